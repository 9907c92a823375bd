// Upstream HTTP transport.
//
// The game protocol is plain `application/x-www-form-urlencoded` POSTs to
// `<endpoint><procedure>.php`, answered with delimited text.

use crate::proxy::config::GatewayConfig;
use crate::proxy::upstream::params::to_form_body;
use reqwest::{header, Client};
use std::future::Future;
use thiserror::Error;
use tokio::time::Duration;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("could not connect to upstream: {0}")]
    Connect(String),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("failed to read upstream response body: {0}")]
    Body(String),

    #[error("upstream request failed: {0}")]
    Other(String),
}

impl TransportError {
    // All transport failures may be retried by the caller except client-side
    // request errors, which will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Status(code) => {
                !(400..500).contains(code) || *code == 408 || *code == 429
            }
            _ => true,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout => "timeout_error",
            TransportError::Connect(_) => "connection_error",
            TransportError::Status(_) => "status_error",
            TransportError::Body(_) => "body_error",
            TransportError::Other(_) => "unknown_error",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_connect() {
            TransportError::Connect(error.to_string())
        } else if let Some(status) = error.status() {
            TransportError::Status(status.as_u16())
        } else if error.is_body() || error.is_decode() {
            TransportError::Body(error.to_string())
        } else {
            TransportError::Other(error.to_string())
        }
    }
}

// One outbound form POST per call, returning the full body as text.
pub trait Transport: Send + Sync {
    fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}

pub struct UpstreamClient {
    client: Client,
    user_agent: header::HeaderValue,
}

impl UpstreamClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.request_timeout))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        let user_agent = header::HeaderValue::from_str(&config.user_agent).unwrap_or_else(|e| {
            tracing::warn!("Invalid User-Agent header value, sending empty: {}", e);
            header::HeaderValue::from_static("")
        });

        Ok(Self { client, user_agent })
    }
}

impl Transport for UpstreamClient {
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
    ) -> Result<String, TransportError> {
        let response = self
            .client
            .post(url)
            .header(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .header(header::USER_AGENT, self.user_agent.clone())
            .body(to_form_body(form))
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("HTTP request failed at {}: {}", url, e);
                TransportError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Upstream {} returned {}", url, status);
            return Err(TransportError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| TransportError::Body(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_with_timeout(secs: u64) -> UpstreamClient {
        let config = GatewayConfig {
            request_timeout: secs,
            ..GatewayConfig::default()
        };
        UpstreamClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn posts_form_and_returns_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/database/getGJUserInfo20.php"))
            .and(header_eq("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("targetAccountID=71"))
            .and(body_string_contains("password="))
            .respond_with(ResponseTemplate::new(200).set_body_string("1:RobTop:2:16"))
            .mount(&mock_server)
            .await;

        let client = client_with_timeout(5);
        let url = format!("{}/database/getGJUserInfo20.php", mock_server.uri());
        let form = vec![
            ("targetAccountID".to_string(), "71".to_string()),
            ("password".to_string(), String::new()),
        ];
        let body = client.post_form(&url, &form).await.unwrap();
        assert_eq!(body, "1:RobTop:2:16");
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("error code: 1005"))
            .mount(&mock_server)
            .await;

        let client = client_with_timeout(5);
        let err = client
            .post_form(&format!("{}/x.php", mock_server.uri()), &[])
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Status(503));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("1:2")
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let client = client_with_timeout(1);
        let err = client
            .post_form(&format!("{}/x.php", mock_server.uri()), &[])
            .await
            .unwrap_err();
        assert_eq!(err, TransportError::Timeout);
    }

    #[tokio::test]
    async fn unreachable_host_is_a_connect_failure() {
        let client = client_with_timeout(2);
        let err = client
            .post_form("http://127.0.0.1:1/database/x.php", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Connect(_) | TransportError::Other(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!TransportError::Status(404).is_retryable());
        assert!(TransportError::Status(429).is_retryable());
        assert!(TransportError::Timeout.is_retryable());
        assert_eq!(TransportError::Timeout.kind(), "timeout_error");
    }
}
