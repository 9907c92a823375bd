//! Per-request dispatch context.
//!
//! A [`DispatchBundle`] is bound to one resolved upstream server and carries
//! everything a feature needs to talk to it: the gateway's default protocol
//! parameters, the transport and the success tracker. It is passed by
//! reference into feature code instead of living in ambient state.

use crate::models::server::ServerDescriptor;
use crate::proxy::config::DefaultParams;
use crate::proxy::mappers::response::{decode, is_sentinel, DecodedResponse};
use crate::proxy::success_tracker::{last_worked_hint, SuccessTracker};
use crate::proxy::upstream::client::{Transport, TransportError};
use crate::proxy::upstream::params::{encode, RequestParams};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub server_id: String,
    pub procedure: String,
    pub error: TransportError,
}

impl DispatchFailure {
    pub fn is_retryable(&self) -> bool {
        self.error.is_retryable()
    }
}

impl std::fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.procedure, self.error)
    }
}

// Either the raw upstream body or a classified transport failure. Sentinel
// bodies such as "-1" are successes: the upstream was reachable and answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Success(String),
    Failure(DispatchFailure),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success(_))
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            DispatchOutcome::Success(body) => Some(body),
            DispatchOutcome::Failure(_) => None,
        }
    }

    // Reachable, but the upstream said "no data" / "denied".
    pub fn is_denied(&self) -> bool {
        self.body().is_some_and(is_sentinel)
    }

    pub fn into_result(self) -> Result<String, DispatchFailure> {
        match self {
            DispatchOutcome::Success(body) => Ok(body),
            DispatchOutcome::Failure(failure) => Err(failure),
        }
    }
}

pub struct DispatchBundle<'a, T: Transport> {
    server: &'a ServerDescriptor,
    defaults: &'a DefaultParams,
    transport: &'a T,
    tracker: &'a dyn SuccessTracker,
}

impl<'a, T: Transport> DispatchBundle<'a, T> {
    pub fn new(
        server: &'a ServerDescriptor,
        defaults: &'a DefaultParams,
        transport: &'a T,
        tracker: &'a dyn SuccessTracker,
    ) -> Self {
        Self {
            server,
            defaults,
            transport,
            tracker,
        }
    }

    pub fn server(&self) -> &ServerDescriptor {
        self.server
    }

    // Fork renames first, then defaults for whatever the caller left unset.
    // Every rename reads the caller's original value, so overlapping renames
    // (`a -> b`, `b -> c`) never chain. A renamed value replaces a caller key
    // of the same name; two renames onto one key resolve in declared order.
    pub fn prepare_params(&self, mut params: RequestParams) -> RequestParams {
        let mut renamed = Vec::new();
        for (logical, replacement) in &self.server.substitutions {
            if logical == replacement {
                continue;
            }
            if let Some(value) = params.remove(logical) {
                renamed.push((replacement.clone(), value));
            }
        }
        for (key, value) in renamed {
            params.set_optional(key, value);
        }

        for (key, value) in self.defaults.resolve_for(self.server) {
            if !params.contains_key(&key) {
                params.set(key, value);
            }
        }
        params
    }

    pub async fn send(&self, procedure: &str, params: RequestParams) -> DispatchOutcome {
        let server_id = self.server.id_str();
        let upstream_procedure = self.server.procedure_name(procedure);
        let form = encode(&self.prepare_params(params));
        let url = self.server.procedure_url(procedure);

        let started = Instant::now();
        let elapsed = || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match self.transport.post_form(&url, &form).await {
            Ok(body) => {
                self.tracker.record_success(server_id);
                debug!(
                    server = %server_id,
                    procedure = %upstream_procedure,
                    elapsed_ms = elapsed(),
                    bytes = body.len(),
                    "Upstream dispatch succeeded"
                );
                DispatchOutcome::Success(body)
            }
            Err(error) => {
                warn!(
                    server = %server_id,
                    procedure = %upstream_procedure,
                    elapsed_ms = elapsed(),
                    kind = error.kind(),
                    "Upstream dispatch failed: {}",
                    error
                );
                DispatchOutcome::Failure(DispatchFailure {
                    server_id: server_id.to_string(),
                    procedure: upstream_procedure.to_string(),
                    error,
                })
            }
        }
    }

    pub async fn send_decoded(
        &self,
        procedure: &str,
        params: RequestParams,
        separator: &str,
    ) -> Result<DecodedResponse, DispatchFailure> {
        let body = self.send(procedure, params).await.into_result()?;
        Ok(decode(&body, separator))
    }

    pub fn last_worked_hint(&self) -> String {
        last_worked_hint(self.tracker.time_since_last_success(self.server.id_str()))
    }

    // Text the caller can surface to users when a dispatch fails.
    pub fn describe_failure(&self, failure: &DispatchFailure) -> String {
        let reason = match failure.error {
            TransportError::Timeout => "timed out",
            TransportError::Status(429) => "is rate limiting requests",
            TransportError::Status(403) => "refused the request (possibly IP banned)",
            _ => "could not be reached",
        };
        format!(
            "{} {} ({}); this server {}",
            self.server.name,
            reason,
            failure.error,
            self.last_worked_hint()
        )
    }
}
