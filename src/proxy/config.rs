use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SECRET: &str = "Wmfd2893gb7";
pub const DEFAULT_GAME_VERSION: &str = "22";
pub const DEFAULT_BINARY_VERSION: &str = "42";

// Parameters every upstream call carries unless the caller already set them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefaultParams {
    #[serde(default = "default_secret")]
    pub secret: String,
    #[serde(default = "default_game_version")]
    pub game_version: String,
    #[serde(default = "default_binary_version")]
    pub binary_version: String,
    #[serde(default = "default_gdw")]
    pub gdw: String,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Default for DefaultParams {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            game_version: default_game_version(),
            binary_version: default_binary_version(),
            gdw: default_gdw(),
            extra: BTreeMap::new(),
        }
    }
}

impl DefaultParams {
    // Wire names, with fork-specific values taking precedence.
    pub fn resolve_for(
        &self,
        server: &crate::models::server::ServerDescriptor,
    ) -> Vec<(String, String)> {
        let mut params = vec![
            (
                "secret".to_string(),
                server.secret.clone().unwrap_or_else(|| self.secret.clone()),
            ),
            (
                "gameVersion".to_string(),
                server
                    .game_version
                    .clone()
                    .unwrap_or_else(|| self.game_version.clone()),
            ),
            (
                "binaryVersion".to_string(),
                server
                    .binary_version
                    .clone()
                    .unwrap_or_else(|| self.binary_version.clone()),
            ),
            ("gdw".to_string(), self.gdw.clone()),
        ];
        params.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    // The official server rejects most browser/library user agents.
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub servers_file: Option<String>,
    #[serde(default)]
    pub default_params: DefaultParams,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: String::new(),
            servers_file: None,
            default_params: DefaultParams::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
        }
    }
}

fn default_secret() -> String {
    DEFAULT_SECRET.to_string()
}

fn default_game_version() -> String {
    DEFAULT_GAME_VERSION.to_string()
}

fn default_binary_version() -> String {
    DEFAULT_BINARY_VERSION.to_string()
}

fn default_gdw() -> String {
    "0".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_max_requests() -> u32 {
    100
}

fn default_window_seconds() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::server::ServerDescriptor;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: GatewayConfig = serde_json::from_str(r#"{"request_timeout": 30}"#).unwrap();
        assert_eq!(cfg.request_timeout, 30);
        assert_eq!(cfg.connect_timeout, 5);
        assert_eq!(cfg.default_params.secret, DEFAULT_SECRET);
        assert!(cfg.user_agent.is_empty());
    }

    #[test]
    fn fork_values_override_process_defaults() {
        let server = ServerDescriptor {
            secret: Some("forksecret".to_string()),
            game_version: Some("21".to_string()),
            ..ServerDescriptor::default()
        };
        let mut defaults = DefaultParams::default();
        defaults.extra.insert("uuid".to_string(), "0".to_string());
        let params: BTreeMap<String, String> = defaults.resolve_for(&server).into_iter().collect();
        assert_eq!(params["secret"], "forksecret");
        assert_eq!(params["gameVersion"], "21");
        assert_eq!(params["binaryVersion"], DEFAULT_BINARY_VERSION);
        assert_eq!(params["gdw"], "0");
        assert_eq!(params["uuid"], "0");
    }
}
