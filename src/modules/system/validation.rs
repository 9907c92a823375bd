use crate::models::AppConfig;
use crate::proxy::config::{DefaultParams, GatewayConfig, RateLimitConfig};
use std::fmt;

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
    pub actual_value: Option<String>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actual_value {
            Some(val) => write!(f, "  • {}: {} (got: {})", self.field, self.message, val),
            None => write!(f, "  • {}: {}", self.field, self.message),
        }
    }
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual_value: None,
        }
    }

    fn with_value(
        field: impl Into<String>,
        message: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            actual_value: Some(value.to_string()),
        }
    }
}

pub fn validate_app_config(config: &AppConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    validate_gateway_config(&config.gateway, &mut errors);
    validate_rate_limit_config(&config.rate_limit, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_gateway_config(config: &GatewayConfig, errors: &mut Vec<ConfigError>) {
    if config.request_timeout == 0 {
        errors.push(ConfigError::with_value(
            "gateway.request_timeout",
            "must be greater than 0",
            config.request_timeout,
        ));
    } else if config.request_timeout > 120 {
        errors.push(ConfigError::with_value(
            "gateway.request_timeout",
            "should not exceed 120 seconds",
            config.request_timeout,
        ));
    }
    if config.connect_timeout == 0 {
        errors.push(ConfigError::with_value(
            "gateway.connect_timeout",
            "must be greater than 0",
            config.connect_timeout,
        ));
    }
    if let Some(path) = &config.servers_file {
        if path.trim().is_empty() {
            errors.push(ConfigError::new(
                "gateway.servers_file",
                "must not be empty when set",
            ));
        }
    }
    validate_default_params(&config.default_params, errors);
}

fn validate_default_params(params: &DefaultParams, errors: &mut Vec<ConfigError>) {
    let required = [
        ("gateway.default_params.secret", &params.secret),
        ("gateway.default_params.game_version", &params.game_version),
        ("gateway.default_params.binary_version", &params.binary_version),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigError::new(field, "must not be empty"));
        }
    }
    for key in params.extra.keys() {
        if key.trim().is_empty() {
            errors.push(ConfigError::new(
                "gateway.default_params.extra",
                "parameter names must not be empty",
            ));
        }
    }
}

fn validate_rate_limit_config(config: &RateLimitConfig, errors: &mut Vec<ConfigError>) {
    if !config.enabled {
        return;
    }
    if config.max_requests == 0 {
        errors.push(ConfigError::with_value(
            "rate_limit.max_requests",
            "must be greater than 0 when rate limiting is enabled",
            config.max_requests,
        ));
    }
    if config.window_seconds == 0 {
        errors.push(ConfigError::with_value(
            "rate_limit.window_seconds",
            "must be greater than 0 when rate limiting is enabled",
            config.window_seconds,
        ));
    }
}
