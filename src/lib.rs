mod commands;
pub mod constants;
pub mod error;
pub mod models;
mod modules;
pub mod proxy;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use proxy::dispatch::{DispatchBundle, DispatchFailure, DispatchOutcome};
pub use proxy::mappers::response::{decode, DecodedResponse};
pub use proxy::registry::{RegistryError, ServerRegistry};
pub use utils::crypto::{hash, obfuscate, reveal};

use error::{AppError, AppResult};
use modules::system::logger;
use proxy::state::GatewayState;
use tracing::{error, info, warn};

const USAGE: &str = "usage: gdgate <servers | status | decode [separator] | probe <server-id> <procedure> [key=value ...]>";

fn apply_env_overrides(config: &mut models::AppConfig) {
    if let Ok(path) = std::env::var(constants::ENV_SERVERS_FILE) {
        if !path.trim().is_empty() {
            info!("Using servers file from environment: {}", path);
            config.gateway.servers_file = Some(path);
        }
    }

    if let Ok(raw) = std::env::var(constants::ENV_REQUEST_TIMEOUT) {
        match raw.trim().parse::<u64>() {
            Ok(secs) => {
                info!("Using request timeout from environment: {}s", secs);
                config.gateway.request_timeout = secs;
            }
            Err(_) => warn!("Ignoring invalid request timeout value: {}", raw),
        }
    }
}

fn load_registry(config: &models::AppConfig) -> AppResult<ServerRegistry> {
    let registry = match config.gateway.servers_file.as_deref() {
        Some(path) => ServerRegistry::load_from_file(std::path::Path::new(path))?,
        None => {
            info!("No servers file configured, using the built-in server list");
            ServerRegistry::builtin()?
        }
    };
    Ok(registry)
}

fn build_state() -> AppResult<GatewayState> {
    let mut config = modules::system::config::load_app_config().map_err(AppError::Config)?;
    apply_env_overrides(&mut config);
    modules::system::validation::validate_app_config(&config).map_err(|errors| {
        AppError::Config(format!(
            "configuration_validation_failed:\n{}",
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n")
        ))
    })?;

    let registry = load_registry(&config)?;
    let state = GatewayState::from_config(registry, &config.gateway, &config.rate_limit)?;
    Ok(state)
}

async fn run_command(state: &GatewayState, args: &[String]) -> Result<String, String> {
    match args.first().map(String::as_str) {
        Some("servers") => commands::servers::list_public_servers(&state.registry),
        Some("status") => {
            let statuses =
                commands::servers::server_statuses(&state.registry, state.tracker.as_ref());
            serde_json::to_string_pretty(&statuses).map_err(|e| e.to_string())
        }
        Some("probe") if args.len() >= 3 => {
            let params = commands::probe::parse_param_args(&args[3..]);
            let result = commands::probe::probe(
                state,
                constants::LOCAL_CLIENT_KEY,
                &args[1],
                &args[2],
                params,
                proxy::mappers::response::DEFAULT_FIELD_SEPARATOR,
            )
            .await?;
            serde_json::to_string_pretty(&result).map_err(|e| e.to_string())
        }
        _ => Err(USAGE.to_string()),
    }
}

pub fn run() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    // Decoding is purely local; no config, registry or runtime needed.
    if args.first().map(String::as_str) == Some("decode") {
        match commands::decode_stdin(args.get(1).map(String::as_str)) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    logger::init_logger();

    let state = match build_state() {
        Ok(state) => state,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create Tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = runtime.block_on(run_command(&state, &args));
    match outcome {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::EnvScope;

    #[test]
    fn env_overrides_apply_valid_values_only() {
        let mut env = EnvScope::new();
        env.set(constants::ENV_SERVERS_FILE, "/tmp/servers.json")
            .set(constants::ENV_REQUEST_TIMEOUT, "abc");

        let mut config = models::AppConfig::new();
        apply_env_overrides(&mut config);
        assert_eq!(
            config.gateway.servers_file.as_deref(),
            Some("/tmp/servers.json")
        );
        assert_eq!(config.gateway.request_timeout, 15);

        env.set(constants::ENV_REQUEST_TIMEOUT, "30");
        apply_env_overrides(&mut config);
        assert_eq!(config.gateway.request_timeout, 30);
    }

    #[test]
    fn env_overrides_leave_config_alone_when_unset() {
        let mut env = EnvScope::new();
        env.unset(constants::ENV_SERVERS_FILE)
            .unset(constants::ENV_REQUEST_TIMEOUT);

        let mut config = models::AppConfig::new();
        apply_env_overrides(&mut config);
        assert!(config.gateway.servers_file.is_none());
        assert_eq!(config.gateway.request_timeout, 15);
    }

    #[test]
    fn missing_servers_file_is_a_registry_error() {
        let mut config = models::AppConfig::new();
        config.gateway.servers_file = Some("/definitely/not/here.json".to_string());
        assert!(matches!(
            load_registry(&config),
            Err(AppError::Registry(RegistryError::Unreadable { .. }))
        ));

        config.gateway.servers_file = None;
        assert_eq!(load_registry(&config).unwrap().len(), 1);
    }
}
