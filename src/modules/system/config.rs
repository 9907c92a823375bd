use std::fs;
use std::path::{Path, PathBuf};

use crate::models::AppConfig;

const CONFIG_FILE: &str = "config.json";
const DATA_DIR: &str = ".gdgate";

pub fn get_data_dir() -> Result<PathBuf, String> {
    fn ensure_dir(path: &PathBuf) -> Result<(), String> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(|e| format!("failed_to_create_data_dir: {}", e))?;
        }
        Ok(())
    }
    if let Ok(env_path) = std::env::var("DATA_DIR") {
        if !env_path.trim().is_empty() {
            let data_dir = PathBuf::from(env_path);
            ensure_dir(&data_dir)?;
            return Ok(data_dir);
        }
    }
    if cfg!(test) {
        let data_dir = std::env::temp_dir().join(format!(".gdgate-test-{}", std::process::id()));
        ensure_dir(&data_dir)?;
        return Ok(data_dir);
    }

    match dirs::home_dir() {
        Some(home) => {
            let data_dir = home.join(DATA_DIR);
            ensure_dir(&data_dir)?;
            Ok(data_dir)
        }
        None => Err("failed_to_locate_home_dir".to_string()),
    }
}

pub fn load_app_config() -> Result<AppConfig, String> {
    load_app_config_from(&get_data_dir()?)
}

pub fn load_app_config_from(data_dir: &Path) -> Result<AppConfig, String> {
    let config_path = data_dir.join(CONFIG_FILE);

    if !config_path.exists() {
        let config = AppConfig::new();
        if let Err(e) = save_app_config_to(data_dir, &config) {
            tracing::warn!("Failed to write default config: {}", e);
        }
        return Ok(config);
    }

    let content = fs::read_to_string(&config_path)
        .map_err(|e| format!("failed_to_read_config_file: {}", e))?;

    serde_json::from_str(&content).map_err(|e| format!("failed_to_parse_config_file: {}", e))
}

pub fn save_app_config_to(data_dir: &Path, config: &AppConfig) -> Result<(), String> {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("failed_to_serialize_config: {}", e))?;

    fs::write(&config_path, content).map_err(|e| format!("failed_to_save_config: {}", e))
}
