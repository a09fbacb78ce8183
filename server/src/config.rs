//! Server configuration (§6, ambient stack). Defaults match the numeric
//! contracts fixed elsewhere (`vtt_core::constants`); a TOML file
//! overrides defaults, and environment variables (loaded via `dotenvy`)
//! override the file.

use serde::Deserialize;
use std::path::Path;

use vtt_core::constants::DEBOUNCE_SAVE_SECONDS;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_address: String,
    pub debounce_save_seconds: u64,
    pub log_level: String,
    pub log_file: Option<String>,
    pub persistence_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_address: "0.0.0.0:8080".to_string(),
            debounce_save_seconds: DEBOUNCE_SAVE_SECONDS,
            log_level: "info".to_string(),
            log_file: None,
            persistence_path: "vtt-data".to_string(),
        }
    }
}

impl Config {
    /// Loads `path` if it exists (TOML), falling back to defaults, then
    /// applies `VTT_*` environment overrides loaded by `dotenvy`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Config> {
        dotenvy::dotenv().ok();

        let mut config = if path.as_ref().exists() {
            let text = std::fs::read_to_string(path)?;
            toml::from_str(&text)?
        } else {
            Config::default()
        };

        if let Ok(bind) = std::env::var("VTT_BIND_ADDRESS") {
            config.bind_address = bind;
        }
        if let Ok(level) = std::env::var("VTT_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(debounce) = std::env::var("VTT_DEBOUNCE_SAVE_SECONDS") {
            config.debounce_save_seconds = debounce.parse().unwrap_or(config.debounce_save_seconds);
        }

        Ok(config)
    }
}
