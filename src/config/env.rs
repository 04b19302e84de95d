use std::time::Duration;

use thiserror::Error;

use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bridge: BridgeConfig,
    pub api: ApiConfig,
    pub seed: Settings,
    /// How often persisted settings are re-read to pick up edits made
    /// by the external settings UI.
    pub settings_poll: Duration,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_url: String,
    pub event_poll_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub predict_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub rescan_crons: Vec<String>,
    pub settle_delay: Duration,
    pub mutation_quiet: Duration,
    pub action_cooldown: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
