use std::{env, time::Duration};

use super::env::{
    ApiConfig, AppConfig, BridgeConfig, ConfigError, DirectoryConfig, LoggingConfig,
    SchedulerConfig,
};
use crate::settings::Settings;

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let bridge = BridgeConfig {
            base_url: env::var("BRIDGE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:9223".to_string())
                .trim_end_matches('/')
                .to_string(),
            event_poll_timeout: parse_millis("BRIDGE_EVENT_POLL_TIMEOUT", 25_000)?,
        };

        let api = ApiConfig {
            predict_timeout: parse_millis("PREDICT_TIMEOUT_MS", 10_000)?,
        };

        let defaults = Settings::default();
        let seed = Settings {
            enabled: parse_bool("DETECTION_ENABLED", defaults.enabled)?,
            confidence_threshold: parse_float(
                "CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
            )?,
            auto_move_to_spam: parse_bool("AUTO_MOVE_TO_SPAM", defaults.auto_move_to_spam)?,
            api_url: env::var("API_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "mailsentry.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let scheduler = SchedulerConfig {
            rescan_crons: env::var("RESCAN_CRONS")
                .map(|value| {
                    value
                        .split(';')
                        .map(|part| part.trim().to_string())
                        .filter(|part| !part.is_empty())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_else(|_| vec!["*/30 * * * * *".to_string()]),
            settle_delay: parse_millis("SETTLE_DELAY_MS", 2_000)?,
            mutation_quiet: parse_millis("MUTATION_QUIET_MS", 1_000)?,
            action_cooldown: parse_millis("ACTION_COOLDOWN_MS", 3_000)?,
        };

        Ok(Self {
            bridge,
            api,
            seed,
            settings_poll: parse_millis("SETTINGS_POLL_MS", 5_000)?,
            directories,
            logging,
            scheduler,
        })
    }
}

fn parse_millis(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(Duration::from_millis(default)),
    }
}

fn parse_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        Err(_) => Ok(default),
    }
}

fn parse_float(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.parse::<f64>() {
            Ok(parsed) if (0.0..=1.0).contains(&parsed) => Ok(parsed),
            _ => Err(ConfigError::Invalid { key, value }),
        },
        Err(_) => Ok(default),
    }
}
