use std::{collections::HashMap, str::FromStr};

use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::{domain::StatsSnapshot, settings::Settings};

/// Key/value persistence for settings and counters. Key names match the
/// storage keys the settings UI reads, so both sides stay in sync.
#[derive(Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub const KEY_API_URL: &'static str = "apiUrl";
    pub const KEY_ENABLED: &'static str = "isEnabled";
    pub const KEY_THRESHOLD: &'static str = "confidenceThreshold";
    pub const KEY_AUTO_MOVE: &'static str = "autoMoveToSpam";
    pub const KEY_SCANNED_COUNT: &'static str = "scannedCount";
    pub const KEY_SPAM_COUNT: &'static str = "spamCount";

    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Read persisted settings and counters, falling back to `defaults`
    /// for any key the table does not hold yet.
    pub async fn load(&self, defaults: &Settings) -> Result<(Settings, StatsSnapshot)> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;
        let map: HashMap<String, String> = rows.into_iter().collect();

        let settings = Settings {
            enabled: parse_or(map.get(Self::KEY_ENABLED), defaults.enabled),
            confidence_threshold: parse_or(
                map.get(Self::KEY_THRESHOLD),
                defaults.confidence_threshold,
            ),
            auto_move_to_spam: parse_or(map.get(Self::KEY_AUTO_MOVE), defaults.auto_move_to_spam),
            api_url: map
                .get(Self::KEY_API_URL)
                .cloned()
                .unwrap_or_else(|| defaults.api_url.clone()),
        };
        let stats = StatsSnapshot {
            scanned: parse_or(map.get(Self::KEY_SCANNED_COUNT), 0),
            spam: parse_or(map.get(Self::KEY_SPAM_COUNT), 0),
        };
        Ok((settings, stats))
    }

    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.put(Self::KEY_API_URL, settings.api_url.clone()).await?;
        self.put(Self::KEY_ENABLED, settings.enabled.to_string())
            .await?;
        self.put(
            Self::KEY_THRESHOLD,
            settings.confidence_threshold.to_string(),
        )
        .await?;
        self.put(
            Self::KEY_AUTO_MOVE,
            settings.auto_move_to_spam.to_string(),
        )
        .await?;
        Ok(())
    }

    pub async fn save_counter(&self, key: &str, value: u64) -> Result<()> {
        self.put(key, value.to_string()).await
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO settings (key, value) VALUES (?1, ?2)
                ON CONFLICT(key) DO UPDATE
                SET value = excluded.value, updated_at = CURRENT_TIMESTAMP"#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn parse_or<T: FromStr + Copy>(raw: Option<&String>, default: T) -> T {
    raw.and_then(|value| value.parse().ok()).unwrap_or(default)
}
