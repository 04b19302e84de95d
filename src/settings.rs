//! Runtime-mutable user settings plus the monotonic scan counters.
//!
//! The store is the one piece of shared mutable state in the pipeline.
//! Scans never read it mid-pass; each pass takes one [`Settings`]
//! snapshot up front, so a settings change only affects future passes.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::RwLock;
use tokio::sync::watch;

use crate::{db::settings::SettingsRepository, domain::StatsSnapshot};

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub enabled: bool,
    pub confidence_threshold: f64,
    pub auto_move_to_spam: bool,
    pub api_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 0.9,
            auto_move_to_spam: false,
            api_url: "http://localhost:8000".to_string(),
        }
    }
}

/// Partial update, the `set(partial)` half of the store contract.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub enabled: Option<bool>,
    pub confidence_threshold: Option<f64>,
    pub auto_move_to_spam: Option<bool>,
    pub api_url: Option<String>,
}

pub struct SettingsStore {
    current: RwLock<Settings>,
    scanned: AtomicU64,
    spam: AtomicU64,
    notify: watch::Sender<Settings>,
    repo: Option<Arc<SettingsRepository>>,
}

impl SettingsStore {
    pub fn new(
        initial: Settings,
        stats: StatsSnapshot,
        repo: Option<Arc<SettingsRepository>>,
    ) -> Arc<Self> {
        let (notify, _) = watch::channel(initial.clone());
        Arc::new(Self {
            current: RwLock::new(initial),
            scanned: AtomicU64::new(stats.scanned),
            spam: AtomicU64::new(stats.spam),
            notify,
            repo,
        })
    }

    pub fn snapshot(&self) -> Settings {
        self.current.read().clone()
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            scanned: self.scanned.load(Ordering::SeqCst),
            spam: self.spam.load(Ordering::SeqCst),
        }
    }

    /// Change notification, the `onChange(callback)` half of the store
    /// contract.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.notify.subscribe()
    }

    pub fn update(&self, update: SettingsUpdate) -> Settings {
        let merged = {
            let mut current = self.current.write();
            if let Some(enabled) = update.enabled {
                current.enabled = enabled;
            }
            if let Some(threshold) = update.confidence_threshold {
                current.confidence_threshold = threshold.clamp(0.0, 1.0);
            }
            if let Some(auto) = update.auto_move_to_spam {
                current.auto_move_to_spam = auto;
            }
            if let Some(api_url) = update.api_url {
                current.api_url = api_url.trim_end_matches('/').to_string();
            }
            current.clone()
        };
        let _ = self.notify.send(merged.clone());
        if let Some(repo) = &self.repo {
            let repo = repo.clone();
            let to_save = merged.clone();
            tokio::spawn(async move {
                if let Err(err) = repo.save_settings(&to_save).await {
                    tracing::warn!(target: "settings", error = %err, "failed to persist settings");
                }
            });
        }
        merged
    }

    pub fn record_scanned(&self) -> u64 {
        let value = self.scanned.fetch_add(1, Ordering::SeqCst) + 1;
        self.persist_counter(SettingsRepository::KEY_SCANNED_COUNT, value);
        value
    }

    pub fn record_spam(&self) -> u64 {
        let value = self.spam.fetch_add(1, Ordering::SeqCst) + 1;
        self.persist_counter(SettingsRepository::KEY_SPAM_COUNT, value);
        value
    }

    fn persist_counter(&self, key: &'static str, value: u64) {
        if let Some(repo) = &self.repo {
            let repo = repo.clone();
            tokio::spawn(async move {
                if let Err(err) = repo.save_counter(key, value).await {
                    tracing::warn!(target: "settings", key, error = %err, "failed to persist counter");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<SettingsStore> {
        SettingsStore::new(Settings::default(), StatsSnapshot::default(), None)
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let settings = Settings::default();
        assert!(settings.enabled);
        assert!((settings.confidence_threshold - 0.9).abs() < 1e-9);
        assert!(!settings.auto_move_to_spam);
        assert_eq!(settings.api_url, "http://localhost:8000");
    }

    #[test]
    fn partial_update_merges_and_notifies() {
        let store = store();
        let mut watcher = store.subscribe();

        let merged = store.update(SettingsUpdate {
            confidence_threshold: Some(0.75),
            ..Default::default()
        });
        assert!((merged.confidence_threshold - 0.75).abs() < 1e-9);
        assert!(merged.enabled);

        assert!(watcher.has_changed().unwrap());
        assert!((watcher.borrow_and_update().confidence_threshold - 0.75).abs() < 1e-9);
    }

    #[test]
    fn counters_only_grow() {
        let store = store();
        assert_eq!(store.record_scanned(), 1);
        assert_eq!(store.record_scanned(), 2);
        assert_eq!(store.record_spam(), 1);
        let stats = store.stats();
        assert_eq!(stats.scanned, 2);
        assert_eq!(stats.spam, 1);
    }

    #[test]
    fn counters_resume_from_persisted_snapshot() {
        let store = SettingsStore::new(
            Settings::default(),
            StatsSnapshot {
                scanned: 40,
                spam: 7,
            },
            None,
        );
        assert_eq!(store.record_scanned(), 41);
        assert_eq!(store.record_spam(), 8);
    }
}
