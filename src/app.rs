use std::{sync::Arc, time::Duration};

use anyhow::Result;
use reqwest::Client;
use tokio::{task::JoinHandle, time::timeout};
use tokio_cron_scheduler::JobScheduler;

use crate::{
    api::{self, ClassifierHandle},
    config::AppConfig,
    db::{self, settings::SettingsRepository},
    infrastructure::{
        directories::ResolvedPaths,
        shutdown::{Shutdown, ShutdownListener},
    },
    page::{HostPage, SidecarPage},
    scan::{MarkerRegistry, ScanProcessor},
    settings::{SettingsStore, SettingsUpdate},
    tasks::{configure_rescan_jobs, Scheduler},
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SentryApp {
    scheduler: JobScheduler,
    scan_loop: JoinHandle<()>,
    repo: Arc<SettingsRepository>,
    store: Arc<SettingsStore>,
    shutdown: Shutdown,
}

impl SentryApp {
    pub async fn initialize(
        config: AppConfig,
        paths: ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let pool = db::init_pool(&paths.db_path).await?;
        let repo = Arc::new(SettingsRepository::new(pool));
        let (settings, stats) = repo.load(&config.seed).await?;
        // Materialize seeded defaults so the settings UI sees every key.
        repo.save_settings(&settings).await?;
        let store = SettingsStore::new(settings, stats, Some(repo.clone()));

        let http = Client::builder()
            .user_agent(format!("mailsentry/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let page = SidecarPage::new(http.clone(), config.bridge.clone());
        let events = page.spawn_event_stream(shutdown.subscribe());
        if let Err(err) = page.health().await {
            tracing::warn!(target: "page", error = %err, "browser bridge not reachable yet");
        }

        let classifier =
            api::spawn_classifier(http, config.api.predict_timeout, shutdown.subscribe());
        probe_prediction_service(&classifier, &store).await;

        let markers = Arc::new(MarkerRegistry::new());
        let page: Arc<dyn HostPage> = Arc::new(page);
        let processor = Arc::new(ScanProcessor::new(
            page.clone(),
            store.clone(),
            markers.clone(),
            classifier,
        ));

        spawn_settings_change_logger(&store, shutdown.subscribe());
        spawn_settings_reloader(
            repo.clone(),
            store.clone(),
            config.settings_poll,
            shutdown.subscribe(),
        );

        let scheduler =
            configure_rescan_jobs(&config.scheduler.rescan_crons, processor.clone()).await?;
        let scan_loop = tokio::spawn(
            Scheduler::new(processor, page, markers, events, config.scheduler.clone())
                .run(shutdown.subscribe()),
        );

        Ok(Self {
            scheduler,
            scan_loop,
            repo,
            store,
            shutdown,
        })
    }

    pub async fn run(self) -> Result<()> {
        let SentryApp {
            mut scheduler,
            mut scan_loop,
            repo,
            store,
            shutdown,
        } = self;

        tracing::info!("mailsentry started");

        let mut listener = shutdown.subscribe();
        listener.notified().await;
        tracing::info!("shutdown signal received");

        match timeout(SHUTDOWN_TIMEOUT, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(?err, "failed to stop the rescan scheduler");
            }
            Err(_) => {
                tracing::warn!(
                    target: "scheduler",
                    "rescan scheduler did not stop within {:?}",
                    SHUTDOWN_TIMEOUT
                );
            }
        }

        tokio::select! {
            res = &mut scan_loop => {
                if let Err(err) = res {
                    if err.is_panic() {
                        tracing::error!("scan loop ended in a panic");
                    }
                }
            }
            _ = tokio::time::sleep(SHUTDOWN_TIMEOUT) => {
                tracing::warn!(
                    target: "scheduler",
                    "scan loop did not stop within {:?}; aborting",
                    SHUTDOWN_TIMEOUT
                );
                scan_loop.abort();
            }
        }

        if timeout(SHUTDOWN_TIMEOUT, repo.close()).await.is_err() {
            tracing::warn!(
                target: "db",
                "settings store did not close within {:?}",
                SHUTDOWN_TIMEOUT
            );
        }

        let stats = store.stats();
        tracing::info!(
            scanned = stats.scanned,
            spam = stats.spam,
            "mailsentry stopped"
        );
        Ok(())
    }
}

async fn probe_prediction_service(classifier: &ClassifierHandle, store: &Arc<SettingsStore>) {
    let api_url = store.snapshot().api_url;
    match classifier.check_api(api_url.clone()).await {
        Ok(true) => {
            tracing::info!(target: "api", %api_url, "prediction service healthy");
        }
        Ok(false) => {
            tracing::warn!(target: "api", %api_url, "prediction service reachable but model not loaded");
        }
        Err(err) => {
            tracing::warn!(target: "api", %api_url, error = %err, "prediction service not reachable");
        }
    }
}

/// The settings UI owns the settings table; this daemon only ever sees
/// its edits by re-reading the rows. Changes apply on the next pass, no
/// mid-pass consistency is attempted.
fn spawn_settings_reloader(
    repo: Arc<SettingsRepository>,
    store: Arc<SettingsStore>,
    poll: Duration,
    mut shutdown: ShutdownListener,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.notified() => break,
                _ = tokio::time::sleep(poll) => {}
            }
            if shutdown.is_triggered() {
                break;
            }
            let current = store.snapshot();
            let loaded = match repo.load(&current).await {
                Ok((settings, _)) => settings,
                Err(err) => {
                    tracing::debug!(target: "settings", error = %err, "settings reload failed");
                    continue;
                }
            };
            if loaded != current {
                store.update(SettingsUpdate {
                    enabled: Some(loaded.enabled),
                    confidence_threshold: Some(loaded.confidence_threshold),
                    auto_move_to_spam: Some(loaded.auto_move_to_spam),
                    api_url: Some(loaded.api_url),
                });
            }
        }
    });
}

fn spawn_settings_change_logger(store: &Arc<SettingsStore>, mut shutdown: ShutdownListener) {
    let mut watcher = store.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.notified() => break,
                changed = watcher.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let settings = watcher.borrow_and_update().clone();
                    tracing::info!(
                        target: "settings",
                        enabled = settings.enabled,
                        threshold = settings.confidence_threshold,
                        auto_move = settings.auto_move_to_spam,
                        "settings changed"
                    );
                }
            }
        }
    });
}
