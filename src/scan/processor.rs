use std::sync::Arc;

use futures::{stream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    api::ClassifierHandle,
    domain::{ExtractedMessage, ScanReason},
    hosts::{self, SelectorSet},
    page::{ElementHandle, HostPage},
    scan::{dispose::DispositionEngine, harvest, markers::MarkerRegistry},
    settings::{Settings, SettingsStore},
};

const MAX_IN_FLIGHT: usize = 8;

/// Runs one harvest-classify-dispose pass per invocation. Everything
/// rests on the marker registry: rows are claimed synchronously at
/// enumeration time, so any number of overlapping passes submit each
/// row at most once.
pub struct ScanProcessor {
    page: Arc<dyn HostPage>,
    store: Arc<SettingsStore>,
    markers: Arc<MarkerRegistry>,
    classifier: ClassifierHandle,
    dispositions: DispositionEngine,
}

impl ScanProcessor {
    pub fn new(
        page: Arc<dyn HostPage>,
        store: Arc<SettingsStore>,
        markers: Arc<MarkerRegistry>,
        classifier: ClassifierHandle,
    ) -> Self {
        let dispositions = DispositionEngine::new(store.clone(), markers.clone());
        Self {
            page,
            store,
            markers,
            classifier,
            dispositions,
        }
    }

    /// One scan pass. Settings are snapshotted once up front; a change
    /// mid-pass only affects the next pass. Never returns an error:
    /// every failure is isolated to its element or logged and dropped.
    pub async fn run_pass(&self, reason: ScanReason) {
        let settings = self.store.snapshot();
        if !settings.enabled {
            debug!(target: "scan", reason = reason.as_str(), "detection disabled; skipping pass");
            return;
        }
        let url = match self.page.url().await {
            Ok(url) => url,
            Err(err) => {
                warn!(target: "scan", error = %err, "cannot read page url; skipping pass");
                return;
            }
        };
        let host = hosts::detect_host(&url);
        let Some(selectors) = host.selectors() else {
            debug!(target: "scan", host = host.as_str(), "unsupported host; skipping pass");
            return;
        };
        let rows = match harvest::find_rows(self.page.as_ref(), selectors).await {
            Ok(rows) => rows,
            Err(err) => {
                warn!(target: "scan", error = %err, "row discovery failed; skipping pass");
                return;
            }
        };
        let fresh: Vec<ElementHandle> = rows
            .into_iter()
            .filter(|row| self.markers.mark_checked(row))
            .collect();
        if fresh.is_empty() {
            debug!(target: "scan", reason = reason.as_str(), "no new rows");
            return;
        }
        info!(
            target: "scan",
            reason = reason.as_str(),
            host = host.as_str(),
            new_rows = fresh.len(),
            "scan pass started"
        );

        let settings = &settings;
        stream::iter(fresh)
            .for_each_concurrent(MAX_IN_FLIGHT, |element| async move {
                self.process_element(selectors, settings, element).await;
            })
            .await;
    }

    async fn process_element(
        &self,
        selectors: &'static SelectorSet,
        settings: &Settings,
        element: ElementHandle,
    ) {
        let message =
            match harvest::extract_message(self.page.as_ref(), selectors, &element).await {
                Ok(message) => message,
                Err(err) => {
                    debug!(target: "scan", element = %element.0, error = %err, "extraction failed; row stays checked");
                    return;
                }
            };
        if !message.is_classifiable() {
            debug!(target: "scan", element = %element.0, "combined text too short; row stays checked");
            return;
        }
        // Counted at dispatch time, so a response that never arrives can
        // not leave a row checked but unaccounted for.
        self.store.record_scanned();
        let ExtractedMessage { element, text } = message;
        let verdict = match self
            .classifier
            .classify(settings.api_url.clone(), text)
            .await
        {
            Ok(verdict) => verdict,
            Err(err) => {
                warn!(target: "scan", element = %element.0, error = %err, "classification failed; row left unhighlighted");
                return;
            }
        };
        self.dispositions
            .dispose(&self.page, selectors, &element, &verdict, settings)
            .await;
    }
}
