use std::sync::Arc;

use tracing::{debug, info};

use crate::{
    domain::Verdict,
    hosts::SelectorSet,
    page::{ElementHandle, HostPage},
    scan::{automator, highlight::Highlighter, markers::MarkerRegistry},
    settings::{Settings, SettingsStore},
};

/// What `dispose` decided for one verdict. The scanned counter is not
/// handled here; it is charged when the classification is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ham,
    BelowThreshold,
    Flagged { attempted: bool },
    AlreadyFlagged,
}

pub struct DispositionEngine {
    store: Arc<SettingsStore>,
    highlighter: Highlighter,
}

impl DispositionEngine {
    pub fn new(store: Arc<SettingsStore>, markers: Arc<MarkerRegistry>) -> Self {
        Self {
            store,
            highlighter: Highlighter::new(markers),
        }
    }

    pub async fn dispose(
        &self,
        page: &Arc<dyn HostPage>,
        selectors: &'static SelectorSet,
        element: &ElementHandle,
        verdict: &Verdict,
        settings: &Settings,
    ) -> Disposition {
        if !verdict.is_spam {
            return Disposition::Ham;
        }
        // Inclusive comparison: a verdict exactly at the threshold acts.
        if verdict.confidence < settings.confidence_threshold {
            debug!(
                target: "dispose",
                element = %element.0,
                confidence = verdict.confidence,
                threshold = settings.confidence_threshold,
                "spam verdict below threshold"
            );
            return Disposition::BelowThreshold;
        }
        if !self
            .highlighter
            .highlight(page.as_ref(), element, verdict.confidence)
            .await
        {
            return Disposition::AlreadyFlagged;
        }
        let spam_total = self.store.record_spam();
        info!(
            target: "dispose",
            element = %element.0,
            confidence = verdict.confidence,
            spam_total,
            "spam flagged"
        );
        let attempted = if settings.auto_move_to_spam {
            automator::move_to_spam(page.clone(), selectors, element.clone()).await
        } else {
            false
        };
        Disposition::Flagged { attempted }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StatsSnapshot;
    use crate::hosts::selectors::GMAIL;
    use crate::page::fake::{el, FakeAction, FakePage};

    fn engine() -> (DispositionEngine, Arc<SettingsStore>) {
        let store = SettingsStore::new(Settings::default(), StatsSnapshot::default(), None);
        let engine = DispositionEngine::new(store.clone(), Arc::new(MarkerRegistry::new()));
        (engine, store)
    }

    fn page() -> Arc<dyn HostPage> {
        Arc::new(FakePage::new("https://mail.google.com/"))
    }

    fn verdict(is_spam: bool, confidence: f64) -> Verdict {
        Verdict { is_spam, confidence }
    }

    #[tokio::test]
    async fn ham_is_left_alone() {
        let (engine, store) = engine();
        let page = page();
        let result = engine
            .dispose(&page, &GMAIL, &el("r1"), &verdict(false, 0.99), &Settings::default())
            .await;
        assert_eq!(result, Disposition::Ham);
        assert_eq!(store.stats().spam, 0);
    }

    #[tokio::test]
    async fn spam_below_threshold_is_logged_only() {
        let (engine, store) = engine();
        let fake = Arc::new(FakePage::new("https://mail.google.com/"));
        let page: Arc<dyn HostPage> = fake.clone();

        let result = engine
            .dispose(&page, &GMAIL, &el("r1"), &verdict(true, 0.85), &Settings::default())
            .await;
        assert_eq!(result, Disposition::BelowThreshold);
        assert_eq!(store.stats().spam, 0);
        assert!(fake.actions().is_empty());
    }

    #[tokio::test]
    async fn threshold_comparison_is_inclusive() {
        let (engine, _) = engine();
        let page = page();
        let result = engine
            .dispose(&page, &GMAIL, &el("r1"), &verdict(true, 0.9), &Settings::default())
            .await;
        assert_eq!(result, Disposition::Flagged { attempted: false });
    }

    #[tokio::test]
    async fn confident_spam_highlights_and_counts_without_auto_action() {
        let (engine, store) = engine();
        let fake = Arc::new(FakePage::new("https://mail.google.com/"));
        let page: Arc<dyn HostPage> = fake.clone();

        let result = engine
            .dispose(&page, &GMAIL, &el("r1"), &verdict(true, 0.95), &Settings::default())
            .await;
        assert_eq!(result, Disposition::Flagged { attempted: false });
        assert_eq!(store.stats().spam, 1);
        assert_eq!(fake.actions(), vec![FakeAction::Highlight(el("r1"))]);
    }

    #[tokio::test]
    async fn auto_action_dispatches_the_automator() {
        let (engine, store) = engine();
        let fake = Arc::new(FakePage::new("https://mail.google.com/"));
        let page: Arc<dyn HostPage> = fake.clone();
        let settings = Settings {
            auto_move_to_spam: true,
            ..Settings::default()
        };

        let result = engine
            .dispose(&page, &GMAIL, &el("r1"), &verdict(true, 0.95), &settings)
            .await;
        assert_eq!(result, Disposition::Flagged { attempted: true });
        assert_eq!(store.stats().spam, 1);
        // Stage 1 of the escalation ran against the row.
        assert!(fake.actions().contains(&FakeAction::Click(el("r1"))));
    }

    #[tokio::test]
    async fn repeated_verdicts_flag_once() {
        let (engine, store) = engine();
        let fake = Arc::new(FakePage::new("https://mail.google.com/"));
        let page: Arc<dyn HostPage> = fake.clone();
        let spam = verdict(true, 0.95);

        let first = engine
            .dispose(&page, &GMAIL, &el("r1"), &spam, &Settings::default())
            .await;
        let second = engine
            .dispose(&page, &GMAIL, &el("r1"), &spam, &Settings::default())
            .await;

        assert_eq!(first, Disposition::Flagged { attempted: false });
        assert_eq!(second, Disposition::AlreadyFlagged);
        assert_eq!(store.stats().spam, 1);
        let highlights = fake
            .actions()
            .iter()
            .filter(|a| matches!(a, FakeAction::Highlight(_)))
            .count();
        assert_eq!(highlights, 1);
    }
}
