//! Best-effort trigger for the host's native "move to spam" action.
//!
//! Neither host exposes a stable API for this, so the automator runs a
//! timed escalation chain, each stage more invasive than the last,
//! stopping at the first stage that activates a control:
//!
//! 1. activate the row and hover it to reveal lazily-rendered controls;
//! 2. poll the spam-action selectors near the row (element, then
//!    ancestors) at increasing delays;
//! 3. search the page-level toolbar regions;
//! 4. send the host keyboard shortcut;
//! 5. open a context menu on the row and match item labels.
//!
//! The caller gets an "attempted" signal right after stage 1; the rest
//! of the chain runs on its own task and is never retried.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    hosts::SelectorSet,
    page::{ElementHandle, HostPage},
};

/// Gaps between stage-2 polls; probes land at +100 ms, +300 ms and
/// +500 ms after stage 1.
const POLL_GAPS: [Duration; 3] = [
    Duration::from_millis(100),
    Duration::from_millis(200),
    Duration::from_millis(200),
];

/// How far up the ancestor chain stage 2 searches for the control.
const ANCESTOR_DEPTH: usize = 5;

const MENU_RENDER_DELAY: Duration = Duration::from_millis(150);

/// Returns `true` once stage 1 is dispatched; the action itself is not
/// confirmed and may still fail silently in the host UI.
pub async fn move_to_spam(
    page: Arc<dyn HostPage>,
    selectors: &'static SelectorSet,
    element: ElementHandle,
) -> bool {
    // Stage 1: a failed activation means the row is already gone, so
    // there is nothing left to escalate against.
    if let Err(err) = page.click(&element).await {
        warn!(target: "automator", element = %element.0, error = %err, "row activation failed");
        return false;
    }
    if let Err(err) = page.hover(&element).await {
        debug!(target: "automator", element = %element.0, error = %err, "hover dispatch failed");
    }
    tokio::spawn(async move {
        escalate(page, selectors, element).await;
    });
    true
}

pub(crate) async fn escalate(
    page: Arc<dyn HostPage>,
    selectors: &'static SelectorSet,
    element: ElementHandle,
) {
    // Stage 2: the control is usually rendered lazily after hover.
    for gap in POLL_GAPS {
        sleep(gap).await;
        if let Some(control) = find_control_near(page.as_ref(), selectors, &element).await {
            if page.click(&control).await.is_ok() {
                info!(target: "automator", element = %element.0, stage = 2, "spam control activated");
                return;
            }
        }
    }

    // Stage 3: some layouts only show the control in the toolbar once a
    // row is selected.
    if let Some(control) = find_control_in_toolbar(page.as_ref(), selectors).await {
        if page.click(&control).await.is_ok() {
            info!(target: "automator", element = %element.0, stage = 3, "toolbar spam control activated");
            return;
        }
    }

    // Stage 4: keyboard shortcut against the selected row.
    match page.send_keys(selectors.spam_shortcut).await {
        Ok(()) => {
            info!(target: "automator", element = %element.0, stage = 4, "spam shortcut dispatched");
            return;
        }
        Err(err) => {
            debug!(target: "automator", element = %element.0, error = %err, "shortcut dispatch failed");
        }
    }

    // Stage 5, last resort: context menu on the row.
    if context_menu_fallback(page.as_ref(), selectors, &element).await {
        info!(target: "automator", element = %element.0, stage = 5, "context menu spam item activated");
        return;
    }

    warn!(
        target: "automator",
        element = %element.0,
        "no spam control found; all escalation stages exhausted"
    );
}

async fn find_control_near(
    page: &dyn HostPage,
    selectors: &SelectorSet,
    element: &ElementHandle,
) -> Option<ElementHandle> {
    let mut scope = element.clone();
    for _ in 0..=ANCESTOR_DEPTH {
        for selector in selectors.spam_action {
            match page.query_within(&scope, selector).await {
                Ok(found) => {
                    if let Some(control) = found.into_iter().next() {
                        return Some(control);
                    }
                }
                Err(_) => return None,
            }
        }
        scope = match page.parent(&scope).await {
            Ok(Some(parent)) => parent,
            _ => return None,
        };
    }
    None
}

async fn find_control_in_toolbar(
    page: &dyn HostPage,
    selectors: &SelectorSet,
) -> Option<ElementHandle> {
    for region_selector in selectors.toolbar {
        let regions = match page.query(region_selector).await {
            Ok(regions) => regions,
            Err(_) => continue,
        };
        for region in regions {
            for selector in selectors.spam_action {
                if let Ok(found) = page.query_within(&region, selector).await {
                    if let Some(control) = found.into_iter().next() {
                        return Some(control);
                    }
                }
            }
        }
    }
    None
}

async fn context_menu_fallback(
    page: &dyn HostPage,
    selectors: &SelectorSet,
    element: &ElementHandle,
) -> bool {
    if page.open_context_menu(element).await.is_err() {
        return false;
    }
    sleep(MENU_RENDER_DELAY).await;
    let items = match page.query(selectors.menu_item).await {
        Ok(items) => items,
        Err(_) => return false,
    };
    for item in items {
        let label = match page.inner_text(&item).await {
            Ok(label) => label,
            Err(_) => continue,
        };
        if selectors.menu_label().is_match(&label) {
            return page.click(&item).await.is_ok();
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts::selectors::{GMAIL, OUTLOOK};
    use crate::page::fake::{el, FakeAction, FakePage};

    #[tokio::test(start_paused = true)]
    async fn control_on_the_row_resolves_at_stage_two() {
        let page = Arc::new(FakePage::new("https://mail.google.com/"));
        page.add_scoped_matches("r1", GMAIL.spam_action[0], &["ctl"]);

        escalate(page.clone(), &GMAIL, el("r1")).await;

        let actions = page.actions();
        assert!(actions.contains(&FakeAction::Click(el("ctl"))));
        // Stages 3-5 never ran.
        assert!(!actions.iter().any(|a| matches!(a, FakeAction::Keys(_))));
        assert!(!actions.iter().any(|a| matches!(a, FakeAction::ContextMenu(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn control_is_found_on_an_ancestor() {
        let page = Arc::new(FakePage::new("https://mail.google.com/"));
        page.set_parent("r1", "p1");
        page.set_parent("p1", "p2");
        page.add_scoped_matches("p2", GMAIL.spam_action[1], &["ctl"]);

        escalate(page.clone(), &GMAIL, el("r1")).await;
        assert!(page.actions().contains(&FakeAction::Click(el("ctl"))));
    }

    #[tokio::test(start_paused = true)]
    async fn toolbar_control_resolves_at_stage_three() {
        let page = Arc::new(FakePage::new("https://mail.google.com/"));
        page.add_page_matches(GMAIL.toolbar[0], &["tb"]);
        page.add_scoped_matches("tb", GMAIL.spam_action[0], &["tb-ctl"]);

        escalate(page.clone(), &GMAIL, el("r1")).await;
        assert!(page.actions().contains(&FakeAction::Click(el("tb-ctl"))));
        assert!(!page.actions().iter().any(|a| matches!(a, FakeAction::Keys(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn shortcut_is_the_stage_four_fallback() {
        let page = Arc::new(FakePage::new("https://mail.google.com/"));

        escalate(page.clone(), &GMAIL, el("r1")).await;
        assert!(page
            .actions()
            .contains(&FakeAction::Keys(GMAIL.spam_shortcut.to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn context_menu_is_the_last_resort() {
        let page = Arc::new(FakePage::new("https://outlook.live.com/"));
        page.fail_keys();
        page.add_page_matches(OUTLOOK.menu_item, &["m1", "m2"]);
        page.set_text("m1", "Archive");
        page.set_text("m2", "Mark as junk");

        escalate(page.clone(), &OUTLOOK, el("r1")).await;

        let actions = page.actions();
        assert!(actions.contains(&FakeAction::ContextMenu(el("r1"))));
        assert!(actions.contains(&FakeAction::Click(el("m2"))));
        assert!(!actions.contains(&FakeAction::Click(el("m1"))));
    }

    #[tokio::test(start_paused = true)]
    async fn attempted_signal_returns_before_the_chain_finishes() {
        let page: Arc<FakePage> = Arc::new(FakePage::new("https://mail.google.com/"));
        let handle: Arc<dyn HostPage> = page.clone();

        let attempted = move_to_spam(handle, &GMAIL, el("r1")).await;
        assert!(attempted);

        // Stage 1 ran inline; the spawned chain has not been polled yet.
        let actions = page.actions();
        assert!(actions.contains(&FakeAction::Click(el("r1"))));
        assert!(actions.contains(&FakeAction::Hover(el("r1"))));
        assert!(!actions.iter().any(|a| matches!(a, FakeAction::Keys(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_row_cannot_be_attempted() {
        let page: Arc<FakePage> = Arc::new(FakePage::new("https://mail.google.com/"));
        page.mark_stale("r1");
        let handle: Arc<dyn HostPage> = page.clone();

        assert!(!move_to_spam(handle, &GMAIL, el("r1")).await);
    }
}
