//! In-memory [`HostPage`] used across the unit tests. Selector matching
//! is literal: a query returns whatever the test registered for that
//! exact selector string, which is all the fallback-order logic needs.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use url::Url;

use super::{ElementHandle, HostPage, PageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeAction {
    Click(ElementHandle),
    Hover(ElementHandle),
    Keys(String),
    ContextMenu(ElementHandle),
    Highlight(ElementHandle),
    ControlBusy(ElementHandle, bool),
}

#[derive(Default)]
struct State {
    url: Option<Url>,
    page_matches: HashMap<String, Vec<ElementHandle>>,
    scoped_matches: HashMap<(ElementHandle, String), Vec<ElementHandle>>,
    texts: HashMap<ElementHandle, String>,
    parents: HashMap<ElementHandle, ElementHandle>,
    stale: HashSet<ElementHandle>,
    keys_fail: bool,
}

#[derive(Default)]
pub struct FakePage {
    state: Mutex<State>,
    actions: Mutex<Vec<FakeAction>>,
}

pub fn el(id: &str) -> ElementHandle {
    ElementHandle::new(id)
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        let page = Self::default();
        page.state.lock().url = Some(Url::parse(url).expect("valid fake url"));
        page
    }

    pub fn add_page_matches(&self, selector: &str, ids: &[&str]) {
        self.state
            .lock()
            .page_matches
            .insert(selector.to_string(), ids.iter().copied().map(el).collect());
    }

    pub fn add_scoped_matches(&self, scope: &str, selector: &str, ids: &[&str]) {
        self.state.lock().scoped_matches.insert(
            (el(scope), selector.to_string()),
            ids.iter().copied().map(el).collect(),
        );
    }

    pub fn set_text(&self, id: &str, text: &str) {
        self.state.lock().texts.insert(el(id), text.to_string());
    }

    pub fn set_parent(&self, child: &str, parent: &str) {
        self.state.lock().parents.insert(el(child), el(parent));
    }

    pub fn mark_stale(&self, id: &str) {
        self.state.lock().stale.insert(el(id));
    }

    pub fn fail_keys(&self) {
        self.state.lock().keys_fail = true;
    }

    pub fn actions(&self) -> Vec<FakeAction> {
        self.actions.lock().clone()
    }

    fn check_live(&self, element: &ElementHandle) -> Result<(), PageError> {
        if self.state.lock().stale.contains(element) {
            Err(PageError::Stale)
        } else {
            Ok(())
        }
    }

    fn record(&self, action: FakeAction) {
        self.actions.lock().push(action);
    }
}

#[async_trait]
impl HostPage for FakePage {
    async fn url(&self) -> Result<Url, PageError> {
        self.state
            .lock()
            .url
            .clone()
            .ok_or_else(|| PageError::Unavailable("no url configured".to_string()))
    }

    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        Ok(self
            .state
            .lock()
            .page_matches
            .get(selector)
            .cloned()
            .unwrap_or_default())
    }

    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, PageError> {
        self.check_live(scope)?;
        Ok(self
            .state
            .lock()
            .scoped_matches
            .get(&(scope.clone(), selector.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn parent(&self, element: &ElementHandle) -> Result<Option<ElementHandle>, PageError> {
        self.check_live(element)?;
        Ok(self.state.lock().parents.get(element).cloned())
    }

    async fn inner_text(&self, element: &ElementHandle) -> Result<String, PageError> {
        self.check_live(element)?;
        Ok(self
            .state
            .lock()
            .texts
            .get(element)
            .cloned()
            .unwrap_or_default())
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.check_live(element)?;
        self.record(FakeAction::Click(element.clone()));
        Ok(())
    }

    async fn hover(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.check_live(element)?;
        self.record(FakeAction::Hover(element.clone()));
        Ok(())
    }

    async fn send_keys(&self, keys: &str) -> Result<(), PageError> {
        if self.state.lock().keys_fail {
            return Err(PageError::Bridge("keyboard dispatch refused".to_string()));
        }
        self.record(FakeAction::Keys(keys.to_string()));
        Ok(())
    }

    async fn open_context_menu(&self, element: &ElementHandle) -> Result<(), PageError> {
        self.check_live(element)?;
        self.record(FakeAction::ContextMenu(element.clone()));
        Ok(())
    }

    async fn apply_highlight(
        &self,
        element: &ElementHandle,
        _confidence: f64,
    ) -> Result<(), PageError> {
        self.check_live(element)?;
        self.record(FakeAction::Highlight(element.clone()));
        Ok(())
    }

    async fn set_control_busy(
        &self,
        element: &ElementHandle,
        busy: bool,
    ) -> Result<(), PageError> {
        self.record(FakeAction::ControlBusy(element.clone(), busy));
        Ok(())
    }
}
