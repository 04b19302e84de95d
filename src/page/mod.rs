pub mod bridge;
#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

pub use bridge::SidecarPage;

/// Opaque handle to one node in the host page. The node's lifetime is
/// controlled by the host; a handle the host has discarded surfaces as
/// [`PageError::Stale`] and simply stops appearing in harvest results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("element is no longer attached to the page")]
    Stale,
    #[error("bridge request failed: {0}")]
    Bridge(String),
    #[error("page backend unavailable: {0}")]
    Unavailable(String),
}

/// Signals pushed by the page backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// Some DOM subtree changed; coalesced by the scheduler's debounce.
    Mutation,
    /// The manual control on a highlighted row was pressed.
    ManualAction { element: ElementHandle },
}

/// Everything the pipeline needs from a live host page. Production code
/// talks to a browser automation sidecar; tests use an in-memory fake.
#[async_trait]
pub trait HostPage: Send + Sync {
    async fn url(&self) -> Result<Url, PageError>;
    async fn query(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError>;
    async fn query_within(
        &self,
        scope: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, PageError>;
    async fn parent(&self, element: &ElementHandle) -> Result<Option<ElementHandle>, PageError>;
    async fn inner_text(&self, element: &ElementHandle) -> Result<String, PageError>;
    async fn click(&self, element: &ElementHandle) -> Result<(), PageError>;
    async fn hover(&self, element: &ElementHandle) -> Result<(), PageError>;
    async fn send_keys(&self, keys: &str) -> Result<(), PageError>;
    async fn open_context_menu(&self, element: &ElementHandle) -> Result<(), PageError>;
    /// Render the persistent spam marker plus the manual action control.
    async fn apply_highlight(
        &self,
        element: &ElementHandle,
        confidence: f64,
    ) -> Result<(), PageError>;
    async fn set_control_busy(&self, element: &ElementHandle, busy: bool)
        -> Result<(), PageError>;
}
