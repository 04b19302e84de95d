use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    page::{ElementHandle, HostPage},
    scan::markers::MarkerRegistry,
};

/// Renders the persistent spam marker on a row. Idempotent through the
/// `highlighted` marker: mutation-triggered repeat passes never stack a
/// second overlay on an already-marked row.
pub struct Highlighter {
    markers: Arc<MarkerRegistry>,
}

impl Highlighter {
    pub fn new(markers: Arc<MarkerRegistry>) -> Self {
        Self { markers }
    }

    /// Returns `true` when this call claimed the highlight, `false` when
    /// the row was already marked.
    pub async fn highlight(
        &self,
        page: &dyn HostPage,
        element: &ElementHandle,
        confidence: f64,
    ) -> bool {
        if !self.markers.mark_highlighted(element) {
            debug!(target: "highlight", element = %element.0, "already highlighted");
            return false;
        }
        // The marker stays claimed even if rendering fails; a row the
        // host is about to drop should not be re-counted on the next pass.
        if let Err(err) = page.apply_highlight(element, confidence).await {
            warn!(target: "highlight", element = %element.0, error = %err, "failed to render highlight");
        }
        true
    }
}
