use std::collections::HashSet;

use parking_lot::Mutex;

use crate::page::ElementHandle;

/// Process-local `checked`/`highlighted` markers. Marking is synchronous
/// and happens before any classification is dispatched, which is the
/// entire correctness story for overlapping scan passes: whichever pass
/// marks first owns the element, the other skips it.
///
/// Handles the host drops never come back with the same id, so entries
/// are never pruned.
#[derive(Debug, Default)]
pub struct MarkerRegistry {
    checked: Mutex<HashSet<ElementHandle>>,
    highlighted: Mutex<HashSet<ElementHandle>>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when this call set the marker, `false` when some
    /// earlier pass already owned the element.
    pub fn mark_checked(&self, element: &ElementHandle) -> bool {
        self.checked.lock().insert(element.clone())
    }

    pub fn mark_highlighted(&self, element: &ElementHandle) -> bool {
        self.highlighted.lock().insert(element.clone())
    }

    /// Used to ignore manual-control events for rows this process never
    /// highlighted.
    pub fn is_highlighted(&self, element: &ElementHandle) -> bool {
        self.highlighted.lock().contains(element)
    }
}
