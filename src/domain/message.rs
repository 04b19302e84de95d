use crate::page::ElementHandle;

/// One message row's extracted text, scoped to a single classification
/// round-trip. The handle stays owned by the host page.
#[derive(Debug, Clone)]
pub struct ExtractedMessage {
    pub element: ElementHandle,
    pub text: String,
}

impl ExtractedMessage {
    /// Rows whose combined text is shorter than this are never classified.
    pub const MIN_TEXT_LEN: usize = 5;

    pub fn is_classifiable(&self) -> bool {
        self.text.chars().count() >= Self::MIN_TEXT_LEN
    }
}
