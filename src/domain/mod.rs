pub mod message;
pub mod types;

pub use message::ExtractedMessage;
pub use types::{ScanReason, StatsSnapshot, Verdict};
