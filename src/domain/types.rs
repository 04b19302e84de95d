use serde::{Deserialize, Serialize};

/// Classification outcome for one harvested message. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_spam: bool,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub scanned: u64,
    pub spam: u64,
}

/// What woke the scheduler up. Logging only; every pass behaves the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanReason {
    Startup,
    Mutation,
    Interval,
}

impl ScanReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanReason::Startup => "startup",
            ScanReason::Mutation => "mutation",
            ScanReason::Interval => "interval",
        }
    }
}
