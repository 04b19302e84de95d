pub mod automator;
pub mod dispose;
pub mod harvest;
pub mod highlight;
pub mod markers;
pub mod processor;

pub use markers::MarkerRegistry;
pub use processor::ScanProcessor;
