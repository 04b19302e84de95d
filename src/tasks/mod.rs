pub mod debounce;
pub mod scheduler;

pub use debounce::DebouncedTrigger;
pub use scheduler::{configure_rescan_jobs, Scheduler};
