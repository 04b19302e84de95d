pub mod env;
mod loader;

pub use env::{AppConfig, BridgeConfig, DirectoryConfig, SchedulerConfig};
pub use loader::load_config;
