mod api;
mod app;
mod config;
mod db;
mod domain;
mod hosts;
mod infrastructure;
mod page;
mod scan;
mod settings;
mod tasks;

use anyhow::Result;
use infrastructure::{directories, instance_guard::InstanceGuard, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let _guard = InstanceGuard::acquire(&paths)?;

    let (shutdown, _) = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::SentryApp::initialize(config, paths, shutdown.clone()).await?;
    app.run().await
}
