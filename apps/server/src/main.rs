//! greatwire file server entry point.

mod cli;
mod config;

use std::sync::Arc;

use clap::Parser;
use greatwire_server::Server;
use greatwire_transfer::Storage;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting greatwire server"
    );

    let config = config::Config::load(args.config.as_deref())?.merge_args(&args);
    tracing::info!(
        host = %config.host,
        port = config.port,
        storage = %config.storage_dir.display(),
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))?;

    tracing::info!("server shut down cleanly");
    Ok(())
}

async fn run(config: config::Config) -> anyhow::Result<()> {
    let server = Server::new(config.server_config(), Storage::new(&config.storage_dir));

    let stopper = Arc::clone(&server);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received");
            stopper.shutdown();
        }
    });

    server.run().await?;
    Ok(())
}
