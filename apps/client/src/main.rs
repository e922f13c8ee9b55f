//! greatwire command-line client.
//!
//! Failures are logged and the process still exits successfully, so a
//! refused upload or missing download never changes the exit status.

mod cli;
mod config;

use std::path::Path;

use clap::Parser;
use greatwire_client::Client;
use tracing_subscriber::EnvFilter;

use crate::cli::{Action, Args};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = config::Config::load(args.config.as_deref())?.merge_args(&args);
    let client = Client::new(config.client_config());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(&client, args.action, &args.file));
    Ok(())
}

async fn run(client: &Client, action: Action, file: &str) {
    match action {
        Action::Upload => {
            if let Err(e) = client.upload(Path::new(file)).await {
                tracing::error!(file, "upload failed: {e}");
            }
        }
        Action::Download => {
            if let Err(e) = client.download(file).await {
                tracing::error!(file, "download failed: {e}");
            }
        }
    }
}
