//! Command-line options for `greatwired`.

use std::path::PathBuf;

use clap::Parser;

/// Serve uploads and downloads over the greatwire protocol.
#[derive(Clone, Debug, Parser)]
#[command(name = "greatwired", version)]
pub struct Args {
    /// Host name or address to listen on
    #[arg(short = 's', long)]
    pub host: Option<String>,

    /// TCP port to listen on
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Directory uploaded files are stored in and served from
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Consecutive empty reads tolerated before an idle client is dropped
    #[arg(long)]
    pub max_empty_reads: Option<u32>,

    /// Length of the pending-connection queue
    #[arg(long)]
    pub backlog: Option<u32>,

    /// TOML file with server settings; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
}
