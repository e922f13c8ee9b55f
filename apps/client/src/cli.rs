//! Command-line options for `greatwire`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// What to do with `--file`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Upload a local file
    #[value(name = "u", alias = "upload")]
    Upload,
    /// Download a file from the server
    #[value(name = "d", alias = "download")]
    Download,
}

/// Push a file to, or pull a file from, a greatwire server.
#[derive(Clone, Debug, Parser)]
#[command(name = "greatwire", version)]
pub struct Args {
    /// Server host name or address
    #[arg(short = 's', long)]
    pub host: Option<String>,

    /// Server TCP port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// `u` to upload, `d` to download
    #[arg(short = 'a', long, value_enum)]
    pub action: Action,

    /// Local path to upload, or the name of the file to download
    #[arg(short = 'f', long)]
    pub file: String,

    /// Directory downloaded files are saved into
    #[arg(long)]
    pub download_dir: Option<PathBuf>,

    /// TOML file with client settings; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
}
