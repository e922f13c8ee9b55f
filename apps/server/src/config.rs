//! Server configuration.
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags. Missing keys fall back to the defaults below.
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 9000
//! storage_dir = "/srv/greatwire"
//! max_empty_reads = 10
//! backlog = 10
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use greatwire_protocol::{DEFAULT_BACKLOG, DEFAULT_MAX_EMPTY_READS};
use greatwire_server::ServerConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Args;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host name or address to listen on.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on (0 = auto-assign).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Storage directory, created on first upload.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    #[serde(default = "default_max_empty_reads")]
    pub max_empty_reads: u32,

    #[serde(default = "default_backlog")]
    pub backlog: u32,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    9000
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_max_empty_reads() -> u32 {
    DEFAULT_MAX_EMPTY_READS
}

fn default_backlog() -> u32 {
    DEFAULT_BACKLOG
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            storage_dir: default_storage_dir(),
            max_empty_reads: default_max_empty_reads(),
            backlog: default_backlog(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or returns the defaults when no
    /// file was given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Applies command-line overrides.
    pub fn merge_args(mut self, args: &Args) -> Self {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(storage) = &args.storage {
            self.storage_dir = storage.clone();
        }
        if let Some(max) = args.max_empty_reads {
            self.max_empty_reads = max;
        }
        if let Some(backlog) = args.backlog {
            self.backlog = backlog;
        }
        self
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            backlog: self.backlog,
            max_empty_reads: self.max_empty_reads,
        }
    }
}
