//! Client configuration.
//!
//! An optional TOML file supplies the server address and download
//! directory; command-line flags take precedence.

use std::path::{Path, PathBuf};

use anyhow::Context;
use greatwire_client::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Args;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory downloaded files are saved into.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    9000
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            download_dir: default_download_dir(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or the defaults when none is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Applies command-line overrides.
    pub fn merge_args(mut self, args: &Args) -> Self {
        if let Some(host) = &args.host {
            self.host = host.clone();
        }
        if let Some(port) = args.port {
            self.port = port;
        }
        if let Some(dir) = &args.download_dir {
            self.download_dir = dir.clone();
        }
        self
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            host: self.host.clone(),
            port: self.port,
            download_dir: self.download_dir.clone(),
        }
    }
}
