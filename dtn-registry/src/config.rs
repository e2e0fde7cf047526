//! # Configuration File
//!
//! Optional TOML file read by `serve`. Command line flags override whatever it sets.
use crate::logging::{DEFAULT_LOG_LEVEL, LogFormat};
use anyhow::{Context, Result};
use dtn_registry_core::server::ServerConfig;
use serde::Deserialize;
use std::{fs, net::SocketAddr, path::Path};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log filter: trace, debug, info, warn, error or any `EnvFilter` directive
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file '{}'", path.display()))?;
        Ok(config)
    }

    /// Server settings with the command line overrides applied.
    pub fn server_config(
        &self,
        listen_address: Option<SocketAddr>,
        worker_concurrency: Option<usize>,
    ) -> ServerConfig {
        let mut config = self.server.clone();
        if let Some(listen_address) = listen_address {
            config.listen_address = listen_address;
        }
        if let Some(worker_concurrency) = worker_concurrency {
            config.worker_concurrency = worker_concurrency;
        }
        config
    }
}
