// ============================
// crates/hub-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level filter passed to the tracing subscriber
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().expect("valid default addr"),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default file location plus environment
    /// variables prefixed with `PALAVER_`.
    pub fn load() -> Result<Self> {
        Self::load_from("config/default")
    }

    /// Load settings from an explicit file (optional) layered under
    /// environment variables.
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("PALAVER"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
