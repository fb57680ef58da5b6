//! Configuration loading for the Argus console.
//! Reads argus.toml from the current directory or path in ARGUS_CONFIG env var.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_http_url")]
    pub http_url: String,
    #[serde(default = "default_username")]
    pub username: String,
}

fn default_ws_url()   -> String { "ws://localhost:8000".to_string() }
fn default_http_url() -> String { "http://localhost:8000".to_string() }
fn default_username() -> String { "operator".to_string() }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// One of "live", "cctv", "upload".
    #[serde(default = "default_mode")]
    pub mode: String,
    pub cctv: Option<CctvConfig>,
    /// Local video path for upload mode.
    pub upload_path: Option<String>,
}

fn default_mode() -> String { "live".to_string() }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            cctv: None,
            upload_path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CctvConfig {
    pub ip: String,
    #[serde(default = "default_cctv_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn default_cctv_port() -> u16 { 554 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_refresh_interval")]
    pub interval_secs: u64,
}

fn bool_true()                -> bool { true }
fn default_refresh_interval() -> u64  { 5 }

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: bool_true(),
            interval_secs: default_refresh_interval(),
        }
    }
}

mod tests;

impl Config {
    /// Load configuration from argus.toml.
    /// Checks ARGUS_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("ARGUS_CONFIG").unwrap_or_else(|_| "argus.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy argus.example.toml to argus.toml and edit it.",
                path
            );
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
