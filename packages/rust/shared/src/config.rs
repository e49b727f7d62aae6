//! Application configuration for StrategyPipe.
//!
//! User config lives at `~/.strategypipe/strategypipe.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrategyPipeError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "strategypipe.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".strategypipe";

// ---------------------------------------------------------------------------
// Config structs (matching strategypipe.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP front door settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-session pipeline settings.
    #[serde(default)]
    pub pipeline: PipelineDefaults,

    /// Artifact store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port for the trigger API.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root directory for session working storage.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            base_dir: default_base_dir(),
        }
    }
}

fn default_port() -> u16 {
    12000
}
fn default_base_dir() -> String {
    "temp_sessions".into()
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDefaults {
    /// Timeout for each input artifact fetch, in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Downstream address the consolidated payload is delivered to.
    #[serde(default = "default_handoff_url")]
    pub handoff_url: String,

    /// Timeout for the handoff delivery, in seconds.
    #[serde(default = "default_handoff_timeout")]
    pub handoff_timeout_secs: u64,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout(),
            handoff_url: default_handoff_url(),
            handoff_timeout_secs: default_handoff_timeout(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    10
}
fn default_handoff_url() -> String {
    "https://gap-target-api.onrender.com/start_gap_target".into()
}
fn default_handoff_timeout() -> u64 {
    30
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the artifact store API.
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub api_key_env: String,

    /// Timeout for each store call, in seconds.
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            api_key_env: default_token_env(),
            upload_timeout_secs: default_upload_timeout(),
        }
    }
}

fn default_store_endpoint() -> String {
    "http://localhost:8081".into()
}
fn default_token_env() -> String {
    "STRATEGYPIPE_STORE_TOKEN".into()
}
fn default_upload_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration handed to each session run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory for session working storage.
    pub base_dir: PathBuf,
    /// Input artifact fetch timeout, seconds.
    pub fetch_timeout_secs: u64,
    /// Downstream handoff address.
    pub handoff_url: String,
    /// Handoff delivery timeout, seconds.
    pub handoff_timeout_secs: u64,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_dir: PathBuf::from(&config.server.base_dir),
            fetch_timeout_secs: config.pipeline.fetch_timeout_secs,
            handoff_url: config.pipeline.handoff_url.clone(),
            handoff_timeout_secs: config.pipeline.handoff_timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.strategypipe/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| StrategyPipeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.strategypipe/strategypipe.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| StrategyPipeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        StrategyPipeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Read the artifact store token from the env var named in config.
///
/// A missing token is not fatal — the store client sends unauthenticated
/// requests, which suits local mock deployments.
pub fn store_token(config: &AppConfig) -> Option<String> {
    match std::env::var(&config.store.api_key_env) {
        Ok(val) if !val.is_empty() => Some(val),
        _ => None,
    }
}
