use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api_key::ApiKey;
use crate::retry::RetryPolicy;
use crate::transport::CurlOptions;

/// Default API endpoint.
pub const DEFAULT_SERVER_URL: &str = "https://api.ospry.io/v1";

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "OSPRY_SECRET";

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per request (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.25,
            max_delay_secs: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/ospry/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OspryConfig {
    /// API base URL; its host also serves signed download URLs.
    pub server_url: String,
    /// Secret API key. `OSPRY_SECRET` takes precedence when set.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Verify TLS certificates.
    #[serde(default = "default_strict_ssl")]
    pub strict_ssl: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound for a whole request or download.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Optional retry policy for idempotent requests; built-in defaults if missing.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_strict_ssl() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for OspryConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: None,
            strict_ssl: default_strict_ssl(),
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            retry: None,
        }
    }
}

impl OspryConfig {
    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            strict_ssl: self.strict_ssl,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    /// API key from `OSPRY_SECRET`, falling back to the config file.
    pub fn resolve_api_key(&self) -> Result<ApiKey> {
        let from_env = std::env::var(API_KEY_ENV).ok();
        pick_api_key(from_env, self.api_key.as_deref())
    }
}

fn pick_api_key(from_env: Option<String>, from_file: Option<&str>) -> Result<ApiKey> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| from_file.filter(|k| !k.trim().is_empty()).map(str::to_string))
        .map(ApiKey::new)
        .with_context(|| {
            format!(
                "no API key: set {} or api_key in {}",
                API_KEY_ENV,
                config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.toml".to_string())
            )
        })
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ospry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<OspryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = OspryConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<OspryConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: OspryConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
