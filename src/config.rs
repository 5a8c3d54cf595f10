use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Url;

/// Default n8n REST API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5678/api/v1/";

/// Default timeout for one n8n call (30 seconds).
const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },
    #[error("{0} must be a positive number of seconds")]
    InvalidTimeout(&'static str),
    #[error("{0} must be a socket address such as 0.0.0.0:8000")]
    InvalidBindAddr(&'static str),
}

/// Bridge configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub base_url: Url,
    /// `None` means anonymous access.
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub bind_addr: SocketAddr,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_key: None,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            bind_addr: DEFAULT_BIND_ADDR.parse().expect("default bind address is valid"),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from environment.
    ///
    /// - `N8N_URL` / `N8N_BASE_URL` (optional, default `http://localhost:5678/api/v1/`)
    /// - `N8N_API_KEY` / `N8N_API_TOKEN` (optional) — sent as `X-N8N-API-KEY`
    /// - `N8N_TIMEOUT` (optional, default 30) — seconds per n8n call, fractions allowed
    /// - `MCP_BIND_ADDR` (optional, default `0.0.0.0:8000`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&'static str]| -> Option<(&'static str, String)> {
            keys.iter()
                .find_map(|k| lookup(*k).filter(|v| !v.trim().is_empty()).map(|v| (*k, v)))
        };

        let mut config = Self::default();

        if let Some((var, raw)) = first(&["N8N_URL", "N8N_BASE_URL"][..]) {
            config.base_url = parse_base_url(var, raw.trim())?;
        }

        config.api_key = first(&["N8N_API_KEY", "N8N_API_TOKEN"][..]).map(|(_, v)| v);

        if let Some((var, raw)) = first(&["N8N_TIMEOUT"][..]) {
            config.timeout = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|secs| *secs > 0.0)
                .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
                .ok_or(ConfigError::InvalidTimeout(var))?;
        }

        if let Some((var, raw)) = first(&["MCP_BIND_ADDR"][..]) {
            config.bind_addr = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidBindAddr(var))?;
        }

        Ok(config)
    }
}

/// Parse a base URL, forcing a trailing slash so relative paths land under it.
fn parse_base_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            var,
            reason: "URL cannot be used as a base".into(),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
