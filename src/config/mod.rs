//! Configuration system (layered: code > env > defaults).

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Url;

use crate::error::GymError;

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<ClientConfig> = OnceLock::new();

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3333";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

const ENV_BASE_URL: &str = "IGNITE_GYM_BASE_URL";
const ENV_REQUEST_TIMEOUT: &str = "IGNITE_GYM_REQUEST_TIMEOUT_SECS";
const ENV_REFRESH_TIMEOUT: &str = "IGNITE_GYM_REFRESH_TIMEOUT_SECS";
const ENV_HOME: &str = "IGNITE_GYM_HOME";

/// Settings for an [`ApiClient`](crate::client::ApiClient) and its stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin every request path is joined onto.
    pub base_url: String,
    pub request_timeout: Duration,
    /// Upper bound on one refresh exchange; parked requests never wait longer.
    pub refresh_timeout: Duration,
    /// Directory holding `tokens.toml` and `user.json`.
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
            data_dir: default_data_dir(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, GymError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Get (or create) the global default config.
    ///
    /// Invalid environment values fall back to defaults here; use
    /// [`ClientConfig::from_env`] to surface them.
    pub fn global() -> &'static ClientConfig {
        DEFAULT_CONFIG.get_or_init(|| {
            Self::from_env().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring invalid environment configuration");
                Self::default()
            })
        })
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GymError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = normalize_base_url(&url)?;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT) {
            config.request_timeout = parse_secs(ENV_REQUEST_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REFRESH_TIMEOUT) {
            config.refresh_timeout = parse_secs(ENV_REFRESH_TIMEOUT, &raw)?;
        }
        if let Some(dir) = lookup(ENV_HOME) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Join a request path onto the base origin.
    ///
    /// Absolute URLs are accepted only on the base origin, so the bearer
    /// header never reaches another host.
    pub fn url_for(&self, path: &str) -> Result<String, GymError> {
        if !(path.starts_with("http://") || path.starts_with("https://")) {
            return Ok(format!("{}/{}", self.base_url, path.trim_start_matches('/')));
        }
        let base = Url::parse(&self.base_url).map_err(|e| {
            GymError::Configuration(format!("invalid base URL {:?}: {e}", self.base_url))
        })?;
        let target = Url::parse(path)
            .map_err(|e| GymError::InvalidArgument(format!("invalid URL {path:?}: {e}")))?;
        if target.origin() != base.origin() {
            return Err(GymError::InvalidArgument(format!(
                "{path:?} is outside the backend origin {}",
                self.base_url
            )));
        }
        Ok(target.into())
    }
}

/// Default data directory (`~/.ignite-gym`).
pub fn default_data_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".ignite-gym"))
        .unwrap_or_else(|| PathBuf::from(".ignite-gym"))
}

fn normalize_base_url(raw: &str) -> Result<String, GymError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(GymError::Configuration(format!(
            "{ENV_BASE_URL} must be an http(s) URL, got {raw:?}"
        )));
    }
    Ok(trimmed.to_string())
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, GymError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(GymError::Configuration(format!(
            "{key} must be a positive number of seconds, got {raw:?}"
        ))),
    }
}
