//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `BIDII_API_URL` - Backend base URL (default: <http://127.0.0.1:8000/api>)
//! - `BIDII_SESSION_FILE` - Where the session is persisted
//!   (default: `<config dir>/bidii/session.json`)
//! - `BIDII_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const SESSION_FILE_NAME: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal client configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Backend base URL, always ending in `/` so relative joins keep the prefix
    api_url: Url,
    /// Path of the persisted session file
    session_file: PathBuf,
    /// Per-request timeout
    http_timeout: Duration,
}

impl PortalConfig {
    /// Build a configuration directly (tests and embedding).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` does not parse.
    pub fn new(
        api_url: &str,
        session_file: PathBuf,
        http_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_base_url("BIDII_API_URL", api_url)?,
            session_file,
            http_timeout,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed, or if no session file
    /// is configured and the platform has no config directory.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_base_url(
            "BIDII_API_URL",
            &get_env_or_default("BIDII_API_URL", DEFAULT_API_URL),
        )?;
        let session_file = match get_optional_env("BIDII_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        };
        let http_timeout = get_env_or_default("BIDII_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("BIDII_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            api_url,
            session_file,
            http_timeout,
        })
    }

    #[must_use]
    pub const fn api_url(&self) -> &Url {
        &self.api_url
    }

    #[must_use]
    pub const fn session_file(&self) -> &PathBuf {
        &self.session_file
    }

    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        self.http_timeout
    }
}

fn parse_base_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(var.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            var.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_session_file() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("bidii").join(SESSION_FILE_NAME))
        .ok_or_else(|| ConfigError::MissingEnvVar("BIDII_SESSION_FILE".to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}
