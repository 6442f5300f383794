//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `LOGIPORT_API_URL` - Base URL of the portal backend API
//!
//! ## Optional
//! - `LOGIPORT_STATE_FILE` - Durable token store path (default: .logiport/session.json)
//! - `LOGIPORT_REQUEST_TIMEOUT_SECS` - Remote call timeout (default: 30)
//! - `LOGIPORT_QUERY_CACHE_CAPACITY` - Max cached query results (default: 1000)
//! - `LOGIPORT_QUERY_CACHE_TTL_SECS` - Cached query lifetime (default: 300)
//! - `LOGIPORT_CLIENT_IP` - Address reported with client logins and OTP verification
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_STATE_FILE: &str = ".logiport/session.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Backend API base URL
    pub api_url: Url,
    /// Where the admin and client tokens are persisted
    pub state_file: PathBuf,
    /// Timeout applied to every remote call
    pub request_timeout: Duration,
    /// Query cache settings
    pub cache: CacheConfig,
    /// Address reported to the backend on client login
    pub client_ip: Option<IpAddr>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Query cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached query results
    pub max_capacity: u64,
    /// Lifetime of a cached result
    pub time_to_live: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: DEFAULT_CACHE_CAPACITY,
            time_to_live: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(&get_required_env("LOGIPORT_API_URL")?)?;
        let state_file = PathBuf::from(get_env_or_default(
            "LOGIPORT_STATE_FILE",
            DEFAULT_STATE_FILE,
        ));
        let request_timeout = Duration::from_secs(get_parsed_or_default(
            "LOGIPORT_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let cache = CacheConfig {
            max_capacity: get_parsed_or_default(
                "LOGIPORT_QUERY_CACHE_CAPACITY",
                DEFAULT_CACHE_CAPACITY,
            )?,
            time_to_live: Duration::from_secs(get_parsed_or_default(
                "LOGIPORT_QUERY_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )?),
        };
        let client_ip = get_optional_env("LOGIPORT_CLIENT_IP")
            .map(|raw| parse_value::<IpAddr>("LOGIPORT_CLIENT_IP", &raw))
            .transpose()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api_url,
            state_file,
            request_timeout,
            cache,
            client_ip,
            sentry_dsn,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the API base URL; only http(s) is accepted.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("LOGIPORT_API_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "LOGIPORT_API_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable parsed as `T`, or `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_accepts_https() {
        let url = parse_api_url("https://portal.example.com").unwrap();
        assert_eq!(url.host_str(), Some("portal.example.com"));
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        let err = parse_api_url("ftp://portal.example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "LOGIPORT_API_URL"));
    }

    #[test]
    fn test_parse_api_url_rejects_garbage() {
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u64>("LOGIPORT_REQUEST_TIMEOUT_SECS", "soon").unwrap_err();
        assert!(err.to_string().contains("LOGIPORT_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_parse_value_ip() {
        let ip = parse_value::<IpAddr>("LOGIPORT_CLIENT_IP", " 203.0.113.7 ").unwrap();
        assert_eq!(ip.to_string(), "203.0.113.7");
    }

    #[test]
    fn test_cache_config_default() {
        let cache = CacheConfig::default();
        assert_eq!(cache.max_capacity, 1000);
        assert_eq!(cache.time_to_live, Duration::from_secs(300));
    }
}
