//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 3000)
//! - `API_BASE_URL` - Public URL of the API (default: `http://localhost:3000`)
//! - `API_UPLOAD_DIR` - Directory product images are written to (default: `uploads`)
//! - `API_MAX_UPLOAD_BYTES` - Largest accepted image in bytes (default: 200000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate, 0.0-1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0-1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, used for image links and the cookie `Secure` flag
    pub base_url: Url,
    /// Where uploaded product images are stored
    pub upload_dir: PathBuf,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate
    pub sentry_traces_sample_rate: f32,
}

impl ApiConfig {
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

        let database_url = get_database_url("API_DATABASE_URL")?;
        let host = parse_env("API_HOST", "127.0.0.1")?;
        let port = parse_env("API_PORT", "3000")?;
        let base_url = parse_base_url(&get_env_or_default("API_BASE_URL", "http://localhost:3000"))?;
        let upload_dir = PathBuf::from(get_env_or_default("API_UPLOAD_DIR", "uploads"));
        let max_upload_bytes = parse_env("API_MAX_UPLOAD_BYTES", "200000")?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = parse_sample_rate("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate = parse_sample_rate("SENTRY_TRACES_SAMPLE_RATE", "0.0")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            upload_dir,
            max_upload_bytes,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }

    /// Name of the uploaded file behind a URL built by [`Self::upload_url`].
    ///
    /// Returns `None` for any other URL, such as external or default images.
    #[must_use]
    pub fn uploaded_file_name<'a>(&self, url: &'a str) -> Option<&'a str> {
        let prefix = self.upload_url("");
        url.strip_prefix(prefix.as_str())
            .filter(|name| !name.is_empty() && !name.contains(['/', '\\']) && *name != "..")
    }

    /// Public URL under which an uploaded file is served.
    #[must_use]
    pub fn upload_url(&self, file_name: &str) -> String {
        format!(
            "{}/uploads/{file_name}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the public base URL; only http(s) is accepted.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidEnvVar("API_BASE_URL".to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            "API_BASE_URL".to_string(),
            format!("unsupported scheme {other}"),
        )),
    }
}

/// Parse a Sentry sample rate and check it lies in 0.0-1.0.
fn parse_sample_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let rate: f32 = parse_env(key, default)?;
    check_sample_rate(key, rate)
}

fn check_sample_rate(key: &str, rate: f32) -> Result<f32, ConfigError> {
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("{rate} is outside 0.0-1.0"),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config(base_url: &str) -> ApiConfig {
        ApiConfig {
            database_url: SecretString::from("postgres://localhost/shop_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: parse_base_url(base_url).unwrap(),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 200_000,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config("http://localhost:3000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure_follows_scheme() {
        assert!(!test_config("http://localhost:3000").is_secure());
        assert!(test_config("https://shop.example.com").is_secure());
    }

    #[test]
    fn test_upload_url_has_single_slash() {
        let config = test_config("https://shop.example.com/");
        assert_eq!(
            config.upload_url("a.png"),
            "https://shop.example.com/uploads/a.png"
        );
    }

    #[test]
    fn test_uploaded_file_name_only_matches_own_uploads() {
        let config = test_config("https://shop.example.com");
        let url = config.upload_url("a.png");
        assert_eq!(config.uploaded_file_name(&url), Some("a.png"));
        assert_eq!(
            config.uploaded_file_name("https://example.com/default-image.png"),
            None
        );
        assert_eq!(
            config.uploaded_file_name("https://shop.example.com/uploads/"),
            None
        );
        assert_eq!(
            config.uploaded_file_name("https://shop.example.com/uploads/../secret"),
            None
        );
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("ftp://shop.example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "API_BASE_URL"));
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u16>("API_PORT", "seventy").unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
        assert_eq!(parse_value::<u16>("API_PORT", " 8080 ").unwrap(), 8080);
    }

    #[test]
    fn test_check_sample_rate_bounds() {
        assert!(check_sample_rate("SENTRY_SAMPLE_RATE", 0.5).is_ok());
        assert!(check_sample_rate("SENTRY_SAMPLE_RATE", 1.5).is_err());
        assert!(check_sample_rate("SENTRY_SAMPLE_RATE", -0.1).is_err());
    }

    #[test]
    fn test_config_debug_redacts_database_url() {
        let debug_output = format!("{:?}", test_config("http://localhost:3000"));
        assert!(!debug_output.contains("shop_test"));
    }
}
