use std::env;
use std::time::Duration;

use crate::{Result, SerieslyError};

pub const DEFAULT_SERIESLY_URL: &str = "http://localhost:3133/";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Process configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `SERIESLY_URL`
    pub seriesly_url: String,
    /// `PORT`
    pub port: u16,
    /// `SERIESLY_TIMEOUT_SECS`
    pub request_timeout: Duration,
    /// `LOG_FORMAT=json`
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seriesly_url: DEFAULT_SERIESLY_URL.to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            log_json: false,
        }
    }
}

impl Config {
    /// Replaces the store URL, as a command line override does.
    pub fn with_url(self, url: impl Into<String>) -> Self {
        Self {
            seriesly_url: with_trailing_slash(url.into()),
            ..self
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let seriesly_url = with_trailing_slash(lookup("SERIESLY_URL").unwrap_or(defaults.seriesly_url));

        let port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|e| SerieslyError::Internal(format!("Invalid PORT {}: {}", port, e)))?,
            None => defaults.port,
        };

        let request_timeout = match lookup("SERIESLY_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(secs.parse().map_err(|e| {
                SerieslyError::Internal(format!("Invalid SERIESLY_TIMEOUT_SECS {}: {}", secs, e))
            })?),
            None => defaults.request_timeout,
        };

        let log_json = lookup("LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(defaults.log_json);

        Ok(Self {
            seriesly_url,
            port,
            request_timeout,
            log_json,
        })
    }

    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| SerieslyError::Internal(format!("Failed to build HTTP client: {}", e)))
    }
}

// Database names are appended to the base URL as-is.
fn with_trailing_slash(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
