//! Client configuration read from the environment.
//!
//! Only the API base URL is configurable. `from_env` loads a `.env` file when
//! one is present, then reads `TODO_API_URL`.

use url::Url;

use crate::error::ConfigError;

pub const API_URL_ENV: &str = "TODO_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:5001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    api_base_url: String,
}

impl Config {
    pub fn new(api_base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let api_base_url = api_base_url.into();
        let parsed = Url::parse(&api_base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: api_base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl {
                url: api_base_url,
                reason: format!("unsupported scheme {:?}", parsed.scheme()),
            });
        }
        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values fall back to the
    /// default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(API_URL_ENV)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        tracing::debug!(api_base_url = %url, "loaded client configuration");
        Self::new(url.trim())
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
        }
    }
}
