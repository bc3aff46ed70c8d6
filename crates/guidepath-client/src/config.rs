//! Configuration for the Flow API client
//!
//! Values come from environment variables on top of the defaults below.

use guidepath_core::CoreError;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Flow API client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://kb.example.com`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path prefix of the REST API
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// `User-Agent` header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("guidepath-client/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_prefix: default_api_prefix(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Config for `base_url` with every other value defaulted
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Same config with a bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Load configuration from environment variables
    pub fn load() -> Result<Self, CoreError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(base_url) = lookup("GUIDEPATH_BACKEND_URL") {
            config.base_url = base_url.trim().to_string();
        }

        if let Some(prefix) = lookup("GUIDEPATH_API_PREFIX") {
            config.api_prefix = prefix.trim().to_string();
        }

        if let Some(token) = lookup("GUIDEPATH_AUTH_TOKEN") {
            if !token.trim().is_empty() {
                config.auth_token = Some(token.trim().to_string());
            }
        }

        if let Some(timeout) = lookup("GUIDEPATH_TIMEOUT_SECS") {
            match timeout.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout_secs = secs,
                _ => warn!("Invalid GUIDEPATH_TIMEOUT_SECS value: {}", timeout),
            }
        }

        if config.base_url.is_empty() {
            return Err(CoreError::Configuration(
                "Backend URL is required".to_string(),
            ));
        }

        if config.auth_token.is_none() {
            warn!("No GUIDEPATH_AUTH_TOKEN provided - requests will be sent unauthenticated");
        }

        Ok(config)
    }

    /// Base URL joined with the API prefix, without a trailing slash
    pub fn api_root(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        if prefix.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, prefix)
        }
    }

    /// Request timeout; zero is rejected the same way `load()` rejects it
    pub fn effective_timeout_secs(&self) -> u64 {
        if self.timeout_secs == 0 {
            warn!(
                "timeout_secs of 0 is invalid, using {}s",
                default_timeout_secs()
            );
            default_timeout_secs()
        } else {
            self.timeout_secs
        }
    }
}
