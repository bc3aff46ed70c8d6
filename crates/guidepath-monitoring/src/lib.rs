//! Monitoring for guidepath: structured logging setup.

use serde::{Deserialize, Serialize};

/// Structured logging
pub mod logging;

pub use logging::{init_logging, try_init_logging};

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// `EnvFilter` directives used when `RUST_LOG` is not set
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// JSON output instead of the pretty formatter
    #[serde(default)]
    pub json: bool,
}

fn default_service_name() -> String {
    "guidepath".to_string()
}

fn default_log_filter() -> String {
    "info,guidepath_core=debug".to_string()
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_filter: default_log_filter(),
            json: false,
        }
    }
}

impl MonitoringConfig {
    /// Config for `service_name` with the default filter
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    /// Switch to JSON output
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Replace the filter directives
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }
}
