//! Guidepath Client - the guided flow REST API over HTTP
//!
//! [`RemoteFlowApi`] implements the [`FlowApi`] and
//! [`guidepath_core::FlowAuthoring`] seams against the backend described by a
//! [`ClientConfig`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use guidepath_core::{CoreError, FlowApi};

/// HTTP implementation of the Flow API
pub mod client;

/// Client configuration
pub mod config;

pub use client::RemoteFlowApi;
pub use config::ClientConfig;

/// Creates a FlowApi implementation from a configuration
pub fn create_remote_flow_api(config: ClientConfig) -> Result<Arc<dyn FlowApi>, CoreError> {
    let client = RemoteFlowApi::new(config)?;
    Ok(Arc::new(client))
}

/// Creates a FlowApi implementation configured from the environment
pub fn create_remote_flow_api_from_env() -> Result<Arc<dyn FlowApi>, CoreError> {
    create_remote_flow_api(ClientConfig::load()?)
}
