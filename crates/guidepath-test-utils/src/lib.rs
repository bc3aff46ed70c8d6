//! Testing utilities for guidepath.
//!
//! Builders for flows and steps, a `mockall` mock of the Flow API, a
//! `wiremock` backed fake of the REST backend, and assertion helpers for
//! session state.

pub mod assertions;
pub mod builders;
pub mod mocks;
pub mod server;
pub mod util;

/// Re-export commonly used types for convenience
pub use mockall;

pub use builders::{FlowBuilder, StepBuilder};
pub use mocks::MockFlowApi;
pub use server::FlowApiServer;
pub use util::init_test_logging;
