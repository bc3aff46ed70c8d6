use serde::{Deserialize, Deserializer};

/// Flow metadata and identifiers
pub mod flow;

/// Step model
pub mod step;

/// Answer validation
pub mod validation;

/// Session wire models and summaries
pub mod session;

/// Session state machine
pub mod session_state;

/// Domain events
pub mod events;

/// Resumable execution links
pub mod link;

/// Flow API collaborator interfaces
pub mod api;

/// In-memory Flow API for tests and local development
#[cfg(feature = "testing")]
pub mod memory;

/// Treats an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
