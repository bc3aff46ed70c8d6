use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::null_as_default;

/// Value object: Flow ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowId(pub String);

/// Value object: Step ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Borrow the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(FlowId);
string_id!(StepId);

pub(crate) use string_id;

/// Who may see and run a flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Anyone, including anonymous readers
    Public,
    /// Any authenticated member of the organisation
    #[default]
    Internal,
    /// Members of the owning department
    Department,
    /// Only the creator
    Private,
}

/// Flow metadata as returned by `GET /flows/{flowId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    /// Unique identifier
    pub id: FlowId,

    /// Human-readable title
    pub title: String,

    /// Longer description
    #[serde(default)]
    pub description: Option<String>,

    /// Visibility level
    #[serde(default)]
    pub visibility: Visibility,

    /// Free-form tags
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: BTreeSet<String>,

    /// Monotonic edit counter
    #[serde(default = "default_version")]
    pub version: u32,

    /// Creator
    #[serde(default)]
    pub created_by: Option<String>,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last edit timestamp
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_version() -> u32 {
    1
}

impl Flow {
    /// Create flow metadata at version 1
    pub fn new(id: impl Into<FlowId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            visibility: Visibility::default(),
            tags: BTreeSet::new(),
            version: default_version(),
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Payload for creating or editing a flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDraft {
    /// Title
    pub title: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Visibility level
    #[serde(default)]
    pub visibility: Visibility,
    /// Tags
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl FlowDraft {
    /// Draft with the given title and default visibility
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            visibility: Visibility::default(),
            tags: BTreeSet::new(),
        }
    }
}

/// Filters for listing flows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowQuery {
    /// Case-insensitive match against title, description and tags
    pub search: Option<String>,
    /// Every listed tag must be present on the flow
    pub tags: Vec<String>,
}

impl FlowQuery {
    /// Query string pairs in the form the flow listing endpoint expects
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search", search.trim().to_string()));
        }
        if !self.tags.is_empty() {
            pairs.push(("tags", self.tags.join(",")));
        }
        pairs
    }

    /// Whether a flow satisfies this query
    pub fn matches(&self, flow: &Flow) -> bool {
        let tags_match = self.tags.iter().all(|tag| flow.tags.contains(tag));
        if !tags_match {
            return false;
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                flow.title.to_lowercase().contains(&needle)
                    || flow
                        .description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                    || flow.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            }
        }
    }
}
