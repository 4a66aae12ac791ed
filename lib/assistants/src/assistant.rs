//! Assistant descriptors returned by the listing endpoint.

use serde::{Deserialize, Serialize};

/// An assistant configured on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assistant {
    /// Assistant identifier, used as `assistant_id` when starting runs.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Model backing the assistant.
    pub model: String,
    /// System instructions.
    #[serde(default)]
    pub instructions: Option<String>,
    /// Unix timestamp of creation.
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AssistantPage {
    pub data: Vec<Assistant>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub last_id: Option<String>,
}
