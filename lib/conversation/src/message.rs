//! Turn types for conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// User/human turn.
    User,
    /// Assistant/AI turn.
    Assistant,
}

impl TurnRole {
    /// Returns the wire name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation.
///
/// Turns are immutable once created; the store only ever hands out clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: TurnRole,
    text: String,
    created_at: DateTime<Utc>,
}

impl ConversationTurn {
    /// Creates a new turn.
    #[must_use]
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    /// Creates a user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, text)
    }

    /// Returns who authored the turn.
    #[must_use]
    pub fn role(&self) -> TurnRole {
        self.role
    }

    /// Returns the turn text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns when the turn was recorded.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of characters (Unicode scalar values) in the text.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_creation() {
        let turn = ConversationTurn::user("Hello!");
        assert_eq!(turn.role(), TurnRole::User);
        assert_eq!(turn.text(), "Hello!");

        let reply = ConversationTurn::assistant("Hi.");
        assert_eq!(reply.role(), TurnRole::Assistant);
    }

    #[test]
    fn char_count_uses_scalar_values() {
        assert_eq!(ConversationTurn::user("héllo").char_count(), 5);
        assert_eq!(ConversationTurn::user("").char_count(), 0);
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(TurnRole::User.to_string(), "user");
        assert_eq!(
            serde_json::to_string(&TurnRole::Assistant).expect("serialize"),
            "\"assistant\""
        );
        let parsed: TurnRole = serde_json::from_str("\"user\"").expect("deserialize");
        assert_eq!(parsed, TurnRole::User);
    }
}
