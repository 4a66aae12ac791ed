//! Selection of the turns submitted with a run.

use serde::{Deserialize, Serialize};
use smart_dialogue_assistants::WindowMessage;
use smart_dialogue_conversation::{ConversationTurn, TurnRole};

/// Which retained turns are sent to the remote service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Only the most recent user turn.
    LatestUserTurn,
    /// Every retained user turn, oldest first.
    UserTurns,
    /// Every retained turn of both roles, oldest first.
    #[default]
    FullHistory,
}

impl WindowPolicy {
    /// Builds the message window from a history snapshot.
    #[must_use]
    pub fn select(&self, turns: &[ConversationTurn]) -> Vec<WindowMessage> {
        match self {
            Self::LatestUserTurn => turns
                .iter()
                .rev()
                .find(|turn| turn.role() == TurnRole::User)
                .map(WindowMessage::from)
                .into_iter()
                .collect(),
            Self::UserTurns => turns
                .iter()
                .filter(|turn| turn.role() == TurnRole::User)
                .map(WindowMessage::from)
                .collect(),
            Self::FullHistory => turns.iter().map(WindowMessage::from).collect(),
        }
    }
}
