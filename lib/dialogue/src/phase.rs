//! Phases of a single message exchange.

use serde::Serialize;
use std::fmt;

/// Where an exchange is in its lifecycle.
///
/// Used as a tracing field and to attribute remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangePhase {
    /// Appending the user turn to local history.
    Recording,
    /// Starting a remote run over the message window.
    Submitting,
    /// Waiting for the run to complete.
    Polling,
    /// Reading the run's output from the thread.
    Fetching,
    /// Appending the reply to local history.
    RecordingReply,
    /// Evicting old turns to stay within budget.
    Trimming,
    /// The exchange finished.
    Done,
}

impl ExchangePhase {
    /// Returns the phase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recording => "recording",
            Self::Submitting => "submitting",
            Self::Polling => "polling",
            Self::Fetching => "fetching",
            Self::RecordingReply => "recording_reply",
            Self::Trimming => "trimming",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for ExchangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_wire_name() {
        assert_eq!(ExchangePhase::RecordingReply.to_string(), "recording_reply");
        assert_eq!(ExchangePhase::Polling.to_string(), "polling");
    }
}
