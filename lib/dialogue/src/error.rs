//! Error types for the dialogue crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConfigError`: configuration that cannot be loaded or is invalid
//! - `DialogueError`: a message exchange that did not produce a reply
//!   (remote `AssistantsError` reports are wrapped via `.context()`)

use crate::phase::ExchangePhase;
use smart_dialogue_assistants::RunStatus;
use std::fmt;
use std::time::Duration;

/// Errors from a message exchange.
///
/// The user turn recorded at the start of the exchange is kept whatever the
/// failure; a trailing user turn without a reply marks an incomplete exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueError {
    /// A remote call failed during the given phase.
    Remote { phase: ExchangePhase },
    /// Listing assistants failed.
    ListAssistantsFailed,
    /// The run reached a terminal state other than completed.
    RunEnded {
        run_id: String,
        status: RunStatus,
        reason: Option<String>,
    },
    /// The run is waiting for tool outputs, which this client does not supply.
    ActionRequired { run_id: String },
    /// The run completed without any assistant text.
    EmptyReply { run_id: String },
    /// The run did not complete before the poll timeout.
    PollTimedOut { run_id: String, timeout: Duration },
    /// The run did not complete within the allowed number of status checks.
    PollAttemptsExhausted { run_id: String, attempts: u32 },
    /// The caller cancelled the exchange.
    Cancelled { phase: ExchangePhase },
}

impl fmt::Display for DialogueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { phase } => write!(f, "remote call failed while {phase}"),
            Self::ListAssistantsFailed => write!(f, "failed to list assistants"),
            Self::RunEnded {
                run_id,
                status,
                reason,
            } => match reason {
                Some(reason) => write!(f, "run {run_id} ended with status {status}: {reason}"),
                None => write!(f, "run {run_id} ended with status {status}"),
            },
            Self::ActionRequired { run_id } => {
                write!(f, "run {run_id} requires tool outputs, which are not supported")
            }
            Self::EmptyReply { run_id } => write!(f, "run {run_id} produced no reply text"),
            Self::PollTimedOut { run_id, timeout } => {
                write!(f, "run {run_id} did not complete within {timeout:?}")
            }
            Self::PollAttemptsExhausted { run_id, attempts } => {
                write!(
                    f,
                    "run {run_id} did not complete after {attempts} status checks"
                )
            }
            Self::Cancelled { phase } => write!(f, "exchange cancelled while {phase}"),
        }
    }
}

impl std::error::Error for DialogueError {}

/// Errors from loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration sources could not be read or deserialized.
    Load { reason: String },
    /// A required value is empty.
    Missing { key: &'static str },
    /// A value is present but not acceptable.
    Invalid { key: &'static str, reason: String },
    /// The HTTP client could not be built from the configuration.
    Client,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { reason } => write!(f, "failed to load configuration: {reason}"),
            Self::Missing { key } => write!(f, "missing required configuration '{key}'"),
            Self::Invalid { key, reason } => {
                write!(f, "invalid configuration '{key}': {reason}")
            }
            Self::Client => write!(f, "failed to build assistants client"),
        }
    }
}

impl std::error::Error for ConfigError {}
