//! Assistants backend abstraction.
//!
//! The remote service exposes runs over threads: a run is submitted with a
//! message window, polled until it reaches a terminal state, and its output is
//! read back from the thread's message list. [`AssistantsBackend`] is the seam
//! between the dialogue orchestrator and that service.

use crate::assistant::Assistant;
use crate::error::AssistantsError;
use crate::thread::ThreadMessage;
use async_trait::async_trait;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use smart_dialogue_conversation::{ConversationTurn, TurnRole};
use std::fmt;
use std::sync::Arc;

/// One message of the window submitted with a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowMessage {
    /// Author of the message.
    pub role: TurnRole,
    /// Message text.
    pub content: String,
}

impl From<&ConversationTurn> for WindowMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role(),
            content: turn.text().to_string(),
        }
    }
}

/// Request body for creating a thread and running an assistant on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// The assistant that processes the thread.
    pub assistant_id: String,
    /// The thread to create.
    pub thread: ThreadSeed,
}

/// Initial contents of the thread created with a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSeed {
    /// Messages placed on the thread before the run starts.
    pub messages: Vec<WindowMessage>,
}

impl RunRequest {
    /// Creates a run request for an assistant over a message window.
    #[must_use]
    pub fn new(assistant_id: impl Into<String>, messages: Vec<WindowMessage>) -> Self {
        Self {
            assistant_id: assistant_id.into(),
            thread: ThreadSeed { messages },
        }
    }

    /// Returns the submitted message window.
    #[must_use]
    pub fn messages(&self) -> &[WindowMessage] {
        &self.thread.messages
    }
}

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start.
    Queued,
    /// Being processed.
    InProgress,
    /// Waiting on tool outputs from the client.
    RequiresAction,
    /// Cancellation requested.
    Cancelling,
    /// Cancelled before completion.
    Cancelled,
    /// Ended with an error.
    Failed,
    /// Finished successfully.
    Completed,
    /// Ended before finishing (e.g. token limits).
    Incomplete,
    /// Not completed before its expiry.
    Expired,
    /// A status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }

    /// Returns true once the run has finished successfully.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the run will not change state again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Cancelled | Self::Failed | Self::Incomplete | Self::Expired
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token usage reported for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunUsage {
    /// Tokens in the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated.
    pub completion_tokens: u32,
    /// Sum of both.
    pub total_tokens: u32,
}

/// Error reported by the service for a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

/// A run as returned by the create and retrieve endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier.
    pub id: String,
    /// Thread the run executes on.
    pub thread_id: String,
    /// Current status.
    pub status: RunStatus,
    /// Usage, present once the run is terminal.
    #[serde(default)]
    pub usage: Option<RunUsage>,
    /// Failure details, present when the run failed.
    #[serde(default)]
    pub last_error: Option<RunFailure>,
}

/// Trait for assistants backends.
///
/// Implemented over HTTP by [`AssistantsClient`](crate::client::AssistantsClient);
/// tests substitute scripted in-memory backends.
#[async_trait]
pub trait AssistantsBackend: Send + Sync {
    /// Creates a thread seeded with the request's messages and starts a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    async fn create_run(&self, request: &RunRequest) -> Result<Run, Report<AssistantsError>>;

    /// Retrieves the current state of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    async fn get_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, Report<AssistantsError>>;

    /// Lists every message on a thread, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    async fn list_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<ThreadMessage>, Report<AssistantsError>>;

    /// Lists the assistants available to the credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    async fn list_assistants(&self) -> Result<Vec<Assistant>, Report<AssistantsError>>;
}

#[async_trait]
impl<T: AssistantsBackend + ?Sized> AssistantsBackend for Arc<T> {
    async fn create_run(&self, request: &RunRequest) -> Result<Run, Report<AssistantsError>> {
        (**self).create_run(request).await
    }

    async fn get_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, Report<AssistantsError>> {
        (**self).get_run(thread_id, run_id).await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<ThreadMessage>, Report<AssistantsError>> {
        (**self).list_messages(thread_id).await
    }

    async fn list_assistants(&self) -> Result<Vec<Assistant>, Report<AssistantsError>> {
        (**self).list_assistants().await
    }
}
