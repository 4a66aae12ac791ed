//! The dialogue orchestrator.
//!
//! A [`Dialogue`] owns the local conversation history and drives one remote
//! run per user message:
//!
//! 1. record the user turn
//! 2. submit a run over the configured window of retained turns
//! 3. poll the run until it completes
//! 4. read the run's reply from the thread
//! 5. record the reply
//! 6. trim the conversation to its token budget
//!
//! No lock on the store is held across a remote call. If the exchange fails
//! after step 1 the user turn stays recorded.

use crate::config::DialogueConfig;
use crate::error::{ConfigError, DialogueError};
use crate::phase::ExchangePhase;
use crate::poll::{PollPolicy, wait_for_completion};
use crate::window::WindowPolicy;
use smart_dialogue_assistants::{
    Assistant, AssistantsBackend, AssistantsClient, AssistantsError, RunRequest, ThreadMessage,
};
use smart_dialogue_conversation::{ConversationStore, ConversationTurn, TokenBudget, TurnRole};
use smart_dialogue_core::{ConversationId, Result};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Per-call overrides for [`Dialogue::send_message_with`].
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    assistant_id: Option<String>,
    cancel: CancellationToken,
}

impl SendOptions {
    /// Creates options that use the configured defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the exchange on a different assistant.
    #[must_use]
    pub fn with_assistant_id(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    /// Aborts the exchange when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }
}

/// Orchestrates exchanges between local history and a remote assistant.
#[derive(Debug, Clone)]
pub struct Dialogue<B> {
    backend: B,
    store: ConversationStore,
    assistant_id: String,
    budget: TokenBudget,
    poll: PollPolicy,
    window: WindowPolicy,
}

impl Dialogue<AssistantsClient> {
    /// Builds a dialogue over HTTP from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &DialogueConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = AssistantsClient::new(&config.client_config())
            .map_err(|report| report.context(ConfigError::Client))?;

        Ok(Self::new(client, config.assistant_id.clone())
            .with_budget(config.token_budget()?)
            .with_poll_policy(config.poll_policy()?)
            .with_window_policy(config.window))
    }
}

impl<B: AssistantsBackend> Dialogue<B> {
    /// Creates a dialogue with an empty store and default settings.
    #[must_use]
    pub fn new(backend: B, assistant_id: impl Into<String>) -> Self {
        Self {
            backend,
            store: ConversationStore::new(),
            assistant_id: assistant_id.into(),
            budget: TokenBudget::default(),
            poll: PollPolicy::default(),
            window: WindowPolicy::default(),
        }
    }

    /// Uses an existing store, shared with its other clones.
    #[must_use]
    pub fn with_store(mut self, store: ConversationStore) -> Self {
        self.store = store;
        self
    }

    /// Sets the history budget.
    #[must_use]
    pub fn with_budget(mut self, budget: TokenBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Sets the polling policy.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Sets which retained turns are submitted.
    #[must_use]
    pub fn with_window_policy(mut self, window: WindowPolicy) -> Self {
        self.window = window;
        self
    }

    /// Returns the shared conversation store.
    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Returns the retained turns of a conversation, oldest first.
    #[must_use]
    pub fn history(&self, id: ConversationId) -> Vec<ConversationTurn> {
        self.store.read(id)
    }

    /// Sends a user message and returns the assistant's reply.
    ///
    /// # Errors
    ///
    /// See [`Dialogue::send_message_with`].
    pub async fn send_message(
        &self,
        id: ConversationId,
        text: impl Into<String>,
    ) -> Result<String, DialogueError> {
        self.send_message_with(id, text, SendOptions::default())
            .await
    }

    /// Sends a user message with per-call overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a remote call fails, the run ends without
    /// completing, polling times out or runs out of attempts, the caller
    /// cancels, or the run produces no text. The user turn stays recorded in
    /// every case.
    #[instrument(skip(self, text, options), fields(conversation_id = %id))]
    pub async fn send_message_with(
        &self,
        id: ConversationId,
        text: impl Into<String>,
        options: SendOptions,
    ) -> Result<String, DialogueError> {
        let assistant_id = options
            .assistant_id
            .as_deref()
            .unwrap_or(&self.assistant_id);

        self.store.append(id, TurnRole::User, text);
        debug!(phase = %ExchangePhase::Recording, "recorded user turn");

        let window = self.window.select(&self.store.read(id));
        let request = RunRequest::new(assistant_id, window);
        let run = cancellable(
            &options.cancel,
            ExchangePhase::Submitting,
            self.backend.create_run(&request),
        )
        .await?;
        info!(
            run_id = %run.id,
            thread_id = %run.thread_id,
            assistant_id,
            window = request.messages().len(),
            "run submitted"
        );

        let run = wait_for_completion(&self.backend, run, &self.poll, &options.cancel).await?;

        let messages = cancellable(
            &options.cancel,
            ExchangePhase::Fetching,
            self.backend.list_messages(&run.thread_id),
        )
        .await?;
        let reply = reply_text(&messages, &run.id);
        if reply.is_empty() {
            warn!(run_id = %run.id, messages = messages.len(), "run produced no reply text");
            return Err(DialogueError::EmptyReply { run_id: run.id }.into());
        }

        self.store.append(id, TurnRole::Assistant, reply.clone());
        debug!(phase = %ExchangePhase::RecordingReply, chars = reply.chars().count(), "recorded reply");

        let evicted = self.store.trim(id, &self.budget);
        debug!(phase = %ExchangePhase::Trimming, evicted, "trimmed history");
        info!(
            phase = %ExchangePhase::Done,
            run_id = %run.id,
            evicted,
            retained = self.store.turn_count(id),
            estimated_tokens = self.store.estimated_tokens(id, &self.budget),
            "exchange complete"
        );

        Ok(reply)
    }

    /// Forgets one conversation. Returns true if it existed.
    pub fn delete_conversation(&self, id: ConversationId) -> bool {
        self.store.delete_one(id)
    }

    /// Forgets every conversation.
    pub fn delete_all_conversations(&self) {
        self.store.delete_all();
    }

    /// Lists the assistants available to the configured credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails.
    pub async fn list_assistants(&self) -> Result<Vec<Assistant>, DialogueError> {
        self.backend
            .list_assistants()
            .await
            .map_err(|report| report.context(DialogueError::ListAssistantsFailed))
    }
}

/// Concatenates, in thread order, the assistant text produced by `run_id`.
fn reply_text(messages: &[ThreadMessage], run_id: &str) -> String {
    messages
        .iter()
        .filter(|message| message.role == TurnRole::Assistant && message.is_from_run(run_id))
        .flat_map(ThreadMessage::text_segments)
        .collect()
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    phase: ExchangePhase,
    call: impl Future<Output = Result<T, AssistantsError>>,
) -> Result<T, DialogueError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DialogueError::Cancelled { phase }.into()),
        result = call => result.map_err(|report| report.context(DialogueError::Remote { phase })),
    }
}
