//! Process-wide conversation store.
//!
//! Conversations are keyed by [`ConversationId`] in a sharded map. Every
//! operation locks only the shard holding its key, and only for the duration
//! of the call, so operations on different conversations rarely contend and
//! operations on the same conversation are serialized.

use crate::budget::TokenBudget;
use crate::message::{ConversationTurn, TurnRole};
use dashmap::DashMap;
use smart_dialogue_core::ConversationId;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// The retained turns of one conversation.
#[derive(Debug, Default)]
struct Conversation {
    turns: VecDeque<ConversationTurn>,
    // Sum of `char_count` over `turns`.
    char_count: usize,
}

impl Conversation {
    fn push(&mut self, turn: ConversationTurn) {
        self.char_count += turn.char_count();
        self.turns.push_back(turn);
    }

    fn pop_oldest(&mut self) -> Option<ConversationTurn> {
        let turn = self.turns.pop_front()?;
        self.char_count -= turn.char_count();
        Some(turn)
    }
}

/// Shared, in-memory store of conversation histories.
///
/// Cloning the store is cheap and yields a handle to the same state.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    conversations: Arc<DashMap<ConversationId, Conversation>>,
}

impl ConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a turn, creating the conversation on first use.
    pub fn append(&self, id: ConversationId, role: TurnRole, text: impl Into<String>) {
        let turn = ConversationTurn::new(role, text);
        let mut conversation = self.conversations.entry(id).or_default();
        conversation.push(turn);
        debug!(
            conversation_id = %id,
            %role,
            turns = conversation.turns.len(),
            "appended turn"
        );
    }

    /// Returns a copy of the conversation's turns in insertion order.
    ///
    /// Unknown identifiers yield an empty history.
    #[must_use]
    pub fn read(&self, id: ConversationId) -> Vec<ConversationTurn> {
        self.conversations
            .get(&id)
            .map(|conversation| conversation.turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Evicts the oldest turns until the conversation fits the budget.
    ///
    /// Removal continues one turn at a time while the estimated token count
    /// is strictly greater than the budget, stopping early if the
    /// conversation becomes empty. Returns the number of turns removed.
    pub fn trim(&self, id: ConversationId, budget: &TokenBudget) -> usize {
        let Some(mut conversation) = self.conversations.get_mut(&id) else {
            return 0;
        };

        let mut removed = 0;
        while budget.is_exceeded_by(conversation.char_count) {
            if conversation.pop_oldest().is_none() {
                break;
            }
            removed += 1;
        }

        if removed > 0 {
            debug!(
                conversation_id = %id,
                removed,
                remaining = conversation.turns.len(),
                estimated_tokens = budget.estimate_tokens(conversation.char_count),
                max_tokens = budget.max_tokens(),
                "trimmed conversation"
            );
        }
        removed
    }

    /// Removes a conversation. Returns true if it existed.
    pub fn delete_one(&self, id: ConversationId) -> bool {
        let removed = self.conversations.remove(&id).is_some();
        if removed {
            debug!(conversation_id = %id, "deleted conversation");
        }
        removed
    }

    /// Removes every conversation.
    pub fn delete_all(&self) {
        let count = self.conversations.len();
        self.conversations.clear();
        debug!(count, "deleted all conversations");
    }

    /// Returns true if the store holds an entry for `id`.
    #[must_use]
    pub fn contains(&self, id: ConversationId) -> bool {
        self.conversations.contains_key(&id)
    }

    /// Number of retained turns for `id`.
    #[must_use]
    pub fn turn_count(&self, id: ConversationId) -> usize {
        self.conversations
            .get(&id)
            .map_or(0, |conversation| conversation.turns.len())
    }

    /// Estimated token footprint of the retained turns for `id`.
    #[must_use]
    pub fn estimated_tokens(&self, id: ConversationId, budget: &TokenBudget) -> f64 {
        let chars = self
            .conversations
            .get(&id)
            .map_or(0, |conversation| conversation.char_count);
        budget.estimate_tokens(chars)
    }

    /// Number of conversations held.
    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}
