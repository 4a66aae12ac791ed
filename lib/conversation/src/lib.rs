//! Conversation history for smart-dialogue.
//!
//! This crate provides:
//!
//! - **Turns**: role-tagged, immutable conversation messages
//! - **Token Budget**: character-ratio token estimation
//! - **Conversation Store**: shared history keyed by conversation, with
//!   oldest-first trimming to a token budget

pub mod budget;
pub mod error;
pub mod message;
pub mod store;

pub use budget::{DEFAULT_CHARS_PER_TOKEN, DEFAULT_MAX_TOKENS, TokenBudget};
pub use error::BudgetError;
pub use message::{ConversationTurn, TurnRole};
pub use store::ConversationStore;
