//! Dialogue orchestration for smart-dialogue.
//!
//! This crate provides:
//!
//! - **Dialogue**: sends a user message to a remote assistant and records the
//!   exchange in bounded local history
//! - **Window Policy**: which retained turns accompany each run
//! - **Poll Policy**: interval, timeout and attempt limits while a run executes
//! - **Configuration**: environment-driven settings validated at startup

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod phase;
pub mod poll;
pub mod window;

pub use config::{BudgetConfig, DialogueConfig, ENV_PREFIX, MAX_POLL_TIMEOUT_SECS, PollConfig};
pub use error::{ConfigError, DialogueError};
pub use orchestrator::{Dialogue, SendOptions};
pub use phase::ExchangePhase;
pub use poll::{DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT, PollPolicy};
pub use window::WindowPolicy;
