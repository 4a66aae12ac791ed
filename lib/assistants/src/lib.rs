//! Client for an assistants-style remote service.
//!
//! A run is started by creating a thread seeded with a message window; the
//! run is then polled until it finishes and the reply is read back from the
//! thread's messages. [`AssistantsBackend`] abstracts those calls and
//! [`AssistantsClient`] implements them over HTTP.

pub mod assistant;
pub mod backend;
pub mod client;
pub mod error;
pub mod thread;

pub use assistant::Assistant;
pub use backend::{
    AssistantsBackend, Run, RunFailure, RunRequest, RunStatus, RunUsage, ThreadSeed,
    WindowMessage,
};
pub use client::{
    AssistantsClient, ClientConfig, DEFAULT_BASE_URL, DEFAULT_PROTOCOL_VERSION,
    DEFAULT_REQUEST_TIMEOUT, PROTOCOL_HEADER, parse_base_url,
};
pub use error::AssistantsError;
pub use thread::{MessageContent, TextContent, ThreadMessage};
