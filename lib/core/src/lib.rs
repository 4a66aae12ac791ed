//! Core types shared across the smart-dialogue crates.
//!
//! This crate provides the conversation identifier and the rootcause-based
//! `Result` alias used throughout the workspace.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConversationId, ParseIdError};
