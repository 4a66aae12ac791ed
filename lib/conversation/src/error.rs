//! Error types for the conversation crate.

use std::fmt;

/// Errors from constructing a token budget.
#[derive(Debug, Clone, PartialEq)]
pub enum BudgetError {
    /// The token ceiling must be positive.
    InvalidMaxTokens { value: usize },
    /// The characters-per-token ratio must be finite and positive.
    InvalidCharsPerToken { value: f64 },
}

impl fmt::Display for BudgetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMaxTokens { value } => {
                write!(f, "max tokens must be greater than zero, got {value}")
            }
            Self::InvalidCharsPerToken { value } => {
                write!(
                    f,
                    "characters per token must be a positive finite number, got {value}"
                )
            }
        }
    }
}

impl std::error::Error for BudgetError {}
