//! Token budget used when trimming conversations.
//!
//! Token counts are estimated, not tokenized: the character count of a
//! conversation divided by an average characters-per-token ratio.

use crate::error::BudgetError;
use rootcause::Report;

/// Default ceiling on the estimated token footprint of a conversation.
pub const DEFAULT_MAX_TOKENS: usize = 2000;

/// Default average number of characters per token.
pub const DEFAULT_CHARS_PER_TOKEN: f64 = 2.85;

/// A maximum token count plus the ratio used to estimate tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBudget {
    max_tokens: usize,
    chars_per_token: f64,
}

impl TokenBudget {
    /// Creates a budget.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_tokens` is zero or `chars_per_token` is not
    /// a positive finite number.
    pub fn new(max_tokens: usize, chars_per_token: f64) -> Result<Self, Report<BudgetError>> {
        if max_tokens == 0 {
            return Err(BudgetError::InvalidMaxTokens { value: max_tokens }.into());
        }
        if !chars_per_token.is_finite() || chars_per_token <= 0.0 {
            return Err(BudgetError::InvalidCharsPerToken {
                value: chars_per_token,
            }
            .into());
        }
        Ok(Self {
            max_tokens,
            chars_per_token,
        })
    }

    /// Returns the token ceiling.
    #[must_use]
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Returns the characters-per-token ratio.
    #[must_use]
    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }

    /// Estimates the tokens occupied by `chars` characters.
    #[must_use]
    pub fn estimate_tokens(&self, chars: usize) -> f64 {
        chars as f64 / self.chars_per_token
    }

    /// Returns true if `chars` characters estimate strictly above the ceiling.
    #[must_use]
    pub fn is_exceeded_by(&self, chars: usize) -> bool {
        self.estimate_tokens(chars) > self.max_tokens as f64
    }
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
        }
    }
}
