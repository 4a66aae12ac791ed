//! Dialogue configuration.
//!
//! Loaded via the `config` crate from `DIALOGUE_*` environment variables;
//! nested keys use `__` (for example `DIALOGUE_POLL__INTERVAL_MS`).
//! Every value is validated up front so a misconfigured process fails at
//! startup rather than on its first exchange.

use crate::error::ConfigError;
use crate::poll::PollPolicy;
use crate::window::WindowPolicy;
use config::Environment;
use rootcause::Report;
use serde::Deserialize;
use smart_dialogue_assistants::{
    ClientConfig, DEFAULT_BASE_URL, DEFAULT_PROTOCOL_VERSION, parse_base_url,
};
use smart_dialogue_conversation::{DEFAULT_CHARS_PER_TOKEN, DEFAULT_MAX_TOKENS, TokenBudget};
use std::time::Duration;

/// Prefix of the environment variables read by [`DialogueConfig::from_env`].
pub const ENV_PREFIX: &str = "DIALOGUE";

/// Longest accepted poll timeout, in seconds.
pub const MAX_POLL_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Top-level dialogue configuration.
#[derive(Clone, Deserialize)]
pub struct DialogueConfig {
    /// Base URL of the assistants API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential for the assistants API.
    pub api_key: String,

    /// Assistant used when a send does not name one.
    pub assistant_id: String,

    /// Value of the protocol-version header.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Which retained turns are submitted with each run.
    #[serde(default)]
    pub window: WindowPolicy,

    /// History budget.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Run polling.
    #[serde(default)]
    pub poll: PollConfig,
}

/// History budget configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Maximum estimated tokens retained per conversation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Characters assumed per token.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: f64,
}

/// Run polling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Delay between status checks, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Overall time limit for a run, in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of status checks; unset means unlimited.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> usize {
    DEFAULT_MAX_TOKENS
}

fn default_chars_per_token() -> f64 {
    DEFAULT_CHARS_PER_TOKEN
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_timeout_secs() -> u64 {
    120
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            chars_per_token: default_chars_per_token(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            timeout_secs: default_poll_timeout_secs(),
            max_attempts: None,
        }
    }
}

impl std::fmt::Debug for DialogueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("assistant_id", &self.assistant_id)
            .field("protocol_version", &self.protocol_version)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("window", &self.window)
            .field("budget", &self.budget)
            .field("poll", &self.poll)
            .finish()
    }
}

impl DialogueConfig {
    /// Loads and validates configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, Report<ConfigError>> {
        Self::from_environment(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_environment(environment: Environment) -> Result<Self, Report<ConfigError>> {
        let config: Self = config::Config::builder()
            .add_source(environment)
            .build()
            .and_then(|built| built.try_deserialize::<Self>())
            .map_err(|e| ConfigError::Load {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value, without contacting the remote service.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid value found.
    pub fn validate(&self) -> Result<(), Report<ConfigError>> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing { key: "api_key" }.into());
        }
        if self.assistant_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "assistant_id",
            }
            .into());
        }
        if self.protocol_version.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "protocol_version",
            }
            .into());
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be positive".to_string(),
            }
            .into());
        }
        parse_base_url(&self.base_url).map_err(|report| {
            let reason = report.current_context().to_string();
            report.context(ConfigError::Invalid {
                key: "base_url",
                reason,
            })
        })?;
        self.token_budget()?;
        self.poll_policy()?;
        Ok(())
    }

    /// Builds the history budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the budget values are out of range.
    pub fn token_budget(&self) -> Result<TokenBudget, Report<ConfigError>> {
        TokenBudget::new(self.budget.max_tokens, self.budget.chars_per_token).map_err(|report| {
            let reason = report.current_context().to_string();
            report.context(ConfigError::Invalid {
                key: "budget",
                reason,
            })
        })
    }

    /// Builds the polling policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval or timeout is zero, the timeout
    /// exceeds [`MAX_POLL_TIMEOUT_SECS`], or the attempt limit is zero.
    pub fn poll_policy(&self) -> Result<PollPolicy, Report<ConfigError>> {
        let invalid = |key: &'static str| ConfigError::Invalid {
            key,
            reason: "must be positive".to_string(),
        };
        if self.poll.interval_ms == 0 {
            return Err(invalid("poll.interval_ms").into());
        }
        if self.poll.timeout_secs == 0 {
            return Err(invalid("poll.timeout_secs").into());
        }
        if self.poll.timeout_secs > MAX_POLL_TIMEOUT_SECS {
            return Err(ConfigError::Invalid {
                key: "poll.timeout_secs",
                reason: format!("must be at most {MAX_POLL_TIMEOUT_SECS}"),
            }
            .into());
        }
        if self.poll.max_attempts == Some(0) {
            return Err(invalid("poll.max_attempts").into());
        }
        Ok(PollPolicy {
            interval: Duration::from_millis(self.poll.interval_ms),
            timeout: Duration::from_secs(self.poll.timeout_secs),
            max_attempts: self.poll.max_attempts,
        })
    }

    /// Builds the HTTP client settings.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url, &self.api_key)
            .with_protocol_version(&self.protocol_version)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }
}
