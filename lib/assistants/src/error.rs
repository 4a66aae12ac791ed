//! Error types for the assistants crate.
//!
//! All remote operations return `Report<AssistantsError>`; callers add their
//! own context with rootcause as the error propagates.

use std::fmt;

/// Errors from talking to the assistants endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantsError {
    /// The base URL could not be parsed or joined.
    InvalidUrl { url: String, reason: String },
    /// A credential or protocol header value is not a valid header.
    InvalidHeader { name: &'static str },
    /// The HTTP client could not be constructed.
    ClientBuild { reason: String },
    /// The request could not be sent or the connection failed.
    RequestFailed { endpoint: String, reason: String },
    /// The request exceeded the configured timeout.
    Timeout { endpoint: String },
    /// The endpoint answered with a non-success status.
    HttpStatus {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The response body did not match the expected shape.
    ResponseParseFailed { endpoint: String, reason: String },
}

impl fmt::Display for AssistantsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { url, reason } => {
                write!(f, "invalid assistants URL '{url}': {reason}")
            }
            Self::InvalidHeader { name } => {
                write!(f, "invalid value for header '{name}'")
            }
            Self::ClientBuild { reason } => {
                write!(f, "failed to build HTTP client: {reason}")
            }
            Self::RequestFailed { endpoint, reason } => {
                write!(f, "request to '{endpoint}' failed: {reason}")
            }
            Self::Timeout { endpoint } => write!(f, "request to '{endpoint}' timed out"),
            Self::HttpStatus {
                endpoint,
                status,
                body,
            } => {
                write!(f, "'{endpoint}' returned HTTP {status}: {body}")
            }
            Self::ResponseParseFailed { endpoint, reason } => {
                write!(f, "failed to parse response from '{endpoint}': {reason}")
            }
        }
    }
}

impl std::error::Error for AssistantsError {}
