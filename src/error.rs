//! Error types for authorizer construction and token acquisition.

use thiserror::Error;

/// Failure to construct an authorizer or to obtain a token from it.
///
/// The selector never produces one of these itself; whatever the chosen
/// constructor reports is handed back to the caller untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or malformed credential configuration (env vars, auth file contents).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Transport-level failure talking to the token endpoint.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The token endpoint answered with a non-success status.
    #[error("Token request failed with status {status}: {message}")]
    TokenRequestFailed { status: u16, message: String },

    /// A response or file could not be decoded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The Azure CLI could not be run or reported an error.
    #[error("Azure CLI error: {0}")]
    CliError(String),
}

impl AuthError {
    /// Whether retrying the same call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::HttpError(_) => true,
            AuthError::TokenRequestFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, AuthError>;
