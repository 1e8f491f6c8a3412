// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Quire journaling pipeline.

use std::time::Duration;

use thiserror::Error;

/// The primary error type used across all Quire crates.
///
/// Credential and endpoint errors are raised before any network call.
/// Transport and API-status errors propagate unchanged; this layer never
/// retries on its own.
#[derive(Debug, Error)]
pub enum QuireError {
    /// No API key was configured for the selected provider.
    #[error("missing API key for provider `{provider}`")]
    MissingCredential { provider: String },

    /// The configured or derived endpoint is not a usable base URL.
    #[error("invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The HTTP transport failed before a status code was received,
    /// or the body could not be read.
    #[error("transport failure: {message}")]
    Transport {
        message: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The provider answered with a non-2xx status. `message` is the raw body.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A required field was structurally absent from a provider response.
    #[error("failed to parse provider response: {message}")]
    ParseFailure { message: String },

    /// The provider returned a successful but empty response.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// Configuration errors (invalid values, missing sections).
    #[error("configuration error: {0}")]
    Config(String),

    /// Memory repository backend failures.
    #[error("storage error: {message}")]
    Storage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A memory row referenced by id does not exist.
    #[error("memory not found: {id}")]
    MemoryNotFound { id: String },

    /// Rows read by a unit of work were changed by another unit that
    /// committed first. Nothing from the losing unit was applied.
    #[error("concurrent write conflict: {message}")]
    Conflict { message: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl QuireError {
    /// Builds a [`QuireError::Transport`] wrapping the given cause.
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        QuireError::Transport {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Builds a [`QuireError::ParseFailure`].
    pub fn parse(message: impl Into<String>) -> Self {
        QuireError::ParseFailure {
            message: message.into(),
        }
    }

    /// Builds a [`QuireError::Storage`] without an underlying cause.
    pub fn storage(message: impl Into<String>) -> Self {
        QuireError::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// True for errors raised before any network traffic (fail-fast class).
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            QuireError::MissingCredential { .. }
                | QuireError::InvalidEndpoint { .. }
                | QuireError::Config(_)
        )
    }

    /// True when a unit of work lost a write race and may be rerun.
    pub fn is_conflict(&self) -> bool {
        matches!(self, QuireError::Conflict { .. })
    }

    /// HTTP status carried by an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            QuireError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
