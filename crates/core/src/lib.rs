//! Shared primitives for all Rust crates in metasync.

#![forbid(unsafe_code)]

/// Pagination cursor shared by list operations.
pub mod cursor;

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use cursor::PageCursor;

/// Result type used across metasync crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common error categories for sync and provisioning operations.
///
/// Idempotent outcomes ("already granted", "already revoked", "already in the
/// requested state") are never represented here.
#[derive(Debug, Error)]
pub enum AppError {
    /// Pagination token could not be decoded.
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),

    /// Upstream answered with a non-success HTTP status.
    #[error("upstream error: status {status}: {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Best-effort message extracted from the response.
        message: String,
    },

    /// Request could not be sent or the connection failed mid-flight.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Entitlement is not one this connector knows how to grant.
    #[error("unsupported entitlement: {0}")]
    UnsupportedEntitlement(String),

    /// Caller-supplied argument was missing or malformed.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// Precise description of the rejected argument.
        reason: String,
    },

    /// Required profile field was absent or empty.
    #[error("missing required field: {name}")]
    MissingField {
        /// Name of the absent key.
        name: String,
    },

    /// Upstream runs a version this connector does not support.
    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),

    /// Invalid configuration or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Caller abandoned the operation.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField { name: name.into() }
    }

    /// Prefixes the error text with the failing operation, keeping the kind.
    ///
    /// `MissingField` and `InvalidArgument` carry caller-facing payloads and
    /// are returned unchanged.
    #[must_use]
    pub fn context(self, context: impl Display) -> Self {
        match self {
            Self::InvalidCursor(message) => Self::InvalidCursor(format!("{context}: {message}")),
            Self::Upstream { status, message } => Self::Upstream {
                status,
                message: format!("{context}: {message}"),
            },
            Self::Transport(message) => Self::Transport(format!("{context}: {message}")),
            Self::Decode(message) => Self::Decode(format!("{context}: {message}")),
            Self::UnsupportedEntitlement(message) => {
                Self::UnsupportedEntitlement(format!("{context}: {message}"))
            }
            Self::UnsupportedVersion(message) => {
                Self::UnsupportedVersion(format!("{context}: {message}"))
            }
            Self::Validation(message) => Self::Validation(format!("{context}: {message}")),
            Self::Cancelled(message) => Self::Cancelled(format!("{context}: {message}")),
            Self::Internal(message) => Self::Internal(format!("{context}: {message}")),
            unchanged @ (Self::InvalidArgument { .. } | Self::MissingField { .. }) => unchanged,
        }
    }

    /// Returns the upstream HTTP status, if this error came from one.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}
