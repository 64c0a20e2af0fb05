//! Error types for the transit wrapper.

use std::path::PathBuf;

use crate::exit_codes;

/// Errors raised while signing or verifying a file.
#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    /// Invalid flags or configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A local file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The signature file could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Transport failure talking to Vault.
    #[error("network error: {message}")]
    Network { message: String },

    /// Token rejected (401/403).
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Vault answered with a non-success status.
    #[error("vault returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// Vault answered 2xx but the body was not what we expected.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

impl TransitError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => exit_codes::USAGE,
            Self::Read { .. } | Self::Write { .. } => exit_codes::IO_ERROR,
            Self::Network { .. }
            | Self::PermissionDenied { .. }
            | Self::Remote { .. }
            | Self::InvalidResponse { .. } => exit_codes::REMOTE_ERROR,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransitError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for transit operations.
pub type Result<T> = std::result::Result<T, TransitError>;
