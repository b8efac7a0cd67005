//! Error types for Tabula.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Tabula client.
///
/// Every layer (request client, cache, flows, storage) reports failures through
/// this type so that flow hooks can reduce any of them to a display string with
/// [`TabulaError::user_message`].
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TabulaError {
    /// Client-side validation failure. Never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The request could not be sent or the connection failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body did not match the expected shape.
    #[error("Unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// Missing, invalid or expired bearer token.
    #[error("Authentication required")]
    Unauthorized,

    /// A flow or wizard rejected an event in its current state.
    #[error("Invalid transition: {0}")]
    Transition(String),

    /// The owning flow was cancelled before the call settled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Reading or writing a local file failed.
    #[error("IO error: {message}")]
    Io { message: String },

    /// A local file could not be encoded or decoded.
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A failure that carries a raw reason instead of a structured error.
    #[error("{0}")]
    Opaque(String),

    /// A broken client-side invariant.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TabulaError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an Http error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a Network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a Decode error for the given endpoint
    pub fn decode(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a Transition error
    pub fn transition(message: impl Into<String>) -> Self {
        Self::Transition(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized) || matches!(self, Self::Http { status: 401, .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Reduces the error to the string a view shows to the user.
    ///
    /// Structured errors keep their own message. An [`TabulaError::Opaque`]
    /// failure (or an empty message) is replaced by `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            Self::Opaque(_) => return fallback.to_string(),
            Self::Http { message, .. } => message.clone(),
            other => other.to_string(),
        };

        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<std::io::Error> for TabulaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TabulaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TabulaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for TabulaError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, TabulaError>`.
pub type Result<T> = std::result::Result<T, TabulaError>;
