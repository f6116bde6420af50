//! Domain error types.

use thiserror::Error;

/// Value object validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("username must not be empty")]
    EmptyUsername,

    #[error("username is too long ({actual} chars, max {max})")]
    UsernameTooLong { max: usize, actual: usize },

    #[error("message body must not be empty")]
    EmptyBody,
}

/// Credential verification failure reported by a `TokenVerifier`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// No credential was presented
    #[error("credential is missing")]
    Missing,

    /// The credential could not be parsed or lacks required claims
    #[error("credential is malformed: {0}")]
    Malformed(String),

    /// The credential's signature does not match
    #[error("credential signature is invalid")]
    InvalidSignature,

    /// The credential's expiry is in the past
    #[error("credential has expired")]
    Expired,
}

/// Persistence failure reported by a `MessageStore`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("message store error: {0}")]
pub struct StoreError(pub String);

/// Delivery failure towards a single connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' is not registered")]
    ClientNotFound(String),

    #[error("outbound queue of connection '{0}' is full")]
    QueueFull(String),

    #[error("outbound channel of connection '{0}' is closed")]
    ChannelClosed(String),

    #[error("failed to encode outbound frame: {0}")]
    Encode(String),
}
