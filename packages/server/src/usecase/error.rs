//! UseCase error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{MessagePushError, VerificationError};

/// Admission refused; the connection is never registered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("no credential presented")]
    MissingCredential,

    #[error("credential rejected: {0}")]
    Rejected(#[from] VerificationError),

    #[error("credential expired at {0}")]
    Expired(DateTime<Utc>),
}

/// Relaying a decoded message failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("broadcast failed: {0}")]
    BroadcastFailed(#[from] MessagePushError),
}
