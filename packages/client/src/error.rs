//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the token during the handshake
    #[error("Server rejected the token (401 Unauthorized)")]
    Unauthorized,

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}

/// Why an input line was not sent
#[derive(Debug, Error)]
pub enum OutboundFrameError {
    /// The encoded frame exceeds what the server accepts
    #[error("message not sent: {actual} bytes once encoded, the limit is {max}")]
    TooLarge { max: usize, actual: usize },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
