//! WebSocket frame DTOs and the inbound decoder.
//!
//! Inbound frames carry `{"body": ..., "sender": ...}`; the sender field is
//! accepted for compatibility but never trusted, and any client timestamp is
//! ignored. Outbound frames are tagged with a `type` field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MessageBody, ValueError};

/// Outbound frame type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Chat,
    Error,
}

/// Frame sent by a client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub body: String,
}

/// Chat frame relayed to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessageDto {
    pub r#type: MessageType,
    pub sender: String,
    pub body: String,
    /// RFC 3339, UTC, minute precision
    pub timestamp: String,
}

/// Notice sent to a single client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorNoticeDto {
    pub r#type: MessageType,
    pub reason: String,
}

/// Inbound frame rejected by the decoder
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("frame of {actual} bytes exceeds the {max}-byte limit")]
    TooLarge { max: usize, actual: usize },

    #[error("frame is not valid UTF-8")]
    NotUtf8,

    #[error("frame is not a valid message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message rejected: {0}")]
    Invalid(#[from] ValueError),
}

/// Result of decoding one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    /// Sender name the client claimed, if any
    pub claimed_sender: Option<String>,
    pub body: MessageBody,
}

/// Decode one inbound frame
///
/// The whole message must fit in a single frame of at most `max_bytes`.
///
/// # Errors
///
/// Any `DecodeError`; the caller treats every one of them as fatal to the
/// connection.
pub fn decode_inbound(frame: &[u8], max_bytes: usize) -> Result<DecodedMessage, DecodeError> {
    if frame.len() > max_bytes {
        return Err(DecodeError::TooLarge {
            max: max_bytes,
            actual: frame.len(),
        });
    }
    let text = std::str::from_utf8(frame).map_err(|_| DecodeError::NotUtf8)?;
    let inbound: InboundMessage = serde_json::from_str(text)?;

    Ok(DecodedMessage {
        claimed_sender: inbound.sender,
        body: MessageBody::new(inbound.body)?,
    })
}
