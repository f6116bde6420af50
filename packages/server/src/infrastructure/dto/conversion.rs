//! Conversion logic between DTOs and domain entities.

use mchat_shared::time::to_utc_rfc3339;

use crate::domain::entity::{ChatMessage, Connection, Notice};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&ChatMessage> for dto::ChatMessageDto {
    fn from(model: &ChatMessage) -> Self {
        Self {
            r#type: dto::MessageType::Chat,
            sender: model.sender.as_str().to_string(),
            body: model.body.as_str().to_string(),
            timestamp: to_utc_rfc3339(&model.timestamp.value()),
        }
    }
}

impl From<Notice> for dto::ErrorNoticeDto {
    fn from(notice: Notice) -> Self {
        Self {
            r#type: dto::MessageType::Error,
            reason: notice.reason().to_string(),
        }
    }
}

impl From<&Connection> for http::ConnectionDto {
    fn from(model: &Connection) -> Self {
        Self {
            id: model.id.to_string(),
            username: model.username.as_str().to_string(),
            remote_addr: model.remote_addr.to_string(),
            connected_at: to_utc_rfc3339(&model.connected_at),
        }
    }
}

impl From<Vec<Connection>> for http::ConnectionsDto {
    fn from(connections: Vec<Connection>) -> Self {
        Self {
            count: connections.len(),
            connections: connections.iter().map(http::ConnectionDto::from).collect(),
        }
    }
}
