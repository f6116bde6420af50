//! Entities
//!
//! `Connection` は登録中の接続、`ChatMessage` は中継されるメッセージを表す。

use std::net::SocketAddr;

use chrono::{DateTime, Utc};

use super::value_object::{ConnectionId, MessageBody, Timestamp, Username};

/// An admitted connection
///
/// Bound to the identity verified at admission for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub username: Username,
    pub remote_addr: SocketAddr,
    pub connected_at: DateTime<Utc>,
}

impl Connection {
    /// Create a connection with a freshly generated id
    pub fn new(username: Username, remote_addr: SocketAddr, connected_at: DateTime<Utc>) -> Self {
        Self {
            id: ConnectionId::generate(),
            username,
            remote_addr,
            connected_at,
        }
    }
}

/// A chat message as relayed and persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Username,
    pub body: MessageBody,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(sender: Username, body: MessageBody, timestamp: Timestamp) -> Self {
        Self {
            sender,
            body,
            timestamp,
        }
    }
}

/// Decoded credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    pub username: Username,
    pub expires_at: DateTime<Utc>,
}

impl IdentityClaim {
    pub fn new(username: Username, expires_at: DateTime<Utc>) -> Self {
        Self {
            username,
            expires_at,
        }
    }

    /// Whether the claim is no longer valid at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Server-originated notice pushed to a single connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    /// The sender's last message was broadcast but could not be persisted
    PersistFailed,
}

impl Notice {
    pub fn reason(&self) -> &'static str {
        match self {
            Notice::PersistFailed => "message could not be persisted",
        }
    }
}
