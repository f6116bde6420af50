//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// One registered connection as exposed by the debug endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub id: String,
    pub username: String,
    pub remote_addr: String,
    /// RFC 3339, UTC
    pub connected_at: String,
}

/// Registry snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionsDto {
    pub count: usize,
    pub connections: Vec<ConnectionDto>,
}
