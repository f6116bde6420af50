//! Value objects
//!
//! 不変で、生成時に検証済みであることが保証される値。

use std::fmt;

use chrono::{DateTime, Utc};
use mchat_shared::time::truncate_to_minute;
use uuid::Uuid;

use super::error::ValueError;

/// Longest accepted username, in characters
pub const USERNAME_MAX_CHARS: usize = 64;

/// Unique key of one admitted connection
///
/// Minted server-side on registration; two connections from the same user
/// get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Verified username a connection speaks as
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Create a username, trimming surrounding whitespace
    ///
    /// # Errors
    ///
    /// * `ValueError::EmptyUsername` - nothing left after trimming
    /// * `ValueError::UsernameTooLong` - more than `USERNAME_MAX_CHARS` characters
    pub fn new(value: String) -> Result<Self, ValueError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueError::EmptyUsername);
        }
        let chars = trimmed.chars().count();
        if chars > USERNAME_MAX_CHARS {
            return Err(ValueError::UsernameTooLong {
                max: USERNAME_MAX_CHARS,
                actual: chars,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Username {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chat message text
///
/// Kept verbatim; only a whitespace-only body is rejected. The size bound is
/// enforced on the raw frame before a body is ever built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBody(String);

impl MessageBody {
    pub fn new(value: String) -> Result<Self, ValueError> {
        if value.trim().is_empty() {
            return Err(ValueError::EmptyBody);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageBody {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Server-assigned message time: UTC, truncated to the minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Build a timestamp from any instant; seconds and below are dropped
    pub fn at_minute(instant: DateTime<Utc>) -> Self {
        Self(truncate_to_minute(instant))
    }

    pub fn value(&self) -> DateTime<Utc> {
        self.0
    }
}
