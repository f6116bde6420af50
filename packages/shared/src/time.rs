//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get the current instant in UTC
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new fixed clock with the given instant
    pub fn new(fixed_time: DateTime<Utc>) -> Self {
        Self { fixed_time }
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.fixed_time
    }
}

/// Truncate an instant to minute granularity (seconds and sub-seconds dropped)
///
/// Works across the whole `DateTime<Utc>` range, including instants that
/// cannot be expressed as nanoseconds since the epoch.
pub fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    match instant
        .with_nanosecond(0)
        .and_then(|without_nanos| without_nanos.with_second(0))
    {
        Some(truncated) => truncated,
        None => {
            tracing::warn!("Could not truncate {} to the minute, keeping it as is", instant);
            instant
        }
    }
}

/// Format an instant as RFC 3339 in UTC with second precision (`...T09:41:00Z`)
pub fn to_utc_rfc3339(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC 3339 string into a UTC instant
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
