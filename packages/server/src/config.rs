//! Server configuration.

use clap::ValueEnum;

/// Default per-connection outbound queue bound
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Default largest accepted inbound frame, in bytes
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024;

/// What the Read Loop does when persisting a message fails
///
/// The message is broadcast under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StoreFailurePolicy {
    /// Push an error notice to the sender and keep reading
    #[default]
    Notify,
    /// Log only and keep reading
    Continue,
    /// End the sender's connection
    Close,
}

/// Relay behavior knobs
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Whether a sender receives its own broadcasts
    pub include_sender: bool,
    pub on_store_failure: StoreFailurePolicy,
    pub outbound_capacity: usize,
    pub max_message_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            include_sender: true,
            on_store_failure: StoreFailurePolicy::default(),
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
        }
    }
}
