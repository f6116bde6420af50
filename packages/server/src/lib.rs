//! Mchat chat relay library.
//!
//! Admits token-authenticated WebSocket connections, stamps and persists
//! each inbound chat message, and fans it out to every live connection.

pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
