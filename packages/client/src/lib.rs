//! Terminal chat client for the Mchat relay.
//!
//! Reads lines from stdin, sends them as chat messages and prints every
//! message relayed by the server.

pub mod domain;
pub mod error;
pub mod formatter;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
