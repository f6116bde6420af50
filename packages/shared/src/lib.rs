//! Utilities shared by the Mchat server and client binaries.

pub mod logger;
pub mod time;
