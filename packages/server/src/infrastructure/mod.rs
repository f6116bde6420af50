//! Infrastructure layer: wire format, connection registry, storage and
//! credential verification implementations.

pub mod dto;
pub mod message_pusher;
pub mod repository;
pub mod verifier;
