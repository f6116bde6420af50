//! Domain layer: value objects, entities, errors and the collaborator
//! interfaces the relay depends on.

pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod value_object;
pub mod verifier;

pub use entity::{ChatMessage, Connection, IdentityClaim, Notice};
pub use error::{MessagePushError, StoreError, ValueError, VerificationError};
pub use message_pusher::{BroadcastReport, Eviction, MessagePusher, OutboundFrame, PusherChannel};
pub use repository::MessageStore;
pub use value_object::{ConnectionId, MessageBody, Timestamp, Username};
pub use verifier::TokenVerifier;

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::MockMessageStore;
#[cfg(test)]
pub use verifier::MockTokenVerifier;
