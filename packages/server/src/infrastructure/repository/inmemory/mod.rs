//! In-memory storage backends.

pub mod message;

pub use message::InMemoryMessageStore;
