//! UseCase layer: admission, message relay and disconnection.

mod admit_connection;
mod disconnect_connection;
mod error;
mod get_connections;
mod send_message;

pub use admit_connection::AdmitConnectionUseCase;
pub use disconnect_connection::DisconnectConnectionUseCase;
pub use error::{AdmissionError, SendMessageError};
pub use get_connections::GetConnectionsUseCase;
pub use send_message::{SendMessagePolicy, SendMessageUseCase, SendOutcome};
