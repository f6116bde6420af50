//! WebSocket chat relay: router, handlers and server lifecycle.

mod handler;
mod server;
mod signal;
pub mod state;

pub use handler::websocket::{ReadLoopExit, extract_credential, read_loop};
pub use server::Server;
pub use signal::shutdown_signal;
