//! Mchat chat relay server.
//!
//! Admits WebSocket connections carrying a valid token and relays every
//! chat message to all connected clients.
//!
//! Run with:
//! ```not_rust
//! MCHAT_JWT_SECRET=secret cargo run --bin mchat-server
//! cargo run --bin mchat-server -- --host 0.0.0.0 --port 3000 --jwt-secret secret
//! ```

use std::sync::Arc;

use clap::Parser;
use mchat_server::{
    config::{DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_OUTBOUND_CAPACITY, ServerConfig, StoreFailurePolicy},
    infrastructure::{
        message_pusher::ConnectionRegistry, repository::InMemoryMessageStore,
        verifier::JwtTokenVerifier,
    },
    ui::Server,
    usecase::{
        AdmitConnectionUseCase, DisconnectConnectionUseCase, GetConnectionsUseCase,
        SendMessagePolicy, SendMessageUseCase,
    },
};
use mchat_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "mchat-server")]
#[command(about = "Token-gated WebSocket chat relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "MCHAT_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "MCHAT_PORT", default_value = "3000")]
    port: u16,

    /// Shared HS256 secret used to verify tokens
    #[arg(long, env = "MCHAT_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Deliver each message back to its sender as well
    #[arg(
        long,
        env = "MCHAT_INCLUDE_SENDER",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    include_sender: bool,

    /// What to do when a message cannot be persisted
    #[arg(long, env = "MCHAT_ON_STORE_FAILURE", value_enum, default_value_t = StoreFailurePolicy::Notify)]
    on_store_failure: StoreFailurePolicy,

    /// Outbound frames buffered per connection before it is dropped as too slow
    #[arg(long, env = "MCHAT_OUTBOUND_CAPACITY", default_value_t = DEFAULT_OUTBOUND_CAPACITY)]
    outbound_capacity: usize,

    /// Largest accepted inbound frame, in bytes
    #[arg(long, env = "MCHAT_MAX_MESSAGE_BYTES", default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    max_message_bytes: usize,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            include_sender: self.include_sender,
            on_store_failure: self.on_store_failure,
            outbound_capacity: self.outbound_capacity,
            max_message_bytes: self.max_message_bytes,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = args.server_config();
    tracing::info!("Starting with {:?}", config);

    // Initialize dependencies in order:
    // 1. Store, Verifier, Clock
    // 2. MessagePusher (Connection Registry)
    // 3. UseCases
    // 4. Server

    // 1. Create Store (in-memory) and the token verifier
    let store = Arc::new(InMemoryMessageStore::new());
    let verifier = Arc::new(JwtTokenVerifier::new(args.jwt_secret.as_bytes()));
    let clock = Arc::new(SystemClock);

    // 2. Create MessagePusher
    let registry = Arc::new(ConnectionRegistry::new());

    // 3. Create UseCases
    let admit_connection_usecase = Arc::new(AdmitConnectionUseCase::new(
        verifier,
        registry.clone(),
        clock.clone(),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(
        store,
        registry.clone(),
        clock,
        SendMessagePolicy::from(&config),
    ));
    let disconnect_connection_usecase =
        Arc::new(DisconnectConnectionUseCase::new(registry.clone()));
    let get_connections_usecase = Arc::new(GetConnectionsUseCase::new(registry));

    // 4. Create and run the server
    let server = Server::new(
        admit_connection_usecase,
        send_message_usecase,
        disconnect_connection_usecase,
        get_connections_usecase,
        &config,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
