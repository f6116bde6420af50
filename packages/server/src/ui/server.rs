//! Server execution logic.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    config::ServerConfig,
    usecase::{
        AdmitConnectionUseCase, DisconnectConnectionUseCase, GetConnectionsUseCase,
        SendMessageUseCase,
    },
};

use super::{
    handler::{
        http::{debug_connections, health_check},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// WebSocket chat relay server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     admit_connection_usecase,
///     send_message_usecase,
///     disconnect_connection_usecase,
///     get_connections_usecase,
///     &config,
/// );
/// server.run("127.0.0.1".to_string(), 3000).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `admit_connection_usecase` - UseCase for the admission handshake
    /// * `send_message_usecase` - UseCase for relaying a message
    /// * `disconnect_connection_usecase` - UseCase for connection teardown
    /// * `get_connections_usecase` - UseCase for listing connections
    /// * `config` - Queue and frame limits
    pub fn new(
        admit_connection_usecase: Arc<AdmitConnectionUseCase>,
        send_message_usecase: Arc<SendMessageUseCase>,
        disconnect_connection_usecase: Arc<DisconnectConnectionUseCase>,
        get_connections_usecase: Arc<GetConnectionsUseCase>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            state: Arc::new(AppState {
                admit_connection_usecase,
                send_message_usecase,
                disconnect_connection_usecase,
                get_connections_usecase,
                outbound_capacity: config.outbound_capacity.max(1),
                max_message_bytes: config.max_message_bytes,
            }),
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/debug/connections", get(debug_connections))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat relay listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
