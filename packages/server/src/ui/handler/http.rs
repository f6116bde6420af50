//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{infrastructure::dto::http::ConnectionsDto, ui::state::AppState};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint listing the registered connections
pub async fn debug_connections(State(state): State<Arc<AppState>>) -> Json<ConnectionsDto> {
    let connections = state.get_connections_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(ConnectionsDto::from(connections))
}
