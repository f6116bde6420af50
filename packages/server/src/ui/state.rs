//! Server state shared by all handlers.

use std::sync::Arc;

use crate::usecase::{
    AdmitConnectionUseCase, DisconnectConnectionUseCase, GetConnectionsUseCase,
    SendMessageUseCase,
};

/// Shared application state
pub struct AppState {
    /// AdmitConnectionUseCase（接続受け入れのユースケース）
    pub admit_connection_usecase: Arc<AdmitConnectionUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// DisconnectConnectionUseCase（接続切断のユースケース）
    pub disconnect_connection_usecase: Arc<DisconnectConnectionUseCase>,
    /// GetConnectionsUseCase（接続一覧取得のユースケース）
    pub get_connections_usecase: Arc<GetConnectionsUseCase>,
    /// Per-connection outbound queue bound
    pub outbound_capacity: usize,
    /// Largest accepted inbound frame, in bytes
    pub max_message_bytes: usize,
}
