//! UseCase: 接続一覧の取得

use std::sync::Arc;

use crate::domain::{Connection, MessagePusher};

/// 接続一覧取得のユースケース（デバッグ用）
pub struct GetConnectionsUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl GetConnectionsUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 登録中の接続のスナップショット（接続時刻順）
    pub async fn execute(&self) -> Vec<Connection> {
        self.message_pusher.connections().await
    }
}
