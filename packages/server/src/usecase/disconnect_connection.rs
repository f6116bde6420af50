//! UseCase: 接続の切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectConnectionUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - Read Loop の終了処理と、Fan-out による登録解除が同じ接続に対して
//!   重なっても、登録解除が 1 回だけ効くことを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録中の接続の切断
//! - エッジケース：既に登録解除された接続の切断（no-op）

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher};

/// 接続切断のユースケース
pub struct DisconnectConnectionUseCase {
    /// MessagePusher（Connection Registry の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectConnectionUseCase {
    /// 新しい DisconnectConnectionUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 接続切断を実行
    ///
    /// # Returns
    ///
    /// この呼び出しで登録解除された場合は `true`、既に登録されていなかった
    /// 場合は `false`（エラーではない）
    pub async fn execute(&self, connection_id: &ConnectionId) -> bool {
        self.message_pusher.unregister_client(connection_id).await
    }

    /// 残りの接続数を取得
    pub async fn count_remaining_connections(&self) -> usize {
        self.message_pusher.count_connections().await
    }
}
