//! UseCase: メッセージ送信処理
//!
//! デコード済みのメッセージに対して、サーバー側タイムスタンプの付与、
//! 永続化、ブロードキャストを行う。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - タイムスタンプ（分単位の UTC）、永続化、配信範囲、永続化失敗時のポリシー
//!
//! ### なぜこのテストが必要か
//! - 永続化の成否に関わらずブロードキャストされることを保証する
//! - 送信者名が検証済みの Identity から付与されることを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：永続化してブロードキャスト
//! - 異常系：永続化失敗（notify / continue / close の各ポリシー）
//! - 自分自身への配信あり／なし

use std::sync::Arc;

use mchat_shared::time::Clock;

use crate::{
    config::{ServerConfig, StoreFailurePolicy},
    domain::{
        BroadcastReport, ChatMessage, Connection, MessageBody, MessagePusher, MessageStore, Notice,
        Timestamp,
    },
};

use super::error::SendMessageError;

/// 配信範囲と永続化失敗時の振る舞い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendMessagePolicy {
    /// 送信者自身にも配信するか
    pub include_sender: bool,
    pub on_store_failure: StoreFailurePolicy,
}

impl Default for SendMessagePolicy {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for SendMessagePolicy {
    fn from(config: &ServerConfig) -> Self {
        Self {
            include_sender: config.include_sender,
            on_store_failure: config.on_store_failure,
        }
    }
}

/// 1 メッセージの処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub message: ChatMessage,
    pub persisted: bool,
    pub report: BroadcastReport,
    /// `false` の場合、呼び出し側は送信者の接続を閉じる
    pub keep_open: bool,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// MessageStore（永続化の抽象化）
    store: Arc<dyn MessageStore>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
    policy: SendMessagePolicy,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        store: Arc<dyn MessageStore>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
        policy: SendMessagePolicy,
    ) -> Self {
        Self {
            store,
            message_pusher,
            clock,
            policy,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `origin` - 送信元の接続（送信者名はこの接続の Identity から付与される）
    /// * `body` - デコード済みの本文
    ///
    /// # Returns
    ///
    /// * `Ok(SendOutcome)` - ブロードキャスト済み（永続化の成否は `persisted`）
    /// * `Err(SendMessageError)` - ブロードキャスト自体ができなかった
    pub async fn execute(
        &self,
        origin: &Connection,
        body: MessageBody,
    ) -> Result<SendOutcome, SendMessageError> {
        // 1. サーバー側でタイムスタンプを付与（クライアントの値は使わない）
        let message = ChatMessage::new(
            origin.username.clone(),
            body,
            Timestamp::at_minute(self.clock.now_utc()),
        );

        // 2. 永続化
        let persisted = match self.store.append(&message).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "Failed to persist message from '{}' on connection '{}': {}",
                    origin.username,
                    origin.id,
                    e
                );
                false
            }
        };

        // 3. 永続化失敗の通知
        if !persisted
            && self.policy.on_store_failure == StoreFailurePolicy::Notify
            && let Err(e) = self
                .message_pusher
                .push_notice(&origin.id, Notice::PersistFailed)
                .await
        {
            tracing::warn!("Failed to notify connection '{}': {}", origin.id, e);
        }

        // 4. ブロードキャスト（永続化の成否に関わらず行う）
        let report = self
            .message_pusher
            .broadcast(&message, &origin.id, self.policy.include_sender)
            .await?;

        let keep_open = persisted || self.policy.on_store_failure != StoreFailurePolicy::Close;

        Ok(SendOutcome {
            message,
            persisted,
            report,
            keep_open,
        })
    }
}
