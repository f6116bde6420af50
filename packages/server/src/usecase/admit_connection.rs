//! UseCase: 接続の受け入れ（Admission Handshake）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AdmitConnectionUseCase::verify() / register()
//! - クレデンシャル検証と、成功時のみのレジストリ登録
//!
//! ### なぜこのテストが必要か
//! - 拒否された接続がレジストリに残らないことを保証する
//! - 検証済みの Identity が接続に紐付くことを確認する
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効なクレデンシャル
//! - 異常系：クレデンシャルなし、検証失敗、期限切れの Claim

use std::{net::SocketAddr, sync::Arc};

use mchat_shared::time::Clock;

use crate::domain::{Connection, IdentityClaim, MessagePusher, PusherChannel, TokenVerifier};

use super::error::AdmissionError;

/// 接続受け入れのユースケース
pub struct AdmitConnectionUseCase {
    /// TokenVerifier（クレデンシャル検証の抽象化）
    verifier: Arc<dyn TokenVerifier>,
    /// MessagePusher（Connection Registry の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl AdmitConnectionUseCase {
    /// 新しい AdmitConnectionUseCase を作成
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            verifier,
            message_pusher,
            clock,
        }
    }

    /// クレデンシャルを検証する（レジストリには触れない）
    ///
    /// # Returns
    ///
    /// * `Ok(IdentityClaim)` - 検証済みの Claim
    /// * `Err(AdmissionError)` - クレデンシャルなし、検証失敗、期限切れ
    pub async fn verify(&self, credential: Option<&str>) -> Result<IdentityClaim, AdmissionError> {
        let credential = credential
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AdmissionError::MissingCredential)?;

        let claim = self.verifier.verify(credential).await?;

        // Verifier の実装に関わらず、期限切れの Claim は受け入れない
        if claim.is_expired_at(self.clock.now_utc()) {
            return Err(AdmissionError::Expired(claim.expires_at));
        }

        Ok(claim)
    }

    /// 検証済みの Claim に紐付けて接続を登録する
    ///
    /// # Arguments
    ///
    /// * `claim` - `verify` が返した Claim
    /// * `remote_addr` - 接続元アドレス
    /// * `channel` - この接続の送信キュー
    pub async fn register(
        &self,
        claim: IdentityClaim,
        remote_addr: SocketAddr,
        channel: PusherChannel,
    ) -> Connection {
        let connection = Connection::new(claim.username, remote_addr, self.clock.now_utc());
        self.message_pusher
            .register_client(connection.clone(), channel)
            .await;
        connection
    }
}
