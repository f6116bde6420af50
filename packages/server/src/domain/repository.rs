//! Repository trait 定義
//!
//! ドメイン層が必要とする永続化のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{ChatMessage, StoreError};

/// Message Store trait
///
/// 中継されたメッセージの永続化先。UseCase 層はこの trait にのみ依存する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// メッセージを追記する
    async fn append(&self, message: &ChatMessage) -> Result<(), StoreError>;
}
