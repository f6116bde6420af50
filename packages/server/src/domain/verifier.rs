//! Token Verifier trait 定義
//!
//! 接続時に提示されたクレデンシャルを検証するインターフェース。
//! トークンの発行・署名方式は実装側（Infrastructure 層）の責務です。

use async_trait::async_trait;

use super::{IdentityClaim, VerificationError};

/// Token Verifier trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// クレデンシャル文字列を検証し、デコードされた Identity Claim を返す
    async fn verify(&self, credential: &str) -> Result<IdentityClaim, VerificationError>;
}
