//! InMemory Message Store 実装
//!
//! ドメイン層が定義する MessageStore trait の具体的な実装。
//! Vec をインメモリ DB として使用します。プロセス再起動で内容は失われます。

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ChatMessage, MessageStore, StoreError};

/// インメモリ Message Store 実装
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<ChatMessage>>,
    /// `true` の間、append は常に失敗する（障害の再現用）
    unavailable: AtomicBool,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みメッセージのスナップショット（追記順）
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Simulate an outage: while set, every append fails
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn append(&self, message: &ChatMessage) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError("store is unavailable".to_string()));
        }
        let mut messages = self.messages.lock().await;
        messages.push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageBody, Timestamp, Username};
    use chrono::Utc;

    fn message(body: &str) -> ChatMessage {
        ChatMessage::new(
            Username::new("alice".to_string()).unwrap(),
            MessageBody::new(body.to_string()).unwrap(),
            Timestamp::at_minute(Utc::now()),
        )
    }

    #[tokio::test]
    async fn test_append_keeps_order() {
        // テスト項目: 追記したメッセージが追記順に保持される
        // given (前提条件):
        let store = InMemoryMessageStore::new();

        // when (操作):
        store.append(&message("one")).await.unwrap();
        store.append(&message("two")).await.unwrap();

        // then (期待する結果):
        let messages = store.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body.as_str(), "one");
        assert_eq!(messages[1].body.as_str(), "two");
    }

    #[tokio::test]
    async fn test_append_fails_while_unavailable() {
        // テスト項目: 障害中は append が失敗し、何も保存されない
        // given (前提条件):
        let store = InMemoryMessageStore::new();
        store.set_unavailable(true);

        // when (操作):
        let result = store.append(&message("lost")).await;

        // then (期待する結果):
        assert!(result.is_err());
        assert!(store.is_empty().await);

        // 復旧後は保存できる
        store.set_unavailable(false);
        store.append(&message("kept")).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
