//! Connection Registry と Broadcast Fan-out の実装
//!
//! ## 責務
//!
//! - 登録中の接続と、その `PusherChannel`（送信キューと Eviction の送信側）を管理
//! - 特定の接続への通知（push_notice）と全接続への配信（broadcast）
//!
//! ## 同期
//!
//! 全ての操作は単一の `tokio::sync::Mutex` を通る。broadcast はロックを
//! 保持したまま各接続のキューへ `try_send` するため、配信中に登録状態が
//! 変わることはない。ソケットへの実際の書き込みは接続ごとの writer タスクが
//! 並行に行うので、ロック保持中に待ちが発生することはない。
//!
//! キューが閉じている、または満杯の接続はその場で登録解除される。
//! `PusherChannel` が drop されるとその接続の `Eviction` が完了し、
//! 接続タスクは writer がソケット書き込みで詰まっていても Read Loop を止める。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc::error::TrySendError};

use crate::{
    domain::{
        BroadcastReport, ChatMessage, Connection, ConnectionId, MessagePushError, MessagePusher,
        Notice, OutboundFrame, PusherChannel,
    },
    infrastructure::dto::websocket::{ChatMessageDto, ErrorNoticeDto},
};

/// 登録中の接続
struct RegisteredClient {
    connection: Connection,
    sender: PusherChannel,
}

/// Mutex で保護された接続レジストリ
///
/// ## 使用例
///
/// ```ignore
/// let registry = ConnectionRegistry::new();
/// let (channel, rx, evicted) = PusherChannel::new(64);
/// registry.register_client(connection, channel).await;
///
/// registry.broadcast(&message, &origin_id, true).await?;
/// ```
#[derive(Default)]
pub struct ConnectionRegistry {
    /// Key: ConnectionId
    clients: Mutex<HashMap<ConnectionId, RegisteredClient>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中かどうか
    #[cfg(test)]
    pub async fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.clients.lock().await.contains_key(connection_id)
    }

    /// `except` を除く全ての接続に対して `f` を呼ぶ
    ///
    /// ロックを保持したまま呼ばれるため、`f` の中で待ってはならない。
    /// `f` が `false` を返した接続は同じロックの中で登録解除され、
    /// その ID が返される。
    pub async fn for_each_except<F>(&self, except: Option<&ConnectionId>, mut f: F) -> Vec<ConnectionId>
    where
        F: FnMut(&Connection, &PusherChannel) -> bool,
    {
        let mut clients = self.clients.lock().await;

        let dropped: Vec<ConnectionId> = clients
            .iter()
            .filter(|(id, _)| Some(*id) != except)
            .filter_map(|(id, client)| (!f(&client.connection, &client.sender)).then_some(*id))
            .collect();

        for id in &dropped {
            clients.remove(id);
        }

        dropped
    }
}

/// 送信キューへ 1 フレームを投入する
fn offer(connection: &Connection, sender: &PusherChannel, frame: &OutboundFrame) -> Result<(), MessagePushError> {
    sender.try_send(frame.clone()).map_err(|e| match e {
        TrySendError::Full(_) => MessagePushError::QueueFull(connection.id.to_string()),
        TrySendError::Closed(_) => MessagePushError::ChannelClosed(connection.id.to_string()),
    })
}

fn encode<T: serde::Serialize>(dto: &T) -> Result<OutboundFrame, MessagePushError> {
    serde_json::to_string(dto)
        .map(OutboundFrame::from)
        .map_err(|e| MessagePushError::Encode(e.to_string()))
}

#[async_trait]
impl MessagePusher for ConnectionRegistry {
    async fn register_client(&self, connection: Connection, sender: PusherChannel) {
        let id = connection.id;
        let username = connection.username.clone();
        let mut clients = self.clients.lock().await;
        clients.insert(id, RegisteredClient { connection, sender });
        tracing::debug!(
            "Connection '{}' ({}) registered, {} live",
            id,
            username,
            clients.len()
        );
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) -> bool {
        let mut clients = self.clients.lock().await;
        let removed = clients.remove(connection_id).is_some();
        if removed {
            tracing::debug!(
                "Connection '{}' unregistered, {} live",
                connection_id,
                clients.len()
            );
        }
        removed
    }

    async fn push_notice(
        &self,
        connection_id: &ConnectionId,
        notice: Notice,
    ) -> Result<(), MessagePushError> {
        let frame = encode(&ErrorNoticeDto::from(notice))?;
        let clients = self.clients.lock().await;

        let client = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        offer(&client.connection, &client.sender, &frame)?;
        tracing::debug!("Pushed notice {:?} to connection '{}'", notice, connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        message: &ChatMessage,
        origin: &ConnectionId,
        include_origin: bool,
    ) -> Result<BroadcastReport, MessagePushError> {
        let frame = encode(&ChatMessageDto::from(message))?;
        let except = (!include_origin).then_some(origin);

        let mut delivered = 0;
        let dropped = self
            .for_each_except(except, |connection, sender| {
                match offer(connection, sender, &frame) {
                    Ok(()) => {
                        delivered += 1;
                        true
                    }
                    // 配信失敗は受信者ごとに閉じ込め、その接続だけを登録解除する
                    Err(e) => {
                        tracing::warn!(
                            "Broadcast to '{}' ({}) failed, deregistering: {}",
                            connection.id,
                            connection.username,
                            e
                        );
                        false
                    }
                }
            })
            .await;

        tracing::debug!(
            "Broadcasted message from '{}' to {} connection(s), {} dropped",
            message.sender,
            delivered,
            dropped.len()
        );

        Ok(BroadcastReport { delivered, dropped })
    }

    async fn connections(&self) -> Vec<Connection> {
        let clients = self.clients.lock().await;
        let mut connections: Vec<Connection> =
            clients.values().map(|c| c.connection.clone()).collect();
        connections.sort_by(|a, b| a.connected_at.cmp(&b.connected_at).then(a.id.cmp(&b.id)));
        connections
    }

    async fn count_connections(&self) -> usize {
        self.clients.lock().await.len()
    }
}
