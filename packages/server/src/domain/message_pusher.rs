//! MessagePusher trait 定義
//!
//! 接続中のクライアントへのメッセージ配信（Connection Registry と
//! Broadcast Fan-out）のインターフェース。
//!
//! ## 所有関係
//!
//! 各接続の `PusherChannel` は登録中の間 MessagePusher だけが保持する。
//! 登録解除で `PusherChannel` が drop されると、その接続の `Eviction` が
//! 完了し、writer がソケットへの書き込みで詰まっていても接続は閉じられる。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};

use super::{ChatMessage, Connection, ConnectionId, MessagePushError, Notice};

/// One encoded outbound frame, shared between all recipients of a broadcast
pub type OutboundFrame = Arc<str>;

/// Resolves once the connection's `PusherChannel` has been dropped by the registry
pub type Eviction = oneshot::Receiver<()>;

/// Registry-side end of one connection's outbound path
///
/// Frames go into a bounded queue drained by the connection's writer task.
/// Dropping the channel also resolves the connection's `Eviction`.
#[derive(Debug)]
pub struct PusherChannel {
    frames: mpsc::Sender<OutboundFrame>,
    _evicted: oneshot::Sender<()>,
}

impl PusherChannel {
    /// Create a channel with a queue of `capacity` frames (at least one)
    ///
    /// # Returns
    ///
    /// The registry-side channel, the writer-side queue receiver and the
    /// connection's eviction signal
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OutboundFrame>, Eviction) {
        let (frames, rx) = mpsc::channel(capacity.max(1));
        let (evicted_tx, evicted_rx) = oneshot::channel();
        (
            Self {
                frames,
                _evicted: evicted_tx,
            },
            rx,
            evicted_rx,
        )
    }

    /// Queue a frame without waiting
    pub fn try_send(&self, frame: OutboundFrame) -> Result<(), TrySendError<OutboundFrame>> {
        self.frames.try_send(frame)
    }
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of recipients the frame was queued for
    pub delivered: usize,
    /// Recipients whose queue was closed or full; deregistered by the broadcast
    pub dropped: Vec<ConnectionId>,
}

/// MessagePusher trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続を登録する
    async fn register_client(&self, connection: Connection, sender: PusherChannel);

    /// 接続の登録を解除する
    ///
    /// 未登録の接続に対しては何もせず `false` を返す（冪等）。
    async fn unregister_client(&self, connection_id: &ConnectionId) -> bool;

    /// 特定の接続に通知を送る
    async fn push_notice(
        &self,
        connection_id: &ConnectionId,
        notice: Notice,
    ) -> Result<(), MessagePushError>;

    /// 登録中の全接続にメッセージを配信する
    ///
    /// `include_origin` が `false` の場合、送信元の接続を除外する。
    async fn broadcast(
        &self,
        message: &ChatMessage,
        origin: &ConnectionId,
        include_origin: bool,
    ) -> Result<BroadcastReport, MessagePushError>;

    /// 登録中の接続のスナップショット
    async fn connections(&self) -> Vec<Connection>;

    /// 登録中の接続数
    async fn count_connections(&self) -> usize;
}
