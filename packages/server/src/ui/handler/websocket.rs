//! WebSocket connection handlers.
//!
//! Admission happens before the upgrade: a rejected credential is answered
//! with `401` and nothing is registered. Once upgraded, each connection runs
//! a read loop and a single writer task draining its bounded outbound queue.

use std::{fmt::Display, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use futures_util::{
    sink::{Sink, SinkExt},
    stream::{Stream, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    domain::{Connection, IdentityClaim, OutboundFrame, PusherChannel},
    infrastructure::dto::websocket::{DecodeError, decode_inbound},
    ui::state::AppState,
    usecase::SendMessageError,
};

/// How long the writer may take to flush and close after deregistration
const WRITER_CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Why a connection's read loop ended
#[derive(Debug)]
pub enum ReadLoopExit {
    /// The peer sent a Close frame
    PeerClosed,
    /// The stream ended without a Close frame
    Eof,
    ReadError(String),
    /// An inbound frame could not be decoded; fatal for the connection
    DecodeError(DecodeError),
    /// Persisting failed under the `close` policy
    StoreFailure,
    /// The writer task stopped first after a failed write
    WriterClosed,
    /// Deregistered by the fan-out while the read loop was still running
    Evicted,
    Aborted,
}

impl Display for ReadLoopExit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PeerClosed => write!(f, "peer closed"),
            Self::Eof => write!(f, "end of stream"),
            Self::ReadError(e) => write!(f, "read error: {}", e),
            Self::DecodeError(e) => write!(f, "undecodable frame: {}", e),
            Self::StoreFailure => write!(f, "message could not be persisted"),
            Self::WriterClosed => write!(f, "writer closed"),
            Self::Evicted => write!(f, "dropped from the registry"),
            Self::Aborted => write!(f, "read loop aborted"),
        }
    }
}

/// Take the credential from the `Sec-WebSocket-Protocol` header
///
/// Browsers cannot set arbitrary headers on a WebSocket handshake, so the
/// token travels as the first offered subprotocol.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let credential = extract_credential(&headers);

    let claim = match state
        .admit_connection_usecase
        .verify(credential.as_deref())
        .await
    {
        Ok(claim) => claim,
        Err(e) => {
            tracing::warn!("Rejected connection from {}: {}", remote_addr, e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };
    tracing::info!("Admitted '{}' from {}", claim.username, remote_addr);

    let mut ws = ws
        .max_message_size(state.max_message_bytes)
        .max_frame_size(state.max_message_bytes);
    // The handshake only completes if the offered subprotocol is echoed back
    if let Some(credential) = credential {
        ws = ws.protocols([credential]);
    }

    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::warn!("WebSocket upgrade from {} failed: {}", remote_addr, e);
        })
        .on_upgrade(move |socket| handle_socket(socket, state, claim, remote_addr)))
}

/// Spawns a task that drains this connection's outbound queue into the socket.
///
/// The queue closes once the connection is removed from the registry (the
/// registry holds the only sender), at which point a Close frame is sent.
///
/// # Arguments
///
/// * `rx` - This connection's outbound queue
/// * `sender` - WebSocket sink to write frames to
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop<S>(mut rx: mpsc::Receiver<OutboundFrame>, mut sender: S) -> JoinHandle<()>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
{
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(frame.to_string().into())).await {
                tracing::debug!("Write failed: {}", e);
                return;
            }
        }
        if let Err(e) = sender.close().await {
            tracing::debug!("Close failed: {}", e);
        }
    })
}

/// Reads frames from one connection until it ends
///
/// Text and binary frames are decoded and relayed; ping/pong frames are
/// ignored. Any undecodable frame ends the loop.
pub async fn read_loop<S, E>(
    mut receiver: S,
    state: Arc<AppState>,
    connection: Connection,
) -> ReadLoopExit
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(frame) = receiver.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => return ReadLoopExit::ReadError(e.to_string()),
        };

        let decoded = match frame {
            Message::Text(text) => decode_inbound(text.as_str().as_bytes(), state.max_message_bytes),
            Message::Binary(data) => decode_inbound(&data, state.max_message_bytes),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return ReadLoopExit::PeerClosed,
        };
        let decoded = match decoded {
            Ok(decoded) => decoded,
            Err(e) => return ReadLoopExit::DecodeError(e),
        };

        if let Some(claimed) = decoded.claimed_sender.as_deref()
            && claimed != connection.username.as_str()
        {
            tracing::debug!(
                "Ignoring claimed sender '{}' on connection '{}' ('{}')",
                claimed,
                connection.id,
                connection.username
            );
        }

        match state
            .send_message_usecase
            .execute(&connection, decoded.body)
            .await
        {
            Ok(outcome) if !outcome.keep_open => return ReadLoopExit::StoreFailure,
            Ok(outcome) => {
                tracing::debug!(
                    "Relayed message from '{}' to {} connection(s)",
                    connection.username,
                    outcome.report.delivered
                );
            }
            Err(SendMessageError::BroadcastFailed(e)) => {
                tracing::warn!(
                    "Failed to relay message from '{}': {}",
                    connection.username,
                    e
                );
            }
        }
    }
    ReadLoopExit::Eof
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    claim: IdentityClaim,
    remote_addr: SocketAddr,
) {
    let (channel, rx, mut evicted) = PusherChannel::new(state.outbound_capacity);
    let connection = state
        .admit_connection_usecase
        .register(claim, remote_addr, channel)
        .await;
    tracing::info!(
        "Connection '{}' ('{}') from {} registered",
        connection.id,
        connection.username,
        remote_addr
    );

    let (sender, receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);
    let mut recv_task = tokio::spawn(read_loop(receiver, state.clone(), connection.clone()));

    // Eviction ends the read loop even while the writer is parked on a full socket
    let (exit, writer_done) = tokio::select! {
        result = &mut recv_task => (result.unwrap_or(ReadLoopExit::Aborted), false),
        _ = &mut send_task => {
            recv_task.abort();
            (ReadLoopExit::WriterClosed, true)
        }
        _ = &mut evicted => {
            recv_task.abort();
            (ReadLoopExit::Evicted, false)
        }
    };

    match &exit {
        ReadLoopExit::PeerClosed | ReadLoopExit::Eof | ReadLoopExit::WriterClosed => {
            tracing::info!("Connection '{}' ended: {}", connection.id, exit);
        }
        _ => tracing::warn!("Connection '{}' ended: {}", connection.id, exit),
    }

    // Dropping the registry's channel lets the writer flush and send Close
    let removed = state
        .disconnect_connection_usecase
        .execute(&connection.id)
        .await;
    if !writer_done && tokio::time::timeout(WRITER_CLOSE_GRACE, &mut send_task).await.is_err() {
        send_task.abort();
    }

    tracing::info!(
        "Connection '{}' ('{}') closed{}, {} remaining",
        connection.id,
        connection.username,
        if removed { "" } else { " (already deregistered)" },
        state
            .disconnect_connection_usecase
            .count_remaining_connections()
            .await
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::StoreFailurePolicy,
        domain::{MessagePusher, MockTokenVerifier, Username},
        infrastructure::{
            dto::websocket::ChatMessageDto, message_pusher::ConnectionRegistry,
            repository::InMemoryMessageStore,
        },
        usecase::{
            AdmitConnectionUseCase, DisconnectConnectionUseCase, GetConnectionsUseCase,
            SendMessagePolicy, SendMessageUseCase,
        },
    };
    use axum::http::HeaderValue;
    use chrono::{TimeZone, Utc};
    use futures_util::stream;
    use mchat_shared::time::FixedClock;

    struct Fixture {
        state: Arc<AppState>,
        registry: Arc<ConnectionRegistry>,
        store: Arc<InMemoryMessageStore>,
    }

    fn fixture(policy: SendMessagePolicy) -> Fixture {
        let registry = Arc::new(ConnectionRegistry::new());
        let store = Arc::new(InMemoryMessageStore::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 9, 41, 37).unwrap(),
        ));

        let state = Arc::new(AppState {
            admit_connection_usecase: Arc::new(AdmitConnectionUseCase::new(
                Arc::new(MockTokenVerifier::new()),
                registry.clone(),
                clock.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                store.clone(),
                registry.clone(),
                clock,
                policy,
            )),
            disconnect_connection_usecase: Arc::new(DisconnectConnectionUseCase::new(
                registry.clone(),
            )),
            get_connections_usecase: Arc::new(GetConnectionsUseCase::new(registry.clone())),
            outbound_capacity: 8,
            max_message_bytes: 1024,
        });

        Fixture {
            state,
            registry,
            store,
        }
    }

    async fn join(
        registry: &ConnectionRegistry,
        name: &str,
    ) -> (Connection, mpsc::Receiver<OutboundFrame>) {
        let connection = Connection::new(
            Username::new(name.to_string()).unwrap(),
            "127.0.0.1:40000".parse().unwrap(),
            Utc::now(),
        );
        let (channel, rx, _evicted) = PusherChannel::new(8);
        registry.register_client(connection.clone(), channel).await;
        (connection, rx)
    }

    fn text(s: &str) -> Result<Message, std::io::Error> {
        Ok(Message::Text(s.to_string().into()))
    }

    #[test]
    fn test_extract_credential_takes_first_protocol() {
        // テスト項目: Sec-WebSocket-Protocol の先頭要素がクレデンシャルになる
        // given (前提条件):
        let mut headers = HeaderMap::new();
        headers.insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(" token-abc , chat"),
        );

        // when (操作):
        let credential = extract_credential(&headers);

        // then (期待する結果):
        assert_eq!(credential.as_deref(), Some("token-abc"));
    }

    #[test]
    fn test_extract_credential_missing_or_blank() {
        // テスト項目: ヘッダーがない、または空の場合は None
        // given (前提条件):
        let empty = HeaderMap::new();
        let mut blank = HeaderMap::new();
        blank.insert(header::SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("  "));

        // when (操作):
        // then (期待する結果):
        assert_eq!(extract_credential(&empty), None);
        assert_eq!(extract_credential(&blank), None);
    }

    #[tokio::test]
    async fn test_read_loop_relays_text_frame() {
        // テスト項目: テキストフレームが永続化され、検証済みの送信者名で配信される
        // given (前提条件):
        let f = fixture(SendMessagePolicy::default());
        let (alice, _rx_alice) = join(&f.registry, "alice").await;
        let (_bob, mut rx_bob) = join(&f.registry, "bob").await;
        let frames = stream::iter(vec![text(r#"{"body":"hi","sender":"mallory"}"#)]);

        // when (操作):
        let exit = read_loop(frames, f.state.clone(), alice).await;

        // then (期待する結果):
        assert!(matches!(exit, ReadLoopExit::Eof));
        assert_eq!(f.store.len().await, 1);
        let frame = rx_bob.try_recv().unwrap();
        let dto: ChatMessageDto = serde_json::from_str(&frame).unwrap();
        assert_eq!(dto.sender, "alice");
        assert_eq!(dto.body, "hi");
        assert_eq!(dto.timestamp, "2024-06-01T09:41:00Z");
    }

    #[tokio::test]
    async fn test_read_loop_accepts_binary_frame() {
        // テスト項目: バイナリフレームも UTF-8 の JSON として扱われる
        // given (前提条件):
        let f = fixture(SendMessagePolicy::default());
        let (alice, _rx_alice) = join(&f.registry, "alice").await;
        let frames = stream::iter(vec![Ok::<_, std::io::Error>(Message::Binary(
            br#"{"body":"bytes"}"#.to_vec().into(),
        ))]);

        // when (操作):
        let exit = read_loop(frames, f.state.clone(), alice).await;

        // then (期待する結果):
        assert!(matches!(exit, ReadLoopExit::Eof));
        assert_eq!(f.store.messages().await[0].body.as_str(), "bytes");
    }

    #[tokio::test]
    async fn test_read_loop_stops_on_malformed_frame() {
        // テスト項目: デコードできないフレームでループが終了し、後続は処理されない
        // given (前提条件):
        let f = fixture(SendMessagePolicy::default());
        let (alice, _rx_alice) = join(&f.registry, "alice").await;
        let (_bob, mut rx_bob) = join(&f.registry, "bob").await;
        let frames = stream::iter(vec![text("not json"), text(r#"{"body":"later"}"#)]);

        // when (操作):
        let exit = read_loop(frames, f.state.clone(), alice).await;

        // then (期待する結果):
        assert!(matches!(exit, ReadLoopExit::DecodeError(DecodeError::Json(_))));
        assert!(f.store.is_empty().await);
        assert!(rx_bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_read_loop_stops_on_oversized_frame() {
        // テスト項目: 上限を超えるフレームは致命的なデコードエラーになる
        // given (前提条件):
        let f = fixture(SendMessagePolicy::default());
        let (alice, _rx_alice) = join(&f.registry, "alice").await;
        let oversized = format!(r#"{{"body":"{}"}}"#, "x".repeat(2048));
        let frames = stream::iter(vec![text(&oversized)]);

        // when (操作):
        let exit = read_loop(frames, f.state.clone(), alice).await;

        // then (期待する結果):
        assert!(matches!(
            exit,
            ReadLoopExit::DecodeError(DecodeError::TooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_loop_ignores_ping_and_stops_on_close() {
        // テスト項目: Ping は無視され、Close フレームでループが終了する
        // given (前提条件):
        let f = fixture(SendMessagePolicy::default());
        let (alice, _rx_alice) = join(&f.registry, "alice").await;
        let frames = stream::iter(vec![
            Ok(Message::Ping(Vec::<u8>::new().into())),
            Ok(Message::Close(None)),
            text(r#"{"body":"after close"}"#),
        ]);

        // when (操作):
        let exit = read_loop(frames, f.state.clone(), alice).await;

        // then (期待する結果):
        assert!(matches!(exit, ReadLoopExit::PeerClosed));
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_read_loop_stops_on_read_error() {
        // テスト項目: 読み取りエラーでループが終了する
        // given (前提条件):
        let f = fixture(SendMessagePolicy::default());
        let (alice, _rx_alice) = join(&f.registry, "alice").await;
        let frames = stream::iter(vec![Err(std::io::Error::other("connection reset"))]);

        // when (操作):
        let exit = read_loop(frames, f.state.clone(), alice).await;

        // then (期待する結果):
        match exit {
            ReadLoopExit::ReadError(reason) => assert!(reason.contains("connection reset")),
            other => panic!("unexpected exit: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_read_loop_close_policy_ends_on_store_failure() {
        // テスト項目: close ポリシーでは永続化失敗後もブロードキャストし、ループを終了する
        // given (前提条件):
        let f = fixture(SendMessagePolicy {
            include_sender: true,
            on_store_failure: StoreFailurePolicy::Close,
        });
        f.store.set_unavailable(true);
        let (alice, _rx_alice) = join(&f.registry, "alice").await;
        let (_bob, mut rx_bob) = join(&f.registry, "bob").await;
        let frames = stream::iter(vec![text(r#"{"body":"one"}"#), text(r#"{"body":"two"}"#)]);

        // when (操作):
        let exit = read_loop(frames, f.state.clone(), alice).await;

        // then (期待する結果):
        assert!(matches!(exit, ReadLoopExit::StoreFailure));
        let dto: ChatMessageDto = serde_json::from_str(&rx_bob.try_recv().unwrap()).unwrap();
        assert_eq!(dto.body, "one");
        assert!(rx_bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_read_loop_continue_policy_keeps_reading() {
        // テスト項目: continue ポリシーでは永続化に失敗しても読み取りを続ける
        // given (前提条件):
        let f = fixture(SendMessagePolicy {
            include_sender: false,
            on_store_failure: StoreFailurePolicy::Continue,
        });
        f.store.set_unavailable(true);
        let (alice, mut rx_alice) = join(&f.registry, "alice").await;
        let (_bob, mut rx_bob) = join(&f.registry, "bob").await;
        let frames = stream::iter(vec![text(r#"{"body":"one"}"#), text(r#"{"body":"two"}"#)]);

        // when (操作):
        let exit = read_loop(frames, f.state.clone(), alice).await;

        // then (期待する結果):
        assert!(matches!(exit, ReadLoopExit::Eof));
        assert!(rx_bob.try_recv().is_ok());
        assert!(rx_bob.try_recv().is_ok());
        // 自分自身への配信も通知もない
        assert!(rx_alice.try_recv().is_err());
    }
}
