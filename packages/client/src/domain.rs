//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use mchat_server::{
    config::DEFAULT_MAX_MESSAGE_BYTES,
    infrastructure::dto::websocket::{ChatMessageDto, ErrorNoticeDto, InboundMessage, MessageType},
};

use crate::error::{ClientError, OutboundFrameError};

/// Largest frame the relay accepts; anything bigger would close the connection
pub const MAX_FRAME_BYTES: usize = DEFAULT_MAX_MESSAGE_BYTES;

/// A text frame received from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    Chat(ChatMessageDto),
    Error(ErrorNoticeDto),
    /// Anything the client does not understand, kept verbatim
    Unknown(String),
}

/// Classify a text frame received from the server
pub fn parse_server_frame(text: &str) -> ServerFrame {
    if let Ok(chat) = serde_json::from_str::<ChatMessageDto>(text)
        && chat.r#type == MessageType::Chat
    {
        return ServerFrame::Chat(chat);
    }
    if let Ok(notice) = serde_json::from_str::<ErrorNoticeDto>(text)
        && notice.r#type == MessageType::Error
    {
        return ServerFrame::Error(notice);
    }
    ServerFrame::Unknown(text.to_string())
}

/// Build the frame sent for one input line
///
/// The sender is left out; the server stamps it from the verified token.
/// The size limit applies to the encoded frame, since escaping can make it
/// longer than the line itself.
pub fn outbound_frame(line: &str, max_bytes: usize) -> Result<String, OutboundFrameError> {
    let json = serde_json::to_string(&InboundMessage {
        sender: None,
        body: line.to_string(),
    })?;
    if json.len() > max_bytes {
        return Err(OutboundFrameError::TooLarge {
            max: max_bytes,
            actual: json.len(),
        });
    }
    Ok(json)
}

/// Check if the client should exit immediately based on the error type.
///
/// # Arguments
///
/// * `error` - The client error to check
///
/// # Returns
///
/// `true` if the error requires immediate exit (a rejected token cannot
/// succeed on retry), `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::Unauthorized)
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
///
/// # Returns
///
/// `true` if reconnection should be attempted, `false` otherwise
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_frame_chat() {
        // テスト項目: チャットフレームが Chat として解釈される
        // given (前提条件):
        let text = r#"{"type":"chat","sender":"alice","body":"hi","timestamp":"2024-06-01T09:41:00Z"}"#;

        // when (操作):
        let frame = parse_server_frame(text);

        // then (期待する結果):
        match frame {
            ServerFrame::Chat(chat) => {
                assert_eq!(chat.sender, "alice");
                assert_eq!(chat.body, "hi");
                assert_eq!(chat.timestamp, "2024-06-01T09:41:00Z");
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[test]
    fn test_parse_server_frame_error_notice() {
        // テスト項目: エラー通知が Error として解釈される
        // given (前提条件):
        let text = r#"{"type":"error","reason":"message could not be persisted"}"#;

        // when (操作):
        let frame = parse_server_frame(text);

        // then (期待する結果):
        assert!(
            matches!(frame, ServerFrame::Error(ref notice) if notice.reason == "message could not be persisted")
        );
    }

    #[test]
    fn test_parse_server_frame_unknown() {
        // テスト項目: 解釈できないフレームはそのまま Unknown になる
        // given (前提条件):
        let text = "hello?";

        // when (操作):
        let frame = parse_server_frame(text);

        // then (期待する結果):
        assert_eq!(frame, ServerFrame::Unknown("hello?".to_string()));
    }

    #[test]
    fn test_outbound_frame_has_body_only() {
        // テスト項目: 送信フレームには本文だけが含まれ、送信者は含まれない
        // given (前提条件):
        let line = "good morning";

        // when (操作):
        let json = outbound_frame(line, MAX_FRAME_BYTES).unwrap();

        // then (期待する結果):
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({"body": "good morning"}));
    }

    #[test]
    fn test_outbound_frame_rejects_oversized_line() {
        // テスト項目: エンコード後に上限を超える行は送信前に拒否される
        // given (前提条件):
        let line = "x".repeat(MAX_FRAME_BYTES);

        // when (操作):
        let result = outbound_frame(&line, MAX_FRAME_BYTES);

        // then (期待する結果): {"body":"..."} の 11 バイト分だけ上限を超える
        match result {
            Err(OutboundFrameError::TooLarge { max, actual }) => {
                assert_eq!(max, MAX_FRAME_BYTES);
                assert_eq!(actual, MAX_FRAME_BYTES + 11);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_outbound_frame_limit_counts_escaped_bytes() {
        // テスト項目: 上限は入力行ではなく、エスケープ後のフレーム長に対して判定される
        // given (前提条件): 引用符はエスケープで 2 バイトになる
        let line = "\"".repeat(10);

        // when (操作):
        let exact = outbound_frame(&line, 31);
        let short = outbound_frame(&line, 30);

        // then (期待する結果):
        assert_eq!(exact.unwrap().len(), 31);
        assert!(matches!(
            short,
            Err(OutboundFrameError::TooLarge { max: 30, actual: 31 })
        ));
    }

    #[test]
    fn test_should_exit_immediately_when_unauthorized() {
        // テスト項目: Unauthorized エラーの場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::Unauthorized;

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_exit_immediately_with_connection_error() {
        // テスト項目: ConnectionError の場合、即座に終了すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_when_unauthorized() {
        // テスト項目: Unauthorized エラーの場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::Unauthorized;

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 再接続回数が上限未満の場合、再接続すべきと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 4, 5);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_attempt_reconnect_at_limit() {
        // テスト項目: 再接続回数が上限に達した場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 5, 5);

        // then (期待する結果):
        assert!(!result);
    }
}
