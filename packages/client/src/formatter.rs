//! Message formatting utilities for client display.

use mchat_server::infrastructure::dto::websocket::{ChatMessageDto, ErrorNoticeDto};
use mchat_shared::time::parse_rfc3339;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a relayed chat message
    ///
    /// # Arguments
    ///
    /// * `message` - The chat frame from the server
    /// * `current_username` - The local user, marked as "(me)" when known
    pub fn format_chat_message(message: &ChatMessageDto, current_username: Option<&str>) -> String {
        let me_suffix = if current_username == Some(message.sender.as_str()) {
            " (me)"
        } else {
            ""
        };
        format!(
            "\n\n------------------------------------------------------------\n\
             @{}{}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            message.sender,
            me_suffix,
            message.body,
            Self::format_timestamp(&message.timestamp)
        )
    }

    /// Format an error notice addressed to this client
    pub fn format_error_notice(notice: &ErrorNoticeDto) -> String {
        format!("\n! {}\n", notice.reason)
    }

    /// Format a local notice about an input line that was not sent
    pub fn format_local_notice(reason: &str) -> String {
        format!("\n! {}\n", reason)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Render a server timestamp as `YYYY-MM-DD HH:MM UTC`, or verbatim if unparseable
    pub fn format_timestamp(timestamp: &str) -> String {
        match parse_rfc3339(timestamp) {
            Some(instant) => instant.format("%Y-%m-%d %H:%M UTC").to_string(),
            None => timestamp.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mchat_server::infrastructure::dto::websocket::MessageType;

    fn chat(sender: &str, body: &str) -> ChatMessageDto {
        ChatMessageDto {
            r#type: MessageType::Chat,
            sender: sender.to_string(),
            body: body.to_string(),
            timestamp: "2024-06-01T09:41:00Z".to_string(),
        }
    }

    #[test]
    fn test_format_chat_message() {
        // テスト項目: チャットメッセージが正しくフォーマットされる
        // given (前提条件):
        let message = chat("alice", "Hello, world!");

        // when (操作):
        let result = MessageFormatter::format_chat_message(&message, Some("bob"));

        // then (期待する結果):
        assert!(result.contains("@alice: Hello, world!"));
        assert!(result.contains("sent at 2024-06-01 09:41 UTC"));
        assert!(!result.contains("(me)"));
    }

    #[test]
    fn test_format_chat_message_marks_own_message() {
        // テスト項目: 自分のメッセージには (me) が付く
        // given (前提条件):
        let message = chat("alice", "echo");

        // when (操作):
        let result = MessageFormatter::format_chat_message(&message, Some("alice"));

        // then (期待する結果):
        assert!(result.contains("@alice (me): echo"));
    }

    #[test]
    fn test_format_timestamp_falls_back_to_raw() {
        // テスト項目: 解釈できないタイムスタンプはそのまま表示される
        // given (前提条件):
        let timestamp = "yesterday";

        // when (操作):
        let result = MessageFormatter::format_timestamp(timestamp);

        // then (期待する結果):
        assert_eq!(result, "yesterday");
    }

    #[test]
    fn test_format_error_notice() {
        // テスト項目: エラー通知が正しくフォーマットされる
        // given (前提条件):
        let notice = ErrorNoticeDto {
            r#type: MessageType::Error,
            reason: "message could not be persisted".to_string(),
        };

        // when (操作):
        let result = MessageFormatter::format_error_notice(&notice);

        // then (期待する結果):
        assert!(result.contains("! message could not be persisted"));
    }

    #[test]
    fn test_format_local_notice() {
        // テスト項目: 送信しなかった行の通知がエラー通知と同じ形式で表示される
        // given (前提条件):
        let reason = "message not sent: 2000 bytes once encoded, the limit is 1024";

        // when (操作):
        let result = MessageFormatter::format_local_notice(reason);

        // then (期待する結果):
        assert_eq!(result, format!("\n! {}\n", reason));
    }

    #[test]
    fn test_format_raw_and_binary_messages() {
        // テスト項目: 生メッセージとバイナリ通知が正しくフォーマットされる
        // given (前提条件):
        let text = "unknown message format";

        // when (操作):
        let raw = MessageFormatter::format_raw_message(text);
        let binary = MessageFormatter::format_binary_message(1024);

        // then (期待する結果):
        assert!(raw.contains("Received: unknown message format"));
        assert!(binary.contains("1024 bytes"));
    }
}
