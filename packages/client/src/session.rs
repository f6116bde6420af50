//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, client::IntoClientRequest, http::header, protocol::Message},
};

use crate::{
    domain::{MAX_FRAME_BYTES, ServerFrame, outbound_frame, parse_server_frame},
    error::{ClientError, OutboundFrameError},
    formatter::MessageFormatter,
    ui::{prompt, redisplay_prompt},
};

/// Label used for the prompt when the username is not known locally
const ANONYMOUS_PROMPT: &str = "me";

/// How one session ended
#[derive(Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user closed stdin or pressed Ctrl+C
    UserExit,
}

/// Run the WebSocket client session
///
/// The token is offered as the `Sec-WebSocket-Protocol` value; the server
/// answers `401` when it is missing, expired or forged.
pub async fn run_client_session(
    url: &str,
    token: &str,
    username: Option<&str>,
) -> Result<SessionEnd, ClientError> {
    let mut request = url
        .into_client_request()
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    let protocol: header::HeaderValue = token
        .parse()
        .map_err(|_| ClientError::ConnectionError("token is not a valid header value".to_string()))?;
    request
        .headers_mut()
        .insert(header::SEC_WEBSOCKET_PROTOCOL, protocol);

    let (ws_stream, _response) = match connect_async(request).await {
        Ok(result) => result,
        Err(tungstenite::Error::Http(response)) if response.status() == 401 => {
            return Err(ClientError::Unauthorized);
        }
        Err(e) => return Err(ClientError::ConnectionError(e.to_string())),
    };

    let label = username.unwrap_or(ANONYMOUS_PROMPT).to_string();

    tracing::info!("Connected to chat server!");
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Press Ctrl+C to exit.\n",
        label
    );

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to handle incoming messages
    let label_for_read = label.clone();
    let username_for_read = username.map(str::to_string);
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            let formatted = match message {
                Ok(Message::Text(text)) => match parse_server_frame(text.as_str()) {
                    ServerFrame::Chat(chat) => {
                        MessageFormatter::format_chat_message(&chat, username_for_read.as_deref())
                    }
                    ServerFrame::Error(notice) => MessageFormatter::format_error_notice(&notice),
                    ServerFrame::Unknown(raw) => MessageFormatter::format_raw_message(&raw),
                },
                Ok(Message::Binary(data)) => MessageFormatter::format_binary_message(data.len()),
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    return ClientError::ConnectionError("closed by server".to_string());
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return ClientError::ConnectionError(e.to_string());
                }
            };
            print!("{}", formatted);
            redisplay_prompt(&label_for_read);
        }
        ClientError::ConnectionError("connection lost".to_string())
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt_text = prompt(&label);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt_text) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    // Spawn a task to handle stdin input and send to WebSocket
    let label_for_write = label.clone();
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            let json = match outbound_frame(&line, MAX_FRAME_BYTES) {
                Ok(json) => json,
                // Sending it would get this connection closed by the server
                Err(e @ OutboundFrameError::TooLarge { .. }) => {
                    tracing::debug!("Skipping oversized line: {}", e);
                    print!("{}", MessageFormatter::format_local_notice(&e.to_string()));
                    redisplay_prompt(&label_for_write);
                    continue;
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                return Err(ClientError::ConnectionError(e.to_string()));
            }
        }

        // Input closed by the user
        write.close().await.ok();
        Ok(())
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            Err(read_result.unwrap_or_else(|e| ClientError::ConnectionError(e.to_string())))
        }
        write_result = &mut write_task => {
            read_task.abort();
            match write_result {
                Ok(Ok(())) => Ok(SessionEnd::UserExit),
                Ok(Err(e)) => Err(e),
                Err(e) => Err(ClientError::ConnectionError(e.to_string())),
            }
        }
    }
}
