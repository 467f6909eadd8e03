//! Media-stream WebSocket handler
//!
//! The telephony platform connects here once a call has been answered. After the
//! agent instance behind the routing key is ready, the socket is split into a
//! writer task, a reader task, and the call session that bridges it to the model.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};
use tracing::{debug, error, info, warn};

use crate::core::codec::{Outbound, OutboundFrame, binary_text};
use crate::core::session::PreparedSession;
use crate::core::telephony::MEDIA_STREAM_SEGMENT;
use crate::state::AppState;

/// Channel buffer size for telephony frames
const CHANNEL_BUFFER_SIZE: usize = 1024;

/// Maximum WebSocket frame size (1 MB)
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// How long the writer may take to flush the close frame
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Media-stream WebSocket handler
///
/// Answers 404 unless the path names this agent, its routing key and ends in
/// `media-stream`, and 503 when the agent instance cannot discover its tools.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path((agent, routing_key, rest)): Path<(String, String, String)>,
) -> Response {
    if agent != state.sessions.agent_name()
        || routing_key != state.config.agent_routing_key
        || rest != MEDIA_STREAM_SEGMENT
    {
        debug!(agent = %agent, routing_key = %routing_key, rest = %rest, "No agent route");
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    }

    let prepared = match state.sessions.prepare(&routing_key).await {
        Ok(prepared) => prepared,
        Err(e) => {
            return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response();
        }
    };

    info!(session_key = %routing_key, "Media stream upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_socket(socket, state, routing_key, prepared))
}

async fn handle_media_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    routing_key: String,
    prepared: PreparedSession,
) {
    info!(session_key = %routing_key, "Media stream connected");

    let (mut sender, mut receiver) = socket.split();
    let (telephony, mut outbound_rx) = Outbound::channel(CHANNEL_BUFFER_SIZE);
    let (inbound_tx, inbound_rx) = mpsc::channel::<String>(CHANNEL_BUFFER_SIZE);

    let mut sender_task = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            match frame {
                OutboundFrame::Text(text) => {
                    if let Err(e) = sender.send(Message::Text(text.into())).await {
                        warn!("Failed to send telephony frame: {}", e);
                        break;
                    }
                }
                OutboundFrame::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
        outbound_rx.mark_closed();
    });

    let receiver_task = tokio::spawn(async move {
        while let Some(message) = receiver.next().await {
            let text = match message {
                Ok(Message::Text(text)) => text.as_str().to_owned(),
                Ok(Message::Binary(data)) => match binary_text(&data) {
                    Some(text) => text,
                    None => continue,
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    debug!("Telephony socket error: {}", e);
                    break;
                }
            };
            if inbound_tx.send(text).await.is_err() {
                break;
            }
        }
    });

    let session = state.sessions.open(&routing_key, telephony, prepared);
    match session.run(inbound_rx, state.sessions.connector()).await {
        Ok(summary) => info!(
            session_key = %summary.key,
            stream_sid = ?summary.stream_sid,
            transcript_entries = summary.history.len(),
            reason = ?summary.reason,
            "Call session ended"
        ),
        Err(e) => error!(session_key = %routing_key, "Call session failed: {}", e),
    }

    receiver_task.abort();
    if timeout(WRITER_DRAIN_TIMEOUT, &mut sender_task).await.is_err() {
        sender_task.abort();
    }
}
