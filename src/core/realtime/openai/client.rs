//! OpenAI Realtime API connector.
//!
//! Opens the WebSocket, then hands the session an [`Outbound`] handle and a
//! channel of raw server frames. The socket is split between a reader task that
//! forwards server text frames and a writer task that writes queued client
//! events and pongs, so a slow consumer of server frames never stalls writes.
//!
//! # API Reference
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Protocol: WebSocket with JSON events
//! - Audio: passed through base64 encoded, format chosen by `session.update`

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use http::HeaderValue;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tracing::{debug, error, info, warn};

use super::config::OpenAIRealtimeConfig;
use crate::core::codec::{Outbound, OutboundFrame, binary_text};
use crate::core::realtime::base::{ModelConnector, ModelLink, RealtimeError, RealtimeResult};

/// Channel capacity for WebSocket messages in both directions.
const WS_CHANNEL_CAPACITY: usize = 256;

/// Pending control frames (pongs) queued for the writer.
const CONTROL_CHANNEL_CAPACITY: usize = 8;

/// Connects call sessions to the OpenAI Realtime API.
#[derive(Debug, Clone)]
pub struct OpenAIRealtimeConnector {
    config: Arc<OpenAIRealtimeConfig>,
}

impl OpenAIRealtimeConnector {
    /// Create a connector. Fails when no API key is configured.
    pub fn new(config: Arc<OpenAIRealtimeConfig>) -> RealtimeResult<Self> {
        if config.api_key.is_empty() {
            return Err(RealtimeError::AuthenticationFailed(
                "API key is required".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Connection settings.
    pub fn config(&self) -> &OpenAIRealtimeConfig {
        &self.config
    }
}

#[async_trait]
impl ModelConnector for OpenAIRealtimeConnector {
    async fn connect(&self) -> RealtimeResult<ModelLink> {
        let url = self.config.ws_url();

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|e| RealtimeError::InvalidConfiguration(e.to_string()))?;
        request.headers_mut().insert("Authorization", bearer);
        request
            .headers_mut()
            .insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| RealtimeError::ConnectionFailed(e.to_string()))?;

        info!(model = %self.config.model, "Connected to OpenAI Realtime API");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (outbound, mut outbound_rx) = Outbound::channel(WS_CHANNEL_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel::<String>(WS_CHANNEL_CAPACITY);
        // Pongs from the reader, written by the writer
        let (control_tx, mut control_rx) = mpsc::channel::<Message>(CONTROL_CHANNEL_CAPACITY);

        // The reader may wait on a full inbound channel; it never holds up writes.
        let reader = tokio::spawn(async move {
            while let Some(msg) = ws_stream.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text.as_str().to_owned(),
                    Ok(Message::Binary(data)) => match binary_text(&data) {
                        Some(text) => text,
                        None => continue,
                    },
                    Ok(Message::Ping(data)) => {
                        if control_tx.try_send(Message::Pong(data)).is_err() {
                            debug!("Writer busy, dropping pong");
                        }
                        continue;
                    }
                    Ok(Message::Close(_)) => {
                        info!("WebSocket closed by server");
                        break;
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                };
                if inbound_tx.send(text).await.is_err() {
                    debug!("Session gone, stopping model reader");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = outbound_rx.recv() => {
                        match frame {
                            Some(OutboundFrame::Text(json)) => {
                                if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                                    error!("Failed to send WebSocket message: {}", e);
                                    break;
                                }
                            }
                            Some(OutboundFrame::Close) | None => {
                                debug!("Closing OpenAI Realtime connection");
                                let _ = ws_sink.send(Message::Close(None)).await;
                                break;
                            }
                        }
                    }

                    control = control_rx.recv() => {
                        match control {
                            Some(pong) => {
                                if let Err(e) = ws_sink.send(pong).await {
                                    error!("Failed to send pong: {}", e);
                                }
                            }
                            // Reader finished: the socket is done
                            None => {
                                let _ = ws_sink.send(Message::Close(None)).await;
                                break;
                            }
                        }
                    }
                }
            }

            outbound_rx.mark_closed();
            reader.abort();
        });

        Ok(ModelLink {
            outbound,
            inbound: inbound_rx,
        })
    }
}
