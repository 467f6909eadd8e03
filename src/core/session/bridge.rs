//! The call session: one phone call bridged to one model connection.
//!
//! A session runs as a single task. Its event loop multiplexes the telephony
//! frames, the model frames, the pending model connect and the results of tool
//! calls, so no two events of one call are ever handled at the same time.
//!
//! Lifecycle: `Init -> ModelConnecting -> Active -> Closing -> Closed`.
//! Either connection closing ends the session and closes the other one.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace};
use uuid::Uuid;

use crate::core::codec::{Outbound, decode, send};
use crate::core::realtime::openai::messages::ApiError;
use crate::core::realtime::openai::{ClientEvent, OutputItem, ServerEvent, SessionConfig};
use crate::core::realtime::{
    FunctionCallRequest, ModelConnector, RealtimeError, TranscriptRole,
};
use crate::core::telephony::{TelephonyCommand, TelephonyEvent};
use crate::core::tools::ToolDispatcher;

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    ModelConnecting,
    Active,
    Closing,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Init => "init",
            SessionState::ModelConnecting => "model_connecting",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// One completed transcription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub id: String,
    pub role: TranscriptRole,
    pub content: String,
}

/// Why a session ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The caller hung up or the platform closed the stream
    TelephonyClosed,
    /// The model connection closed on its own
    ModelClosed,
}

/// What is left of a session once it has closed.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub key: String,
    pub stream_sid: Option<String>,
    pub history: Vec<TranscriptEntry>,
    pub reason: CloseReason,
}

/// Errors that end a session abnormally.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Model connection failed: {0}")]
    ModelConnect(#[from] RealtimeError),

    #[error("Model reported an error: {0}")]
    ModelReported(ApiError),
}

/// A finished tool call waiting to be returned to the model.
#[derive(Debug)]
struct Completion {
    call_id: String,
    output: Value,
}

/// Bridge between one telephony connection and one model connection.
pub struct CallSession {
    key: String,
    state: SessionState,
    stream_sid: Option<String>,
    history: Vec<TranscriptEntry>,
    telephony: Outbound,
    model: Option<Outbound>,
    dispatcher: ToolDispatcher,
    session_config: SessionConfig,
}

impl CallSession {
    /// Create a session for an accepted media-stream connection.
    ///
    /// `telephony` is the sending half of the telephony socket; the receiving
    /// half is handed to [`CallSession::run`].
    pub fn new(
        key: impl Into<String>,
        telephony: Outbound,
        dispatcher: ToolDispatcher,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            key: key.into(),
            state: SessionState::Init,
            stream_sid: None,
            history: Vec::new(),
            telephony,
            model: None,
            dispatcher,
            session_config,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session until either connection closes or the model fails.
    pub async fn run(
        mut self,
        mut telephony_in: mpsc::Receiver<String>,
        connector: Arc<dyn ModelConnector>,
    ) -> Result<SessionSummary, SessionError> {
        self.transition(SessionState::ModelConnecting);

        let mut connect = connector.connect();
        let mut model_in: Option<mpsc::Receiver<String>> = None;
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Completion>();

        let outcome = loop {
            tokio::select! {
                result = &mut connect, if self.state == SessionState::ModelConnecting => {
                    match result {
                        Ok(link) => {
                            self.model = Some(link.outbound);
                            model_in = Some(link.inbound);
                            self.activate().await;
                        }
                        Err(e) => {
                            error!(session_key = %self.key, "Failed to connect to model: {}", e);
                            break Err(SessionError::ModelConnect(e));
                        }
                    }
                }

                frame = telephony_in.recv() => {
                    match frame {
                        Some(raw) => self.on_telephony_frame(&raw).await,
                        None => {
                            info!(session_key = %self.key, "Telephony connection closed");
                            break Ok(CloseReason::TelephonyClosed);
                        }
                    }
                }

                frame = next_frame(&mut model_in) => {
                    match frame {
                        Some(raw) => {
                            if let Err(e) = self.on_model_frame(&raw, &done_tx).await {
                                break Err(e);
                            }
                        }
                        None => {
                            info!(session_key = %self.key, "Model connection closed");
                            break Ok(CloseReason::ModelClosed);
                        }
                    }
                }

                Some(done) = done_rx.recv() => self.deliver(done).await,
            }
        };

        self.shutdown();

        outcome.map(|reason| SessionSummary {
            key: self.key,
            stream_sid: self.stream_sid,
            history: self.history,
            reason,
        })
    }

    fn transition(&mut self, next: SessionState) {
        debug!(session_key = %self.key, from = %self.state, to = %next, "Session state change");
        self.state = next;
    }

    async fn activate(&mut self) {
        self.transition(SessionState::Active);
        if let Some(model) = &self.model {
            let update = ClientEvent::SessionUpdate {
                session: self.session_config.clone(),
            };
            send(model, &update).await;
        }
    }

    fn shutdown(&mut self) {
        self.transition(SessionState::Closing);
        if let Some(model) = self.model.take() {
            model.close();
        }
        self.telephony.close();
        self.transition(SessionState::Closed);
    }

    // -------------------------------------------------------------------------
    // Telephony -> model
    // -------------------------------------------------------------------------

    async fn on_telephony_frame(&mut self, raw: &str) {
        let Some(event) = decode::<TelephonyEvent>(raw) else {
            return;
        };

        match event {
            TelephonyEvent::Start { start } => {
                if let Some(current) = &self.stream_sid {
                    debug!(session_key = %self.key, stream_sid = %current, "Ignoring repeated start event");
                    return;
                }
                info!(
                    session_key = %self.key,
                    stream_sid = %start.stream_sid,
                    call_sid = ?start.call_sid,
                    "Media stream started"
                );
                self.stream_sid = Some(start.stream_sid);
            }
            TelephonyEvent::Media { media } => match (&self.state, &self.model) {
                (SessionState::Active, Some(model)) => {
                    let append = ClientEvent::InputAudioBufferAppend {
                        audio: media.payload,
                    };
                    send(model, &append).await;
                }
                _ => trace!(session_key = %self.key, "Model not ready, dropping caller audio"),
            },
            TelephonyEvent::Stop => {
                debug!(session_key = %self.key, "Media stream stopped");
            }
            TelephonyEvent::Connected | TelephonyEvent::Mark | TelephonyEvent::Unhandled => {}
        }
    }

    // -------------------------------------------------------------------------
    // Model -> telephony
    // -------------------------------------------------------------------------

    async fn on_model_frame(
        &mut self,
        raw: &str,
        done_tx: &mpsc::UnboundedSender<Completion>,
    ) -> Result<(), SessionError> {
        let Some(event) = decode::<ServerEvent>(raw) else {
            return Ok(());
        };

        match event {
            ServerEvent::Error { error } => {
                error!(session_key = %self.key, "Model reported an error: {}", error);
                return Err(SessionError::ModelReported(error));
            }
            ServerEvent::SessionCreated { session } => {
                debug!(session_key = %self.key, model_session = ?session.id, "Model session created");
            }
            ServerEvent::SessionUpdated { .. } => {
                debug!(session_key = %self.key, "Model session updated");
            }
            ServerEvent::TranscriptionCompleted { transcript, .. } => {
                self.record(TranscriptRole::User, transcript);
            }
            ServerEvent::AudioTranscriptDone { transcript, .. } => {
                self.record(TranscriptRole::Assistant, transcript);
            }
            ServerEvent::AudioDelta { delta, .. } => {
                let sid = self.stream_sid.clone();
                send(&self.telephony, &TelephonyCommand::media(sid.clone(), delta)).await;
                send(&self.telephony, &TelephonyCommand::mark(sid)).await;
            }
            ServerEvent::OutputItemDone {
                item:
                    OutputItem::FunctionCall {
                        name,
                        call_id,
                        arguments,
                    },
            } => {
                self.spawn_dispatch(
                    FunctionCallRequest {
                        call_id,
                        name,
                        arguments,
                    },
                    done_tx.clone(),
                );
            }
            ServerEvent::OutputItemDone {
                item: OutputItem::Other,
            }
            | ServerEvent::Unhandled => {}
        }

        Ok(())
    }

    fn record(&mut self, role: TranscriptRole, content: String) {
        debug!(session_key = %self.key, %role, "Transcript: {}", content);
        self.history.push(TranscriptEntry {
            id: Uuid::new_v4().to_string(),
            role,
            content,
        });
    }

    // -------------------------------------------------------------------------
    // Tool calls
    // -------------------------------------------------------------------------

    fn spawn_dispatch(&self, request: FunctionCallRequest, done_tx: mpsc::UnboundedSender<Completion>) {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            let output = dispatcher.dispatch(&request).await;
            // Fails only once the session has ended.
            let _ = done_tx.send(Completion {
                call_id: request.call_id,
                output,
            });
        });
    }

    async fn deliver(&mut self, done: Completion) {
        let Some(model) = self.model.as_ref().filter(|m| m.is_open()) else {
            debug!(session_key = %self.key, call_id = %done.call_id, "Model connection gone, dropping function result");
            return;
        };

        let item = ClientEvent::function_call_output(done.call_id, done.output.to_string());
        send(model, &item).await;
        send(model, &ClientEvent::ResponseCreate).await;
    }
}

/// Next frame from an optional receiver. Pends forever while there is none.
async fn next_frame(rx: &mut Option<mpsc::Receiver<String>>) -> Option<String> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
