//! OpenAI Realtime API WebSocket message types.
//!
//! This module defines the client and server events the bridge exchanges with
//! the Realtime API. All events are JSON-encoded and discriminated by `type`.
//!
//! # Protocol Overview
//!
//! Client events (sent to server):
//! - session.update - Configure instructions, audio formats, voice and tools
//! - input_audio_buffer.append - Append caller audio to the input buffer
//! - conversation.item.create - Add a function call result to the conversation
//! - response.create - Ask the model to continue generating
//!
//! Server events (acted on):
//! - error - Error occurred
//! - session.created / session.updated - Session lifecycle
//! - conversation.item.input_audio_transcription.completed - Caller transcript
//! - response.audio_transcript.done - Assistant transcript
//! - response.audio.delta - Audio data chunk
//! - response.output_item.done - Output item complete (may be a function call)
//!
//! Every other server event decodes to [`ServerEvent::Unhandled`].

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration for OpenAI Realtime API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// System instructions for the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Response modalities (text, audio)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,

    /// Turn detection configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    /// Voice for audio output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Input audio transcription configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,

    /// Input audio format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<String>,

    /// Output audio format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,

    /// Tool definitions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDef>>,
}

/// Input audio transcription configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// Transcription model (e.g., "gpt-4o-transcribe")
    pub model: String,
    /// Spoken language hint (ISO-639-1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Turn detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    /// Server-side VAD
    #[serde(rename = "server_vad")]
    ServerVad {
        /// Activation threshold
        #[serde(default, skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
        /// Audio prefix padding in ms
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix_padding_ms: Option<u32>,
        /// Silence duration in ms
        #[serde(default, skip_serializing_if = "Option::is_none")]
        silence_duration_ms: Option<u32>,
    },
    /// Semantic VAD
    #[serde(rename = "semantic_vad")]
    SemanticVad {
        /// Eagerness level
        #[serde(default, skip_serializing_if = "Option::is_none")]
        eagerness: Option<String>,
    },
}

impl TurnDetection {
    /// Server VAD with the provider's defaults.
    pub fn server_vad() -> Self {
        TurnDetection::ServerVad {
            threshold: None,
            prefix_padding_ms: None,
            silence_duration_ms: None,
        }
    }
}

/// Tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function name
    pub name: String,
    /// Function description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Function parameters JSON schema
    pub parameters: serde_json::Value,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: SessionConfig,
    },

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio data, passed through as received
        audio: String,
    },

    /// Create a conversation item
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        /// Item to create
        item: ItemParam,
    },

    /// Create a response
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    /// Function call result item for `call_id`.
    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        ClientEvent::ConversationItemCreate {
            item: ItemParam::FunctionCallOutput {
                call_id: call_id.into(),
                output: output.into(),
            },
        }
    }
}

/// Conversation item created by the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemParam {
    /// Result of a function call
    FunctionCallOutput {
        /// Call ID the result belongs to
        call_id: String,
        /// JSON-encoded result
        output: String,
    },
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the OpenAI Realtime API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Error occurred
    #[serde(rename = "error")]
    Error {
        /// Error details
        #[serde(default)]
        error: ApiError,
    },

    /// Session created
    #[serde(rename = "session.created")]
    SessionCreated {
        /// Session information
        #[serde(default)]
        session: SessionInfo,
    },

    /// Session updated
    #[serde(rename = "session.updated")]
    SessionUpdated {
        /// Session information
        #[serde(default)]
        session: SessionInfo,
    },

    /// Input audio transcription completed
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    TranscriptionCompleted {
        /// Item ID
        #[serde(default)]
        item_id: Option<String>,
        /// Transcript text
        transcript: String,
    },

    /// Audio transcript done
    #[serde(rename = "response.audio_transcript.done")]
    AudioTranscriptDone {
        /// Item ID
        #[serde(default)]
        item_id: Option<String>,
        /// Full transcript
        transcript: String,
    },

    /// Audio delta (audio data chunk)
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        /// Item ID
        #[serde(default)]
        item_id: Option<String>,
        /// Base64-encoded audio delta
        delta: String,
    },

    /// Output item done
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        /// Item
        item: OutputItem,
    },

    /// Any other server event
    #[serde(other)]
    Unhandled,
}

/// Output item reported by `response.output_item.done`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// The model wants a function called
    FunctionCall {
        /// Function name
        name: String,
        /// Call ID
        call_id: String,
        /// JSON-encoded arguments
        #[serde(default)]
        arguments: String,
    },

    /// Messages and other item kinds
    #[serde(other)]
    Other,
}

// =============================================================================
// Supporting Types
// =============================================================================

/// API error information.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiError {
    /// Error type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Parameter that caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Event ID that caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.error_type.as_deref().unwrap_or("error");
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "{kind} ({code}): {message}"),
            (None, Some(message)) => write!(f, "{kind}: {message}"),
            (Some(code), None) => write!(f, "{kind} ({code})"),
            (None, None) => write!(f, "{kind}"),
        }
    }
}

/// Session information.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionInfo {
    /// Session ID
    pub id: Option<String>,
    /// Model used
    pub model: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::codec::decode;
    use serde_json::json;

    #[test]
    fn test_audio_append_serialization() {
        let event = ClientEvent::InputAudioBufferAppend {
            audio: "AAAA".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "input_audio_buffer.append", "audio": "AAAA"})
        );
    }

    #[test]
    fn test_response_create_serialization() {
        let json = serde_json::to_string(&ClientEvent::ResponseCreate).unwrap();
        assert_eq!(json, r#"{"type":"response.create"}"#);
    }

    #[test]
    fn test_function_call_output_serialization() {
        let event = ClientEvent::function_call_output("C1", r#"{"ok":true}"#);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "conversation.item.create",
                "item": {"type": "function_call_output", "call_id": "C1", "output": "{\"ok\":true}"}
            })
        );
    }

    #[test]
    fn test_session_update_serialization() {
        let event = ClientEvent::SessionUpdate {
            session: SessionConfig {
                modalities: Some(vec!["text".to_string(), "audio".to_string()]),
                voice: Some("ash".to_string()),
                turn_detection: Some(TurnDetection::server_vad()),
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"]["voice"], "ash");
        assert_eq!(value["session"]["turn_detection"], json!({"type": "server_vad"}));
        assert!(value["session"].get("tools").is_none());
    }

    #[test]
    fn test_error_event_deserialization() {
        let event: ServerEvent = decode(
            r#"{"type":"error","event_id":"e1","error":{"type":"invalid_request_error","code":"bad","message":"Test error"}}"#,
        )
        .unwrap();
        match event {
            ServerEvent::Error { error } => {
                assert_eq!(error.message.as_deref(), Some("Test error"));
                assert_eq!(error.to_string(), "invalid_request_error (bad): Test error");
            }
            other => panic!("Wrong event type: {:?}", other),
        }
    }

    #[test]
    fn test_error_event_without_details() {
        let event: ServerEvent = decode(r#"{"type":"error"}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::Error {
                error: ApiError::default()
            }
        );
    }

    #[test]
    fn test_minimal_audio_delta() {
        let event: ServerEvent = decode(r#"{"type":"response.audio.delta","delta":"BBBB"}"#).unwrap();
        assert_eq!(
            event,
            ServerEvent::AudioDelta {
                item_id: None,
                delta: "BBBB".to_string()
            }
        );
    }

    #[test]
    fn test_function_call_item_done() {
        let event: ServerEvent = decode(
            r#"{"type":"response.output_item.done","response_id":"r1","output_index":0,
                "item":{"id":"i1","type":"function_call","status":"completed","name":"list_products","call_id":"C1","arguments":"{}"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ServerEvent::OutputItemDone {
                item: OutputItem::FunctionCall {
                    name: "list_products".to_string(),
                    call_id: "C1".to_string(),
                    arguments: "{}".to_string(),
                }
            }
        );
    }

    #[test]
    fn test_message_item_done_is_other() {
        let event: ServerEvent = decode(
            r#"{"type":"response.output_item.done","item":{"type":"message","role":"assistant","content":[]}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ServerEvent::OutputItemDone {
                item: OutputItem::Other
            }
        );
    }

    #[test]
    fn test_unknown_server_event() {
        let event: ServerEvent =
            decode(r#"{"type":"rate_limits.updated","rate_limits":[]}"#).unwrap();
        assert_eq!(event, ServerEvent::Unhandled);
    }

    #[test]
    fn test_transcription_events() {
        let user: ServerEvent = decode(
            r#"{"type":"conversation.item.input_audio_transcription.completed","item_id":"i1","content_index":0,"transcript":"hello"}"#,
        )
        .unwrap();
        assert!(matches!(user, ServerEvent::TranscriptionCompleted { ref transcript, .. } if transcript == "hello"));

        let assistant: ServerEvent =
            decode(r#"{"type":"response.audio_transcript.done","transcript":"hi there"}"#).unwrap();
        assert!(matches!(assistant, ServerEvent::AudioTranscriptDone { ref transcript, .. } if transcript == "hi there"));
    }
}
