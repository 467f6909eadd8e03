//! OpenAI Realtime API module.
//!
//! Speech-to-speech model connection used by call sessions.
//!
//! # Features
//!
//! - Bidirectional audio streaming, relayed as opaque base64 payloads
//! - Input and output transcription
//! - Server-side voice activity detection
//! - Function calling
//!
//! # Audio Format
//!
//! Telephony audio is 8kHz G.711 u-law, which the API accepts directly, so
//! no transcoding happens on either side.

mod client;
mod config;
pub mod messages;

pub use client::OpenAIRealtimeConnector;
pub use config::{
    DEFAULT_REALTIME_MODEL, DEFAULT_TRANSCRIPTION_LANGUAGE, DEFAULT_TRANSCRIPTION_MODEL,
    DEFAULT_VOICE, OPENAI_REALTIME_URL, OpenAIRealtimeAudioFormat, OpenAIRealtimeConfig,
};
pub use messages::{ClientEvent, OutputItem, ServerEvent, SessionConfig, ToolDef};
