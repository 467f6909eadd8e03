//! Realtime speech model connections.
//!
//! # Architecture
//!
//! - [`ModelConnector`] opens a connection and returns a [`ModelLink`]
//! - [`openai`] implements it against the OpenAI Realtime API
//! - Call sessions decode the inbound frames with [`openai::ServerEvent`]

mod base;
pub mod openai;

pub use base::{
    FunctionCallRequest, ModelConnector, ModelLink, RealtimeError, RealtimeResult,
    TranscriptRole,
};
pub use openai::{OpenAIRealtimeAudioFormat, OpenAIRealtimeConfig, OpenAIRealtimeConnector};
