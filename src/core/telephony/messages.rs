//! Media-stream protocol spoken by the telephony platform.
//!
//! Inbound frames are discriminated by the `event` field. Audio payloads are
//! base64 strings that the bridge relays untouched.
//!
//! # Protocol Overview
//!
//! Platform events (received):
//! - connected - Socket accepted by the platform
//! - start - Stream metadata, carries the `streamSid`
//! - media - Audio chunk from the caller
//! - mark - Playback reached a mark we sent
//! - stop - Stream ended
//!
//! Bridge events (sent):
//! - media - Audio chunk for the caller, addressed by `streamSid`
//! - mark - Synchronisation marker following each audio chunk

use serde::{Deserialize, Serialize};

// =============================================================================
// Inbound Events
// =============================================================================

/// Events received from the telephony platform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyEvent {
    /// Socket accepted
    Connected,

    /// Stream started
    Start {
        /// Stream metadata
        start: StreamStart,
    },

    /// Caller audio
    Media {
        /// Audio payload
        media: MediaPayload,
    },

    /// Mark acknowledgement
    Mark,

    /// Stream stopped
    Stop,

    /// Any event the bridge does not act on
    #[serde(other)]
    Unhandled,
}

/// Metadata carried by a `start` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StreamStart {
    /// Identifier of the call leg's stream
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
    /// Call identifier, when the platform provides one
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
}

/// Audio chunk in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaPayload {
    /// Base64-encoded audio, opaque to the bridge
    pub payload: String,
}

// =============================================================================
// Outbound Events
// =============================================================================

/// Events sent to the telephony platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyCommand {
    /// Audio for the caller
    Media {
        /// Target stream
        #[serde(rename = "streamSid", skip_serializing_if = "Option::is_none")]
        stream_sid: Option<String>,
        /// Audio payload
        media: MediaPayload,
    },

    /// Sync marker after an audio chunk
    Mark {
        /// Target stream
        #[serde(rename = "streamSid", skip_serializing_if = "Option::is_none")]
        stream_sid: Option<String>,
    },
}

impl TelephonyCommand {
    /// Audio frame addressed to a stream.
    pub fn media(stream_sid: Option<String>, payload: String) -> Self {
        TelephonyCommand::Media {
            stream_sid,
            media: MediaPayload { payload },
        }
    }

    /// Mark frame addressed to a stream.
    pub fn mark(stream_sid: Option<String>) -> Self {
        TelephonyCommand::Mark { stream_sid }
    }
}
