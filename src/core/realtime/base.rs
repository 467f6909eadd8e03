//! Base traits and types for the realtime model connection.
//!
//! A call session never talks to a socket directly. It asks a [`ModelConnector`]
//! for a [`ModelLink`]: an [`Outbound`] handle for client events plus a channel of
//! raw inbound text frames. The OpenAI implementation lives in [`super::openai`];
//! tests plug in in-memory connectors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::core::codec::Outbound;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while establishing or using the model connection.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Shared Types
// =============================================================================

/// Role of the speaker in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptRole {
    /// User speech transcript
    User,
    /// Assistant speech transcript
    Assistant,
}

impl fmt::Display for TranscriptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptRole::User => write!(f, "user"),
            TranscriptRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Function call request from the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallRequest {
    /// Call ID for the function call
    pub call_id: String,
    /// Function name
    pub name: String,
    /// JSON arguments, as emitted by the model
    pub arguments: String,
}

// =============================================================================
// Connection
// =============================================================================

/// An open model connection.
#[derive(Debug)]
pub struct ModelLink {
    /// Client events go here
    pub outbound: Outbound,
    /// Raw server frames, closed when the socket closes
    pub inbound: mpsc::Receiver<String>,
}

/// Opens model connections.
///
/// Completion of [`ModelConnector::connect`] is the connection's "open" event.
#[async_trait]
pub trait ModelConnector: Send + Sync {
    /// Open a new connection to the realtime model.
    async fn connect(&self) -> RealtimeResult<ModelLink>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_role_display() {
        assert_eq!(TranscriptRole::User.to_string(), "user");
        assert_eq!(TranscriptRole::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_transcript_role_serialization() {
        assert_eq!(
            serde_json::to_string(&TranscriptRole::Assistant).unwrap(),
            r#""assistant""#
        );
    }

    #[test]
    fn test_error_display() {
        let err = RealtimeError::ConnectionFailed("test".to_string());
        assert!(err.to_string().contains("Connection failed"));

        let err = RealtimeError::AuthenticationFailed("API key is required".to_string());
        assert_eq!(
            err.to_string(),
            "Authentication failed: API key is required"
        );
    }
}
