//! OpenAI Realtime API configuration types.
//!
//! This module contains:
//! - Endpoint and model defaults
//! - Audio format selection
//! - The per-agent connection settings used to open a model connection and
//!   to build its `session.update`

use serde::{Deserialize, Serialize};

use super::messages::{InputAudioTranscription, SessionConfig, ToolDef, TurnDetection};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default realtime model.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-realtime-mini-2025-12-15";

/// Default output voice.
pub const DEFAULT_VOICE: &str = "ash";

/// Default input transcription model.
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "gpt-4o-transcribe";

/// Default transcription language.
pub const DEFAULT_TRANSCRIPTION_LANGUAGE: &str = "en";

// =============================================================================
// Audio Formats
// =============================================================================

/// Supported audio formats for OpenAI Realtime API.
///
/// Telephony media streams carry 8kHz G.711 u-law, so that is the default here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAIRealtimeAudioFormat {
    /// PCM 16-bit signed little-endian
    Pcm16,
    /// G.711 u-law (8-bit)
    #[default]
    #[serde(rename = "g711_ulaw")]
    G711Ulaw,
    /// G.711 a-law (8-bit)
    #[serde(rename = "g711_alaw")]
    G711Alaw,
}

impl OpenAIRealtimeAudioFormat {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm16 => "pcm16",
            Self::G711Ulaw => "g711_ulaw",
            Self::G711Alaw => "g711_alaw",
        }
    }

    /// Parse from string. Returns `None` for unknown formats.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pcm16" | "pcm" | "linear16" => Some(Self::Pcm16),
            "g711_ulaw" | "ulaw" | "mulaw" => Some(Self::G711Ulaw),
            "g711_alaw" | "alaw" => Some(Self::G711Alaw),
            _ => None,
        }
    }
}

impl std::fmt::Display for OpenAIRealtimeAudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Connection Settings
// =============================================================================

/// Settings for connecting to the Realtime API and configuring each session.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAIRealtimeConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// WebSocket endpoint, without query string
    pub url: String,
    /// Model name appended as `?model=`
    pub model: String,
    /// Output voice
    pub voice: String,
    /// Input transcription model
    pub transcription_model: String,
    /// Input transcription language hint
    pub transcription_language: Option<String>,
    /// Audio format used for both directions
    pub audio_format: OpenAIRealtimeAudioFormat,
}

impl Default for OpenAIRealtimeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            transcription_language: Some(DEFAULT_TRANSCRIPTION_LANGUAGE.to_string()),
            audio_format: OpenAIRealtimeAudioFormat::default(),
        }
    }
}

impl OpenAIRealtimeConfig {
    /// Build the WebSocket URL with model parameter.
    pub fn ws_url(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}model={}", self.url, separator, self.model)
    }

    /// Build the `session.update` payload sent once the connection opens.
    pub fn session_config(&self, instructions: &str, tools: Vec<ToolDef>) -> SessionConfig {
        SessionConfig {
            instructions: Some(instructions.to_string()),
            modalities: Some(vec!["text".to_string(), "audio".to_string()]),
            turn_detection: Some(TurnDetection::server_vad()),
            voice: Some(self.voice.clone()),
            input_audio_transcription: Some(InputAudioTranscription {
                model: self.transcription_model.clone(),
                language: self.transcription_language.clone(),
            }),
            input_audio_format: Some(self.audio_format.as_str().to_string()),
            output_audio_format: Some(self.audio_format.as_str().to_string()),
            tools: Some(tools),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_audio_format_parse() {
        assert_eq!(
            OpenAIRealtimeAudioFormat::parse("g711_ulaw"),
            Some(OpenAIRealtimeAudioFormat::G711Ulaw)
        );
        assert_eq!(
            OpenAIRealtimeAudioFormat::parse("linear16"),
            Some(OpenAIRealtimeAudioFormat::Pcm16)
        );
        assert_eq!(OpenAIRealtimeAudioFormat::parse("opus"), None);
        assert_eq!(
            OpenAIRealtimeAudioFormat::default(),
            OpenAIRealtimeAudioFormat::G711Ulaw
        );
    }

    #[test]
    fn test_ws_url() {
        let config = OpenAIRealtimeConfig::default();
        assert_eq!(
            config.ws_url(),
            "wss://api.openai.com/v1/realtime?model=gpt-realtime-mini-2025-12-15"
        );

        let config = OpenAIRealtimeConfig {
            url: "ws://127.0.0.1:9000/v1/realtime?debug=1".to_string(),
            model: "test-model".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.ws_url(),
            "ws://127.0.0.1:9000/v1/realtime?debug=1&model=test-model"
        );
    }

    #[test]
    fn test_session_config() {
        let config = OpenAIRealtimeConfig::default();
        let tool = ToolDef {
            tool_type: "function".to_string(),
            name: "list_products".to_string(),
            description: Some("List products".to_string()),
            parameters: json!({"type": "object"}),
        };

        let session = config.session_config("Be brief.", vec![tool]);
        let value = serde_json::to_value(&session).unwrap();

        assert_eq!(value["instructions"], "Be brief.");
        assert_eq!(value["modalities"], json!(["text", "audio"]));
        assert_eq!(value["turn_detection"]["type"], "server_vad");
        assert_eq!(value["voice"], "ash");
        assert_eq!(
            value["input_audio_transcription"],
            json!({"model": "gpt-4o-transcribe", "language": "en"})
        );
        assert_eq!(value["input_audio_format"], "g711_ulaw");
        assert_eq!(value["output_audio_format"], "g711_ulaw");
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["name"], "list_products");
    }
}
