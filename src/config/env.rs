use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::validation::tls_from_paths;
use super::{ConfigError, ServerConfig};
use crate::core::realtime::openai::OpenAIRealtimeAudioFormat;

/// Read a variable, treating blank values as unset.
pub(super) fn env_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    env_var(name)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                name,
                message: format!("'{raw}': {e}"),
            })
        })
        .transpose()
}

/// Split a comma-separated list, dropping empty entries.
pub(super) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub(super) fn parse_audio_format(
    name: &'static str,
    raw: &str,
) -> Result<OpenAIRealtimeAudioFormat, ConfigError> {
    OpenAIRealtimeAudioFormat::parse(raw).ok_or_else(|| ConfigError::InvalidValue {
        name,
        message: format!("unsupported audio format '{raw}'"),
    })
}

/// Build a configuration from environment variables over the defaults.
pub fn load_from_env() -> Result<ServerConfig, ConfigError> {
    let mut config = ServerConfig::default();

    if let Some(host) = env_var("HOST") {
        config.host = host;
    }
    if let Some(port) = parse_env::<u16>("PORT")? {
        config.port = port;
    }
    config.tls = tls_from_paths(
        env_var("TLS_CERT_PATH").map(PathBuf::from),
        env_var("TLS_KEY_PATH").map(PathBuf::from),
    )?;
    config.public_host = env_var("PUBLIC_HOST");

    if let Some(name) = env_var("AGENT_NAME") {
        config.agent_name = name;
    }
    if let Some(key) = env_var("AGENT_ROUTING_KEY") {
        config.agent_routing_key = key;
    }

    config.openai_api_key = env_var("OPENAI_API_KEY");
    if let Some(url) = env_var("OPENAI_REALTIME_URL") {
        config.openai_realtime_url = url;
    }
    if let Some(model) = env_var("OPENAI_REALTIME_MODEL") {
        config.openai_realtime_model = model;
    }
    if let Some(voice) = env_var("OPENAI_VOICE") {
        config.openai_voice = voice;
    }
    if let Some(model) = env_var("TRANSCRIPTION_MODEL") {
        config.transcription_model = model;
    }
    if let Some(language) = env_var("TRANSCRIPTION_LANGUAGE") {
        config.transcription_language = Some(language);
    }
    if let Some(format) = env_var("AUDIO_FORMAT") {
        config.audio_format = parse_audio_format("AUDIO_FORMAT", &format)?;
    }
    config.instructions_path = env_var("INSTRUCTIONS_PATH").map(PathBuf::from);

    if let Some(url) = env_var("MCP_SERVER_URL") {
        config.mcp_server_url = url;
    }
    config.mcp_api_key = env_var("STRIPE_API_KEY");
    if let Some(tools) = env_var("ALLOWED_TOOLS") {
        config.allowed_tools = parse_list(&tools);
    }

    config.resend_api_key = env_var("RESEND_API_KEY");
    config.resend_from_email = env_var("RESEND_FROM_EMAIL");
    if let Some(url) = env_var("RESEND_API_URL") {
        config.resend_api_url = url;
    }

    config.cors_allowed_origins = env_var("CORS_ALLOWED_ORIGINS");
    if let Some(rps) = parse_env::<u32>("RATE_LIMIT_REQUESTS_PER_SECOND")? {
        config.rate_limit_requests_per_second = rps;
    }
    if let Some(burst) = parse_env::<u32>("RATE_LIMIT_BURST_SIZE")? {
        config.rate_limit_burst_size = burst;
    }

    Ok(config)
}
