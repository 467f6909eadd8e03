use super::env::{load_from_env, parse_audio_format};
use super::validation::tls_from_paths;
use super::yaml::YamlConfig;
use super::{ConfigError, ServerConfig};

/// Overwrite `target` when the YAML value is present.
fn apply<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Overwrite an optional `target` when the YAML value is present.
fn apply_opt<T>(target: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *target = value;
    }
}

/// Load the environment configuration and apply YAML overrides on top.
pub fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, ConfigError> {
    let mut config = load_from_env()?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        apply(&mut config.host, server.host);
        apply(&mut config.port, server.port);
        apply_opt(&mut config.public_host, server.public_host);
        if let Some(tls) = server.tls {
            config.tls = tls_from_paths(tls.cert_path, tls.key_path)?;
        }
    }

    if let Some(agent) = yaml.agent {
        apply(&mut config.agent_name, agent.name);
        apply(&mut config.agent_routing_key, agent.routing_key);
    }

    if let Some(model) = yaml.model {
        apply_opt(&mut config.openai_api_key, model.api_key);
        apply(&mut config.openai_realtime_url, model.url);
        apply(&mut config.openai_realtime_model, model.model);
        apply(&mut config.openai_voice, model.voice);
        apply(&mut config.transcription_model, model.transcription_model);
        apply_opt(&mut config.transcription_language, model.transcription_language);
        if let Some(format) = model.audio_format {
            config.audio_format = parse_audio_format("model.audio_format", &format)?;
        }
        apply_opt(&mut config.instructions_path, model.instructions_path);
    }

    if let Some(tools) = yaml.tools {
        apply(&mut config.mcp_server_url, tools.mcp_url);
        apply_opt(&mut config.mcp_api_key, tools.mcp_api_key);
        apply(&mut config.allowed_tools, tools.allowed);
    }

    if let Some(email) = yaml.email {
        apply_opt(&mut config.resend_api_key, email.api_key);
        apply_opt(&mut config.resend_from_email, email.from);
        apply(&mut config.resend_api_url, email.api_url);
    }

    if let Some(security) = yaml.security {
        apply_opt(&mut config.cors_allowed_origins, security.cors_allowed_origins);
        apply(
            &mut config.rate_limit_requests_per_second,
            security.rate_limit_requests_per_second,
        );
        apply(&mut config.rate_limit_burst_size, security.rate_limit_burst_size);
    }

    Ok(config)
}
