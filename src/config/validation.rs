use std::path::PathBuf;

use url::Url;

use super::{ConfigError, ServerConfig, TlsConfig};

/// Combine optional TLS paths. Both must be given, or neither.
pub fn tls_from_paths(
    cert_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
) -> Result<Option<TlsConfig>, ConfigError> {
    match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => Ok(Some(TlsConfig {
            cert_path,
            key_path,
        })),
        (None, None) => Ok(None),
        _ => Err(ConfigError::InvalidValue {
            name: "TLS_CERT_PATH/TLS_KEY_PATH",
            message: "certificate and key must be configured together".to_string(),
        }),
    }
}

/// Check a merged configuration.
pub fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    validate_required("OPENAI_API_KEY", &config.openai_api_key)?;
    validate_required("STRIPE_API_KEY", &config.mcp_api_key)?;

    validate_url("OPENAI_REALTIME_URL", &config.openai_realtime_url, &["ws", "wss"])?;
    validate_url("MCP_SERVER_URL", &config.mcp_server_url, &["http", "https"])?;
    validate_url("RESEND_API_URL", &config.resend_api_url, &["http", "https"])?;

    if config.agent_name.contains('/') || config.agent_routing_key.contains('/') {
        return Err(ConfigError::InvalidValue {
            name: "AGENT_NAME/AGENT_ROUTING_KEY",
            message: "must be a single path segment".to_string(),
        });
    }

    Ok(())
}

fn validate_required(name: &'static str, value: &Option<String>) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn validate_url(name: &'static str, value: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        name,
        message: format!("'{value}': {e}"),
    })?;

    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidValue {
            name,
            message: format!("scheme must be one of {}", schemes.join(", ")),
        });
    }
    Ok(())
}
