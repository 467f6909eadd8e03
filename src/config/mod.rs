//! Configuration module for the call bridge
//!
//! Configuration comes from `.env` files, environment variables and an optional YAML
//! file. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Applying YAML overrides on top of the environment
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use callbridge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

use thiserror::Error;

use crate::core::realtime::openai::{
    DEFAULT_REALTIME_MODEL, DEFAULT_TRANSCRIPTION_LANGUAGE, DEFAULT_TRANSCRIPTION_MODEL,
    DEFAULT_VOICE, OPENAI_REALTIME_URL, OpenAIRealtimeAudioFormat, OpenAIRealtimeConfig,
};
use crate::core::tools::{DEFAULT_MCP_URL, EmailConfig, McpConfig, RESEND_API_URL};

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Agent name used in stream URLs when none is configured.
pub const DEFAULT_AGENT_NAME: &str = "my-agent";

/// Routing key used in stream URLs when none is configured.
pub const DEFAULT_ROUTING_KEY: &str = "123";

/// Remote tools exposed to the model unless `ALLOWED_TOOLS` says otherwise.
pub const DEFAULT_ALLOWED_TOOLS: &[&str] = &[
    "search_documentation",
    "create_customer",
    "list_customers",
    "list_products",
    "list_prices",
    "create_payment_link",
    "create_invoice",
    "list_invoices",
    "create_invoice_item",
    "finalize_invoice",
    "create_refund",
    "list_payment_intents",
];

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls: Option<TlsConfig>,
    /// Host advertised in TwiML; the request `Host` header is used when unset
    pub public_host: Option<String>,

    pub agent_name: String,
    pub agent_routing_key: String,

    // Realtime model
    pub openai_api_key: Option<String>,
    pub openai_realtime_url: String,
    pub openai_realtime_model: String,
    pub openai_voice: String,
    pub transcription_model: String,
    pub transcription_language: Option<String>,
    pub audio_format: OpenAIRealtimeAudioFormat,
    pub instructions_path: Option<PathBuf>,

    // Tool backend
    pub mcp_server_url: String,
    pub mcp_api_key: Option<String>,
    pub allowed_tools: Vec<String>,

    // Email tool
    pub resend_api_key: Option<String>,
    pub resend_from_email: Option<String>,
    pub resend_api_url: String,

    // Security settings
    /// Comma-separated origins, or "*" for any
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: u32,
    pub rate_limit_burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            tls: None,
            public_host: None,
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            agent_routing_key: DEFAULT_ROUTING_KEY.to_string(),
            openai_api_key: None,
            openai_realtime_url: OPENAI_REALTIME_URL.to_string(),
            openai_realtime_model: DEFAULT_REALTIME_MODEL.to_string(),
            openai_voice: DEFAULT_VOICE.to_string(),
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
            transcription_language: Some(DEFAULT_TRANSCRIPTION_LANGUAGE.to_string()),
            audio_format: OpenAIRealtimeAudioFormat::default(),
            instructions_path: None,
            mcp_server_url: DEFAULT_MCP_URL.to_string(),
            mcp_api_key: None,
            allowed_tools: DEFAULT_ALLOWED_TOOLS.iter().map(|t| t.to_string()).collect(),
            resend_api_key: None,
            resend_from_email: None,
            resend_api_url: RESEND_API_URL.to_string(),
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.mcp_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.resend_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `.env` values are expected to be loaded already (see `main.rs`).
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = env::load_from_env()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file, with environment variables as the base
    ///
    /// Values in the file win over environment variables.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let yaml_config = YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Realtime model settings for the connector.
    pub fn model_config(&self) -> OpenAIRealtimeConfig {
        OpenAIRealtimeConfig {
            api_key: self.openai_api_key.clone().unwrap_or_default(),
            url: self.openai_realtime_url.clone(),
            model: self.openai_realtime_model.clone(),
            voice: self.openai_voice.clone(),
            transcription_model: self.transcription_model.clone(),
            transcription_language: self.transcription_language.clone(),
            audio_format: self.audio_format,
        }
    }

    /// Tool backend endpoint and credentials.
    pub fn mcp_config(&self) -> McpConfig {
        McpConfig {
            url: self.mcp_server_url.clone(),
            api_key: self.mcp_api_key.clone().unwrap_or_default(),
        }
    }

    /// Email tool settings, present only when both key and sender are configured.
    pub fn email_config(&self) -> Option<EmailConfig> {
        match (&self.resend_api_key, &self.resend_from_email) {
            (Some(api_key), Some(from)) => Some(EmailConfig {
                api_key: api_key.clone(),
                from: from.clone(),
                api_url: self.resend_api_url.clone(),
            }),
            _ => None,
        }
    }
}
