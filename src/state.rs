use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::ServerConfig;
use crate::core::realtime::{ModelConnector, OpenAIRealtimeConnector, RealtimeError};
use crate::core::session::{SessionFactory, load_instructions};
use crate::core::tools::{McpConnector, SendEmailTool, ToolBackendConnector};

/// Errors raised while building the application state.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to load instructions from {path}: {source}")]
    Instructions {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Model(#[from] RealtimeError),
}

/// Shared state handed to every handler.
pub struct AppState {
    pub config: ServerConfig,
    pub sessions: SessionFactory,
}

impl AppState {
    /// Build the state for a loaded configuration.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, StartupError> {
        let http = reqwest::Client::new();

        let instructions = load_instructions(config.instructions_path.as_deref()).map_err(
            |source| StartupError::Instructions {
                path: config
                    .instructions_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                source,
            },
        )?;

        let model = Arc::new(config.model_config());
        let connector: Arc<dyn ModelConnector> =
            Arc::new(OpenAIRealtimeConnector::new(model.clone())?);
        let backends: Arc<dyn ToolBackendConnector> =
            Arc::new(McpConnector::new(http.clone(), config.mcp_config()));

        let mut sessions = SessionFactory::new(config.agent_name.clone(), model, connector, backends)
            .with_allowed_tools(config.allowed_tools.clone())
            .with_instructions(instructions);

        match config.email_config() {
            Some(email) => {
                info!(from = %email.from, "Email tool enabled");
                sessions = sessions.with_local_tool(Arc::new(SendEmailTool::new(http, email)));
            }
            None => info!("Email tool disabled: RESEND_API_KEY or RESEND_FROM_EMAIL not set"),
        }

        Ok(Self::from_parts(config, sessions))
    }

    /// Assemble state from an already built session factory.
    pub fn from_parts(config: ServerConfig, sessions: SessionFactory) -> Arc<Self> {
        Arc::new(Self { config, sessions })
    }
}
