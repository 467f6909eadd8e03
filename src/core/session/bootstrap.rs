//! Agent instances and session bootstrap.
//!
//! An agent instance is addressed by the routing key in the stream URL. The
//! first call that reaches an instance connects to the tool backend and runs
//! discovery; the resulting tool set is kept for the life of the process and
//! shared by every later call on that key. A failed discovery leaves the
//! instance uninitialised so the next call tries again.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info};

use super::bridge::CallSession;
use crate::core::codec::Outbound;
use crate::core::realtime::openai::{OpenAIRealtimeConfig, SessionConfig};
use crate::core::realtime::ModelConnector;
use crate::core::tools::{LocalTool, McpError, ToolBackendConnector, ToolDispatcher, ToolRegistry};

/// Errors raised while preparing an agent instance.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Tool discovery failed: {0}")]
    Discovery(#[from] McpError),
}

/// One agent instance.
#[derive(Debug)]
pub struct CallAgent {
    tools: OnceCell<ToolDispatcher>,
}

impl CallAgent {
    fn new() -> Self {
        Self {
            tools: OnceCell::new(),
        }
    }

    /// Whether discovery has completed.
    pub fn is_ready(&self) -> bool {
        self.tools.initialized()
    }
}

/// Everything a new call session needs.
pub struct PreparedSession {
    pub dispatcher: ToolDispatcher,
    pub session_config: SessionConfig,
}

/// Creates agent instances and the sessions that run on them.
pub struct SessionFactory {
    agent_name: String,
    agents: DashMap<String, Arc<CallAgent>>,
    model: Arc<OpenAIRealtimeConfig>,
    connector: Arc<dyn ModelConnector>,
    backends: Arc<dyn ToolBackendConnector>,
    local_tools: Vec<Arc<dyn LocalTool>>,
    allowed_tools: Vec<String>,
    instructions: String,
}

impl SessionFactory {
    /// Create a factory for the agent called `agent_name`.
    pub fn new(
        agent_name: impl Into<String>,
        model: Arc<OpenAIRealtimeConfig>,
        connector: Arc<dyn ModelConnector>,
        backends: Arc<dyn ToolBackendConnector>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            agents: DashMap::new(),
            model,
            connector,
            backends,
            local_tools: Vec::new(),
            allowed_tools: Vec::new(),
            instructions: String::new(),
        }
    }

    /// Remote tools the model may use.
    pub fn with_allowed_tools(mut self, allowed: Vec<String>) -> Self {
        self.allowed_tools = allowed;
        self
    }

    /// Register an in-process tool.
    pub fn with_local_tool(mut self, tool: Arc<dyn LocalTool>) -> Self {
        self.local_tools.push(tool);
        self
    }

    /// System instructions sent in `session.update`.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Model connector handed to sessions.
    pub fn connector(&self) -> Arc<dyn ModelConnector> {
        self.connector.clone()
    }

    /// The agent instance for `routing_key`, created on first use.
    pub fn agent(&self, routing_key: &str) -> Arc<CallAgent> {
        self.agents
            .entry(routing_key.to_string())
            .or_insert_with(|| Arc::new(CallAgent::new()))
            .clone()
    }

    /// Number of agent instances created so far.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Make sure the instance for `routing_key` has its tools, then build the
    /// session configuration.
    pub async fn prepare(&self, routing_key: &str) -> Result<PreparedSession, BootstrapError> {
        let agent = self.agent(routing_key);
        let dispatcher = agent
            .tools
            .get_or_try_init(|| self.discover(routing_key))
            .await
            .inspect_err(|e| error!(routing_key, "Agent bootstrap failed: {}", e))?
            .clone();

        let session_config = self
            .model
            .session_config(&self.instructions, dispatcher.registry().tool_defs());

        Ok(PreparedSession {
            dispatcher,
            session_config,
        })
    }

    /// Build a session for an accepted media-stream connection.
    pub fn open(&self, routing_key: &str, telephony: Outbound, prepared: PreparedSession) -> CallSession {
        CallSession::new(
            routing_key,
            telephony,
            prepared.dispatcher,
            prepared.session_config,
        )
    }

    async fn discover(&self, routing_key: &str) -> Result<ToolDispatcher, BootstrapError> {
        let backend = self.backends.connect().await?;
        let discovered = backend.list_tools().await?;
        let advertised = discovered.len();

        let registry = ToolRegistry::build(discovered, &self.allowed_tools, self.local_tools.clone());
        info!(
            routing_key,
            advertised,
            enabled = registry.len(),
            "Tool discovery complete"
        );

        Ok(ToolDispatcher::new(Arc::new(registry), backend))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realtime::{ModelLink, RealtimeError, RealtimeResult};
    use crate::core::tools::{RemoteTool, ToolBackend};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoModel;

    #[async_trait]
    impl ModelConnector for NoModel {
        async fn connect(&self) -> RealtimeResult<ModelLink> {
            Err(RealtimeError::ConnectionFailed("unused".to_string()))
        }
    }

    struct StaticBackend;

    #[async_trait]
    impl ToolBackend for StaticBackend {
        async fn list_tools(&self) -> Result<Vec<RemoteTool>, McpError> {
            Ok(["list_products", "create_refund", "delete_account"]
                .iter()
                .map(|name| RemoteTool {
                    name: name.to_string(),
                    description: None,
                    input_schema: Some(json!({"type": "object"})),
                })
                .collect())
        }

        async fn call_tool(&self, _name: &str, _arguments: Value) -> Result<Value, McpError> {
            Ok(Value::Null)
        }
    }

    /// Counts connects; fails the first `failures` of them.
    struct CountingConnector {
        connects: AtomicUsize,
        failures: usize,
    }

    #[async_trait]
    impl ToolBackendConnector for CountingConnector {
        async fn connect(&self) -> Result<Arc<dyn ToolBackend>, McpError> {
            let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(McpError::InvalidResponse("unreachable".to_string()));
            }
            Ok(Arc::new(StaticBackend))
        }
    }

    fn factory(backends: Arc<CountingConnector>) -> SessionFactory {
        SessionFactory::new(
            "my-agent",
            Arc::new(OpenAIRealtimeConfig::default()),
            Arc::new(NoModel),
            backends,
        )
        .with_allowed_tools(vec!["list_products".to_string(), "create_refund".to_string()])
        .with_instructions("Be brief.")
    }

    #[tokio::test]
    async fn test_discovery_runs_once_per_agent() {
        let backends = Arc::new(CountingConnector {
            connects: AtomicUsize::new(0),
            failures: 0,
        });
        let factory = factory(backends.clone());

        let first = factory.prepare("123").await.unwrap();
        let second = factory.prepare("123").await.unwrap();
        assert_eq!(backends.connects.load(Ordering::SeqCst), 1);
        assert_eq!(first.session_config, second.session_config);

        factory.prepare("456").await.unwrap();
        assert_eq!(backends.connects.load(Ordering::SeqCst), 2);
        assert_eq!(factory.agent_count(), 2);
        assert!(factory.agent("123").is_ready());
    }

    #[tokio::test]
    async fn test_session_config_carries_filtered_tools() {
        let backends = Arc::new(CountingConnector {
            connects: AtomicUsize::new(0),
            failures: 0,
        });
        let prepared = factory(backends).prepare("123").await.unwrap();

        let config = prepared.session_config;
        assert_eq!(config.instructions.as_deref(), Some("Be brief."));
        let names: Vec<_> = config
            .tools
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["list_products", "create_refund"]);
    }

    #[tokio::test]
    async fn test_failed_discovery_is_retried() {
        let backends = Arc::new(CountingConnector {
            connects: AtomicUsize::new(0),
            failures: 1,
        });
        let factory = factory(backends.clone());

        assert!(matches!(
            factory.prepare("123").await,
            Err(BootstrapError::Discovery(_))
        ));
        assert!(!factory.agent("123").is_ready());

        assert!(factory.prepare("123").await.is_ok());
        assert_eq!(backends.connects.load(Ordering::SeqCst), 2);
    }
}
