//! Function call dispatch.
//!
//! [`ToolDispatcher::dispatch`] always produces a value: tool failures become an
//! `{"error": ...}` object so every call the model makes gets an answer.

use std::fmt;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::mcp::ToolBackend;
use super::registry::{ToolError, ToolRegistry};
use crate::core::realtime::FunctionCallRequest;

/// Routes function calls to local tools or the tool backend.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    backend: Arc<dyn ToolBackend>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, backend: Arc<dyn ToolBackend>) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run a function call. Never fails.
    pub async fn dispatch(&self, request: &FunctionCallRequest) -> Value {
        info!(tool = %request.name, call_id = %request.call_id, "Handling function call");

        match self.try_dispatch(request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %request.name, call_id = %request.call_id, "Function call failed: {}", e);
                e.to_payload()
            }
        }
    }

    async fn try_dispatch(&self, request: &FunctionCallRequest) -> Result<Value, ToolError> {
        if let Some(tool) = self.registry.local(&request.name) {
            return tool.invoke(&request.arguments).await;
        }

        let entry = self
            .registry
            .remote(&request.name)
            .ok_or_else(|| ToolError::UnknownTool(request.name.clone()))?;

        let arguments = parse_arguments(&request.arguments)?;
        if !entry.accepts(&arguments) {
            debug!(tool = %request.name, "Arguments rejected by tool schema");
            return Err(ToolError::InvalidArguments);
        }

        self.backend
            .call_tool(&entry.descriptor().name, arguments)
            .await
            .map_err(|e| ToolError::Execution {
                name: request.name.clone(),
                message: e.to_string(),
            })
    }
}

impl fmt::Debug for ToolDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Parse model-supplied arguments. An empty string means no arguments.
fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(raw).map_err(|_| ToolError::InvalidArguments)
}
