//! Tool descriptors and the per-agent tool registry.
//!
//! The registry is built once per agent from the tools the backend advertises,
//! filtered by the allow-list, plus the in-process tools. Remote parameter
//! schemas are compiled when the registry is built so that arguments can be
//! checked before anything is forwarded.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::{Draft, JSONSchema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::realtime::openai::ToolDef;

// =============================================================================
// Errors
// =============================================================================

/// Reasons a function call could not produce a result.
///
/// These never escape the dispatcher; they are rendered into the
/// `{"error": ...}` payload returned to the model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Name matches neither a local tool nor an allowed remote tool
    #[error("No handler found for function: {0}")]
    UnknownTool(String),

    /// Arguments are not JSON or do not match the declared parameters
    #[error("invalid arguments")]
    InvalidArguments,

    /// The tool ran and failed
    #[error("Error running function {name}: {message}")]
    Execution { name: String, message: String },
}

impl ToolError {
    /// Error payload sent back as the function call output.
    pub fn to_payload(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

// =============================================================================
// Descriptors
// =============================================================================

/// Where a tool runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Forwarded to the tool backend
    Remote,
    /// Executed in-process
    Local,
}

/// A tool the model may call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON schema of the arguments object
    pub parameters: Value,
    pub kind: ToolKind,
}

impl ToolDescriptor {
    /// Function definition as advertised in `session.update`.
    pub fn to_tool_def(&self) -> ToolDef {
        ToolDef {
            tool_type: "function".to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

/// A tool as advertised by the backend's `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Option<Value>,
}

/// An in-process tool.
#[async_trait]
pub trait LocalTool: Send + Sync {
    /// Descriptor advertised to the model. `kind` must be [`ToolKind::Local`].
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool with the raw JSON arguments from the model.
    ///
    /// Implementations parse the arguments into their own typed structure and
    /// return [`ToolError::InvalidArguments`] when that fails.
    async fn invoke(&self, arguments: &str) -> Result<Value, ToolError>;
}

// =============================================================================
// Registry
// =============================================================================

/// An allowed remote tool and its compiled argument schema.
pub struct RemoteEntry {
    descriptor: ToolDescriptor,
    validator: Option<JSONSchema>,
}

impl RemoteEntry {
    fn new(tool: RemoteTool) -> Self {
        let parameters = tool
            .input_schema
            .unwrap_or_else(|| json!({"type": "object", "properties": {}}));

        let validator = match JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&parameters)
        {
            Ok(schema) => Some(schema),
            Err(e) => {
                warn!(tool = %tool.name, "Tool schema does not compile, arguments will not be validated: {}", e);
                None
            }
        };

        Self {
            descriptor: ToolDescriptor {
                name: tool.name,
                description: tool.description,
                parameters,
                kind: ToolKind::Remote,
            },
            validator,
        }
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Whether `arguments` satisfy the tool's declared parameters.
    pub fn accepts(&self, arguments: &Value) -> bool {
        self.validator
            .as_ref()
            .is_none_or(|schema| schema.is_valid(arguments))
    }
}

/// The fixed set of tools for one agent.
#[derive(Default)]
pub struct ToolRegistry {
    remote: HashMap<String, RemoteEntry>,
    local: HashMap<String, Arc<dyn LocalTool>>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Intersect the discovered tools with `allowed` and merge in `local_tools`.
    ///
    /// Discovery order is preserved, local tools come last. A local tool
    /// shadows a remote tool of the same name.
    pub fn build(
        discovered: Vec<RemoteTool>,
        allowed: &[String],
        local_tools: Vec<Arc<dyn LocalTool>>,
    ) -> Self {
        let mut registry = Self::default();

        let mut local_descriptors = Vec::with_capacity(local_tools.len());
        for tool in local_tools {
            let descriptor = tool.descriptor();
            if registry.local.contains_key(&descriptor.name) {
                warn!(tool = %descriptor.name, "Duplicate local tool ignored");
                continue;
            }
            registry.local.insert(descriptor.name.clone(), tool);
            local_descriptors.push(descriptor);
        }

        for tool in discovered {
            if !allowed.iter().any(|name| name == &tool.name) {
                debug!(tool = %tool.name, "Tool not in allow-list, skipping");
                continue;
            }
            if registry.local.contains_key(&tool.name) || registry.remote.contains_key(&tool.name)
            {
                continue;
            }
            let entry = RemoteEntry::new(tool);
            registry.descriptors.push(entry.descriptor.clone());
            registry
                .remote
                .insert(entry.descriptor.name.clone(), entry);
        }

        registry.descriptors.extend(local_descriptors);
        registry
    }

    /// All descriptors, in advertisement order.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Function definitions for `session.update`.
    pub fn tool_defs(&self) -> Vec<ToolDef> {
        self.descriptors.iter().map(ToolDescriptor::to_tool_def).collect()
    }

    pub fn local(&self, name: &str) -> Option<&Arc<dyn LocalTool>> {
        self.local.get(name)
    }

    pub fn remote(&self, name: &str) -> Option<&RemoteEntry> {
        self.remote.get(name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field(
                "tools",
                &self.descriptors.iter().map(|d| &d.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
