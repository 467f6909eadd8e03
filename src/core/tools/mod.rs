//! Tools the model can call during a call.
//!
//! - [`registry`]: descriptors, allow-list filtering, argument schemas
//! - [`mcp`]: the remote tool backend (MCP over streamable HTTP)
//! - [`email`]: the in-process email tool
//! - [`dispatcher`]: turns a function call into a result value

mod dispatcher;
pub mod email;
pub mod mcp;
pub mod registry;

pub use dispatcher::ToolDispatcher;
pub use email::{EmailConfig, RESEND_API_URL, SEND_EMAIL_TOOL, SendEmailTool};
pub use mcp::{
    DEFAULT_MCP_URL, McpClient, McpConfig, McpConnector, McpError, ToolBackend,
    ToolBackendConnector,
};
pub use registry::{LocalTool, RemoteTool, ToolDescriptor, ToolError, ToolKind, ToolRegistry};
