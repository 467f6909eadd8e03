//! MCP client over streamable HTTP.
//!
//! Every request is a JSON-RPC 2.0 POST to the server URL. The server may answer
//! with a plain JSON body or with a short `text/event-stream` whose `data:`
//! lines carry the JSON-RPC response. The session id returned by `initialize`
//! is echoed on every later request until the server expires it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::registry::RemoteTool;

/// MCP protocol revision requested during `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2025-03-26";

/// Default tool backend endpoint.
pub const DEFAULT_MCP_URL: &str = "https://mcp.stripe.com";

/// Header carrying the MCP session id.
pub const MCP_SESSION_HEADER: &str = "mcp-session-id";

/// Upper bound on `tools/list` pages followed during discovery.
const MAX_TOOL_PAGES: usize = 50;

/// Errors from the tool backend.
#[derive(Debug, Error)]
pub enum McpError {
    /// Transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("MCP server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not a usable JSON-RPC response
    #[error("Invalid MCP response: {0}")]
    InvalidResponse(String),

    /// JSON-RPC error object
    #[error("MCP error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The tool ran and flagged its result as an error
    #[error("{0}")]
    ToolFailed(String),
}

/// Executes remote tools.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Every tool the backend advertises.
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, McpError>;

    /// Invoke `name` with `arguments` and return the backend's result.
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError>;
}

/// Opens tool backend connections.
#[async_trait]
pub trait ToolBackendConnector: Send + Sync {
    /// Connect and complete any handshake.
    async fn connect(&self) -> Result<Arc<dyn ToolBackend>, McpError>;
}

// =============================================================================
// Client
// =============================================================================

/// MCP connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct McpConfig {
    /// Server endpoint
    pub url: String,
    /// Bearer token
    pub api_key: String,
}

/// An initialised MCP session.
///
/// When the server forgets the session (HTTP 404 on a request carrying the
/// session id) the client runs `initialize` again and retries the request once.
#[derive(Debug)]
pub struct McpClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    session_id: RwLock<Option<String>>,
    next_id: AtomicU64,
}

impl McpClient {
    /// Connect to the server and perform the `initialize` handshake.
    pub async fn connect(http: reqwest::Client, config: &McpConfig) -> Result<Self, McpError> {
        let client = Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            session_id: RwLock::new(None),
            next_id: AtomicU64::new(1),
        };
        client.initialize().await?;
        Ok(client)
    }

    /// Session id assigned by the server, if any.
    pub async fn session_id(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }

    /// Start a new session, replacing any previous session id.
    async fn initialize(&self) -> Result<(), McpError> {
        *self.session_id.write().await = None;

        let (headers, response) = self
            .send_request(
                "initialize",
                json!({
                    "protocolVersion": MCP_PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            )
            .await?;

        let session_id = headers
            .get(MCP_SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let server = response
            .pointer("/serverInfo/name")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(url = %self.url, server, session = ?session_id, "MCP session initialised");

        *self.session_id.write().await = session_id;
        self.notify("notifications/initialized").await
    }

    async fn post(&self, body: &Value) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json, text/event-stream")
            .header("mcp-protocol-version", MCP_PROTOCOL_VERSION)
            .json(body);
        if let Some(session_id) = self.session_id.read().await.as_deref() {
            request = request.header(MCP_SESSION_HEADER, session_id);
        }
        request
    }

    /// Send a request, re-initialising once if the server expired the session.
    async fn request(&self, method: &str, params: Value) -> Result<(HeaderMap, Value), McpError> {
        let had_session = self.session_id.read().await.is_some();
        match self.send_request(method, params.clone()).await {
            Err(McpError::Status { status: 404, .. }) if had_session => {
                warn!(method, "MCP session expired, re-initialising");
                self.initialize().await?;
                self.send_request(method, params).await
            }
            other => other,
        }
    }

    async fn send_request(
        &self,
        method: &str,
        params: Value,
    ) -> Result<(HeaderMap, Value), McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "MCP request");
        let response = self.post(&body).await.send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(McpError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let is_event_stream = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        let message = if is_event_stream {
            parse_event_stream(&text, id)?
        } else {
            serde_json::from_str(&text)
                .map_err(|e| McpError::InvalidResponse(format!("{e}: {text}")))?
        };

        Ok((headers, into_result(message)?))
    }

    async fn notify(&self, method: &str) -> Result<(), McpError> {
        let body = json!({ "jsonrpc": "2.0", "method": method });
        let response = self.post(&body).await.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ToolBackend for McpClient {
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, McpError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_TOOL_PAGES {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let (_, result) = self.request("tools/list", params).await?;

            let page = result
                .get("tools")
                .cloned()
                .ok_or_else(|| McpError::InvalidResponse("tools/list without tools".to_string()))?;
            let page: Vec<RemoteTool> = serde_json::from_value(page)
                .map_err(|e| McpError::InvalidResponse(format!("malformed tool list: {e}")))?;
            tools.extend(page);

            cursor = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
                .map(str::to_owned);
            if cursor.is_none() {
                return Ok(tools);
            }
        }

        warn!("tools/list still paginating after {} pages, using what was fetched", MAX_TOOL_PAGES);
        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value, McpError> {
        let (_, result) = self
            .request("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;

        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            return Err(McpError::ToolFailed(content_text(&result)));
        }
        Ok(result)
    }
}

/// Connects [`McpClient`]s with a shared HTTP client.
#[derive(Debug, Clone)]
pub struct McpConnector {
    http: reqwest::Client,
    config: McpConfig,
}

impl McpConnector {
    pub fn new(http: reqwest::Client, config: McpConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl ToolBackendConnector for McpConnector {
    async fn connect(&self) -> Result<Arc<dyn ToolBackend>, McpError> {
        let client = McpClient::connect(self.http.clone(), &self.config).await?;
        Ok(Arc::new(client))
    }
}

// =============================================================================
// Response parsing
// =============================================================================

/// Find the JSON-RPC response for `id` among the `data:` lines of an SSE body.
fn parse_event_stream(body: &str, id: u64) -> Result<Value, McpError> {
    let mut fallback = None;

    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let Ok(message) = serde_json::from_str::<Value>(data.trim()) else {
            continue;
        };
        if message.get("id").and_then(Value::as_u64) == Some(id) {
            return Ok(message);
        }
        if fallback.is_none() && (message.get("result").is_some() || message.get("error").is_some())
        {
            fallback = Some(message);
        }
    }

    fallback.ok_or_else(|| McpError::InvalidResponse("event stream carried no response".to_string()))
}

fn into_result(mut message: Value) -> Result<Value, McpError> {
    if let Some(error) = message.get("error") {
        return Err(McpError::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    message
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| McpError::InvalidResponse("response has neither result nor error".to_string()))
}

/// Text blocks of a tool result joined by newlines.
fn content_text(result: &Value) -> String {
    let text = result
        .get("content")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();
    if text.is_empty() {
        "tool returned an error".to_string()
    } else {
        text
    }
}
