//! HTTP Mock for the MCP tool backend
//!
//! Answers `initialize`, `notifications/initialized`, `tools/list` and
//! `tools/call` with canned JSON-RPC responses.

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION_ID: &str = "mock-session-1";

pub struct MockMcpServer {
    pub server: MockServer,
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("mcp-session-id", SESSION_ID)
        .set_body_json(json!({ "jsonrpc": "2.0", "id": 1, "result": result }))
}

impl MockMcpServer {
    /// Backend advertising `tools` and answering every call with `call_result`.
    pub async fn start(tools: &[&str], call_result: Value) -> Self {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "initialize" })))
            .respond_with(rpc_result(json!({
                "protocolVersion": "2025-03-26",
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "mock-mcp", "version": "0.0.1" }
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "notifications/initialized" })))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let tools: Vec<Value> = tools
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "description": format!("Mock {name}"),
                    "inputSchema": { "type": "object", "properties": {} }
                })
            })
            .collect();
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "tools/list" })))
            .respond_with(rpc_result(json!({ "tools": tools })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "tools/call" })))
            .respond_with(rpc_result(call_result))
            .mount(&server)
            .await;

        Self { server }
    }

    /// Backend that fails every request.
    pub async fn unavailable() -> Self {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;
        Self { server }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// JSON-RPC bodies received for `rpc_method`, in arrival order.
    pub async fn requests_for(&self, rpc_method: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|request| serde_json::from_slice::<Value>(&request.body).ok())
            .filter(|body| body["method"] == rpc_method)
            .collect()
    }
}
