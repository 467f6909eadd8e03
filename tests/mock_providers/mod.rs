//! Mock upstream services for integration tests
//!
//! - `realtime_mock`: a realtime model WebSocket server
//! - `mcp_mock`: an MCP tool backend on top of wiremock
//!
//! Plus helpers to build a test configuration and serve the router on a
//! random local port.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod mcp_mock;
pub mod realtime_mock;

use std::net::SocketAddr;
use std::sync::Arc;

use callbridge::{ServerConfig, routes, state::AppState};
use tokio::net::TcpListener;

/// A configuration that passes validation and points at the given mocks.
pub fn test_config(realtime_url: &str, mcp_url: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.host = "127.0.0.1".to_string();
    config.port = 0;
    config.openai_api_key = Some("sk-test".to_string());
    config.openai_realtime_url = realtime_url.to_string();
    config.mcp_server_url = mcp_url.to_string();
    config.mcp_api_key = Some("rk-test".to_string());
    config
}

/// Serve the application router on a random local port.
pub async fn spawn_app(state: Arc<AppState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = routes::api::create_api_router().with_state(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
