//! Incoming call webhook
//!
//! The telephony platform posts here when a call arrives. The reply tells it to
//! announce the connection and open a media stream back to this server.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        HeaderMap,
        header::{CONTENT_TYPE, HOST},
    },
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::core::telephony::build_connect_response;
use crate::state::AppState;

/// Answer a call with a stream-connect TwiML document. Always 200.
pub async fn incoming_call_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let host = state
        .config
        .public_host
        .clone()
        .or_else(|| {
            headers
                .get(HOST)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| state.config.address());

    info!(
        host = %host,
        agent = %state.config.agent_name,
        routing_key = %state.config.agent_routing_key,
        "Incoming call"
    );

    let body = build_connect_response(
        &host,
        &state.config.agent_name,
        &state.config.agent_routing_key,
    );
    ([(CONTENT_TYPE, "text/xml")], body).into_response()
}
