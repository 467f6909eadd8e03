use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, incoming_call_handler, media_stream_handler};
use crate::state::AppState;
use std::sync::Arc;

/// Create the router for the health check, the call webhook, and agent media streams
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/incoming-call", post(incoming_call_handler))
        .route(
            "/agents/{agent}/{routing_key}/{*rest}",
            get(media_stream_handler),
        )
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
}
