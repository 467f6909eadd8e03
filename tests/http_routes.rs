//! Router tests for the plain HTTP endpoints.

mod mock_providers;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use tower::util::ServiceExt;

use callbridge::{ServerConfig, routes, state::AppState};
use mock_providers::test_config;

fn app(config: ServerConfig) -> Router {
    let state = AppState::new(config).unwrap();
    routes::api::create_api_router().with_state(state)
}

fn default_app() -> Router {
    app(test_config("ws://127.0.0.1:9/v1/realtime", "http://127.0.0.1:9/mcp"))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = default_app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"status":"OK"}"#);
}

#[tokio::test]
async fn test_incoming_call_uses_host_header() {
    let response = default_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/incoming-call")
                .header(header::HOST, "bridge.test")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("CallSid=CA1&From=%2B15550100"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/xml"
    );
    let body = body_string(response).await;
    assert!(body.contains("<Say>Connected</Say>"));
    assert!(body.contains(r#"<Stream url="wss://bridge.test/agents/my-agent/123/media-stream" />"#));
}

#[tokio::test]
async fn test_incoming_call_prefers_public_host() {
    let mut config = test_config("ws://127.0.0.1:9/v1/realtime", "http://127.0.0.1:9/mcp");
    config.public_host = Some("calls.example.com".to_string());
    config.agent_name = "sales".to_string();
    config.agent_routing_key = "store-7".to_string();

    let response = app(config)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/incoming-call")
                .header(header::HOST, "internal:3001")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = body_string(response).await;
    assert!(body.contains("wss://calls.example.com/agents/sales/store-7/media-stream"));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let response = default_app()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "Not found");
}

#[tokio::test]
async fn test_incoming_call_requires_post() {
    let response = default_app()
        .oneshot(
            Request::builder()
                .uri("/incoming-call")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn test_state_requires_model_key() {
    let mut config = test_config("ws://127.0.0.1:9/v1/realtime", "http://127.0.0.1:9/mcp");
    config.openai_api_key = None;
    assert!(AppState::new(config).is_err());
}
