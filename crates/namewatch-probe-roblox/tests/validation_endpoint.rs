//! Probe behavior against an in-process validation endpoint
//!
//! Constraints verified:
//! - The identifier and birthdate are sent as query parameters
//! - HTTP 429 is reported as rate limiting, not as an error
//! - Other non-2xx statuses and malformed bodies are probe errors
//! - Exactly one request is made per check

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use namewatch_core::traits::{AvailabilityProbe, ProbeResponse};
use namewatch_core::Error;
use namewatch_probe_roblox::RobloxProbe;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy)]
enum Mode {
    Json,
    TooManyRequests,
    ServerError,
    Garbage,
    ErrorEnvelope,
}

#[derive(Clone)]
struct StubState {
    mode: Mode,
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn validate(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.requests.lock().unwrap().push(params.clone());

    match state.mode {
        Mode::Json => {
            let username = params.get("Username").cloned().unwrap_or_default();
            let body = if username == "builderman" {
                serde_json::json!({ "code": 1, "message": "Username is already in use" })
            } else {
                serde_json::json!({ "code": 0, "message": "Username is valid" })
            };
            axum::Json(body).into_response()
        }
        Mode::TooManyRequests => (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(serde_json::json!({ "errors": [{ "code": 0, "message": "Too many requests" }] })),
        )
            .into_response(),
        Mode::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "upstream down").into_response(),
        Mode::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
        Mode::ErrorEnvelope => axum::Json(
            serde_json::json!({ "errors": [{ "code": 0, "message": "InternalServerError" }] }),
        )
        .into_response(),
    }
}

/// Spawn the stub and return (endpoint, recorded query strings)
async fn spawn_stub(mode: Mode) -> (String, Arc<Mutex<Vec<HashMap<String, String>>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        mode,
        requests: Arc::clone(&requests),
    };
    let app = Router::new()
        .route("/v1/usernames/validate", get(validate))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (
        format!("http://{}/v1/usernames/validate", addr),
        requests,
    )
}

fn probe_for(endpoint: &str) -> RobloxProbe {
    RobloxProbe::new(endpoint, "2000-01-01", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn sends_username_and_birthday() {
    let (endpoint, requests) = spawn_stub(Mode::Json).await;
    let probe = probe_for(&endpoint);

    let response = probe.check("foo bar").await.unwrap();

    assert_eq!(response, ProbeResponse::answered("Username is valid", 0));
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].get("Username").map(String::as_str), Some("foo bar"));
    assert_eq!(requests[0].get("Birthday").map(String::as_str), Some("2000-01-01"));
}

#[tokio::test]
async fn returns_raw_message_for_taken_names() {
    let (endpoint, _requests) = spawn_stub(Mode::Json).await;
    let probe = probe_for(&endpoint);

    let response = probe.check("builderman").await.unwrap();

    assert_eq!(response, ProbeResponse::answered("Username is already in use", 1));
}

#[tokio::test]
async fn too_many_requests_is_rate_limited() {
    let (endpoint, requests) = spawn_stub(Mode::TooManyRequests).await;
    let probe = probe_for(&endpoint);

    let response = probe.check("foo").await.unwrap();

    assert_eq!(response, ProbeResponse::RateLimited);
    assert_eq!(requests.lock().unwrap().len(), 1, "probe must not retry");
}

#[tokio::test]
async fn server_error_is_probe_error() {
    let (endpoint, requests) = spawn_stub(Mode::ServerError).await;
    let probe = probe_for(&endpoint);

    let err = probe.check("foo").await.unwrap_err();

    assert!(matches!(err, Error::Probe { ref probe, .. } if probe == "roblox"));
    assert!(err.to_string().contains("500"));
    assert_eq!(requests.lock().unwrap().len(), 1, "probe must not retry");
}

#[tokio::test]
async fn malformed_body_is_probe_error() {
    let (endpoint, _requests) = spawn_stub(Mode::Garbage).await;
    let probe = probe_for(&endpoint);

    let err = probe.check("foo").await.unwrap_err();

    assert!(err.to_string().contains("Failed to decode JSON response"));
}

#[tokio::test]
async fn body_without_code_and_message_is_probe_error() {
    let (endpoint, requests) = spawn_stub(Mode::ErrorEnvelope).await;
    let probe = probe_for(&endpoint);

    let err = probe.check("foo").await.unwrap_err();

    assert!(matches!(err, Error::Probe { ref probe, .. } if probe == "roblox"));
    assert!(err.to_string().contains("Failed to decode JSON response"));
    assert_eq!(requests.lock().unwrap().len(), 1, "probe must not retry");
}

#[tokio::test]
async fn unreachable_endpoint_is_probe_error() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = probe_for(&format!("http://{}/v1/usernames/validate", addr));

    let err = probe.check("foo").await.unwrap_err();
    assert!(err.to_string().contains("Request failed"));
}
