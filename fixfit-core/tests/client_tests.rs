//! Integration tests for the HTTP analysis client
//!
//! Each test starts a stub analysis service on a pre-bound local listener
//! and drives `HttpAnalysisClient` against it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use fixfit_core::*;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

type Captured = Arc<Mutex<Vec<Value>>>;

const FRAME: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQAAAQABAAD";

async fn start_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn client_for(base_url: &str) -> HttpAnalysisClient {
    HttpAnalysisClient::new(ClientConfig::with_base_url(base_url)).unwrap()
}

fn result_body(timestamp: Value) -> Value {
    json!({
        "current_state": "BOTTOM",
        "is_form_valid": false,
        "correction_cue": "WIDEN KNEES",
        "rep_count": 3,
        "feedback": "KNEE_VALGUS",
        "joint_angles": {"left_knee": 84.0, "right_knee": 86.0, "average": 85.0},
        "error_details": {"knee_valgus_ratio": 0.72, "depth_threshold_reached": true},
        "processing": {"timestamp": timestamp, "processing_time_ms": 12.5}
    })
}

async fn echo_analyze(State(captured): State<Captured>, Json(request): Json<Value>) -> Json<Value> {
    let timestamp = request["timestamp"].clone();
    captured.lock().unwrap().push(request);
    Json(result_body(timestamp))
}

fn echo_router(captured: Captured) -> Router {
    Router::new()
        .route(ANALYZE_PATH, post(echo_analyze))
        .with_state(captured)
}

// ============================================================================
// ANALYZE
// ============================================================================

#[tokio::test]
async fn test_analyze_sends_contract_body() {
    let captured: Captured = Arc::default();
    let base_url = start_stub(echo_router(captured.clone())).await;
    let client = client_for(&base_url);

    let result = assert_ok!(client.analyze(FRAME, 1_700_000_000_123).await);

    assert_eq!(result.current_state, SquatPhase::Bottom);
    assert_eq!(result.rep_count, 3);
    assert_eq!(result.feedback, Feedback::KneeValgus);

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        json!({"frame_data": FRAME, "timestamp": 1_700_000_000_123i64})
    );
}

#[tokio::test]
async fn test_processing_timestamp_round_trip() {
    let base_url = start_stub(echo_router(Arc::default())).await;
    let client = client_for(&base_url);

    for timestamp in [1_700_000_000_000i64, 1_700_000_000_100, 1_700_000_000_200] {
        let result = assert_ok!(client.analyze(FRAME, timestamp).await);
        assert_eq!(result.processing.timestamp, timestamp as f64);
    }
}

#[tokio::test]
async fn test_rejection_carries_detail() {
    let app = Router::new().route(
        ANALYZE_PATH,
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "model unavailable"})),
            )
        }),
    );
    let client = client_for(&start_stub(app).await);

    let error = assert_err!(client.analyze(FRAME, 1_700_000_000_000).await);
    assert_eq!(
        error,
        AnalysisError::AnalysisRejected {
            status: 500,
            detail: "model unavailable".to_string(),
        }
    );
    assert_eq!(error.to_string(), "model unavailable");
}

#[tokio::test]
async fn test_rejection_without_detail() {
    let app = Router::new().route(
        ANALYZE_PATH,
        post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "upstream down") }),
    );
    let client = client_for(&start_stub(app).await);

    let error = assert_err!(client.analyze(FRAME, 1_700_000_000_000).await);
    assert_eq!(error.to_string(), "API error: 503");
    assert_eq!(error.kind(), ErrorKind::Rejected);
}

#[tokio::test]
async fn test_malformed_bodies() {
    let app = Router::new()
        .route(ANALYZE_PATH, post(|| async { Json(json!({"status": "ok"})) }))
        .route("/text/api/v1/analyze-frame", post(|| async { "not json" }))
        .route(
            "/range/api/v1/analyze-frame",
            post(|| async {
                let mut body = result_body(json!(1.0));
                body["joint_angles"]["average"] = json!(400.0);
                Json(body)
            }),
        );
    let base_url = start_stub(app).await;

    for prefix in ["", "/text", "/range"] {
        let client = client_for(&format!("{}{}", base_url, prefix));
        let error = assert_err!(client.analyze(FRAME, 1_700_000_000_000).await);
        assert!(
            matches!(error, AnalysisError::MalformedResponse { .. }),
            "unexpected error for {:?}: {:?}",
            prefix,
            error
        );
        assert!(error.is_transport_class());
    }
}

#[tokio::test]
async fn test_unreachable_service_is_transport_failure() {
    // Reserve a port, then free it so nothing is listening there.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{}", addr));
    let error = assert_err!(client.analyze(FRAME, 1_700_000_000_000).await);
    assert!(matches!(error, AnalysisError::TransportFailure { .. }));
    assert!(error.is_recoverable());
    assert!(!client.check_health().await);
}

// ============================================================================
// RESET AND HEALTH
// ============================================================================

#[tokio::test]
async fn test_reset_session() {
    let app = Router::new().route(
        RESET_PATH,
        post(|| async { Json(json!({"status": "reset", "rep_count": 0})) }),
    );
    let client = client_for(&start_stub(app).await);

    assert_ok!(client.reset_session().await);
}

#[tokio::test]
async fn test_reset_failure_is_transport_class() {
    let app = Router::new().route(RESET_PATH, post(|| async { StatusCode::BAD_GATEWAY }));
    let client = client_for(&start_stub(app).await);

    let error = assert_err!(client.reset_session().await);
    assert_eq!(
        error,
        AnalysisError::TransportFailure {
            reason: "Reset failed: 502".to_string(),
        }
    );
}

#[tokio::test]
async fn test_health_check() {
    let app = Router::new()
        .route(
            HEALTH_PATH,
            get(|| async { Json(json!({"status": "ok", "service": "fixfit-backend"})) }),
        )
        .route(
            "/sick/health",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
    let base_url = start_stub(app).await;

    assert!(client_for(&base_url).check_health().await);
    assert!(!client_for(&format!("{}/sick", base_url)).check_health().await);
}
