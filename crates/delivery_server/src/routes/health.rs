//! Service banner, health and readiness endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};

use super::AppState;

/// Root banner response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeResponse {
    pub message: String,
    pub docs: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status ("healthy" or "unhealthy")
    pub status: String,
    /// Server version
    pub version: String,
    /// Server uptime in seconds
    pub uptime_secs: u64,
    /// Whether the quote database answered
    pub storage: bool,
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    /// Ready status
    pub ready: bool,
}

/// Build the health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
}

/// GET / - Service banner
async fn home_handler() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "API is running!".to_string(),
        docs: "/health".to_string(),
    })
}

async fn storage_ok(state: &AppState) -> bool {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || store.ping())
        .await
        .unwrap_or(false)
}

/// GET /health - Health check endpoint
///
/// 503 when the quote database does not answer.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let storage = storage_ok(&state).await;

    let response = HealthResponse {
        status: if storage { "healthy" } else { "unhealthy" }.to_string(),
        version: crate::VERSION.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        storage,
    };

    let status = if storage {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// GET /ready - Readiness endpoint
async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ready = storage_ok(&state).await;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReadyResponse { ready }))
}
