//! HTTP API.

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use nullism_core::{CounterResponse, ErrorResponse, HealthResponse, IncrementResponse};
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::counter::IncrementError;
use crate::realtime::ws_handler;
use crate::server::AppState;

/// Build the router: API, realtime socket, then static files for the rest.
pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/counter", get(get_counter))
        .route("/api/increment", post(increment))
        // WebSocket for roster and counts
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        orbits: state.counter.read(),
        total_visits: state.roster.total_visits(),
        active_users: state.roster.active_users().await,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn get_counter(State(state): State<AppState>) -> Json<CounterResponse> {
    Json(CounterResponse {
        orbits: state.counter.read(),
    })
}

async fn increment(
    State(state): State<AppState>,
) -> Result<Json<IncrementResponse>, IncrementError> {
    let increment = state.counter.increment().await?;
    Ok(Json(IncrementResponse {
        orbits: increment.orbits,
        message: increment.message.to_string(),
    }))
}

impl IntoResponse for IncrementError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            IncrementError::Busy => (
                StatusCode::TOO_MANY_REQUESTS,
                "Update in progress, please try again",
            ),
            IncrementError::Exhausted { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Orbit counter is at its maximum",
            ),
            IncrementError::Persist { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to persist counter",
            ),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
