use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::server::AppState;

/// Health check endpoint
/// Returns 200 OK if the service is running
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "car-catalog",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Readiness check endpoint
///
/// Ready once the search index has been built, or failing that, once the
/// database answers (search then runs against the database).
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let index_ready = state.search.is_ready();
    let database_ready = if index_ready {
        true
    } else {
        match state.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Readiness probe: database unavailable");
                false
            }
        }
    };

    let status = if database_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if database_ready { "ready" } else { "unavailable" },
            "service": "car-catalog",
            "searchIndex": if index_ready { "built" } else { "pending" },
        })),
    )
}
