use axum::{extract::State, response::IntoResponse, Json};

use crate::server::AppState;

/// Handle /api/search/stats
pub async fn search_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.search.stats())
}

/// Handle /api/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.cache.stats())
}
