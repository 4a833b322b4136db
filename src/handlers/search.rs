use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::search;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Handle /api/search
pub async fn search_models(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let config = state.config.load();
    let limit = params
        .limit
        .unwrap_or(config.search.default_limit)
        .clamp(1, config.search.max_limit);

    let response = search::search(&state.search, state.store.as_ref(), &params.q, limit).await?;

    tracing::debug!(
        query = %params.q,
        source = response.source.as_str(),
        total = response.total,
        "Search answered"
    );

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::handlers::test_support::{get_json, router, seeded_state};

    #[tokio::test]
    async fn test_search_falls_back_to_database_before_build() {
        let state = seeded_state().await;
        let (status, body) = get_json(router(state), "/api/search?q=swift").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "database");
        assert_eq!(body["total"], 1);
        assert_eq!(body["results"][0]["slug"], "maruti-suzuki-swift");
    }

    #[tokio::test]
    async fn test_search_uses_memory_after_build() {
        let state = seeded_state().await;
        state.search.build_index().await.unwrap();
        let (status, body) = get_json(router(state), "/api/search?q=tata%20nex").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "memory");
        assert_eq!(body["results"][0]["name"], "Nexon");
        assert!(body["indexAgeMs"].is_u64());
    }

    #[tokio::test]
    async fn test_short_query_is_empty() {
        let state = seeded_state().await;
        state.search.build_index().await.unwrap();
        let (status, body) = get_json(router(state), "/api/search?q=s").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
    }
}
