use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::ops::Bound;

use crate::catalog::{BudgetRange, ListingParams, ListingQuery, SortOrder};
use crate::error::AppError;
use crate::server::AppState;

const POPULAR_DEFAULT_LIMIT: u32 = 10;

async fn run_listing(state: &AppState, query: ListingQuery) -> Result<Value, AppError> {
    let fields = query.fields.clone();
    let page = state.store.list_model_summaries(&query).await?;
    let page = page.project(fields.as_deref())?;
    Ok(serde_json::to_value(page)?)
}

/// Handle /api/models-with-pricing
pub async fn models_with_pricing(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = params.into_query()?;
    Ok(Json(run_listing(&state, query).await?))
}

fn bound_value(bound: Bound<f64>) -> Option<f64> {
    match bound {
        Bound::Included(v) | Bound::Excluded(v) => Some(v),
        Bound::Unbounded => None,
    }
}

/// Handle /api/cars-by-budget/:budget
pub async fn cars_by_budget(
    State(state): State<AppState>,
    Path(budget): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<impl IntoResponse, AppError> {
    let range = BudgetRange::from_slug(&budget)
        .ok_or_else(|| AppError::NotFound(format!("Unknown budget range '{}'", budget)))?;

    let default_sort = params.sort.is_none();
    let mut query = params.into_query()?;
    if default_sort {
        query.sort = SortOrder::PriceAsc;
    }
    let (min, max) = range.bounds();
    query.min_price = min;
    query.max_price = max;

    let mut body = run_listing(&state, query).await?;
    if let Value::Object(map) = &mut body {
        map.insert(
            "budget".to_string(),
            json!({
                "slug": range.slug(),
                "label": range.label(),
                "min": bound_value(min),
                "max": bound_value(max),
            }),
        );
    }

    Ok(Json(body))
}

/// Handle /api/popular-cars
pub async fn popular_cars(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<impl IntoResponse, AppError> {
    let default_sort = params.sort.is_none();
    let default_limit = params.limit.is_none();
    let mut query = params.into_query()?;
    query.popular_only = true;
    if default_sort {
        query.sort = SortOrder::Popular;
    }
    if default_limit {
        query.limit = POPULAR_DEFAULT_LIMIT;
    }

    Ok(Json(run_listing(&state, query).await?))
}
