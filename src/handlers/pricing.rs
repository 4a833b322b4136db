use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::metrics;
use crate::pricing::PriceOptions;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnRoadPriceParams {
    pub price: Option<f64>,
    pub state: Option<String>,
    pub fuel_type: Option<String>,
    pub hypothecation: Option<bool>,
    pub fastag: Option<bool>,
}

/// Handle /api/on-road-price
pub async fn on_road_price(
    State(state): State<AppState>,
    params: Result<Query<OnRoadPriceParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let price = params
        .price
        .ok_or_else(|| AppError::InvalidInput("price is required".to_string()))?;
    let region = params
        .state
        .unwrap_or_else(|| state.config.load().pricing.default_state.clone());
    let fuel = params.fuel_type.unwrap_or_else(|| "Petrol".to_string());
    let options = PriceOptions {
        hypothecation: params.hypothecation.unwrap_or(true),
        fastag: params.fastag.unwrap_or(true),
    };

    let breakup = state
        .pricing
        .load()
        .calculate(price, &region, &fuel, options)?;

    metrics::record_price_quote(breakup.used_fallback());

    Ok(Json(breakup))
}
