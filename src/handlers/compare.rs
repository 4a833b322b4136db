use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::catalog::{model_slug, ListingQuery, ModelSummary, Variant};
use crate::error::AppError;
use crate::pricing::{PriceBreakup, PriceOptions, PricingError};
use crate::server::AppState;

const MIN_COMPARED: usize = 2;
const MAX_COMPARED: usize = 4;

#[derive(Debug, Default, Deserialize)]
pub struct CompareParams {
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedVariant {
    #[serde(flatten)]
    pub variant: Variant,
    /// Absent for unpriced variants
    pub on_road_price: Option<PriceBreakup>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedModel {
    #[serde(flatten)]
    pub summary: ModelSummary,
    pub variants: Vec<ComparedVariant>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub slugs: Vec<String>,
    pub state: String,
    pub models: Vec<ComparedModel>,
}

/// `maruti-suzuki-swift-vs-tata-nexon` -> `["maruti-suzuki-swift", "tata-nexon"]`
pub fn split_compare_slug(slug: &str) -> Result<Vec<String>, AppError> {
    let slugs: Vec<String> = slug
        .split("-vs-")
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();

    if slugs.len() < MIN_COMPARED || slugs.len() > MAX_COMPARED {
        return Err(AppError::InvalidInput(format!(
            "Compare between {} and {} models, got {}",
            MIN_COMPARED,
            MAX_COMPARED,
            slugs.len()
        )));
    }

    Ok(slugs)
}

/// Map each slug to a model id, from the index when it is fresh, else from the database
async fn resolve_slugs(state: &AppState, slugs: &[String]) -> Result<Vec<String>, AppError> {
    let mut resolved: Vec<Option<String>> = slugs
        .iter()
        .map(|slug| state.search.lookup_slug(slug).map(|entry| entry.id))
        .collect();

    if resolved.iter().any(Option::is_none) {
        let by_slug: HashMap<String, String> = state
            .store
            .active_models_with_brands()
            .await?
            .into_iter()
            .map(|m| (model_slug(&m.brand_name, &m.name), m.id))
            .collect();

        for (slot, slug) in resolved.iter_mut().zip(slugs) {
            if slot.is_none() {
                *slot = by_slug.get(slug).cloned();
            }
        }
    }

    resolved
        .into_iter()
        .zip(slugs)
        .map(|(id, slug)| id.ok_or_else(|| AppError::NotFound(format!("Model '{}' not found", slug))))
        .collect()
}

/// Handle /api/compare/:slug
pub async fn compare_models(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<CompareParams>,
) -> Result<impl IntoResponse, AppError> {
    let slugs = split_compare_slug(&slug)?;
    let ids = resolve_slugs(&state, &slugs).await?;

    let query = ListingQuery {
        ids: ids.clone(),
        limit: MAX_COMPARED as u32,
        ..ListingQuery::default()
    };
    let mut summaries: HashMap<String, ModelSummary> = state
        .store
        .list_model_summaries(&query)
        .await?
        .data
        .into_iter()
        .map(|s| (s.model.id.clone(), s))
        .collect();

    let mut variants_by_model: HashMap<String, Vec<Variant>> = HashMap::new();
    for variant in state.store.active_variants_for_models(&ids).await? {
        variants_by_model
            .entry(variant.model_id.clone())
            .or_default()
            .push(variant);
    }

    let calculator = state.pricing.load();
    let requested_state = params.state.filter(|s| !s.trim().is_empty());
    let user_state = requested_state.is_some();
    let region =
        requested_state.unwrap_or_else(|| state.config.load().pricing.default_state.clone());

    let mut models = Vec::with_capacity(ids.len());
    for id in &ids {
        let Some(summary) = summaries.remove(id) else {
            // duplicate slug in the request
            continue;
        };

        let stored = variants_by_model.remove(id).unwrap_or_default();
        let mut variants = Vec::with_capacity(stored.len());
        for variant in stored {
            let on_road_price = if variant.price > 0.0 {
                let fuel = variant
                    .fuel_type
                    .as_deref()
                    .unwrap_or(&summary.lowest_price_fuel_type);
                match calculator.calculate(variant.price, &region, fuel, PriceOptions::default()) {
                    Ok(breakup) => Some(breakup),
                    Err(e @ PricingError::UnknownState(_)) if user_state => return Err(e.into()),
                    Err(e @ (PricingError::UnknownState(_) | PricingError::UnknownFuelType(_))) => {
                        warn!(variant = %variant.id, error = %e, "Leaving variant unpriced");
                        None
                    }
                    Err(e) => return Err(e.into()),
                }
            } else {
                None
            };
            variants.push(ComparedVariant {
                variant,
                on_road_price,
            });
        }

        models.push(ComparedModel { summary, variants });
    }

    Ok(Json(CompareResponse {
        slugs,
        state: region,
        models,
    }))
}
