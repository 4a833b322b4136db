use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::server::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandParams {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelParams {
    pub brand_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantParams {
    pub model_id: Option<String>,
    pub brand_id: Option<String>,
}

pub async fn list_brands(
    State(state): State<AppState>,
    Query(params): Query<BrandParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.list_brands(params.include_inactive).await?))
}

pub async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let brand = state
        .store
        .get_brand(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Brand '{}' not found", id)))?;
    Ok(Json(brand))
}

pub async fn list_models(
    State(state): State<AppState>,
    Query(params): Query<ModelParams>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.list_models(params.brand_id.as_deref()).await?))
}

pub async fn get_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let model = state
        .store
        .get_model(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Model '{}' not found", id)))?;
    Ok(Json(model))
}

pub async fn list_variants(
    State(state): State<AppState>,
    Query(params): Query<VariantParams>,
) -> Result<impl IntoResponse, AppError> {
    let variants = state
        .store
        .list_variants(params.model_id.as_deref(), params.brand_id.as_deref())
        .await?;
    Ok(Json(variants))
}

pub async fn get_variant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let variant = state
        .store
        .get_variant(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Variant '{}' not found", id)))?;
    Ok(Json(variant))
}
