use async_trait::async_trait;
use serde::Serialize;

use super::listing::{ListingQuery, Page};
use super::models::{Brand, CarModel, CatalogImport, ModelSummary, ModelWithBrand, SearchEntry, Variant};

/// Rows written by a batch import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub brands: usize,
    pub models: usize,
    pub variants: usize,
}

/// Storage interface for the catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Cheap liveness query
    async fn ping(&self) -> Result<(), sqlx::Error>;

    async fn list_brands(&self, include_inactive: bool) -> Result<Vec<Brand>, sqlx::Error>;
    async fn get_brand(&self, id: &str) -> Result<Option<Brand>, sqlx::Error>;

    async fn list_models(&self, brand_id: Option<&str>) -> Result<Vec<CarModel>, sqlx::Error>;
    async fn get_model(&self, id: &str) -> Result<Option<CarModel>, sqlx::Error>;

    async fn list_variants(
        &self,
        model_id: Option<&str>,
        brand_id: Option<&str>,
    ) -> Result<Vec<Variant>, sqlx::Error>;
    async fn get_variant(&self, id: &str) -> Result<Option<Variant>, sqlx::Error>;

    /// Active variants of the given models, cheapest first
    async fn active_variants_for_models(&self, model_ids: &[String]) -> Result<Vec<Variant>, sqlx::Error>;

    /// Every active model with its brand name (search index source)
    async fn active_models_with_brands(&self) -> Result<Vec<ModelWithBrand>, sqlx::Error>;

    /// Case-insensitive substring match of every query term against "brand model"
    async fn search_models(&self, query: &str, limit: usize) -> Result<Vec<SearchEntry>, sqlx::Error>;

    async fn list_model_summaries(&self, query: &ListingQuery) -> Result<Page<ModelSummary>, sqlx::Error>;

    async fn upsert_brand(&self, brand: &Brand) -> Result<(), sqlx::Error>;
    async fn upsert_model(&self, model: &CarModel) -> Result<(), sqlx::Error>;
    async fn upsert_variant(&self, variant: &Variant) -> Result<(), sqlx::Error>;

    /// Returns false when nothing was deleted
    async fn delete_brand(&self, id: &str) -> Result<bool, sqlx::Error>;
    /// Removes the model's variants as well
    async fn delete_model(&self, id: &str) -> Result<bool, sqlx::Error>;
    async fn delete_variant(&self, id: &str) -> Result<bool, sqlx::Error>;

    /// Upsert a whole batch in one transaction
    async fn import(&self, batch: &CatalogImport) -> Result<ImportSummary, sqlx::Error>;
}
