use std::sync::Arc;
use tracing::info;

use super::models::{Brand, CarModel, CatalogImport, Variant};
use super::store::{CatalogStore, ImportSummary};
use crate::cache::ResponseCache;
use crate::search::SearchIndex;

/// Cache namespaces that embed brand, model or variant data
const BRAND_NAMESPACES: &[&str] = &[
    "brands",
    "models",
    "models-with-pricing",
    "cars-by-budget",
    "popular-cars",
    "search",
    "compare",
];
const MODEL_NAMESPACES: &[&str] = &[
    "models",
    "variants",
    "models-with-pricing",
    "cars-by-budget",
    "popular-cars",
    "search",
    "compare",
];
const VARIANT_NAMESPACES: &[&str] = &[
    "variants",
    "models-with-pricing",
    "cars-by-budget",
    "popular-cars",
    "compare",
];

/// Applies catalog mutations and keeps the search index and response cache in step
pub struct CatalogWriter {
    store: Arc<dyn CatalogStore>,
    index: Arc<SearchIndex>,
    cache: Arc<ResponseCache>,
}

impl CatalogWriter {
    pub fn new(store: Arc<dyn CatalogStore>, index: Arc<SearchIndex>, cache: Arc<ResponseCache>) -> Self {
        Self { store, index, cache }
    }

    pub async fn upsert_brand(&self, brand: &Brand) -> Result<(), sqlx::Error> {
        self.store.upsert_brand(brand).await?;
        self.after_write(BRAND_NAMESPACES);
        Ok(())
    }

    pub async fn upsert_model(&self, model: &CarModel) -> Result<(), sqlx::Error> {
        self.store.upsert_model(model).await?;
        self.after_write(MODEL_NAMESPACES);
        Ok(())
    }

    pub async fn upsert_variant(&self, variant: &Variant) -> Result<(), sqlx::Error> {
        self.store.upsert_variant(variant).await?;
        self.after_write(VARIANT_NAMESPACES);
        Ok(())
    }

    pub async fn delete_brand(&self, id: &str) -> Result<bool, sqlx::Error> {
        let deleted = self.store.delete_brand(id).await?;
        if deleted {
            self.after_write(BRAND_NAMESPACES);
            self.cache.invalidate_namespace("variants");
        }
        Ok(deleted)
    }

    pub async fn delete_model(&self, id: &str) -> Result<bool, sqlx::Error> {
        let deleted = self.store.delete_model(id).await?;
        if deleted {
            self.after_write(MODEL_NAMESPACES);
        }
        Ok(deleted)
    }

    pub async fn delete_variant(&self, id: &str) -> Result<bool, sqlx::Error> {
        let deleted = self.store.delete_variant(id).await?;
        if deleted {
            self.after_write(VARIANT_NAMESPACES);
        }
        Ok(deleted)
    }

    pub async fn import(&self, batch: &CatalogImport) -> Result<ImportSummary, sqlx::Error> {
        let summary = self.store.import(batch).await?;
        info!(
            brands = summary.brands,
            models = summary.models,
            variants = summary.variants,
            "Catalog batch imported"
        );
        self.index.invalidate();
        self.cache.clear();
        Ok(summary)
    }

    fn after_write(&self, namespaces: &[&str]) {
        self.index.invalidate();
        for namespace in namespaces {
            self.cache.invalidate_namespace(namespace);
        }
    }
}
