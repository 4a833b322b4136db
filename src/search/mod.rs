//! Model search: in-memory index with a database fallback

pub mod index;
pub mod tokenizer;

pub use index::{BuildOutcome, IndexSnapshot, IndexStats, SearchIndex};

use serde::Serialize;

use crate::catalog::{CatalogStore, SearchEntry};
use crate::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Memory,
    Database,
}

impl SearchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Database => "database",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchEntry>,
    pub source: SearchSource,
    pub index_age_ms: Option<u64>,
    pub total: usize,
}

/// Answer from the index when it is usable, otherwise from the database
pub async fn search(
    index: &SearchIndex,
    store: &dyn CatalogStore,
    query: &str,
    limit: usize,
) -> Result<SearchResponse, sqlx::Error> {
    let (results, source) = match index.search_from_index(query, limit) {
        Some(results) => (results, SearchSource::Memory),
        None => {
            let results = if query.trim().chars().count() < index.min_query_length() {
                Vec::new()
            } else {
                store.search_models(query, limit).await?
            };
            (results, SearchSource::Database)
        }
    };

    metrics::record_search(source.as_str());

    Ok(SearchResponse {
        total: results.len(),
        index_age_ms: index.stats().age_ms,
        results,
        source,
    })
}
