//! Brand / model / variant catalog: records, storage, listings and mutations

pub mod budget;
pub mod listing;
pub mod models;
pub mod sqlite;
pub mod store;
pub mod writer;

pub use budget::BudgetRange;
pub use listing::{ListingParams, ListingQuery, Page, Pagination, SortOrder};
pub use models::{
    model_slug, slugify, Brand, CarModel, CatalogImport, ModelSummary, ModelWithBrand, SearchEntry,
    Status, Variant,
};
pub use sqlite::SqliteCatalogStore;
pub use store::{CatalogStore, ImportSummary};
pub use writer::CatalogWriter;
