use anyhow::{Context, Result};
use car_catalog::cache::ResponseCache;
use car_catalog::catalog::{CatalogImport, CatalogStore, CatalogWriter, SqliteCatalogStore};
use car_catalog::search::{BuildOutcome, SearchIndex};
use car_catalog::{config, db};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Execute the import command
///
/// Loads `{brands, models, variants}` from a JSON file in one transaction,
/// then builds the search index to report what is now searchable.
pub async fn execute(config_path: &Path, file: &Path) -> Result<()> {
    let cfg = config::load_config(config_path)?;

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let batch: CatalogImport = serde_json::from_str(&content)
        .with_context(|| format!("Invalid catalog JSON in {}", file.display()))?;

    println!(
        "{} {} brands, {} models, {} variants from {}",
        "Importing".yellow(),
        batch.brands.len(),
        batch.models.len(),
        batch.variants.len(),
        file.display()
    );

    let pool = db::connect(&cfg.database).await?;
    let store: Arc<dyn CatalogStore> = Arc::new(SqliteCatalogStore::new(pool.clone()));
    let index = Arc::new(SearchIndex::new(
        store.clone(),
        cfg.search.min_query_length,
        Duration::from_secs(cfg.search.refresh_interval_seconds),
    ));
    let cache = Arc::new(ResponseCache::new(&cfg.cache));
    let writer = CatalogWriter::new(store, index.clone(), cache);

    let summary = writer.import(&batch).await?;
    info!(
        brands = summary.brands,
        models = summary.models,
        variants = summary.variants,
        "Import finished"
    );

    // the writer scheduled a background rebuild; build inline so the report is accurate
    let entries = loop {
        match index.build_index().await? {
            BuildOutcome::Built { entries } => break entries,
            BuildOutcome::Coalesced => tokio::time::sleep(Duration::from_millis(20)).await,
        }
    };
    index.shutdown();
    pool.close().await;

    println!("{}", "✓ Import successful".green());
    println!(
        "  {}: {} brands, {} models, {} variants",
        "Written".cyan(),
        summary.brands,
        summary.models,
        summary.variants
    );
    println!("  {}: {} searchable models", "Search index".cyan(), entries);

    Ok(())
}
