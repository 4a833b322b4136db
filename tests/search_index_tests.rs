/// Integration tests for the in-memory search index lifecycle
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use car_catalog::catalog::{
    Brand, CarModel, CatalogImport, CatalogStore, ImportSummary, ListingQuery, ModelSummary,
    ModelWithBrand, Page, SearchEntry, SqliteCatalogStore, Status, Variant,
};
use car_catalog::db;
use car_catalog::search::{self, BuildOutcome, SearchIndex, SearchSource};

/// SQLite store whose index source can be slowed down or made to fail
struct InstrumentedStore {
    inner: SqliteCatalogStore,
    fail: AtomicBool,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[async_trait]
impl CatalogStore for InstrumentedStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.inner.ping().await
    }

    async fn list_brands(&self, include_inactive: bool) -> Result<Vec<Brand>, sqlx::Error> {
        self.inner.list_brands(include_inactive).await
    }

    async fn get_brand(&self, id: &str) -> Result<Option<Brand>, sqlx::Error> {
        self.inner.get_brand(id).await
    }

    async fn list_models(&self, brand_id: Option<&str>) -> Result<Vec<CarModel>, sqlx::Error> {
        self.inner.list_models(brand_id).await
    }

    async fn get_model(&self, id: &str) -> Result<Option<CarModel>, sqlx::Error> {
        self.inner.get_model(id).await
    }

    async fn list_variants(
        &self,
        model_id: Option<&str>,
        brand_id: Option<&str>,
    ) -> Result<Vec<Variant>, sqlx::Error> {
        self.inner.list_variants(model_id, brand_id).await
    }

    async fn get_variant(&self, id: &str) -> Result<Option<Variant>, sqlx::Error> {
        self.inner.get_variant(id).await
    }

    async fn active_variants_for_models(&self, model_ids: &[String]) -> Result<Vec<Variant>, sqlx::Error> {
        self.inner.active_variants_for_models(model_ids).await
    }

    async fn active_models_with_brands(&self) -> Result<Vec<ModelWithBrand>, sqlx::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let result = if self.fail.load(Ordering::SeqCst) {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            self.inner.active_models_with_brands().await
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn search_models(&self, query: &str, limit: usize) -> Result<Vec<SearchEntry>, sqlx::Error> {
        self.inner.search_models(query, limit).await
    }

    async fn list_model_summaries(&self, query: &ListingQuery) -> Result<Page<ModelSummary>, sqlx::Error> {
        self.inner.list_model_summaries(query).await
    }

    async fn upsert_brand(&self, brand: &Brand) -> Result<(), sqlx::Error> {
        self.inner.upsert_brand(brand).await
    }

    async fn upsert_model(&self, model: &CarModel) -> Result<(), sqlx::Error> {
        self.inner.upsert_model(model).await
    }

    async fn upsert_variant(&self, variant: &Variant) -> Result<(), sqlx::Error> {
        self.inner.upsert_variant(variant).await
    }

    async fn delete_brand(&self, id: &str) -> Result<bool, sqlx::Error> {
        self.inner.delete_brand(id).await
    }

    async fn delete_model(&self, id: &str) -> Result<bool, sqlx::Error> {
        self.inner.delete_model(id).await
    }

    async fn delete_variant(&self, id: &str) -> Result<bool, sqlx::Error> {
        self.inner.delete_variant(id).await
    }

    async fn import(&self, batch: &CatalogImport) -> Result<ImportSummary, sqlx::Error> {
        self.inner.import(batch).await
    }
}

fn brand(id: &str, name: &str) -> Brand {
    Brand {
        id: id.to_string(),
        name: name.to_string(),
        logo: None,
        ranking: 0,
        status: Status::Active,
    }
}

fn model(id: &str, brand_id: &str, name: &str, status: Status) -> CarModel {
    CarModel {
        id: id.to_string(),
        brand_id: brand_id.to_string(),
        name: name.to_string(),
        status,
        is_popular: false,
        is_new: false,
        popular_rank: None,
        new_rank: None,
        body_type: None,
        launch_date: None,
        fuel_types: Vec::new(),
        transmissions: Vec::new(),
        hero_image: None,
    }
}

async fn instrumented_store(delay: Duration) -> Arc<InstrumentedStore> {
    let inner = SqliteCatalogStore::new(db::connect_in_memory().await.unwrap());
    inner
        .import(&CatalogImport {
            brands: vec![brand("b1", "Maruti Suzuki"), brand("b2", "Tata")],
            models: vec![
                model("m1", "b1", "Swift", Status::Active),
                model("m2", "b1", "Swift Dzire", Status::Active),
                model("m3", "b1", "Swift Classic", Status::Inactive),
                model("m4", "b2", "Nexon", Status::Active),
            ],
            variants: Vec::new(),
        })
        .await
        .unwrap();

    Arc::new(InstrumentedStore {
        inner,
        fail: AtomicBool::new(false),
        delay,
        calls: AtomicUsize::new(0),
        in_flight: AtomicUsize::new(0),
        max_in_flight: AtomicUsize::new(0),
    })
}

fn index_over(store: &Arc<InstrumentedStore>) -> Arc<SearchIndex> {
    let store: Arc<dyn CatalogStore> = store.clone();
    Arc::new(SearchIndex::new(store, 2, Duration::from_secs(3600)))
}

async fn wait_until_idle(index: &SearchIndex) {
    for _ in 0..200 {
        if !index.stats().building {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if !index.stats().building {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("search index never became idle");
}

#[tokio::test]
async fn test_swift_finds_every_active_swift_and_no_inactive() {
    let store = instrumented_store(Duration::ZERO).await;
    let index = index_over(&store);

    assert_eq!(index.build_index().await.unwrap(), BuildOutcome::Built { entries: 3 });

    let results = index.search_from_index("swift", 10).unwrap();
    let mut ids: Vec<&str> = results.iter().map(|e| e.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["m1", "m2"]);
    assert_eq!(results[0].name, "Swift");
}

#[tokio::test]
async fn test_unbuilt_index_defers_to_database() {
    let store = instrumented_store(Duration::ZERO).await;
    let index = index_over(&store);

    assert!(index.search_from_index("swift", 10).is_none());

    let response = search::search(&index, store.as_ref(), "swift", 10).await.unwrap();
    assert_eq!(response.source, SearchSource::Database);
    assert_eq!(response.total, 2);
}

#[tokio::test]
async fn test_concurrent_invalidations_coalesce() {
    let store = instrumented_store(Duration::from_millis(100)).await;
    let index = index_over(&store);

    let first = {
        let index = index.clone();
        tokio::spawn(async move { index.build_index().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    for _ in 0..5 {
        index.invalidate();
    }

    first.await.unwrap().unwrap();
    wait_until_idle(&index).await;

    assert_eq!(store.max_in_flight.load(Ordering::SeqCst), 1);
    // the initial build plus exactly one follow-up for all five invalidations
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    assert!(index.search_from_index("nexon", 10).is_some());
}

#[tokio::test]
async fn test_failed_refresh_keeps_fresh_snapshot() {
    let store = instrumented_store(Duration::ZERO).await;
    let index = index_over(&store);
    index.build_index().await.unwrap();

    store.fail.store(true, Ordering::SeqCst);
    assert!(index.build_index().await.is_err());

    // nothing was invalidated, so the old snapshot is still current
    let results = index.search_from_index("nexon", 10).unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_failed_rebuild_after_invalidate_falls_back() {
    let store = instrumented_store(Duration::ZERO).await;
    let index = index_over(&store);
    index.build_index().await.unwrap();

    store.fail.store(true, Ordering::SeqCst);
    index.invalidate();
    wait_until_idle(&index).await;

    assert!(index.search_from_index("swift", 10).is_none());
    assert!(index.stats().stale);

    let response = search::search(&index, store.as_ref(), "swift", 10).await.unwrap();
    assert_eq!(response.source, SearchSource::Database);
    assert_eq!(response.total, 2);

    store.fail.store(false, Ordering::SeqCst);
    index.build_index().await.unwrap();
    assert!(index.search_from_index("swift", 10).is_some());
}

#[tokio::test]
async fn test_shutdown_drops_snapshot() {
    let store = instrumented_store(Duration::ZERO).await;
    let index = index_over(&store);
    index.build_index().await.unwrap();
    let refresh = index.spawn_refresh_loop();

    index.shutdown();
    refresh.await.unwrap();

    assert!(index.search_from_index("swift", 10).is_none());
    assert_eq!(index.stats().entries, 0);
}
