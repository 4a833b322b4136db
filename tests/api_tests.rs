/// End-to-end tests through the HTTP router on an in-memory catalog
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use car_catalog::catalog::{
    Brand, CarModel, CatalogImport, CatalogStore, CatalogWriter, SqliteCatalogStore, Status, Variant,
};
use car_catalog::config::Config;
use car_catalog::db;
use car_catalog::server::{create_router, AppState};

fn brand(id: &str, name: &str) -> Brand {
    Brand {
        id: id.to_string(),
        name: name.to_string(),
        logo: None,
        ranking: 0,
        status: Status::Active,
    }
}

fn model(id: &str, brand_id: &str, name: &str) -> CarModel {
    CarModel {
        id: id.to_string(),
        brand_id: brand_id.to_string(),
        name: name.to_string(),
        status: Status::Active,
        is_popular: true,
        is_new: false,
        popular_rank: None,
        new_rank: None,
        body_type: Some("SUV".to_string()),
        launch_date: None,
        fuel_types: vec!["Petrol".to_string()],
        transmissions: vec!["Automatic".to_string()],
        hero_image: None,
    }
}

fn variant(id: &str, model_id: &str, brand_id: &str, price: f64) -> Variant {
    Variant {
        id: id.to_string(),
        brand_id: brand_id.to_string(),
        model_id: model_id.to_string(),
        name: id.to_uppercase(),
        price,
        status: Status::Active,
        fuel_type: Some("Petrol".to_string()),
        transmission: Some("Automatic".to_string()),
    }
}

async fn app_state() -> AppState {
    let store = SqliteCatalogStore::new(db::connect_in_memory().await.unwrap());
    store
        .import(&CatalogImport {
            brands: vec![brand("hyundai", "Hyundai"), brand("kia", "Kia")],
            models: vec![model("creta", "hyundai", "Creta"), model("seltos", "kia", "Seltos")],
            variants: vec![
                variant("creta-e", "creta", "hyundai", 1_100_000.0),
                variant("creta-sx", "creta", "hyundai", 1_900_000.0),
                variant("seltos-htk", "seltos", "kia", 1_150_000.0),
            ],
        })
        .await
        .unwrap();

    let store: Arc<dyn CatalogStore> = Arc::new(store);
    AppState::new(Config::default(), store).unwrap()
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<String>, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let x_cache = response
        .headers()
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, x_cache, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router(app_state().await, None);
    let (status, cache, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache, None);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_listing_is_cached_then_served_as_hit() {
    let app = create_router(app_state().await, None);

    let (status, cache, first) = get(&app, "/api/models-with-pricing?sort=price-asc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache.as_deref(), Some("MISS"));

    let (_, cache, second) = get(&app, "/api/models-with-pricing?sort=price-asc").await;
    assert_eq!(cache.as_deref(), Some("HIT"));
    assert_eq!(first, second);

    // a different query string is a different entry
    let (_, cache, _) = get(&app, "/api/models-with-pricing?sort=price-desc").await;
    assert_eq!(cache.as_deref(), Some("MISS"));
}

#[tokio::test]
async fn test_errors_are_not_cached() {
    let app = create_router(app_state().await, None);

    let (status, cache, _) = get(&app, "/api/brands/tesla").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(cache, None);

    let (_, _, stats) = get(&app, "/api/cache/stats").await;
    assert_eq!(stats["entries"], 0);
}

#[tokio::test]
async fn test_writer_mutation_refreshes_listing_and_search() {
    let state = app_state().await;
    state.search.build_index().await.unwrap();
    let app = create_router(state.clone(), None);
    let writer = CatalogWriter::new(state.store.clone(), state.search.clone(), state.cache.clone());

    let (_, _, before) = get(&app, "/api/models-with-pricing").await;
    assert_eq!(before["pagination"]["total"], 2);

    writer.upsert_model(&model("venue", "hyundai", "Venue")).await.unwrap();
    writer
        .upsert_variant(&variant("venue-e", "venue", "hyundai", 800_000.0))
        .await
        .unwrap();

    let (_, cache, after) = get(&app, "/api/models-with-pricing").await;
    assert_eq!(cache.as_deref(), Some("MISS"));
    assert_eq!(after["pagination"]["total"], 3);

    // whichever source answers, the new model is visible immediately
    let (_, _, found) = get(&app, "/api/search?q=venue").await;
    assert_eq!(found["total"], 1);
    assert_eq!(found["results"][0]["slug"], "hyundai-venue");
}

#[tokio::test]
async fn test_compare_prices_every_variant() {
    let app = create_router(app_state().await, None);
    let (status, _, body) = get(&app, "/api/compare/hyundai-creta-vs-kia-seltos?state=Delhi").await;

    assert_eq!(status, StatusCode::OK);
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 2);

    let creta_variants = models[0]["variants"].as_array().unwrap();
    assert_eq!(creta_variants.len(), 2);
    for v in creta_variants {
        let price = v["price"].as_f64().unwrap();
        let total = v["onRoadPrice"]["totalOnRoadPrice"].as_f64().unwrap();
        assert!(total > price);
        assert_eq!(v["onRoadPrice"]["stateFallback"], false);
    }
}

#[tokio::test]
async fn test_compare_rejects_single_model() {
    let app = create_router(app_state().await, None);
    let (status, _, body) = get(&app, "/api/compare/hyundai-creta").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_input");
}

#[tokio::test]
async fn test_budget_listing_and_search_stats() {
    let state = app_state().await;
    state.search.build_index().await.unwrap();
    let app = create_router(state, None);

    let (status, _, body) = get(&app, "/api/cars-by-budget/under-15").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);
    // cheapest first by default
    assert_eq!(body["data"][0]["name"], "Creta");

    let (_, _, stats) = get(&app, "/api/search/stats").await;
    assert_eq!(stats["entries"], 2);
}

#[tokio::test]
async fn test_demo_catalog_imports_and_serves() {
    let batch: CatalogImport = serde_json::from_str(include_str!("../demos/catalog.json")).unwrap();
    let store: Arc<dyn CatalogStore> =
        Arc::new(SqliteCatalogStore::new(db::connect_in_memory().await.unwrap()));
    let state = AppState::new(Config::default(), store).unwrap();
    let writer = CatalogWriter::new(state.store.clone(), state.search.clone(), state.cache.clone());

    let summary = writer.import(&batch).await.unwrap();
    assert_eq!((summary.brands, summary.models, summary.variants), (3, 3, 6));

    let app = create_router(state, None);
    let (_, _, popular) = get(&app, "/api/popular-cars").await;
    assert_eq!(popular["pagination"]["total"], 2);
    assert_eq!(popular["data"][0]["name"], "Swift");

    let (_, _, nexon) = get(&app, "/api/models/nexon").await;
    assert_eq!(nexon["fuelTypes"].as_array().unwrap().len(), 3);
}
