use anyhow::Result;
use arc_swap::ArcSwap;
use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    cache::{self, ResponseCache},
    catalog::{CatalogStore, SqliteCatalogStore},
    config::Config,
    db, handlers, metrics,
    pricing::OnRoadPriceCalculator,
    search::SearchIndex,
    signals::setup_signal_handlers,
};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<Config>>,
    pub store: Arc<dyn CatalogStore>,
    pub search: Arc<SearchIndex>,
    pub cache: Arc<ResponseCache>,
    pub pricing: Arc<ArcSwap<OnRoadPriceCalculator>>,
}

impl AppState {
    /// Wire services for `config` on top of `store`
    pub fn new(config: Config, store: Arc<dyn CatalogStore>) -> Result<Self> {
        let calculator = config
            .pricing
            .build_calculator()
            .map_err(|e| anyhow::anyhow!("Invalid pricing configuration: {}", e))?;

        let search = Arc::new(SearchIndex::new(
            store.clone(),
            config.search.min_query_length,
            Duration::from_secs(config.search.refresh_interval_seconds),
        ));
        let cache = Arc::new(ResponseCache::new(&config.cache));

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            store,
            search,
            cache,
            pricing: Arc::new(ArcSwap::from_pointee(calculator)),
        })
    }
}

/// Start the catalog server
///
/// Connects the database, builds the search index, starts the refresh loop and
/// serves until SIGTERM/SIGINT. SIGHUP reloads `config_path`.
pub async fn start_server(config: Config, config_path: PathBuf) -> Result<()> {
    let metrics_handle = if config.metrics.enabled {
        info!("Initializing Prometheus metrics...");
        Some(Arc::new(metrics::init_metrics()?))
    } else {
        None
    };

    let pool = db::connect(&config.database).await?;
    info!(url = %config.database.url, "Catalog database ready");

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let store: Arc<dyn CatalogStore> = Arc::new(SqliteCatalogStore::new(pool));
    let state = AppState::new(config, store)?;

    // a failed first build is not fatal; search falls back to the database
    if let Err(e) = state.search.build_index().await {
        error!(error = %e, "Initial search index build failed");
    }
    let refresh_handle = state.search.spawn_refresh_loop();

    let (shutdown_tx, signal_handle) = setup_signal_handlers(state.clone(), config_path);
    let mut shutdown_rx = shutdown_tx.subscribe();

    let app = create_router(state.clone(), metrics_handle);

    info!("Starting car catalog on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    state.search.shutdown();
    state.cache.clear();
    refresh_handle.await?;
    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState, metrics_handle: Option<Arc<PrometheusHandle>>) -> Router {
    let config = state.config.load_full();

    // GET endpoints served through the response cache
    let cached = Router::new()
        .route("/api/search", get(handlers::search::search_models))
        .route(
            "/api/models-with-pricing",
            get(handlers::listing::models_with_pricing),
        )
        .route(
            "/api/cars-by-budget/:budget",
            get(handlers::listing::cars_by_budget),
        )
        .route("/api/popular-cars", get(handlers::listing::popular_cars))
        .route("/api/compare/:slug", get(handlers::compare::compare_models))
        .route("/api/brands", get(handlers::catalog::list_brands))
        .route("/api/brands/:id", get(handlers::catalog::get_brand))
        .route("/api/models", get(handlers::catalog::list_models))
        .route("/api/models/:id", get(handlers::catalog::get_model))
        .route("/api/variants", get(handlers::catalog::list_variants))
        .route("/api/variants/:id", get(handlers::catalog::get_variant))
        .route_layer(middleware::from_fn_with_state(
            state.cache.clone(),
            cache::cache_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/api/on-road-price", get(handlers::pricing::on_road_price))
        .route("/api/search/stats", get(handlers::stats::search_stats))
        .route("/api/cache/stats", get(handlers::stats::cache_stats))
        .merge(cached)
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(
            Router::new()
                .route(&config.metrics.endpoint, get(handlers::metrics_handler::metrics))
                .with_state(handle),
        );
    }

    let cors = if config.server.cors_allow_any {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    router
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
