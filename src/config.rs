use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::pricing::{
    ChargeSchedule, FuelRates, OnRoadPriceCalculator, PricingError, RateTable, UnknownInputPolicy,
};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_true")]
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            cors_allow_any: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Periodic index rebuild interval
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_search_limit")]
    pub max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval(),
            min_query_length: default_min_query_length(),
            default_limit: default_search_limit(),
            max_limit: default_max_search_limit(),
        }
    }
}

/// HTTP response cache settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_seconds: u64,
    /// Entries this close to expiry are served once as STALE
    #[serde(default = "default_stale_seconds")]
    pub stale_seconds: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Namespace (path segment after `/api/`) -> TTL in seconds
    #[serde(default = "default_namespace_ttls")]
    pub namespaces: HashMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_seconds: default_cache_ttl(),
            stale_seconds: default_stale_seconds(),
            max_entries: default_max_entries(),
            namespaces: default_namespace_ttls(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PricingConfig {
    #[serde(default = "default_state")]
    pub default_state: String,
    #[serde(default)]
    pub unknown_input: UnknownInputPolicy,
    #[serde(default = "default_cess_percent")]
    pub road_safety_cess_percent: f64,
    #[serde(default = "default_insurance_percent")]
    pub insurance_percent: FuelRates,
    #[serde(default = "default_tcs_threshold")]
    pub tcs_threshold: f64,
    #[serde(default = "default_tcs_percent")]
    pub tcs_percent: f64,
    #[serde(default = "default_other_charges")]
    pub other_charges: f64,
    #[serde(default = "default_hypothecation_fee")]
    pub hypothecation_fee: f64,
    #[serde(default = "default_fastag_fee")]
    pub fastag_fee: f64,
    /// TOML file replacing the built-in RTO table
    #[serde(default)]
    pub rate_table_path: Option<PathBuf>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_state: default_state(),
            unknown_input: UnknownInputPolicy::default(),
            road_safety_cess_percent: default_cess_percent(),
            insurance_percent: default_insurance_percent(),
            tcs_threshold: default_tcs_threshold(),
            tcs_percent: default_tcs_percent(),
            other_charges: default_other_charges(),
            hypothecation_fee: default_hypothecation_fee(),
            fastag_fee: default_fastag_fee(),
            rate_table_path: None,
        }
    }
}

impl PricingConfig {
    pub fn charge_schedule(&self) -> ChargeSchedule {
        ChargeSchedule {
            road_safety_cess_percent: self.road_safety_cess_percent,
            insurance_percent: self.insurance_percent,
            tcs_threshold: self.tcs_threshold,
            tcs_percent: self.tcs_percent,
            other_charges: self.other_charges,
            hypothecation_fee: self.hypothecation_fee,
            fastag_fee: self.fastag_fee,
        }
    }

    pub fn rate_table(&self) -> Result<RateTable, PricingError> {
        match &self.rate_table_path {
            Some(path) => RateTable::from_toml_file(path, &self.default_state),
            None => RateTable::builtin().with_default_state(&self.default_state),
        }
    }

    /// Build the calculator this section describes
    pub fn build_calculator(&self) -> Result<OnRoadPriceCalculator, PricingError> {
        OnRoadPriceCalculator::new(self.rate_table()?, self.charge_schedule(), self.unknown_input)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_metrics_endpoint(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}

fn default_database_url() -> String {
    "sqlite://data/catalog.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_refresh_interval() -> u64 {
    1800
}

fn default_min_query_length() -> usize {
    2
}

fn default_search_limit() -> usize {
    20
}

fn default_max_search_limit() -> usize {
    50
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_stale_seconds() -> u64 {
    60
}

fn default_max_entries() -> usize {
    10_000
}

fn default_namespace_ttls() -> HashMap<String, u64> {
    [
        ("brands", 3600),
        ("models", 1800),
        ("variants", 1800),
        ("models-with-pricing", 1800),
        ("cars-by-budget", 1800),
        ("popular-cars", 1800),
        ("search", 300),
        ("compare", 900),
    ]
    .into_iter()
    .map(|(ns, ttl)| (ns.to_string(), ttl))
    .collect()
}

fn default_state() -> String {
    "Maharashtra".to_string()
}

fn default_cess_percent() -> f64 {
    2.0
}

fn default_insurance_percent() -> FuelRates {
    FuelRates::uniform(4.6)
}

fn default_tcs_threshold() -> f64 {
    999_000.0
}

fn default_tcs_percent() -> f64 {
    1.0
}

fn default_other_charges() -> f64 {
    2000.0
}

fn default_hypothecation_fee() -> f64 {
    1500.0
}

fn default_fastag_fee() -> f64 {
    500.0
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_string()
}

/// Load configuration from `path` (optional file) and `CAR_CATALOG__*` environment variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("CAR_CATALOG").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("server.port must not be 0");
    }

    if cfg.database.url.trim().is_empty() {
        anyhow::bail!("database.url cannot be empty");
    }

    if cfg.database.max_connections == 0 {
        anyhow::bail!("database.max_connections must be at least 1");
    }

    if cfg.search.min_query_length == 0 {
        anyhow::bail!("search.min_query_length must be at least 1");
    }

    if cfg.search.refresh_interval_seconds == 0 {
        anyhow::bail!("search.refresh_interval_seconds must be at least 1");
    }

    if cfg.search.default_limit == 0 || cfg.search.default_limit > cfg.search.max_limit {
        anyhow::bail!(
            "search.default_limit ({}) must be between 1 and search.max_limit ({})",
            cfg.search.default_limit,
            cfg.search.max_limit
        );
    }

    if cfg.cache.enabled && cfg.cache.stale_seconds >= cfg.cache.default_ttl_seconds {
        anyhow::bail!(
            "cache.stale_seconds ({}) must be less than cache.default_ttl_seconds ({})",
            cfg.cache.stale_seconds,
            cfg.cache.default_ttl_seconds
        );
    }

    if !cfg.metrics.endpoint.starts_with('/') {
        anyhow::bail!("metrics.endpoint must start with '/'");
    }

    // Builds the rate table too, so an unknown default_state or a broken override file fails here
    cfg.pricing
        .build_calculator()
        .map_err(|e| anyhow::anyhow!("Invalid pricing configuration: {}", e))?;

    Ok(())
}
