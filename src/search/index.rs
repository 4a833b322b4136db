use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::tokenizer::{index_terms, query_terms};
use crate::catalog::{CatalogStore, SearchEntry};
use crate::metrics;

struct IndexedEntry {
    entry: SearchEntry,
    name_lower: String,
    brand_lower: String,
    /// "brand name", lower-cased
    haystack: String,
}

/// Immutable result of one index build
pub struct IndexSnapshot {
    entries: Vec<IndexedEntry>,
    by_id: HashMap<String, usize>,
    by_slug: HashMap<String, usize>,
    /// token -> sorted entry positions
    tokens: HashMap<String, Vec<usize>>,
    generation: u64,
    built_at: DateTime<Utc>,
    built_instant: Instant,
    build_duration: Duration,
}

impl IndexSnapshot {
    fn build(entries: Vec<SearchEntry>, generation: u64, build_duration: Duration) -> Self {
        let mut indexed = Vec::with_capacity(entries.len());
        let mut by_id = HashMap::with_capacity(entries.len());
        let mut by_slug = HashMap::with_capacity(entries.len());
        let mut tokens: HashMap<String, Vec<usize>> = HashMap::new();

        for (pos, entry) in entries.into_iter().enumerate() {
            let name_lower = entry.name.to_lowercase();
            let brand_lower = entry.brand_name.to_lowercase();
            let haystack = format!("{} {}", brand_lower, name_lower);

            let mut terms: HashSet<String> = HashSet::new();
            terms.extend(index_terms(&entry.name));
            terms.extend(index_terms(&entry.brand_name));
            terms.extend(index_terms(&haystack));
            for term in terms {
                tokens.entry(term).or_default().push(pos);
            }

            by_id.insert(entry.id.clone(), pos);
            by_slug.insert(entry.slug.clone(), pos);
            indexed.push(IndexedEntry {
                entry,
                name_lower,
                brand_lower,
                haystack,
            });
        }

        Self {
            entries: indexed,
            by_id,
            by_slug,
            tokens,
            generation,
            built_at: Utc::now(),
            built_instant: Instant::now(),
            build_duration,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn get(&self, id: &str) -> Option<&SearchEntry> {
        self.by_id.get(id).map(|&pos| &self.entries[pos].entry)
    }

    pub fn get_by_slug(&self, slug: &str) -> Option<&SearchEntry> {
        self.by_slug.get(slug).map(|&pos| &self.entries[pos].entry)
    }

    fn has_token(&self, term: &str, pos: usize) -> bool {
        self.tokens
            .get(term)
            .is_some_and(|positions| positions.binary_search(&pos).is_ok())
    }

    fn search(&self, query: &str, limit: usize) -> Vec<SearchEntry> {
        let full = query.trim().to_lowercase();
        let terms = query_terms(&full);
        if terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut hits: Vec<(bool, usize, &IndexedEntry)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, indexed)| terms.iter().all(|term| indexed.haystack.contains(term.as_str())))
            .map(|(pos, indexed)| {
                let starts =
                    indexed.name_lower.starts_with(&full) || indexed.brand_lower.starts_with(&full);
                let prefix_hits = terms.iter().filter(|t| self.has_token(t, pos)).count();
                (starts, prefix_hits, indexed)
            })
            .collect();

        hits.sort_by(|a, b| {
            (Reverse(a.0), Reverse(a.1), &a.2.name_lower, &a.2.entry.id)
                .cmp(&(Reverse(b.0), Reverse(b.1), &b.2.name_lower, &b.2.entry.id))
        });
        hits.truncate(limit);
        hits.into_iter().map(|(_, _, indexed)| indexed.entry.clone()).collect()
    }
}

/// Result of a `build_index` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// This call ran a build (the last one, if follow-ups were chained)
    Built { entries: usize },
    /// A build was already in flight; it will run one follow-up for this request
    Coalesced,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub entries: usize,
    pub tokens: usize,
    pub last_built_at: Option<DateTime<Utc>>,
    pub age_ms: Option<u64>,
    pub last_build_ms: Option<u64>,
    pub builds_completed: u64,
    pub building: bool,
    pub stale: bool,
}

/// In-memory search index over active models
///
/// Readers get the current snapshot lock-free. Content mutations call
/// [`SearchIndex::invalidate`], which marks the snapshot stale and schedules a
/// rebuild in the background. At most one rebuild runs at a time; requests
/// that arrive meanwhile collapse into a single follow-up rebuild.
pub struct SearchIndex {
    store: Arc<dyn CatalogStore>,
    snapshot: ArcSwapOption<IndexSnapshot>,
    /// Bumped by every invalidation; a snapshot built from an older
    /// generation is stale
    generation: AtomicU64,
    building: AtomicBool,
    pending: AtomicBool,
    builds_completed: AtomicU64,
    min_query_length: usize,
    refresh_interval: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl SearchIndex {
    pub fn new(store: Arc<dyn CatalogStore>, min_query_length: usize, refresh_interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            store,
            snapshot: ArcSwapOption::const_empty(),
            generation: AtomicU64::new(0),
            building: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            builds_completed: AtomicU64::new(0),
            min_query_length: min_query_length.max(1),
            refresh_interval: refresh_interval.max(Duration::from_secs(1)),
            shutdown_tx,
        }
    }

    /// Build now, unless a build is already running
    pub async fn build_index(&self) -> Result<BuildOutcome, sqlx::Error> {
        self.pending.store(true, Ordering::SeqCst);
        match self.run_pending_builds().await {
            Some(result) => result.map(|entries| BuildOutcome::Built { entries }),
            None => Ok(BuildOutcome::Coalesced),
        }
    }

    /// Mark the index stale and rebuild in the background
    pub fn invalidate(self: &Arc<Self>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.pending.store(true, Ordering::SeqCst);
        debug!("Search index invalidated");

        let index = Arc::clone(self);
        tokio::spawn(async move {
            index.run_pending_builds().await;
        });
    }

    /// Search the current snapshot.
    ///
    /// `None` means the caller must fall back to the database: the index has
    /// not been built, is stale, or is being rebuilt.
    pub fn search_from_index(&self, query: &str, limit: usize) -> Option<Vec<SearchEntry>> {
        let snapshot = self.current()?;

        if query.trim().chars().count() < self.min_query_length {
            return Some(Vec::new());
        }
        Some(snapshot.search(query, limit))
    }

    /// Lookup by slug in a fresh snapshot
    pub fn lookup_slug(&self, slug: &str) -> Option<SearchEntry> {
        self.current()?.get_by_slug(slug).cloned()
    }

    /// The snapshot if it is fresh and no rebuild is running
    fn current(&self) -> Option<Arc<IndexSnapshot>> {
        if self.building.load(Ordering::SeqCst) {
            return None;
        }
        let snapshot = self.snapshot.load_full()?;
        if snapshot.generation != self.generation.load(Ordering::SeqCst) {
            return None;
        }
        Some(snapshot)
    }

    pub fn min_query_length(&self) -> usize {
        self.min_query_length
    }

    /// Built at least once
    pub fn is_ready(&self) -> bool {
        self.builds_completed.load(Ordering::SeqCst) > 0
    }

    pub fn stats(&self) -> IndexStats {
        let snapshot = self.snapshot.load_full();
        let generation = self.generation.load(Ordering::SeqCst);

        IndexStats {
            entries: snapshot.as_ref().map_or(0, |s| s.len()),
            tokens: snapshot.as_ref().map_or(0, |s| s.token_count()),
            last_built_at: snapshot.as_ref().map(|s| s.built_at),
            age_ms: snapshot
                .as_ref()
                .map(|s| s.built_instant.elapsed().as_millis() as u64),
            last_build_ms: snapshot
                .as_ref()
                .map(|s| s.build_duration.as_millis() as u64),
            builds_completed: self.builds_completed.load(Ordering::SeqCst),
            building: self.building.load(Ordering::SeqCst),
            stale: snapshot.as_ref().map_or(true, |s| s.generation != generation),
        }
    }

    /// Periodic rebuilds until [`SearchIndex::shutdown`]
    pub fn spawn_refresh_loop(self: &Arc<Self>) -> JoinHandle<()> {
        let index = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(index.refresh_interval);
            // the first tick completes immediately; startup already built the index
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("Periodic search index refresh");
                        index.pending.store(true, Ordering::SeqCst);
                        index.run_pending_builds().await;
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("Search index refresh loop stopped");
                        break;
                    }
                }
            }
        })
    }

    /// Stop the refresh loop and drop the snapshot
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
        self.snapshot.store(None);
        info!("Search index shut down");
    }

    /// Run builds while requests are pending, unless another task holds the guard.
    ///
    /// Returns the result of the last build this call ran.
    async fn run_pending_builds(&self) -> Option<Result<usize, sqlx::Error>> {
        let mut last = None;

        while self.pending.load(Ordering::SeqCst) {
            if self
                .building
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                // the running builder re-checks `pending` when it finishes
                break;
            }

            if self.pending.swap(false, Ordering::SeqCst) {
                last = Some(self.rebuild().await);
            }
            self.building.store(false, Ordering::SeqCst);
        }

        last
    }

    async fn rebuild(&self) -> Result<usize, sqlx::Error> {
        let generation = self.generation.load(Ordering::SeqCst);
        let started = Instant::now();

        let rows = match self.store.active_models_with_brands().await {
            Ok(rows) => rows,
            Err(e) => {
                metrics::record_index_rebuild("failure", started.elapsed());
                error!(error = %e, "Search index rebuild failed, keeping previous snapshot");
                return Err(e);
            }
        };

        let entries: Vec<SearchEntry> = rows.into_iter().map(SearchEntry::from).collect();
        let snapshot = IndexSnapshot::build(entries, generation, started.elapsed());
        let count = snapshot.len();
        let tokens = snapshot.token_count();
        let elapsed = started.elapsed();

        self.snapshot.store(Some(Arc::new(snapshot)));
        self.builds_completed.fetch_add(1, Ordering::SeqCst);
        metrics::record_index_rebuild("success", elapsed);

        info!(
            entries = count,
            tokens = tokens,
            elapsed_ms = elapsed.as_millis() as u64,
            "Search index built"
        );

        Ok(count)
    }
}
