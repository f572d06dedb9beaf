//! # Category Cache
//!
//! In-memory read-through cache for categories, keyed by both name and ID.
//!
//! ## Key Responsibilities
//!
//! - **Dual lookup**: one entry is reachable by name and by ID, and the two
//!   maps always describe the same set of categories
//! - **Bookkeeping**: hit and miss counters are bumped while the read guard of
//!   the lookup is still held, so stats never observe a lookup without its count
//! - **Freshness**: every removal bumps a generation number, and backend
//!   results fetched before a removal are refused by `set_if_generation`
//! - **Administration**: enable, disable and clear for operational use
//!
//! The cache never fails. A disabled cache or a miss is simply a signal to go
//! to the backend.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::domain::models::Category;

/// Point-in-time view of the cache counters
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub enabled: bool,
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    /// Percentage in [0, 100]; zero when there have been no lookups
    pub hit_rate: f64,
    pub last_clear: DateTime<Utc>,
}

#[derive(Debug)]
struct CacheState {
    by_name: HashMap<String, Category>,
    by_id: HashMap<String, Category>,
    enabled: bool,
    last_clear: DateTime<Utc>,
    generation: u64,
}

impl CacheState {
    fn remove_by_name(&mut self, name: &str) {
        if let Some(entry) = self.by_name.remove(name) {
            self.by_id.remove(&entry.id);
        }
    }

    fn remove_by_id(&mut self, id: &str) {
        if let Some(entry) = self.by_id.remove(id) {
            self.by_name.remove(&entry.name);
        }
    }

    fn reset(&mut self) {
        self.by_name.clear();
        self.by_id.clear();
        self.last_clear = Utc::now();
        self.generation += 1;
    }

    fn insert(&mut self, category: &Category) {
        // Drop whatever previously occupied either key so the maps stay paired
        self.remove_by_id(&category.id);
        self.remove_by_name(&category.name);
        self.by_name.insert(category.name.clone(), category.clone());
        self.by_id.insert(category.id.clone(), category.clone());
    }
}

/// Thread-safe category cache, shared as `Arc<CategoryCache>`
#[derive(Debug)]
pub struct CategoryCache {
    state: RwLock<CacheState>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for CategoryCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CategoryCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            state: RwLock::new(CacheState {
                by_name: HashMap::new(),
                by_id: HashMap::new(),
                enabled,
                last_clear: Utc::now(),
                generation: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    // The state is a disposable mirror of the backend, so a panic in another
    // holder never leaves it unusable
    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a lookup result. Callers still hold the read guard.
    fn record(&self, found: Option<&Category>) -> Option<Category> {
        match found {
            Some(category) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(category.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn get_by_name(&self, name: &str) -> Option<Category> {
        let state = self.read();
        if !state.enabled {
            return None;
        }
        let found = self.record(state.by_name.get(name));
        debug!(name, hit = found.is_some(), "Category cache lookup by name");
        found
    }

    pub fn get_by_id(&self, id: &str) -> Option<Category> {
        let state = self.read();
        if !state.enabled {
            return None;
        }
        let found = self.record(state.by_id.get(id));
        debug!(id, hit = found.is_some(), "Category cache lookup by id");
        found
    }

    /// Insert or replace an entry under both of its keys
    pub fn set(&self, category: &Category) {
        if category.id.is_empty() || category.name.is_empty() {
            return;
        }

        let mut state = self.write();
        if !state.enabled {
            return;
        }

        state.insert(category);
        debug!(id = %category.id, name = %category.name, "Cached category");
    }

    /// Current generation. Capture it before reading the backend and hand it
    /// back to `set_if_generation`.
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Insert `category` only if nothing was removed since `generation` was
    /// captured. Returns whether the entry was stored.
    pub fn set_if_generation(&self, category: &Category, generation: u64) -> bool {
        if category.id.is_empty() || category.name.is_empty() {
            return false;
        }

        let mut state = self.write();
        if !state.enabled {
            return false;
        }
        if state.generation != generation {
            debug!(id = %category.id, "Dropping category fetched before an invalidation");
            return false;
        }

        state.insert(category);
        debug!(id = %category.id, name = %category.name, "Cached category");
        true
    }

    pub fn invalidate(&self, name: &str) {
        let mut state = self.write();
        state.remove_by_name(name);
        state.generation += 1;
    }

    pub fn invalidate_by_id(&self, id: &str) {
        let mut state = self.write();
        state.remove_by_id(id);
        state.generation += 1;
    }

    /// Drop every entry. Counters and the enabled flag are kept.
    pub fn clear(&self) {
        self.write().reset();
        info!("Category cache cleared");
    }

    pub fn enable(&self) {
        self.write().enabled = true;
        info!("Category cache enabled");
    }

    pub fn disable(&self) {
        let mut state = self.write();
        state.enabled = false;
        state.reset();
        info!("Category cache disabled");
    }

    /// Snapshot of the counters. The write guard excludes every lookup, so
    /// hits and misses are read at one instant.
    pub fn stats(&self) -> CacheStats {
        let state = self.write();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            hits as f64 / lookups as f64 * 100.0
        };

        CacheStats {
            enabled: state.enabled,
            size: state.by_id.len(),
            hits,
            misses,
            hit_rate,
            last_clear: state.last_clear,
        }
    }
}
