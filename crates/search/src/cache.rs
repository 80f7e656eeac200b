//! Session-scoped result cache
//!
//! This module provides:
//! - ResultStore trait: where cached rows live, keyed by (session, pointer)
//! - MemoryResultStore: DashMap-backed default
//! - CachedResultSet: the full ordered rows of one search
//! - ResultCache: get-or-create, paging and invalidation
//!
//! # Lifecycle
//!
//! The first page of a new or changed search advances the session pointer
//! (wrapping at the configured modulus), clears the rows under the old
//! pointer and enumerates once. Later pages with the same encoded params
//! read the stored rows. A slot whose params differ, whose rows are gone or
//! whose age exceeds the TTL is rebuilt. Every rebuild also purges rows
//! of any session that outlived the TTL, so abandoned sessions do not pin
//! memory.

use crate::scoring::ResultRow;
use crate::session::{CacheSlot, SearchSession};
use boardsearch_core::Result;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

// ============================================================================
// ResultStore
// ============================================================================

/// Rows stored under one pointer, tagged with the params they belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResults {
    /// Encoded params
    pub params: String,
    /// Ordered rows
    pub rows: Arc<Vec<ResultRow>>,
    /// Creation time, epoch seconds
    pub created_at: i64,
}

impl StoredResults {
    /// Whether the rows are older than `ttl_secs` at `now`
    pub fn is_expired(&self, now: i64, ttl_secs: u64) -> bool {
        now.saturating_sub(self.created_at) >= ttl_secs as i64
    }
}

/// Backing storage of cached rows
pub trait ResultStore: Send + Sync {
    /// Rows under `(session, pointer)`
    fn load(&self, session: &str, pointer: u16) -> Option<StoredResults>;

    /// Store rows under `(session, pointer)`, replacing any
    fn save(&self, session: &str, pointer: u16, results: StoredResults);

    /// Remove rows under `(session, pointer)`
    fn clear(&self, session: &str, pointer: u16);

    /// Remove every entry older than `ttl_secs` at `now`, returning how many
    fn purge_expired(&self, now: i64, ttl_secs: u64) -> usize;
}

/// In-process result store
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    entries: DashMap<(String, u16), StoredResults>,
}

impl MemoryResultStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored result sets
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResultStore for MemoryResultStore {
    fn load(&self, session: &str, pointer: u16) -> Option<StoredResults> {
        self.entries
            .get(&(session.to_string(), pointer))
            .map(|entry| entry.value().clone())
    }

    fn save(&self, session: &str, pointer: u16, results: StoredResults) {
        self.entries.insert((session.to_string(), pointer), results);
    }

    fn clear(&self, session: &str, pointer: u16) {
        self.entries.remove(&(session.to_string(), pointer));
    }

    fn purge_expired(&self, now: i64, ttl_secs: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, stored| !stored.is_expired(now, ttl_secs));
        before.saturating_sub(self.entries.len())
    }
}

// ============================================================================
// CachedResultSet
// ============================================================================

/// Full ordered match set of one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResultSet {
    /// Pointer the rows are stored under
    pub pointer: u16,
    /// Encoded params the rows belong to
    pub params: String,
    rows: Arc<Vec<ResultRow>>,
}

impl CachedResultSet {
    /// Number of rows
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// All rows in order
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Highest relevance in the set, 0 when empty
    pub fn best_relevance(&self) -> u32 {
        self.rows.iter().map(|r| r.relevance).max().unwrap_or(0)
    }
}

// ============================================================================
// ResultCache
// ============================================================================

/// Pointer-addressed cache of full result sets
pub struct ResultCache {
    store: Arc<dyn ResultStore>,
    modulus: u16,
    ttl_secs: u64,
    max_results: usize,
}

impl ResultCache {
    /// Cache over `store`
    pub fn new(store: Arc<dyn ResultStore>, modulus: u16, ttl_secs: u64, max_results: usize) -> Self {
        ResultCache {
            store,
            modulus,
            ttl_secs,
            max_results,
        }
    }

    /// Return the cached set for `params_key`, building it with `fill` on a miss
    ///
    /// The boolean is true on a cache hit. On a miss the old rows are cleared
    /// before `fill` runs; if `fill` fails the session is left without a slot.
    pub fn get_or_create<F>(
        &self,
        session: &mut SearchSession,
        params_key: &str,
        fill: F,
    ) -> Result<(CachedResultSet, bool)>
    where
        F: FnOnce() -> Result<Vec<ResultRow>>,
    {
        self.get_or_create_at(session, params_key, chrono::Utc::now().timestamp(), fill)
    }

    /// [`ResultCache::get_or_create`] at an explicit time, epoch seconds
    pub fn get_or_create_at<F>(
        &self,
        session: &mut SearchSession,
        params_key: &str,
        now: i64,
        fill: F,
    ) -> Result<(CachedResultSet, bool)>
    where
        F: FnOnce() -> Result<Vec<ResultRow>>,
    {
        if let Some(set) = self.lookup(session, params_key, now) {
            debug!(target: "boardsearch::cache", session = session.id(), pointer = set.pointer, "Cache hit");
            return Ok((set, true));
        }

        if let Some(old) = session.take_slot() {
            self.store.clear(session.id(), old.pointer);
        }
        let pointer = session.advance_pointer(self.modulus);
        // Pointer wrapped onto a live entry of this session
        self.store.clear(session.id(), pointer);
        let purged = self.store.purge_expired(now, self.ttl_secs);
        if purged > 0 {
            debug!(target: "boardsearch::cache", purged, "Expired result sets purged");
        }

        let mut rows = fill()?;
        let found = rows.len();
        rows.truncate(self.max_results);
        let rows = Arc::new(rows);

        self.store.save(
            session.id(),
            pointer,
            StoredResults {
                params: params_key.to_string(),
                rows: Arc::clone(&rows),
                created_at: now,
            },
        );
        session.set_slot(CacheSlot {
            pointer,
            params: params_key.to_string(),
            num_results: rows.len(),
            created_at: now,
        });
        info!(
            target: "boardsearch::cache",
            session = session.id(),
            pointer,
            found,
            cached = rows.len(),
            "Result cache rebuilt"
        );

        Ok((
            CachedResultSet {
                pointer,
                params: params_key.to_string(),
                rows,
            },
            false,
        ))
    }

    fn lookup(&self, session: &SearchSession, params_key: &str, now: i64) -> Option<CachedResultSet> {
        let slot = session.slot()?;
        if slot.params != params_key || slot.is_expired(now, self.ttl_secs) {
            return None;
        }
        let stored = self.store.load(session.id(), slot.pointer)?;
        if stored.params != params_key || stored.is_expired(now, self.ttl_secs) {
            return None;
        }
        Some(CachedResultSet {
            pointer: slot.pointer,
            params: stored.params,
            rows: stored.rows,
        })
    }

    /// Rows `offset..offset + limit` of `set`; empty when out of range
    pub fn page(&self, set: &CachedResultSet, offset: usize, limit: usize) -> Vec<ResultRow> {
        set.rows().iter().skip(offset).take(limit).cloned().collect()
    }

    /// Drop the session's cached rows and slot
    pub fn invalidate(&self, session: &mut SearchSession) {
        if let Some(slot) = session.take_slot() {
            self.store.clear(session.id(), slot.pointer);
            debug!(target: "boardsearch::cache", session = session.id(), pointer = slot.pointer, "Cache invalidated");
        }
    }
}
