//! Per-user search session state
//!
//! The host application owns one [`SearchSession`] per user session and
//! hands it to the engine on every request. It is serde-serializable so it
//! can live in whatever session store the host uses.

use serde::{Deserialize, Serialize};

/// The session's current result cache slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSlot {
    /// Pointer addressing the cached rows
    pub pointer: u16,
    /// Encoded params the rows were built for
    pub params: String,
    /// Number of cached rows
    pub num_results: usize,
    /// Creation time, epoch seconds
    pub created_at: i64,
}

impl CacheSlot {
    /// Whether the slot is older than `ttl_secs` at `now`
    pub fn is_expired(&self, now: i64, ttl_secs: u64) -> bool {
        now.saturating_sub(self.created_at) >= ttl_secs as i64
    }
}

/// Search state of one user session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSession {
    id: String,
    pointer: u16,
    slot: Option<CacheSlot>,
    last_search: Option<String>,
}

impl SearchSession {
    /// Fresh session state
    pub fn new(id: impl Into<String>) -> Self {
        SearchSession {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Session id, used to key cached rows
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Last pointer handed out
    pub fn pointer(&self) -> u16 {
        self.pointer
    }

    /// Move to the next pointer, wrapping at `modulus`
    pub fn advance_pointer(&mut self, modulus: u16) -> u16 {
        self.pointer = ((self.pointer as u32 + 1) % modulus.max(1) as u32) as u16;
        self.pointer
    }

    /// Current cache slot
    pub fn slot(&self) -> Option<&CacheSlot> {
        self.slot.as_ref()
    }

    /// Replace the cache slot
    pub fn set_slot(&mut self, slot: CacheSlot) {
        self.slot = Some(slot);
    }

    /// Drop the cache slot, returning it
    pub fn take_slot(&mut self) -> Option<CacheSlot> {
        self.slot.take()
    }

    /// Raw query of the last search that passed the guards
    pub fn last_search(&self) -> Option<&str> {
        self.last_search.as_deref()
    }

    /// Record the raw query of a search that passed the guards
    pub fn set_last_search(&mut self, search: impl Into<String>) {
        self.last_search = Some(search.into());
    }

    /// True when `search` repeats the last guarded query (a page turn)
    pub fn is_repeat(&self, search: &str) -> bool {
        self.last_search.as_deref() == Some(search)
    }
}
