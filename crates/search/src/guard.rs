//! Load, flood and verification guards
//!
//! Guards run before any tokenization or backend work. The traits are
//! collaborator seams; the bundled implementations cover single-process
//! deployments and tests.

use boardsearch_core::{Caller, Result, SearchError};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Reports current system load
pub trait LoadGuard: Send + Sync {
    /// Current load, `None` when unknown
    fn current_load(&self) -> Option<f64>;
}

/// Rate limiting of new searches
pub trait SpamGuard: Send + Sync {
    /// Record a new search by `caller`
    ///
    /// # Errors
    ///
    /// `FloodProtection` when the caller searched too recently.
    fn check(&self, caller: &Caller) -> Result<()>;
}

/// Human verification (captcha or equivalent)
pub trait HumanVerifier: Send + Sync {
    /// Whether `response` proves `caller` is human
    fn verify(&self, caller: &Caller, response: Option<&str>) -> bool;
}

// ============================================================================
// Load
// ============================================================================

/// Load guard that never knows the load
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLoadGuard;

impl LoadGuard for NoLoadGuard {
    fn current_load(&self) -> Option<f64> {
        None
    }
}

/// Load guard reporting a value set by the host
#[derive(Debug, Default)]
pub struct ReportedLoad {
    load: Mutex<Option<f64>>,
}

impl ReportedLoad {
    /// Guard with no reading yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the latest reading
    pub fn report(&self, load: f64) {
        *self.load.lock() = Some(load);
    }
}

impl LoadGuard for ReportedLoad {
    fn current_load(&self) -> Option<f64> {
        *self.load.lock()
    }
}

// ============================================================================
// Flood
// ============================================================================

/// Allows one new search per caller every `interval_secs`
///
/// Members are keyed by id, guests by address.
#[derive(Debug)]
pub struct IntervalSpamGuard {
    interval_secs: i64,
    last_search: Mutex<HashMap<String, i64>>,
}

impl IntervalSpamGuard {
    /// Guard with the given minimum interval
    pub fn new(interval_secs: u64) -> Self {
        IntervalSpamGuard {
            interval_secs: interval_secs as i64,
            last_search: Mutex::new(HashMap::new()),
        }
    }

    fn key(caller: &Caller) -> String {
        match caller.member_id {
            Some(id) => format!("member:{}", id),
            None => format!("ip:{}", caller.ip),
        }
    }

    /// Check `caller` against the clock value `now` (epoch seconds)
    pub fn check_at(&self, caller: &Caller, now: i64) -> Result<()> {
        let mut last = self.last_search.lock();
        let key = Self::key(caller);
        if let Some(&previous) = last.get(&key) {
            let elapsed = now - previous;
            if elapsed < self.interval_secs {
                return Err(SearchError::FloodProtection {
                    wait_secs: (self.interval_secs - elapsed) as u64,
                });
            }
        }
        last.insert(key, now);
        Ok(())
    }
}

impl SpamGuard for IntervalSpamGuard {
    fn check(&self, caller: &Caller) -> Result<()> {
        self.check_at(caller, chrono::Utc::now().timestamp())
    }
}

/// Spam guard that never refuses
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpamGuard;

impl SpamGuard for NoSpamGuard {
    fn check(&self, _caller: &Caller) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Verification
// ============================================================================

/// Verifier that accepts everyone
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysVerified;

impl HumanVerifier for AlwaysVerified {
    fn verify(&self, _caller: &Caller, _response: Option<&str>) -> bool {
        true
    }
}

/// Verifier expecting a fixed answer, case-insensitively
#[derive(Debug, Clone)]
pub struct AnswerVerifier {
    answer: String,
}

impl AnswerVerifier {
    /// Verifier for `answer`
    pub fn new(answer: impl Into<String>) -> Self {
        AnswerVerifier {
            answer: answer.into(),
        }
    }
}

impl HumanVerifier for AnswerVerifier {
    fn verify(&self, _caller: &Caller, response: Option<&str>) -> bool {
        response.is_some_and(|r| r.trim().eq_ignore_ascii_case(&self.answer))
    }
}
