use dashmap::DashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Source of wall-clock milliseconds for idempotency bookkeeping.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Clock backed by [`SystemTime`]. Not usable on `wasm32-unknown-unknown`,
/// where the browser adapter supplies its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Bounded, time-limited set of request ids that have already been handled.
///
/// Hosts reuse a request id across the redirects a request goes through, so
/// remembering the id stops the rewriter from redirecting its own redirect.
/// Hosts never tell us when an id is retired, hence the TTL and capacity.
#[derive(Clone)]
pub struct SeenRequests {
    /// Maps Request ID -> time it was first marked (ms)
    entries: Arc<DashMap<String, u64>>,
    ttl_ms: u64,
    max_entries: usize,
    clock: Arc<dyn Clock>,
}

impl SeenRequests {
    pub fn new(ttl_ms: u64, max_entries: usize) -> Self {
        Self::with_clock(ttl_ms, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_ms: u64, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            ttl_ms,
            max_entries: max_entries.max(1),
            clock,
        }
    }

    /// Marks `request_id` as seen.
    ///
    /// Returns `true` when the id was not already marked (or its mark had
    /// expired), `false` when it was marked within the TTL.
    pub fn mark_if_new(&self, request_id: &str) -> bool {
        let now = self.clock.now_ms();

        if let Some(marked_at) = self.entries.get(request_id).map(|e| *e.value()) {
            if now.saturating_sub(marked_at) < self.ttl_ms {
                return false;
            }
        }

        self.entries.insert(request_id.to_string(), now);

        if self.entries.len() > self.max_entries {
            self.evict(now);
        }
        true
    }

    /// True when `request_id` is marked and its mark has not expired.
    pub fn contains(&self, request_id: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(request_id)
            .map(|e| now.saturating_sub(*e.value()) < self.ttl_ms)
            .unwrap_or(false)
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();
        let ttl = self.ttl_ms;
        self.entries.retain(|_, marked_at| now.saturating_sub(*marked_at) < ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn evict(&self, now: u64) {
        let expired = self.purge_expired();
        let overflow = self.entries.len().saturating_sub(self.max_entries);
        if overflow == 0 {
            debug!("Evicted {} expired request ids", expired);
            return;
        }

        // Still over capacity with only live entries: drop the oldest marks
        let mut by_age: Vec<(String, u64)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        by_age.sort_by_key(|(_, marked_at)| *marked_at);
        for (id, _) in by_age.into_iter().take(overflow) {
            self.entries.remove(&id);
        }
        debug!(
            "Evicted {} expired and {} live request ids at {}",
            expired, overflow, now
        );
    }
}

impl std::fmt::Debug for SeenRequests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeenRequests")
            .field("len", &self.entries.len())
            .field("ttl_ms", &self.ttl_ms)
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

/// Clock that only moves when told to. Useful for exercising TTL behavior.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::sync::atomic::AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: std::sync::atomic::AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, std::sync::atomic::Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(std::sync::atomic::Ordering::Relaxed)
    }
}
