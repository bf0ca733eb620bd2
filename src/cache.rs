//! Time-boxed in-memory cache for upstream lookups.
//!
//! Entries live in named buckets, one per kind of lookup. Expiry is checked
//! on every read; a background sweeper frees entries nobody reads again.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Shorter sweep intervals are raised to this.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Lookups,
    Definitions,
    Quotes,
    Images,
    Disambiguations,
    ContentBoard,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Bucket::Lookups,
        Bucket::Definitions,
        Bucket::Quotes,
        Bucket::Images,
        Bucket::Disambiguations,
        Bucket::ContentBoard,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Bucket::Lookups => "lookups",
            Bucket::Definitions => "definitions",
            Bucket::Quotes => "quotes",
            Bucket::Images => "images",
            Bucket::Disambiguations => "disambiguations",
            Bucket::ContentBoard => "content-board",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub expiry: DateTime<Utc>,
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for expiry tests.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = offset(*now, by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn offset(from: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|delta| from.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub struct ExpiringCache {
    buckets: Mutex<HashMap<Bucket, HashMap<String, CacheEntry>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ExpiringCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let buckets = Bucket::ALL
            .iter()
            .map(|bucket| (*bucket, HashMap::new()))
            .collect();
        Self {
            buckets: Mutex::new(buckets),
            ttl,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Bucket, HashMap<String, CacheEntry>>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raw lookup; does not look at expiry.
    pub fn get(&self, bucket: Bucket, key: &str) -> Option<CacheEntry> {
        self.lock().get(&bucket)?.get(key).cloned()
    }

    pub fn is_valid(&self, entry: Option<&CacheEntry>) -> bool {
        entry.is_some_and(|e| e.expiry > self.clock.now())
    }

    pub fn set(&self, bucket: Bucket, key: &str, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expiry: offset(self.clock.now(), ttl),
        };
        self.lock()
            .entry(bucket)
            .or_default()
            .insert(key.to_string(), entry);
    }

    /// Typed read of a still-valid entry.
    pub fn get_valid<T: DeserializeOwned>(&self, bucket: Bucket, key: &str) -> Option<T> {
        let entry = self.get(bucket, key);
        if !self.is_valid(entry.as_ref()) {
            return None;
        }
        let entry = entry?;
        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    bucket = bucket.name(),
                    key,
                    error = %e,
                    "discarding undecodable cache entry"
                );
                None
            }
        }
    }

    /// Typed write with the cache's default ttl.
    pub fn store<T: Serialize>(&self, bucket: Bucket, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.set(bucket, key, value, self.ttl),
            Err(e) => warn!(bucket = bucket.name(), key, error = %e, "value not cacheable"),
        }
    }

    pub fn invalidate(&self, bucket: Bucket, key: &str) -> bool {
        self.lock()
            .get_mut(&bucket)
            .is_some_and(|entries| entries.remove(key).is_some())
    }

    /// Drops every entry whose expiry has passed. Returns how many went.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut buckets = self.lock();
        let mut removed = 0;
        for entries in buckets.values_mut() {
            let before = entries.len();
            entries.retain(|_, entry| entry.expiry > now);
            removed += before - entries.len();
        }
        removed
    }

    pub fn bucket_sizes(&self) -> BTreeMap<&'static str, usize> {
        let buckets = self.lock();
        Bucket::ALL
            .iter()
            .map(|bucket| (bucket.name(), buckets.get(bucket).map_or(0, HashMap::len)))
            .collect()
    }

    /// Starts the periodic sweep. The task holds only a weak reference and
    /// ends on its own once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweepHandle {
        let cache: Weak<Self> = Arc::downgrade(self);
        let interval = interval.max(MIN_SWEEP_INTERVAL);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep();
                if removed > 0 {
                    debug!(removed, "swept expired cache entries");
                }
            }
        });
        SweepHandle { handle }
    }
}

/// Owns the sweeper task; dropping it stops the sweep.
pub struct SweepHandle {
    handle: JoinHandle<()>,
}

impl SweepHandle {
    pub fn shutdown(self) {
        // Drop aborts.
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
