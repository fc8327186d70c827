// Time-based cache shared by the flight price and exchange rate lookups.
// Entries are never purged proactively; a stale entry just stops being served
// and is overwritten by the next successful fetch.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use dashmap::DashMap;
use parking_lot::Mutex;

/// Source of "now" for TTL checks.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + *self.offset.lock()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub expired_count: usize,
    pub total_lookups: usize,
}

#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub timestamp: Instant,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.timestamp) < ttl
    }
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicUsize,
    misses: AtomicUsize,
    expired: AtomicUsize,
}

pub struct TtlCache<T> {
    store: DashMap<String, CacheEntry<T>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    counters: Counters,
}

impl<T: Clone + Send + Sync + 'static> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
            clock,
            counters: Counters::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a clone of the value if present and not older than the TTL.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now();

        match self.store.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            Some(_) => {
                self.counters.expired.fetch_add(1, Ordering::Relaxed);
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores `value` stamped with the current time, replacing any prior entry.
    pub fn insert(&self, key: impl Into<String>, value: T) {
        let entry = CacheEntry {
            value,
            timestamp: self.clock.now(),
        };
        self.store.insert(key.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let hit_count = self.counters.hits.load(Ordering::Relaxed);
        let miss_count = self.counters.misses.load(Ordering::Relaxed);
        CacheStats {
            items_count: self.store.len(),
            hit_count,
            miss_count,
            expired_count: self.counters.expired.load(Ordering::Relaxed),
            total_lookups: hit_count + miss_count,
        }
    }
}

pub fn flight_cache_key(origin: &str, destination: &str, departure_date: &str) -> String {
    format!("{}-{}-{}", origin, destination, departure_date)
}

pub fn rate_cache_key(from_currency: &str, to_currency: &str) -> String {
    format!("{}-{}", from_currency, to_currency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn cache_with_clock(ttl_secs: u64) -> (TtlCache<u32>, ManualClock) {
        let clock = ManualClock::new();
        let cache = TtlCache::with_clock(Duration::from_secs(ttl_secs), Arc::new(clock.clone()));
        (cache, clock)
    }

    #[test]
    fn test_expiration_and_ttl() {
        let (cache, clock) = cache_with_clock(300);

        cache.insert("DEL-BOM-2025-01-01", 7);
        assert_eq!(cache.get("DEL-BOM-2025-01-01"), Some(7));

        clock.advance(Duration::from_secs(299));
        assert_eq!(cache.get("DEL-BOM-2025-01-01"), Some(7));

        // valid only while now - timestamp < ttl
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get("DEL-BOM-2025-01-01"), None);

        // stale entries stay until overwritten
        assert_eq!(cache.len(), 1);

        let stats = cache.stats();
        assert_eq!(stats.hit_count, 2);
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.expired_count, 1);
        assert_eq!(stats.total_lookups, 3);
    }

    #[test]
    fn test_overwrite_refreshes_timestamp() {
        let (cache, clock) = cache_with_clock(10);

        cache.insert("USD-INR", 1);
        clock.advance(Duration::from_secs(8));
        cache.insert("USD-INR", 2);
        clock.advance(Duration::from_secs(8));

        assert_eq!(cache.get("USD-INR"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_key_is_a_miss() {
        let (cache, _clock) = cache_with_clock(10);
        assert!(cache.is_empty());
        assert_eq!(cache.get("nope"), None);
        assert_eq!(cache.stats().miss_count, 1);
        assert_eq!(cache.stats().expired_count, 0);
    }

    #[test]
    fn test_keys_join_parts_with_dashes() {
        assert_eq!(flight_cache_key("DEL", "BOM", ""), "DEL-BOM-");
        assert_eq!(flight_cache_key("DEL", "BOM", "2025-01-01"), "DEL-BOM-2025-01-01");
        assert_eq!(rate_cache_key("USD", "EUR"), "USD-EUR");
    }

    #[test]
    fn test_concurrent_access_with_contention() {
        let cache = Arc::new(TtlCache::<usize>::new(Duration::from_secs(300)));
        let threads_count = 8;
        let operations_per_thread = 500;
        let popular_routes = ["DEL-BOM-", "BOM-BLR-", "DEL-DXB-"];

        let mut handles = vec![];
        for i in 0..threads_count {
            let cache = cache.clone();
            handles.push(thread::spawn(move || {
                for j in 0..operations_per_thread {
                    let key = popular_routes[j % popular_routes.len()];
                    if j % 10 < 8 {
                        let _ = cache.get(key);
                    } else {
                        cache.insert(key, i * operations_per_thread + j);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.items_count, popular_routes.len());
        assert_eq!(
            stats.total_lookups,
            threads_count * operations_per_thread * 8 / 10
        );
    }
}
