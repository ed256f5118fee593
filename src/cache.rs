//! # cache
//!
//! Bounded map with sliding per-entry expiry and an eviction callback.
//!
//! All map operations acquire a single lock, held only for in-memory
//! bookkeeping; the eviction callback always runs after the lock has been
//! released. A dedicated sweeper thread removes entries whose last access
//! is older than the TTL.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Callback invoked with each entry removed by size pressure or expiry.
/// Invoked exactly once per evicted entry, never under the cache lock.
pub type EvictionListener<K, V> = Box<dyn Fn(K, Arc<V>) + Send + Sync>;

/// Thread-safe mapping with a maximum entry count and a sliding TTL.
///
/// Every successful `get` (and every `put`) refreshes the entry's
/// last-access stamp; an entry is expired only once it has been idle for
/// the whole TTL. Inserting past the maximum size evicts the
/// least-recently-accessed entry.
pub struct ExpiringCache<K, V> {
    shared: Arc<Shared<K, V>>,
    stop: Arc<StopSignal>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

struct Shared<K, V> {
    max_entries: usize,
    ttl: Duration,
    map: Mutex<HashMap<K, CacheEntry<V>>>,
    /// Access counter; disambiguates entries stamped within the same
    /// clock grain.
    tick: AtomicU64,
    on_evict: EvictionListener<K, V>,
}

struct CacheEntry<V> {
    value: Arc<V>,
    last_access: Instant,
    touched: u64,
}

struct StopSignal {
    stopped: Mutex<bool>,
    cv: Condvar,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Send + Sync + 'static,
{
    /// Create a cache holding at most `max_entries` entries, each expiring
    /// once idle for `ttl`, and spawn the sweeper thread.
    ///
    /// # Panics
    ///
    /// Panics if `max_entries` is zero or the sweeper thread cannot be
    /// spawned.
    pub fn new(max_entries: usize, ttl: Duration, on_evict: EvictionListener<K, V>) -> Self {
        assert!(max_entries > 0, "cache must hold at least one entry");
        let shared = Arc::new(Shared {
            max_entries,
            ttl,
            map: Mutex::new(HashMap::new()),
            tick: AtomicU64::new(0),
            on_evict,
        });
        let stop = Arc::new(StopSignal {
            stopped: Mutex::new(false),
            cv: Condvar::new(),
        });
        let sweeper = spawn_sweeper(Arc::clone(&shared), Arc::clone(&stop));
        Self {
            shared,
            stop,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    /// Look up `key`, refreshing the entry's last-access stamp.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let mut map = self.shared.map.lock().expect("cache lock poisoned");
        let touched = self.shared.next_tick();
        let entry = map.get_mut(key)?;
        entry.last_access = Instant::now();
        entry.touched = touched;
        Some(Arc::clone(&entry.value))
    }

    /// Insert or replace the entry for `key`, refreshing its stamp.
    ///
    /// If the insert grows the map past the maximum size, the
    /// least-recently-accessed entry is evicted and handed to the eviction
    /// listener. Replacing an existing key is not an eviction: the old
    /// value is simply dropped.
    pub fn put(&self, key: K, value: Arc<V>) {
        let mut evicted = Vec::new();
        {
            let mut map = self.shared.map.lock().expect("cache lock poisoned");
            map.insert(
                key,
                CacheEntry {
                    value,
                    last_access: Instant::now(),
                    touched: self.shared.next_tick(),
                },
            );
            while map.len() > self.shared.max_entries {
                let oldest = map
                    .iter()
                    .min_by_key(|(_, e)| e.touched)
                    .map(|(k, _)| k.clone());
                let Some(oldest) = oldest else {
                    break;
                };
                if let Some(entry) = map.remove(&oldest) {
                    evicted.push((oldest, entry.value));
                }
            }
        }
        for (key, value) in evicted {
            debug!("cache full, evicting oldest entry {:?}", key);
            (self.shared.on_evict)(key, value);
        }
    }

    /// Remove and return every entry without invoking the eviction
    /// listener. Used for teardown, where the owner closes values itself.
    pub fn drain(&self) -> Vec<(K, Arc<V>)> {
        let mut map = self.shared.map.lock().expect("cache lock poisoned");
        map.drain().map(|(k, e)| (k, e.value)).collect()
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.shared.map.lock().expect("cache lock poisoned").len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the sweeper thread and wait for it to exit. Idempotent;
    /// entries still in the map are left untouched.
    pub fn shutdown(&self) {
        {
            let mut stopped = self.stop.stopped.lock().expect("stop lock poisoned");
            *stopped = true;
        }
        self.stop.cv.notify_all();
        let handle = self
            .sweeper
            .lock()
            .expect("sweeper handle lock poisoned")
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl<K, V> Drop for ExpiringCache<K, V> {
    fn drop(&mut self) {
        {
            let mut stopped = self
                .stop
                .stopped
                .lock()
                .unwrap_or_else(|poison| poison.into_inner());
            *stopped = true;
        }
        self.stop.cv.notify_all();
        let handle = self
            .sweeper
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash + Clone + Debug,
{
    fn next_tick(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::Relaxed)
    }

    /// Remove every entry idle past the TTL, then run the listener for
    /// each outside the lock.
    fn sweep(&self) {
        let mut expired = Vec::new();
        {
            let mut map = self.map.lock().expect("cache lock poisoned");
            let now = Instant::now();
            let dead: Vec<K> = map
                .iter()
                .filter(|(_, e)| now.duration_since(e.last_access) >= self.ttl)
                .map(|(k, _)| k.clone())
                .collect();
            for key in dead {
                if let Some(entry) = map.remove(&key) {
                    expired.push((key, entry.value));
                }
            }
        }
        for (key, value) in expired {
            debug!("cache entry {:?} idle past ttl, expiring", key);
            (self.on_evict)(key, value);
        }
    }
}

fn spawn_sweeper<K, V>(shared: Arc<Shared<K, V>>, stop: Arc<StopSignal>) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Send + Sync + 'static,
{
    let interval = sweep_interval(shared.ttl);
    std::thread::Builder::new()
        .name("smb-pool-sweeper".to_string())
        .spawn(move || loop {
            {
                let stopped = stop.stopped.lock().expect("stop lock poisoned");
                let (stopped, _) = stop
                    .cv
                    .wait_timeout_while(stopped, interval, |stopped| !*stopped)
                    .expect("stop lock poisoned");
                if *stopped {
                    break;
                }
            }
            shared.sweep();
        })
        .expect("failed to spawn cache sweeper thread")
}

/// A fraction of the TTL, clamped so short test TTLs still get swept
/// promptly and long production TTLs don't wake a sleeping process more
/// than once a minute.
fn sweep_interval(ttl: Duration) -> Duration {
    (ttl / 4).clamp(Duration::from_millis(10), Duration::from_secs(60))
}

#[cfg(test)]
mod test {

    use std::sync::atomic::AtomicUsize;
    use std::thread;

    use pretty_assertions::assert_eq;

    use super::*;

    struct Recorder {
        evicted: Mutex<Vec<String>>,
        closes: AtomicUsize,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                evicted: Mutex::new(Vec::new()),
                closes: AtomicUsize::new(0),
            })
        }

        fn evicted(&self) -> Vec<String> {
            self.evicted.lock().unwrap().clone()
        }

        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    fn listener(recorder: &Arc<Recorder>) -> EvictionListener<String, String> {
        let recorder = Arc::clone(recorder);
        Box::new(move |key, _value| {
            recorder.evicted.lock().unwrap().push(key);
            recorder.closes.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn entry<S: AsRef<str>>(s: S) -> Arc<String> {
        Arc::new(s.as_ref().to_string())
    }

    #[test]
    fn should_get_what_was_put() {
        crate::mock::logger();
        let recorder = Recorder::new();
        let cache = ExpiringCache::new(10, Duration::from_secs(60), listener(&recorder));
        cache.put("a".to_string(), entry("alpha"));
        assert_eq!(cache.get(&"a".to_string()).as_deref(), Some(&"alpha".to_string()));
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.len(), 1);
        cache.shutdown();
    }

    #[test]
    fn should_evict_oldest_entry_on_size_pressure() {
        crate::mock::logger();
        let recorder = Recorder::new();
        let cache = ExpiringCache::new(2, Duration::from_secs(60), listener(&recorder));
        cache.put("a".to_string(), entry("alpha"));
        cache.put("b".to_string(), entry("bravo"));
        assert_eq!(recorder.closes(), 0);
        cache.put("c".to_string(), entry("charlie"));
        assert_eq!(recorder.evicted(), vec!["a".to_string()]);
        assert_eq!(recorder.closes(), 1);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.get(&"b".to_string()).is_some());
        assert!(cache.get(&"c".to_string()).is_some());
        cache.shutdown();
    }

    #[test]
    fn should_keep_recently_accessed_entry_on_size_pressure() {
        crate::mock::logger();
        let recorder = Recorder::new();
        let cache = ExpiringCache::new(2, Duration::from_secs(60), listener(&recorder));
        cache.put("a".to_string(), entry("alpha"));
        cache.put("b".to_string(), entry("bravo"));
        // touch "a" so "b" becomes the oldest
        assert!(cache.get(&"a".to_string()).is_some());
        cache.put("c".to_string(), entry("charlie"));
        assert_eq!(recorder.evicted(), vec!["b".to_string()]);
        assert!(cache.get(&"a".to_string()).is_some());
        cache.shutdown();
    }

    #[test]
    fn should_not_treat_replacement_as_eviction() {
        crate::mock::logger();
        let recorder = Recorder::new();
        let cache = ExpiringCache::new(2, Duration::from_secs(60), listener(&recorder));
        cache.put("a".to_string(), entry("old"));
        cache.put("a".to_string(), entry("new"));
        assert_eq!(recorder.closes(), 0);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"a".to_string()).as_deref(), Some(&"new".to_string()));
        cache.shutdown();
    }

    #[test]
    fn should_expire_idle_entry_exactly_once() {
        crate::mock::logger();
        let recorder = Recorder::new();
        let cache = ExpiringCache::new(10, Duration::from_millis(100), listener(&recorder));
        cache.put("a".to_string(), entry("alpha"));
        thread::sleep(Duration::from_millis(400));
        assert_eq!(cache.len(), 0);
        assert_eq!(recorder.evicted(), vec!["a".to_string()]);
        assert_eq!(recorder.closes(), 1);
        cache.shutdown();
    }

    #[test]
    fn should_slide_expiry_on_access() {
        crate::mock::logger();
        let recorder = Recorder::new();
        let cache = ExpiringCache::new(10, Duration::from_millis(200), listener(&recorder));
        cache.put("a".to_string(), entry("alpha"));
        // keep touching well past the original deadline
        for _ in 0..6 {
            thread::sleep(Duration::from_millis(60));
            assert!(cache.get(&"a".to_string()).is_some(), "entry expired under access");
        }
        assert_eq!(recorder.closes(), 0);
        // stop touching; now it must go
        thread::sleep(Duration::from_millis(600));
        assert_eq!(cache.len(), 0);
        assert_eq!(recorder.closes(), 1);
        cache.shutdown();
    }

    #[test]
    fn should_drain_without_running_listener() {
        crate::mock::logger();
        let recorder = Recorder::new();
        let cache = ExpiringCache::new(10, Duration::from_secs(60), listener(&recorder));
        cache.put("a".to_string(), entry("alpha"));
        cache.put("b".to_string(), entry("bravo"));
        let mut drained: Vec<String> = cache.drain().into_iter().map(|(k, _)| k).collect();
        drained.sort();
        assert_eq!(drained, vec!["a".to_string(), "b".to_string()]);
        assert!(cache.is_empty());
        assert_eq!(recorder.closes(), 0);
        cache.shutdown();
    }

    #[test]
    fn should_shutdown_twice_without_panicking() {
        crate::mock::logger();
        let recorder = Recorder::new();
        let cache = ExpiringCache::new(10, Duration::from_secs(60), listener(&recorder));
        cache.shutdown();
        cache.shutdown();
    }

    #[test]
    fn should_survive_concurrent_access() {
        crate::mock::logger();
        let recorder = Recorder::new();
        let cache = Arc::new(ExpiringCache::new(
            8,
            Duration::from_millis(50),
            listener(&recorder),
        ));
        let mut handles = Vec::new();
        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..200 {
                    let key = format!("key-{}", (t * 7 + i) % 16);
                    if cache.get(&key).is_none() {
                        cache.put(key, entry("value"));
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 8);
        cache.shutdown();
    }
}
