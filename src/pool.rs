//! # pool
//!
//! The connection pool façade: hands out live connectors, creating or
//! recreating them behind a bounded, self-expiring cache.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::auth::SmbAuthentication;
use crate::cache::ExpiringCache;
use crate::client::ClientFactory;
use crate::config::SmbConfig;
use crate::connector::Connector;
use crate::error::ConnectError;
use crate::path::SmbPath;

const MAX_CACHE_ENTRIES: usize = 50;
const CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Pool of SMB share connections, keyed by [`SmbPath`].
///
/// Connecting to a share is expensive (transport connect, authentication,
/// share bind), so connectors are kept in a cache of up to 50 entries with
/// a 15-minute sliding expiry. Expired or displaced connectors are closed
/// in the background; a connector found dead on lookup is replaced
/// transparently.
///
/// ```rust,no_run
/// use smb_pool::{SmbAuthentication, SmbPath, SmbPool, SmbcFactory, UserCredentials};
///
/// let pool = SmbPool::new(Box::new(SmbcFactory))
///     .with_authentication(SmbAuthentication::User(
///         UserCredentials::default().username("test").password("test"),
///     ));
/// pool.start();
///
/// let path = SmbPath::parse(r"\\fileserver\public\inbox").unwrap();
/// let connector = pool.get_or_create(&path).unwrap();
/// let share = connector.share().unwrap();
/// // ... read / write / list against the share ...
///
/// pool.stop();
/// ```
pub struct SmbPool {
    authentication: SmbAuthentication,
    config: SmbConfig,
    factory: Box<dyn ClientFactory>,
    cache: Mutex<Option<Arc<ExpiringCache<SmbPath, Connector>>>>,
    /// Serializes all connector creation; see [`SmbPool::get_or_create`].
    create_lock: Mutex<()>,
}

impl SmbPool {
    /// Create a stopped pool building clients through `factory`, with
    /// anonymous authentication and default configuration.
    pub fn new(factory: Box<dyn ClientFactory>) -> Self {
        Self {
            authentication: SmbAuthentication::default(),
            config: SmbConfig::default(),
            factory,
            cache: Mutex::new(None),
            create_lock: Mutex::new(()),
        }
    }

    /// Set the authentication strategy
    pub fn with_authentication(mut self, authentication: SmbAuthentication) -> Self {
        self.authentication = authentication;
        self
    }

    /// Set the transport configuration
    pub fn with_config(mut self, config: SmbConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the connector cache and its close-on-evict listener. Called
    /// once per pool lifetime, before the first [`SmbPool::get_or_create`].
    pub fn start(&self) {
        let mut slot = self.cache.lock().expect("cache slot lock poisoned");
        if slot.is_some() {
            warn!("connection pool already started");
            return;
        }
        *slot = Some(Arc::new(ExpiringCache::new(
            MAX_CACHE_ENTRIES,
            CACHE_TTL,
            Box::new(|path: SmbPath, connector: Arc<Connector>| {
                debug!("closing evicted connector for {}", path);
                connector.close();
            }),
        )));
    }

    /// Close every cached connector and drop the cache. Individual close
    /// failures are logged and do not abort the sweep. The pool cannot be
    /// used again afterwards.
    pub fn stop(&self) {
        let cache = self
            .cache
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .take();
        if let Some(cache) = cache {
            for (path, connector) in cache.drain() {
                debug!("closing cached connector for {}", path);
                connector.close();
            }
            cache.shutdown();
        }
    }

    /// Return a live connector for `path`, creating or recreating one if
    /// the cache holds none or holds a dead one.
    ///
    /// The fast path is lock-free apart from the cache's own map lock: a
    /// cached, connected worker is returned immediately and its expiry
    /// slides forward. On a miss, creation is serialized by a single
    /// pool-wide lock; the cache is re-checked under the lock so racing
    /// callers for the same path end up sharing one connect. The lock is
    /// coarse on purpose: it also serializes creation for unrelated paths,
    /// which is acceptable because creation is rare relative to reuse.
    ///
    /// A connect failure propagates to the caller and leaves no cache
    /// entry behind, so the next call starts creation from scratch.
    pub fn get_or_create(&self, path: &SmbPath) -> Result<Arc<Connector>, ConnectError> {
        let cache = self.cache()?;
        if let Some(connector) = cache.get(path) {
            if connector.is_connected() {
                trace!("reusing cached connector for {}", path);
                return Ok(connector);
            }
        }
        let _guard = self.create_lock.lock().expect("create lock poisoned");
        // another caller may have raced ahead while we waited on the lock
        if let Some(connector) = cache.get(path) {
            if connector.is_connected() {
                trace!("reusing connector created while waiting for {}", path);
                return Ok(connector);
            }
        }
        debug!("no live connector for {}, creating one", path);
        let client = self
            .factory
            .build(&self.config)
            .map_err(ConnectError::ClientBuild)?;
        let connector = Arc::new(Connector::new(
            path.clone(),
            self.authentication.auth_context(),
        ));
        connector.connect(client)?;
        cache.put(path.clone(), Arc::clone(&connector));
        Ok(connector)
    }

    fn cache(&self) -> Result<Arc<ExpiringCache<SmbPath, Connector>>, ConnectError> {
        self.cache
            .lock()
            .expect("cache slot lock poisoned")
            .clone()
            .ok_or(ConnectError::NotStarted)
    }
}

impl Drop for SmbPool {
    fn drop(&mut self) {
        self.stop();
    }
}
