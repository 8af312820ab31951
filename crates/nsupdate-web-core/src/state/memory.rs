// # Memory Address Cache
//
// In-memory implementation of AddressCache.
//
// ## Crash Behavior
//
// - All entries are lost on restart
// - The first request per host after a restart always runs an update
// - Entries are never expired; the host count is expected to stay small

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::address::AddressSet;
use crate::traits::address_cache::{AddressCache, CacheRecord};

/// In-memory address cache
///
/// Entries live in a HashMap behind a RwLock, so lookups for different
/// hosts run concurrently and writes only hold the lock for an insert.
/// Clones share the same map.
///
/// # Example
///
/// ```rust,no_run
/// use nsupdate_web_core::state::MemoryAddressCache;
/// use nsupdate_web_core::traits::AddressCache;
/// use nsupdate_web_core::AddressSet;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cache = MemoryAddressCache::new();
///
///     let addresses: AddressSet = ["10.1.1.1".parse()?].into_iter().collect();
///     cache.set_addresses("foo", addresses.clone()).await?;
///
///     assert_eq!(cache.get_addresses("foo").await?, Some(addresses));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryAddressCache {
    inner: Arc<RwLock<HashMap<String, CacheRecord>>>,
}

impl MemoryAddressCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of cached hosts
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Forget every host
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

#[async_trait]
impl AddressCache for MemoryAddressCache {
    async fn get_record(&self, host: &str) -> Result<Option<CacheRecord>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(host).cloned())
    }

    async fn set_addresses(&self, host: &str, addresses: AddressSet) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(host.to_string(), CacheRecord::new(addresses));
        Ok(())
    }

    async fn list_hosts(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }
}
