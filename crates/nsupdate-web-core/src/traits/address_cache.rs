// # Address Cache Trait
//
// Defines the interface for change detection.
//
// ## Purpose
//
// The cache remembers, per hostname, the address set of the last
// successful update so identical requests can be answered with
// `no-change` without running the update tool again.
//
// The cache is best effort and lives only as long as the process. A cold
// cache costs one extra, idempotent update per host.

use async_trait::async_trait;

use crate::address::AddressSet;

/// Cache entry for one hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    /// Address set of the last successful update
    pub addresses: AddressSet,
    /// When that update completed
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl CacheRecord {
    /// Create a record stamped with the current time
    pub fn new(addresses: AddressSet) -> Self {
        Self {
            addresses,
            last_updated: chrono::Utc::now(),
        }
    }
}

/// Trait for change-detection caches
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Requests for different hostnames must not block each other for longer
/// than a map lookup.
///
/// # Consistency
///
/// Two requests for the same hostname may both miss the cache and both run
/// an update; whichever succeeds last wins. `set_addresses` must only be
/// called after a confirmed successful update.
#[async_trait]
pub trait AddressCache: Send + Sync {
    /// Get the full cache record for a hostname
    async fn get_record(&self, host: &str) -> Result<Option<CacheRecord>, crate::Error>;

    /// Get the last applied address set for a hostname
    async fn get_addresses(&self, host: &str) -> Result<Option<AddressSet>, crate::Error> {
        Ok(self.get_record(host).await?.map(|record| record.addresses))
    }

    /// Record the address set of a successful update
    async fn set_addresses(&self, host: &str, addresses: AddressSet) -> Result<(), crate::Error>;

    /// List all cached hostnames
    async fn list_hosts(&self) -> Result<Vec<String>, crate::Error>;
}
