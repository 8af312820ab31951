//! Core traits for the bridge
//!
//! - [`DnsUpdater`]: Apply an address set to a hostname
//! - [`AddressCache`]: Change detection between requests

pub mod address_cache;
pub mod dns_updater;

pub use address_cache::{AddressCache, CacheRecord};
pub use dns_updater::{DnsUpdater, UpdateResult};
