//! Test doubles and common utilities for pipeline contract tests
//!
//! The doubles record every call so tests can assert not only on the
//! response but on whether the update tool would have run.

#![allow(dead_code)]

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use nsupdate_web_core::error::{Error, Result};
use nsupdate_web_core::traits::{AddressCache, CacheRecord, DnsUpdater, UpdateResult};
use nsupdate_web_core::{AddressSet, BridgeConfig, HostCredentials, IncomingRequest, UpdateHandler};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How a [`MockDnsUpdater`] answers
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Commit and report `success`
    Succeed,
    /// Report the given text as tool stderr
    ToolError(String),
    /// Report a timeout
    Timeout,
}

/// A mock DnsUpdater that tracks calls
pub struct MockDnsUpdater {
    /// Call counter for apply()
    apply_call_count: Arc<AtomicUsize>,
    /// Recorded (fqdn, addresses) pairs
    applied: Arc<std::sync::Mutex<Vec<(String, AddressSet)>>>,
    /// Current behavior; tests may switch it between requests
    behavior: Arc<std::sync::Mutex<Behavior>>,
    /// Simulated tool latency
    delay: Duration,
}

impl MockDnsUpdater {
    pub fn new() -> Self {
        Self {
            apply_call_count: Arc::new(AtomicUsize::new(0)),
            applied: Arc::new(std::sync::Mutex::new(Vec::new())),
            behavior: Arc::new(std::sync::Mutex::new(Behavior::Succeed)),
            delay: Duration::ZERO,
        }
    }

    /// Simulate a slow update tool
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Change how subsequent calls answer
    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Get the number of times apply() was called
    pub fn apply_call_count(&self) -> usize {
        self.apply_call_count.load(Ordering::SeqCst)
    }

    /// Get every (fqdn, addresses) pair passed to apply()
    pub fn applied(&self) -> Vec<(String, AddressSet)> {
        self.applied.lock().unwrap().clone()
    }

    /// Create a new MockDnsUpdater that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            apply_call_count: Arc::clone(&other.apply_call_count),
            applied: Arc::clone(&other.applied),
            behavior: Arc::clone(&other.behavior),
            delay: other.delay,
        }
    }
}

#[async_trait::async_trait]
impl DnsUpdater for MockDnsUpdater {
    async fn apply(&self, fqdn: &str, addresses: &AddressSet) -> Result<UpdateResult> {
        self.apply_call_count.fetch_add(1, Ordering::SeqCst);
        assert!(!addresses.is_empty(), "apply() called with an empty set");

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Succeed => {
                self.applied
                    .lock()
                    .unwrap()
                    .push((fqdn.to_string(), addresses.clone()));
                Ok(UpdateResult::success())
            }
            Behavior::ToolError(text) => Err(Error::UpdateTool(text)),
            Behavior::Timeout => Err(Error::UpdateTimeout),
        }
    }

    fn updater_name(&self) -> &'static str {
        "mock"
    }
}

/// A mock AddressCache that tracks calls
pub struct MockAddressCache {
    /// Call counter for get_record()
    get_call_count: Arc<AtomicUsize>,
    /// Call counter for set_addresses()
    set_call_count: Arc<AtomicUsize>,
    /// Stored sets
    state: Arc<std::sync::Mutex<HashMap<String, CacheRecord>>>,
}

impl MockAddressCache {
    pub fn new() -> Self {
        Self {
            get_call_count: Arc::new(AtomicUsize::new(0)),
            set_call_count: Arc::new(AtomicUsize::new(0)),
            state: Arc::new(std::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Get the number of times get_record() was called
    pub fn get_call_count(&self) -> usize {
        self.get_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times set_addresses() was called
    pub fn set_call_count(&self) -> usize {
        self.set_call_count.load(Ordering::SeqCst)
    }

    /// Peek at the stored set for a host
    pub fn stored(&self, host: &str) -> Option<AddressSet> {
        self.state
            .lock()
            .unwrap()
            .get(host)
            .map(|record| record.addresses.clone())
    }

    /// Create a new MockAddressCache that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            get_call_count: Arc::clone(&other.get_call_count),
            set_call_count: Arc::clone(&other.set_call_count),
            state: Arc::clone(&other.state),
        }
    }
}

#[async_trait::async_trait]
impl AddressCache for MockAddressCache {
    async fn get_record(&self, host: &str) -> Result<Option<CacheRecord>> {
        self.get_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().get(host).cloned())
    }

    async fn set_addresses(&self, host: &str, addresses: AddressSet) -> Result<()> {
        self.set_call_count.fetch_add(1, Ordering::SeqCst);
        self.state
            .lock()
            .unwrap()
            .insert(host.to_string(), CacheRecord::new(addresses));
        Ok(())
    }

    async fn list_hosts(&self) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().keys().cloned().collect())
    }
}

/// Everything a contract test needs to drive and observe the pipeline
pub struct Harness {
    pub handler: UpdateHandler,
    pub updater: MockDnsUpdater,
    pub cache: MockAddressCache,
}

/// Build a handler around fresh mocks
pub fn harness(config: BridgeConfig, credentials: Option<HostCredentials>) -> Harness {
    harness_with(config, credentials, MockDnsUpdater::new())
}

/// Build a handler around the given updater and a fresh mock cache
pub fn harness_with(
    config: BridgeConfig,
    credentials: Option<HostCredentials>,
    updater: MockDnsUpdater,
) -> Harness {
    let cache = MockAddressCache::new();
    let handler = UpdateHandler::new(
        config,
        credentials,
        Box::new(MockDnsUpdater::sharing_counters_with(&updater)),
        Box::new(MockAddressCache::sharing_counters_with(&cache)),
    )
    .expect("handler construction succeeds");

    Harness {
        handler,
        updater,
        cache,
    }
}

/// Helper to create the usual test configuration
pub fn minimal_config() -> BridgeConfig {
    BridgeConfig::new("dyn.example.com").with_max_ip(32)
}

/// Credential map with `foo:s3cret` and `bar:hunter2`
pub fn credentials() -> HostCredentials {
    [("foo", "s3cret"), ("bar", "hunter2")].into_iter().collect()
}

/// Build a request from a query string, e.g. `name=foo&ip=10.1.1.1`
pub fn query(q: &str) -> IncomingRequest {
    let params = q
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect();

    IncomingRequest {
        params,
        peer: Some("127.0.0.1:40000".to_string()),
        ..Default::default()
    }
}

/// Add a Basic Authorization header to a request
pub fn with_basic(mut request: IncomingRequest, user: &str, pass: &str) -> IncomingRequest {
    request.authorization = Some(format!(
        "Basic {}",
        BASE64.encode(format!("{}:{}", user, pass))
    ));
    request
}

/// Parse a list of address literals into a set
pub fn addresses(ips: &[&str]) -> AddressSet {
    ips.iter().map(|s| s.parse().unwrap()).collect()
}
