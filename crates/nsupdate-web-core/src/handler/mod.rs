//! Request handler
//!
//! The UpdateHandler runs one request through the whole pipeline:
//!
//! ```text
//! ┌───────────────┐   ┌────────────────┐   ┌──────────────┐
//! │ Authenticator │──▶│ Address Parser │──▶│ AddressCache │── unchanged ──▶ no-change
//! │ (host)        │   │ (addresses)    │   │ (check)      │
//! └───────────────┘   └────────────────┘   └──────────────┘
//!                                                 │ changed
//!                                                 ▼
//!                                          ┌──────────────┐   ┌──────────────┐
//!                                          │  DnsUpdater  │──▶│ AddressCache │──▶ success
//!                                          │  (apply)     │   │ (record)     │
//!                                          └──────────────┘   └──────────────┘
//! ```
//!
//! Any stage can end the request early with an [`Error`]; the transport
//! turns it into a response. There are no retries.

use tracing::{debug, error, info, warn};

use crate::address::{AddressSet, AddressSource, parse_addresses};
use crate::auth::Authenticator;
use crate::config::{BridgeConfig, HostCredentials};
use crate::error::{Error, Result};
use crate::traits::{AddressCache, DnsUpdater};

/// Transport-independent view of an HTTP request
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    /// `Authorization` header
    pub authorization: Option<String>,
    /// `X-Real-IP` header
    pub real_ip: Option<String>,
    /// Decoded query parameters, in order; keys may repeat
    pub params: Vec<(String, String)>,
    /// Peer address reported by the transport, for logging
    pub peer: Option<String>,
}

impl IncomingRequest {
    /// All values of a query parameter, in order
    pub fn param_values(&self, key: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Address to name the client by in logs
    ///
    /// `X-Real-IP` wins over the peer address when it is the address
    /// source, i.e. when no `ip` parameter was given.
    pub fn client_label(&self) -> &str {
        match (&self.real_ip, &self.peer) {
            (Some(real_ip), _) if self.param_values("ip").is_empty() => real_ip,
            (_, Some(peer)) => peer,
            _ => "unknown",
        }
    }
}

/// Successful outcome of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The update tool ran and committed the change
    Updated {
        /// Name that was updated
        fqdn: String,
        /// Addresses now published
        addresses: AddressSet,
        /// Message from the updater
        message: String,
    },

    /// The cache already holds this address set; nothing ran
    Unchanged {
        /// Hostname the request resolved to
        host: String,
    },
}

impl HandleOutcome {
    /// Response body for the client
    pub fn body(&self) -> &str {
        match self {
            HandleOutcome::Updated { message, .. } => message,
            HandleOutcome::Unchanged { .. } => "no-change",
        }
    }
}

/// Per-request pipeline
///
/// Shared by every request worker; all state it owns is either read-only
/// (configuration, credentials) or lives in the injected cache.
pub struct UpdateHandler {
    /// Resolves hostnames
    authenticator: Authenticator,

    /// Applies changes
    updater: Box<dyn DnsUpdater>,

    /// Change detection
    cache: Box<dyn AddressCache>,

    /// Domain suffix
    domain: String,

    /// Maximum addresses per host
    max_ip: usize,
}

impl UpdateHandler {
    /// Create a new handler
    ///
    /// # Parameters
    ///
    /// - `config`: Bridge configuration (validated here)
    /// - `credentials`: Credential map, or `None` for open mode
    /// - `updater`: Update executor
    /// - `cache`: Change-detection cache
    pub fn new(
        mut config: BridgeConfig,
        credentials: Option<HostCredentials>,
        updater: Box<dyn DnsUpdater>,
        cache: Box<dyn AddressCache>,
    ) -> Result<Self> {
        config.validate()?;

        let authenticator =
            Authenticator::new(&config.domain, credentials, config.allow_hosts.as_deref())?;

        Ok(Self {
            authenticator,
            updater,
            cache,
            domain: config.domain,
            max_ip: config.max_ip,
        })
    }

    /// The configured domain suffix (used as the auth realm)
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Fully-qualified name for a resolved host
    ///
    /// `host` is never empty; the authenticator rejects names that would
    /// address the zone apex.
    pub fn fqdn(&self, host: &str) -> String {
        format!("{}.{}", host, self.domain)
    }

    /// Handle one request
    ///
    /// # Returns
    ///
    /// - `Ok(HandleOutcome)`: 200 with [`HandleOutcome::body`]
    /// - `Err(Error)`: status per [`Error::status_code`]
    pub async fn handle(&self, request: &IncomingRequest) -> Result<HandleOutcome> {
        let client = request.client_label();

        let result = self.run(request).await;
        match &result {
            Ok(HandleOutcome::Updated {
                fqdn, addresses, ..
            }) => info!("{} updated {} -> {}", client, fqdn, addresses),
            Ok(HandleOutcome::Unchanged { host }) => debug!("{} no change for {}", client, host),
            Err(e @ (Error::UpdateTimeout | Error::UpdateTool(_) | Error::Io(_))) => {
                error!("{} update failed: {}", client, e)
            }
            Err(e) => warn!("{} rejected ({}): {}", client, e.status_code(), e),
        }
        result
    }

    async fn run(&self, request: &IncomingRequest) -> Result<HandleOutcome> {
        let host = self
            .authenticator
            .resolve_host(request.authorization.as_deref(), &request.params)?;

        let (addresses, source) = parse_addresses(
            &request.param_values("ip"),
            request.real_ip.as_deref(),
            self.max_ip,
        )?;
        if source == AddressSource::RealIp {
            debug!("Using X-Real-IP {} for {}", addresses, host);
        }

        if let Some(record) = self.cache.get_record(&host).await? {
            if record.addresses == addresses {
                debug!(
                    "Host {} unchanged since {}, skipping update",
                    host, record.last_updated
                );
                return Ok(HandleOutcome::Unchanged { host });
            }
        }

        let fqdn = self.fqdn(&host);
        debug!(
            "Applying {} via {}: {}",
            fqdn,
            self.updater.updater_name(),
            addresses
        );
        let result = self.updater.apply(&fqdn, &addresses).await?;

        self.cache.set_addresses(&host, addresses.clone()).await?;

        Ok(HandleOutcome::Updated {
            fqdn,
            addresses,
            message: result.message,
        })
    }

    /// Hosts currently held in the change-detection cache
    pub async fn cached_hosts(&self) -> Result<Vec<String>> {
        self.cache.list_hosts().await
    }
}
