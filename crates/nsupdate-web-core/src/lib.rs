// # nsupdate-web-core
//
// Request validation and update pipeline for the nsupdate web bridge.
//
// Clients update the DNS records of a host they control with a single
// HTTP GET; the bridge checks who they are, validates the addresses,
// skips no-op updates and drives nsupdate(1) for the rest.
//
// ## Architecture Overview
//
// - **Authenticator**: Resolves the hostname from Basic credentials or `name`
// - **Address Parser**: Validates `ip` values / `X-Real-IP` into an AddressSet
// - **AddressCache**: Change detection (last applied set per host)
// - **DnsUpdater**: Trait for applying a change (nsupdate lives in its own crate)
// - **UpdateHandler**: Orchestrates one request through all of the above
//
// ## Design Principles
//
// 1. **Transport-agnostic**: No HTTP types here; errors carry their status
// 2. **Injected state**: The cache is owned by the handler, never global
// 3. **Single-shot**: Every request runs once; clients retry on failure

pub mod address;
pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod script;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use address::{AddressSet, AddressSource, RecordType, parse_addresses};
pub use auth::Authenticator;
pub use config::{BridgeConfig, HostCredentials};
pub use error::{Error, Result};
pub use handler::{HandleOutcome, IncomingRequest, UpdateHandler};
pub use script::UpdateScript;
pub use state::MemoryAddressCache;
pub use traits::{AddressCache, CacheRecord, DnsUpdater, UpdateResult};
