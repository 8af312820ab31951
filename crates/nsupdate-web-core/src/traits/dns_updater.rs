// # DNS Updater Trait
//
// Defines the interface for applying an address set to a hostname.
//
// ## Implementations
//
// - nsupdate subprocess: `nsupdate-web-nsupdate` crate
//
// ## Usage
//
// ```rust,ignore
// use nsupdate_web_core::{DnsUpdater, UpdateScript};
//
// let result = updater.apply("foo.dyn.example.com", &addresses).await?;
// println!("{}", result.message);
// ```

use async_trait::async_trait;

use crate::address::AddressSet;

/// Successful outcome of an update
///
/// Failures are reported as [`crate::Error::UpdateTimeout`],
/// [`crate::Error::UpdateTool`] or [`crate::Error::Io`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// Human-readable message returned to the client
    pub message: String,
}

impl UpdateResult {
    /// The standard success result
    pub fn success() -> Self {
        Self {
            message: "success".to_string(),
        }
    }
}

/// Trait for DNS updater implementations
///
/// # Contract
///
/// - `addresses` is never empty.
/// - The update replaces every record of `fqdn` with exactly `addresses`,
///   so repeating it is harmless.
/// - The call is single-shot: no retries. The client retries on failure.
/// - The call is bounded; implementations enforce their own timeout and
///   clean up any subprocess they started on every exit path.
#[async_trait]
pub trait DnsUpdater: Send + Sync {
    /// Replace the records of `fqdn` with `addresses`
    ///
    /// # Parameters
    ///
    /// - `fqdn`: Fully-qualified name, e.g. `foo.dyn.example.com`
    /// - `addresses`: Non-empty address set
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateResult)`: The change was committed
    /// - `Err(Error)`: Timeout, tool-reported error or I/O failure
    async fn apply(
        &self,
        fqdn: &str,
        addresses: &AddressSet,
    ) -> Result<UpdateResult, crate::Error>;

    /// Get the updater name (for logging)
    fn updater_name(&self) -> &'static str;
}
