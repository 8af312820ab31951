// # Address Parser
//
// Turns client-supplied address strings into a validated, deduplicated
// set of IP addresses.
//
// ## Sources (first match wins)
//
// 1. One or more `ip` query values, each trimmed
// 2. The `X-Real-IP` header (set by a fronting proxy)
// 3. Nothing: the request fails with `no address`

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

use crate::error::{Error, Result};

/// DNS record type for an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
}

impl RecordType {
    /// Record type matching the address family of `ip`
    pub fn of(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Presentation form used in update scripts
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of addresses for one hostname
///
/// Equality is set equality; iteration order is stable (IPv4 before IPv6,
/// numerically ascending) so generated scripts are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSet(BTreeSet<IpAddr>);

impl AddressSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an address, returning false if it was already present
    pub fn insert(&mut self, ip: IpAddr) -> bool {
        self.0.insert(ip)
    }

    /// Number of distinct addresses
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `ip` is in the set
    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }

    /// Iterate addresses in stable order
    pub fn iter(&self) -> impl Iterator<Item = &IpAddr> {
        self.0.iter()
    }

    /// Iterate addresses with their record type
    pub fn records(&self) -> impl Iterator<Item = (RecordType, &IpAddr)> {
        self.0.iter().map(|ip| (RecordType::of(ip), ip))
    }
}

impl FromIterator<IpAddr> for AddressSet {
    fn from_iter<T: IntoIterator<Item = IpAddr>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for AddressSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for ip in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}", ip)?;
            first = false;
        }
        Ok(())
    }
}

/// Where the addresses of a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// `ip` query parameters
    Query,
    /// `X-Real-IP` header
    RealIp,
}

/// Parse and validate the addresses of one request
///
/// # Parameters
///
/// - `ip_values`: every `ip` query value, in request order
/// - `real_ip`: the `X-Real-IP` header, consulted only when `ip_values` is empty
/// - `max_ip`: maximum number of distinct addresses
///
/// # Returns
///
/// A non-empty [`AddressSet`] and the source it was taken from.
pub fn parse_addresses<S: AsRef<str>>(
    ip_values: &[S],
    real_ip: Option<&str>,
    max_ip: usize,
) -> Result<(AddressSet, AddressSource)> {
    let (candidates, source): (Vec<&str>, _) = if !ip_values.is_empty() {
        (
            ip_values.iter().map(|s| s.as_ref().trim()).collect(),
            AddressSource::Query,
        )
    } else if let Some(real_ip) = real_ip {
        (vec![real_ip], AddressSource::RealIp)
    } else {
        return Err(Error::MissingAddress);
    };

    let mut addresses = AddressSet::new();
    for candidate in candidates {
        let ip: IpAddr = candidate
            .parse()
            .map_err(|_| Error::invalid_address(candidate))?;
        addresses.insert(ip);
    }

    if addresses.len() > max_ip {
        return Err(Error::TooManyAddresses { max: max_ip });
    }

    Ok((addresses, source))
}
