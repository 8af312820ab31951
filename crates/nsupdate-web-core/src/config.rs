//! Configuration types for the nsupdate web bridge
//!
//! This module defines the values the request pipeline consumes. How they are
//! collected (flags, environment) is up to the daemon.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Domain suffix (zone) that hostnames live under, e.g. `dyn.example.com`
    pub domain: String,

    /// TTL in seconds attached to every added record
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Maximum number of distinct addresses per hostname
    #[serde(default = "default_max_ip")]
    pub max_ip: usize,

    /// Path to the nsupdate binary
    #[serde(default = "default_nsupdate")]
    pub nsupdate: PathBuf,

    /// TSIG key file passed to nsupdate with `-k`; `-l` is used when absent
    #[serde(default)]
    pub key_file: Option<PathBuf>,

    /// Remote nameserver for the `server` directive
    #[serde(default)]
    pub server: Option<String>,

    /// Maximum time to wait for nsupdate (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Only accept hosts matching this regular expression (anchored at the start)
    #[serde(default)]
    pub allow_hosts: Option<String>,
}

impl BridgeConfig {
    /// Create a new configuration for `domain` with defaults
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: normalize_domain(&domain.into()),
            ttl: default_ttl(),
            max_ip: default_max_ip(),
            nsupdate: default_nsupdate(),
            key_file: None,
            server: None,
            timeout_secs: default_timeout_secs(),
            allow_hosts: None,
        }
    }

    /// Set the record TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the per-host address limit
    pub fn with_max_ip(mut self, max_ip: usize) -> Self {
        self.max_ip = max_ip;
        self
    }

    /// Set the nsupdate binary path
    pub fn with_nsupdate(mut self, path: impl Into<PathBuf>) -> Self {
        self.nsupdate = path.into();
        self
    }

    /// Use a TSIG key file instead of local trust
    pub fn with_key_file(mut self, path: Option<PathBuf>) -> Self {
        self.key_file = path;
        self
    }

    /// Set the remote nameserver
    pub fn with_server(mut self, server: Option<String>) -> Self {
        self.server = server;
        self
    }

    /// Set the nsupdate timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Restrict hosts to those matching `pattern`
    pub fn with_allow_hosts(mut self, pattern: Option<String>) -> Self {
        self.allow_hosts = pattern;
        self
    }

    /// The nsupdate timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    ///
    /// Also normalizes the domain so deserialized configs behave like
    /// ones built with [`BridgeConfig::new`].
    pub fn validate(&mut self) -> Result<(), crate::Error> {
        self.domain = normalize_domain(&self.domain);

        if self.domain.is_empty() {
            return Err(crate::Error::config("Domain suffix cannot be empty"));
        }
        if self.ttl == 0 {
            return Err(crate::Error::config("TTL must be > 0"));
        }
        if self.max_ip == 0 {
            return Err(crate::Error::config("max_ip must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("nsupdate timeout must be > 0"));
        }
        if let Some(pattern) = &self.allow_hosts {
            regex::Regex::new(pattern).map_err(|e| {
                crate::Error::config(format!("Invalid allow_hosts regex '{}': {}", pattern, e))
            })?;
        }

        Ok(())
    }
}

/// Strip surrounding dots so `.dyn.example.com.` and `dyn.example.com` agree
fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_matches('.').to_string()
}

fn default_ttl() -> u32 {
    300
}

fn default_max_ip() -> usize {
    32
}

fn default_nsupdate() -> PathBuf {
    PathBuf::from("/usr/bin/nsupdate")
}

fn default_timeout_secs() -> u64 {
    3
}

/// Hostname to shared-secret map
///
/// Loaded once at startup and read-only afterwards. The `Debug`
/// implementation lists hostnames only.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostCredentials(HashMap<String, String>);

impl std::fmt::Debug for HostCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

impl HostCredentials {
    /// Load a JSON object of `{"host": "secret", ...}` from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse a JSON object of `{"host": "secret", ...}`
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether `secret` is the one registered for `host`
    pub fn verify(&self, host: &str, secret: &str) -> bool {
        self.0.get(host).is_some_and(|expected| expected == secret)
    }

    /// Number of registered hosts
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no hosts are registered
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for HostCredentials {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::new("dyn.example.com");
        assert_eq!(config.ttl, 300);
        assert_eq!(config.max_ip, 32);
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.nsupdate, PathBuf::from("/usr/bin/nsupdate"));
        assert!(config.key_file.is_none());
    }

    #[test]
    fn test_domain_normalized() {
        let config = BridgeConfig::new(".dyn.example.com.");
        assert_eq!(config.domain, "dyn.example.com");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let mut config: BridgeConfig =
            serde_json::from_str(r#"{"domain": "dyn.example.com.", "ttl": 60}"#).unwrap();
        config.validate().unwrap();
        assert_eq!(config.domain, "dyn.example.com");
        assert_eq!(config.ttl, 60);
        assert_eq!(config.max_ip, 32);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(BridgeConfig::new("").validate().is_err());
        assert!(BridgeConfig::new("d").with_ttl(0).validate().is_err());
        assert!(BridgeConfig::new("d").with_max_ip(0).validate().is_err());
        assert!(BridgeConfig::new("d").with_timeout_secs(0).validate().is_err());
        assert!(
            BridgeConfig::new("d")
                .with_allow_hosts(Some("(unclosed".into()))
                .validate()
                .is_err()
        );
        assert!(
            BridgeConfig::new("d")
                .with_allow_hosts(Some("home-.*".into()))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_credentials_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"foo": "s3cret", "bar": "hunter2"}}"#).unwrap();

        let creds = HostCredentials::from_file(file.path()).unwrap();
        assert_eq!(creds.len(), 2);
        assert!(creds.verify("foo", "s3cret"));
        assert!(!creds.verify("foo", "hunter2"));
        assert!(!creds.verify("baz", "s3cret"));
    }

    #[test]
    fn test_credentials_malformed() {
        assert!(matches!(
            HostCredentials::from_json("[1, 2]"),
            Err(crate::Error::Json(_))
        ));
        assert!(matches!(
            HostCredentials::from_file("/nonexistent/hosts.json"),
            Err(crate::Error::Io(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds: HostCredentials = [("foo", "s3cret")].into_iter().collect();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("foo"));
        assert!(!debug.contains("s3cret"));
    }
}
