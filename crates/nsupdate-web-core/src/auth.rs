// # Authenticator
//
// Resolves the logical hostname a request wants to update.
//
// ## Modes
//
// - **Credentials**: the hostname is the identity of an HTTP Basic header
//   and must carry the secret registered for it.
// - **Open**: no credential map is loaded; the hostname comes from the
//   `name` query parameter.
//
// In both modes the domain suffix is stripped first, then the optional
// allow-hosts pattern is applied.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use regex::Regex;
use tracing::debug;

use crate::config::HostCredentials;
use crate::error::{Error, Result};

/// Hostname resolver for incoming requests
#[derive(Debug, Clone)]
pub struct Authenticator {
    /// Configured domain suffix, without surrounding dots
    domain: String,

    /// Credential map; `None` means open mode
    credentials: Option<HostCredentials>,

    /// Original allow-hosts pattern, for error messages
    allow_pattern: Option<String>,

    /// Allow-hosts pattern anchored at the start of the hostname
    allow_regex: Option<Regex>,
}

impl Authenticator {
    /// Create a new authenticator
    ///
    /// # Parameters
    ///
    /// - `domain`: Domain suffix to strip from identities
    /// - `credentials`: Credential map, or `None` for open mode
    /// - `allow_hosts`: Optional pattern every resolved host must match
    pub fn new(
        domain: impl Into<String>,
        credentials: Option<HostCredentials>,
        allow_hosts: Option<&str>,
    ) -> Result<Self> {
        let allow_regex = allow_hosts
            .map(|pattern| {
                Regex::new(&format!("^(?:{})", pattern)).map_err(|e| {
                    Error::config(format!("Invalid allow_hosts regex '{}': {}", pattern, e))
                })
            })
            .transpose()?;

        Ok(Self {
            domain: domain.into(),
            credentials,
            allow_pattern: allow_hosts.map(str::to_string),
            allow_regex,
        })
    }

    /// Whether a credential map is configured
    pub fn requires_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Resolve the hostname of a request
    ///
    /// # Parameters
    ///
    /// - `authorization`: Value of the `Authorization` header, if any
    /// - `params`: Decoded query parameters
    pub fn resolve_host(
        &self,
        authorization: Option<&str>,
        params: &[(String, String)],
    ) -> Result<String> {
        let host = match &self.credentials {
            Some(credentials) => {
                let header = authorization.ok_or(Error::AuthenticationRequired)?;
                let (identity, secret) = decode_basic(header)?;
                let host = self.strip_domain(&identity).to_string();
                if host.is_empty() {
                    return Err(Error::auth_failed("identity names the zone itself"));
                }
                if !credentials.verify(&host, &secret) {
                    return Err(Error::auth_failed(format!("bad credentials for {}", host)));
                }
                host
            }
            None => {
                let name = params
                    .iter()
                    .find(|(key, _)| key == "name")
                    .map(|(_, value)| value.trim())
                    .filter(|value| !value.is_empty())
                    .ok_or(Error::MissingHost)?;
                let host = self.strip_domain(name);
                if host.is_empty() {
                    return Err(Error::MissingHost);
                }
                host.to_string()
            }
        };

        check_hostname(&host)?;

        if let (Some(regex), Some(pattern)) = (&self.allow_regex, &self.allow_pattern) {
            if !regex.is_match(&host) {
                return Err(Error::HostNotAllowed {
                    host,
                    pattern: pattern.clone(),
                });
            }
        }

        debug!("Resolved host {}", host);
        Ok(host)
    }

    /// Remove the configured domain suffix from `host`, if present
    ///
    /// Only whole labels are stripped: `foo.dyn.example.com` becomes `foo`,
    /// `foodyn.example.com` is left alone.
    pub fn strip_domain<'a>(&self, host: &'a str) -> &'a str {
        let host = host.trim_end_matches('.');
        match host.strip_suffix(self.domain.as_str()) {
            Some("") => "",
            Some(rest) => rest.strip_suffix('.').unwrap_or(host),
            None => host,
        }
    }
}

/// Reject hostnames that could not appear as labels in an nsupdate directive
///
/// Every dot-separated label must be non-empty and made of ASCII letters,
/// digits, `-` and `_`.
fn check_hostname(host: &str) -> Result<()> {
    let valid = host.split('.').all(|label| {
        !label.is_empty()
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    });
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidHostname {
            host: host.to_string(),
        })
    }
}

/// Decode an HTTP Basic `Authorization` header into `(identity, secret)`
fn decode_basic(header: &str) -> Result<(String, String)> {
    let (scheme, encoded) = header
        .trim()
        .split_once(' ')
        .ok_or_else(|| Error::auth_failed("malformed Authorization header"))?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(Error::auth_failed(format!("unsupported scheme {}", scheme)));
    }

    let decoded = BASE64
        .decode(encoded.trim())
        .map_err(|e| Error::auth_failed(format!("invalid base64: {}", e)))?;
    let decoded =
        String::from_utf8(decoded).map_err(|_| Error::auth_failed("credentials are not UTF-8"))?;

    let (identity, secret) = decoded
        .split_once(':')
        .ok_or_else(|| Error::auth_failed("missing ':' in credentials"))?;
    Ok((identity.to_string(), secret.to_string()))
}
