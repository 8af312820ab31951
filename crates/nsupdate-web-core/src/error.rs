//! Error types for the nsupdate web bridge
//!
//! Every request-scoped failure is a variant here. The transport maps each
//! variant to an HTTP status via [`Error::status_code`] and a response body
//! via [`Error::body`]; none of them is fatal to the server process.

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the bridge
#[derive(Error, Debug)]
pub enum Error {
    /// Credentials are configured but the request carried no Basic header
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The Basic header was malformed or the secret did not match
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The resolved host does not match the allow-hosts pattern
    #[error("{host} does not match the allow_hosts regex")]
    HostNotAllowed {
        /// Resolved hostname
        host: String,
        /// The configured pattern
        pattern: String,
    },

    /// Open mode request without a `name` parameter
    #[error("Must specify 'name'")]
    MissingHost,

    /// The hostname has an empty label or a character outside `[A-Za-z0-9_-]`
    #[error("invalid name {host:?}")]
    InvalidHostname {
        /// The offending hostname, after suffix stripping
        host: String,
    },

    /// Neither `ip` parameters nor an `X-Real-IP` header
    #[error("no address")]
    MissingAddress,

    /// A candidate address failed to parse as IPv4 or IPv6
    #[error("broken address\n{value}: invalid IP address syntax")]
    InvalidAddress {
        /// The offending value, as received
        value: String,
    },

    /// The deduplicated address set exceeds the per-host maximum
    #[error("too many addresses\nmax {max}")]
    TooManyAddresses {
        /// Configured maximum
        max: usize,
    },

    /// The update tool did not finish within the configured timeout
    #[error("timeout")]
    UpdateTimeout,

    /// The update tool wrote to its error stream
    #[error("{0}")]
    UpdateTool(String),

    /// Spawning or talking to the update tool failed, or a file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an authentication failure
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    /// Create an invalid address error naming the offending value
    pub fn invalid_address(value: impl Into<String>) -> Self {
        Self::InvalidAddress {
            value: value.into(),
        }
    }

    /// HTTP status code this error surfaces as
    pub fn status_code(&self) -> u16 {
        match self {
            Error::AuthenticationRequired | Error::AuthenticationFailed(_) => 401,
            Error::HostNotAllowed { .. } => 403,
            Error::MissingHost
            | Error::InvalidHostname { .. }
            | Error::MissingAddress
            | Error::InvalidAddress { .. }
            | Error::TooManyAddresses { .. } => 400,
            Error::UpdateTimeout
            | Error::UpdateTool(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Config(_) => 500,
        }
    }

    /// Whether the response must carry a `WWW-Authenticate` challenge
    pub fn is_auth_challenge(&self) -> bool {
        self.status_code() == 401
    }

    /// Response body sent to the client
    ///
    /// Authentication failures never echo why they failed.
    pub fn body(&self) -> String {
        match self {
            Error::AuthenticationRequired | Error::AuthenticationFailed(_) => "no auth".to_string(),
            other => other.to_string(),
        }
    }
}
