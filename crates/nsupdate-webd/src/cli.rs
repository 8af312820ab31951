//! Command-line and environment configuration
//!
//! Every flag can also be set through an `NSUPDATE_WEB_*` environment
//! variable, which is how the daemon is usually run under systemd.

use clap::Parser;
use nsupdate_web_core::BridgeConfig;
use std::path::PathBuf;

/// Web API for updating DNS records through nsupdate
#[derive(Debug, Clone, Parser)]
#[command(name = "nsupdate-webd", version, about)]
pub struct Cli {
    /// The address to bind to. A path starting with `/` listens on a Unix domain socket.
    #[arg(
        short = 'l',
        long,
        default_value = "127.0.0.1",
        value_name = "ADDRESS",
        env = "NSUPDATE_WEB_LISTEN_ADDR"
    )]
    pub listen_addr: String,

    /// TCP port; ignored for Unix domain sockets
    #[arg(
        short = 'p',
        long,
        default_value_t = 8080,
        value_name = "PORT",
        env = "NSUPDATE_WEB_LISTEN_PORT"
    )]
    pub listen_port: u16,

    /// The remote nameserver
    #[arg(short = 's', long, env = "NSUPDATE_WEB_SERVER")]
    pub server: Option<String>,

    /// File mode (octal) of the Unix domain socket; ignored for TCP
    #[arg(
        short = 'm',
        long,
        default_value = "660",
        value_name = "FILE-MODE",
        value_parser = parse_mode,
        env = "NSUPDATE_WEB_SOCKET_MODE"
    )]
    pub socket_mode: u32,

    /// JSON file with hostname/secret pairs; open mode when absent
    #[arg(
        short = 'k',
        long,
        value_name = "HOST-FILE",
        env = "NSUPDATE_WEB_HOST_LIST"
    )]
    pub host_list: Option<PathBuf>,

    /// Only accept updates for hosts matching this regular expression
    #[arg(short = 'a', long, env = "NSUPDATE_WEB_ALLOW_HOSTS")]
    pub allow_hosts: Option<String>,

    /// The key file to use with nsupdate
    #[arg(short = 'K', long, env = "NSUPDATE_WEB_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Domain suffix, e.g. dyn.example.com
    #[arg(
        short = 'd',
        long,
        value_name = "DOMAIN_SUFFIX",
        env = "NSUPDATE_WEB_DOMAIN"
    )]
    pub domain: String,

    /// Path to nsupdate
    #[arg(
        long,
        default_value = "/usr/bin/nsupdate",
        value_name = "NSUPDATE-PATH",
        env = "NSUPDATE_WEB_NSUPDATE"
    )]
    pub nsupdate: PathBuf,

    /// TTL of added records
    #[arg(
        long,
        default_value_t = 300,
        value_name = "SECONDS",
        env = "NSUPDATE_WEB_TTL"
    )]
    pub ttl: u32,

    /// Max allowed number of IPs on each name
    #[arg(
        long,
        default_value_t = 32,
        value_name = "MAX-IP",
        env = "NSUPDATE_WEB_MAX_IP"
    )]
    pub max_ip: usize,

    /// Max waiting time for nsupdate
    #[arg(
        long,
        default_value_t = 3,
        value_name = "SECONDS",
        env = "NSUPDATE_WEB_TIMEOUT"
    )]
    pub timeout: u64,

    /// Log level
    #[arg(
        long,
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        env = "NSUPDATE_WEB_LOG_LEVEL"
    )]
    pub log_level: String,
}

/// Where to accept connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listen {
    /// TCP address and port
    Tcp(String, u16),
    /// Unix domain socket path and file mode
    Unix(PathBuf, u32),
}

impl Cli {
    /// Listener selected by `--listen-addr`
    pub fn listen(&self) -> Listen {
        if self.listen_addr.starts_with('/') {
            Listen::Unix(PathBuf::from(&self.listen_addr), self.socket_mode)
        } else {
            Listen::Tcp(self.listen_addr.clone(), self.listen_port)
        }
    }

    /// Pipeline configuration (validated later by the handler)
    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig::new(&self.domain)
            .with_ttl(self.ttl)
            .with_max_ip(self.max_ip)
            .with_nsupdate(&self.nsupdate)
            .with_key_file(self.key_file.clone())
            .with_server(self.server.clone())
            .with_timeout_secs(self.timeout)
            .with_allow_hosts(self.allow_hosts.clone())
    }
}

fn parse_mode(s: &str) -> Result<u32, String> {
    u32::from_str_radix(s, 8)
        .ok()
        .filter(|mode| *mode <= 0o7777)
        .ok_or_else(|| format!("'{}' is not an octal file mode", s))
}
