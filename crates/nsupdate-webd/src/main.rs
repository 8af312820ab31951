// # nsupdate-webd - nsupdate web daemon
//
// A thin integration layer: all request validation and update logic lives
// in nsupdate-web-core and nsupdate-web-nsupdate.
//
// The daemon is responsible for:
// 1. Reading configuration from flags / environment variables
// 2. Loading the host list (credential map)
// 3. Initializing logging and the runtime
// 4. Serving HTTP on a TCP address or a Unix domain socket
// 5. Shutting down cleanly on SIGINT/SIGTERM
//
// ## Example
//
// ```bash
// export NSUPDATE_WEB_DOMAIN=dyn.example.com
// export NSUPDATE_WEB_HOST_LIST=/etc/nsupdate-web/hosts.json
// export NSUPDATE_WEB_KEY_FILE=/etc/bind/ddns.key
//
// nsupdate-webd --listen-addr /run/nsupdate-web/http.sock --socket-mode 660
// ```
//
// ```bash
// curl -u foo:secret 'http://127.0.0.1:8080/?ip=192.0.2.1&ip=2001:db8::1'
// ```

mod cli;
mod http;

use anyhow::{Context, Result};
use clap::Parser;
use nsupdate_web_core::{HostCredentials, MemoryAddressCache, UpdateHandler};
use nsupdate_web_nsupdate::NsupdateExecutor;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, Listen};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Unreadable host list, or runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebdExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown,
    /// Invalid configuration or startup failure
    ConfigError,
    /// Host list file missing, unreadable or not a JSON object
    HostListError,
    /// Runtime error (unexpected failure)
    RuntimeError,
}

impl WebdExitCode {
    fn code(self) -> u8 {
        match self {
            WebdExitCode::CleanShutdown => 0,
            WebdExitCode::ConfigError => 1,
            WebdExitCode::HostListError | WebdExitCode::RuntimeError => 2,
        }
    }
}

impl From<WebdExitCode> for ExitCode {
    fn from(code: WebdExitCode) -> Self {
        ExitCode::from(code.code())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WebdExitCode::ConfigError.into();
    }

    let credentials = match load_credentials(cli.host_list.as_deref()) {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("{:#}", e);
            return WebdExitCode::HostListError.into();
        }
    };

    let handler = match build_handler(&cli, credentials) {
        Ok(handler) => Arc::new(handler),
        Err(e) => {
            error!("{:#}", e);
            return WebdExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WebdExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(cli.listen(), handler).await {
            error!("Daemon error: {:#}", e);
            WebdExitCode::RuntimeError
        } else {
            WebdExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Load the credential map, or `None` for open mode
fn load_credentials(host_list: Option<&Path>) -> Result<Option<HostCredentials>> {
    match host_list {
        Some(path) => {
            let credentials = HostCredentials::from_file(path)
                .with_context(|| format!("Cannot read host list file {}", path.display()))?;
            info!("Loaded {} host(s) from {}", credentials.len(), path.display());
            Ok(Some(credentials))
        }
        None => {
            warn!("No host list given, running in open mode: any client may update any name");
            Ok(None)
        }
    }
}

/// Assemble the request pipeline
fn build_handler(cli: &Cli, credentials: Option<HostCredentials>) -> Result<UpdateHandler> {
    let config = cli.bridge_config();
    let executor = NsupdateExecutor::from_config(&config);

    info!(
        "Serving updates for *.{} via {}",
        config.domain,
        config.nsupdate.display()
    );

    UpdateHandler::new(
        config,
        credentials,
        Box::new(executor),
        Box::new(MemoryAddressCache::new()),
    )
    .context("Invalid configuration")
}

/// Serve until a shutdown signal arrives
async fn run_daemon(listen: Listen, handler: Arc<UpdateHandler>) -> Result<()> {
    let app = http::router(Arc::clone(&handler));

    match listen {
        Listen::Tcp(addr, port) => {
            let listener = tokio::net::TcpListener::bind((addr.as_str(), port))
                .await
                .with_context(|| format!("Failed to bind {}:{}", addr, port))?;
            info!("Listening on http://{}", listener.local_addr()?);

            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        }
        Listen::Unix(path, mode) => serve_unix(app, &path, mode).await?,
    }

    let cached = handler.cached_hosts().await?;
    info!("Shutting down, {} host(s) updated this run", cached.len());
    Ok(())
}

#[cfg(unix)]
async fn serve_unix(app: axum::Router, path: &std::path::Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::{FileTypeExt, PermissionsExt};

    // Remove a stale socket left by an unclean exit
    if let Ok(metadata) = std::fs::symlink_metadata(path) {
        if metadata.file_type().is_socket() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove stale socket {}", path.display()))?;
        }
    }

    let listener = tokio::net::UnixListener::bind(path)
        .with_context(|| format!("Failed to bind {}", path.display()))?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .with_context(|| format!("Failed to chmod {:o} {}", mode, path.display()))?;
    info!("Listening on unix:{} (mode {:o})", path.display(), mode);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = std::fs::remove_file(path) {
        warn!("Failed to remove socket {}: {}", path.display(), e);
    }
    Ok(served?)
}

#[cfg(not(unix))]
async fn serve_unix(_app: axum::Router, _path: &std::path::Path, _mode: u32) -> Result<()> {
    anyhow::bail!("Unix domain socket is unsupported on this platform.")
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn shutdown_signal() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to set up signal handlers: {}", e);
            return std::future::pending().await;
        }
    };

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", received);
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
