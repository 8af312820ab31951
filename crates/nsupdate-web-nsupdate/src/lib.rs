// # nsupdate Executor
//
// This crate applies address sets through BIND's nsupdate(1).
//
// ## Behavior
//
// - One nsupdate process per update; the script is written to its stdin
// - `-k <key-file>` when a key file is configured, otherwise `-l` (local trust)
// - The whole exchange is bounded by the configured timeout; on expiry the
//   process is killed and reaped before the error is returned
// - Anything on stderr means failure and is returned verbatim
// - No retries: the client retries on failure
//
// ## Script
//
// See `nsupdate_web_core::UpdateScript`: optional `server`, `zone`, one
// `update delete` for the name, one `update add` per address, `send`, `quit`.

use async_trait::async_trait;
use nsupdate_web_core::traits::{DnsUpdater, UpdateResult};
use nsupdate_web_core::{AddressSet, BridgeConfig, Error, Result, UpdateScript};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// nsupdate subprocess executor
#[derive(Debug, Clone)]
pub struct NsupdateExecutor {
    /// Path to the nsupdate binary
    nsupdate: PathBuf,

    /// TSIG key file; local trust (`-l`) when absent
    key_file: Option<PathBuf>,

    /// Remote nameserver, if not the local one
    server: Option<String>,

    /// Zone for the `zone` directive
    zone: String,

    /// TTL for added records
    ttl: u32,

    /// Upper bound for one nsupdate run
    timeout: Duration,
}

impl NsupdateExecutor {
    /// Create an executor from the bridge configuration
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            nsupdate: config.nsupdate.clone(),
            key_file: config.key_file.clone(),
            server: config.server.clone(),
            zone: config.domain.clone(),
            ttl: config.ttl,
            timeout: config.timeout(),
        }
    }

    /// Command-line arguments for nsupdate
    ///
    /// The key file takes precedence over local trust.
    pub fn args(&self) -> Vec<OsString> {
        match &self.key_file {
            Some(key_file) => vec!["-k".into(), key_file.clone().into_os_string()],
            None => vec!["-l".into()],
        }
    }

    /// Script replacing the records of `fqdn` with `addresses`
    pub fn script(&self, fqdn: &str, addresses: &AddressSet) -> UpdateScript {
        UpdateScript::replace(self.server.as_deref(), &self.zone, fqdn, self.ttl, addresses)
    }

    /// Run nsupdate with `script` on stdin
    ///
    /// # Returns
    ///
    /// - `Ok((status, stderr))`: nsupdate finished in time
    /// - `Err(Error::UpdateTimeout)`: nsupdate was killed after the timeout
    /// - `Err(Error::Io)`: nsupdate could not be started or waited on
    async fn run(&self, script: &str) -> Result<(ExitStatus, String)> {
        let mut child = Command::new(&self.nsupdate)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let outcome = tokio::time::timeout(self.timeout, communicate(&mut child, script)).await;
        match outcome {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(
                    "nsupdate did not finish within {:?}, killing it",
                    self.timeout
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill nsupdate: {}", e);
                }
                Err(Error::UpdateTimeout)
            }
        }
    }
}

/// Feed `script` to the child and collect its exit status and stderr
async fn communicate(child: &mut Child, script: &str) -> io::Result<(ExitStatus, String)> {
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("nsupdate stdin not captured"))?;
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("nsupdate stdout not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("nsupdate stderr not captured"))?;

    // nsupdate may exit before reading everything; its stderr says why
    match stdin.write_all(script.as_bytes()).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("nsupdate closed stdin early");
        }
        Err(e) => return Err(e),
    }
    drop(stdin);

    let mut out = Vec::new();
    let mut err = Vec::new();
    let (status, _, _) = tokio::try_join!(
        child.wait(),
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err),
    )?;

    if !out.is_empty() {
        debug!("nsupdate stdout: {}", String::from_utf8_lossy(&out).trim_end());
    }
    Ok((status, String::from_utf8_lossy(&err).into_owned()))
}

#[async_trait]
impl DnsUpdater for NsupdateExecutor {
    async fn apply(&self, fqdn: &str, addresses: &AddressSet) -> Result<UpdateResult> {
        let script = self.script(fqdn, addresses).to_string();
        debug!("Executing nsupdate commands:\n{}", script);

        let (status, stderr) = self.run(&script).await?;

        if !stderr.is_empty() {
            return Err(Error::UpdateTool(stderr));
        }
        if !status.success() {
            return Err(Error::UpdateTool(format!("nsupdate exited with {}", status)));
        }

        Ok(UpdateResult::success())
    }

    fn updater_name(&self) -> &'static str {
        "nsupdate"
    }
}
