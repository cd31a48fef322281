//! Device port forwarding through adb.

use async_trait::async_trait;
use shell_core::error::{Result, ShellError};
use std::path::PathBuf;
use std::process::Output;
use tokio::process::Command;

/// Establishes a TCP tunnel from this host to a port on a device.
#[async_trait]
pub trait DeviceTunnel: Send + Sync {
    /// Forward a local port to `remote` (e.g. `tcp:8886`) on device `udid`.
    /// Returns the local port.
    async fn forward(&self, udid: &str, remote: &str) -> Result<u16>;
}

/// Tunnel backed by `adb forward`.
#[derive(Debug, Clone)]
pub struct AdbTunnel {
    adb: PathBuf,
}

impl AdbTunnel {
    pub fn new(adb: impl Into<PathBuf>) -> Self {
        Self { adb: adb.into() }
    }

    async fn run(&self, args: &[&str]) -> std::io::Result<Output> {
        tracing::debug!(adb = %self.adb.display(), ?args, "Running adb");
        Command::new(&self.adb)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
    }
}

#[async_trait]
impl DeviceTunnel for AdbTunnel {
    async fn forward(&self, udid: &str, remote: &str) -> Result<u16> {
        let failure = |message: String| ShellError::Tunnel {
            udid: udid.to_string(),
            remote: remote.to_string(),
            message,
        };

        // Reuse an existing forward when adb already has one.
        match self.run(&["forward", "--list"]).await {
            Ok(output) if output.status.success() => {
                let listing = String::from_utf8_lossy(&output.stdout);
                if let Some(port) = find_forward(&listing, udid, remote) {
                    tracing::debug!(udid, remote, port, "Reusing existing forward");
                    return Ok(port);
                }
            }
            Ok(output) => {
                tracing::debug!(
                    status = %output.status,
                    "adb forward --list failed, requesting a new forward"
                );
            }
            Err(e) => return Err(failure(e.to_string())),
        }

        let output = self
            .run(&["-s", udid, "forward", "tcp:0", remote])
            .await
            .map_err(|e| failure(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure(format!(
                "adb exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let port = parse_port(&stdout)
            .ok_or_else(|| failure(format!("unexpected adb output: {:?}", stdout.trim())))?;

        tracing::info!(udid, remote, port, "Forward established");
        Ok(port)
    }
}

/// Find the local port of an existing `adb forward --list` entry.
///
/// Each line reads `<serial> tcp:<local> <remote>`.
fn find_forward(listing: &str, udid: &str, remote: &str) -> Option<u16> {
    listing.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let (serial, local, target) = (parts.next()?, parts.next()?, parts.next()?);
        if serial != udid || target != remote {
            return None;
        }
        local.strip_prefix("tcp:")?.parse().ok()
    })
}

/// `adb forward tcp:0 ...` prints the allocated port on its own line.
fn parse_port(stdout: &str) -> Option<u16> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())?
        .parse()
        .ok()
}
