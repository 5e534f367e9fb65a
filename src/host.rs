/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::host
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Single seam between Syn-Phi and the host: external command
    execution, filesystem probes, PATH lookup, privilege query,
    and the few HTTP calls installation needs.

  Security / Safety Notes:
    Commands are spawned directly with argument vectors; no
    shell is involved, so no interpolation can occur. HTTP is
    limited to read-only GET/HEAD against operator-configured
    URLs.

  Dependencies:
    tokio::process for async command execution, reqwest for
    HTTP, which for PATH resolution, libc for the euid check,
    async-trait for the trait seam.

  Operational Scope:
    SystemHost is the production implementation; tests swap in
    a scripted host so no external process ever runs.

  Revision History:
    2025-11-19 COD  Crafted host integration layer.
    2025-11-27 COD  Folded HTTP probes into the host seam so
                    tests stay fully hermetic.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Deterministic command invocation with explicit checks
    - Structured parsing with clear failure modes
    - One mockable boundary for every side effect
============================================================*/

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Result, SynPhiError};

/// Captured result of an external command. A non-zero status is data,
/// not an error: callers classify it as soft or hard.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Everything Syn-Phi does to the machine goes through this trait.
#[async_trait]
pub trait Host: Send + Sync {
    /// Run a command to completion, capturing output.
    async fn run(&self, program: &str, args: &[String]) -> Result<RunOutput>;

    fn path_exists(&self, path: &Path) -> bool;

    fn tool_in_path(&self, tool: &str) -> bool;

    fn is_root(&self) -> bool;

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    async fn remove_file(&self, path: &Path) -> Result<()>;

    /// Reachability probe: true when the URL answered at all.
    async fn http_head(&self, url: &str, timeout: Duration) -> Result<bool>;

    /// Fetch a small artifact into memory.
    async fn http_get(&self, url: &str) -> Result<Vec<u8>>;
}

/// Production host backed by tokio, reqwest, which, and libc.
pub struct SystemHost {
    client: reqwest::Client,
}

impl SystemHost {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent("Syn-Phi/0.4 (debian)")
            .build()
            .map_err(|err| {
                SynPhiError::Network(format!("Failed to build HTTP client: {err}"))
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Host for SystemHost {
    async fn run(&self, program: &str, args: &[String]) -> Result<RunOutput> {
        let output = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| map_spawn_error(err, program))?;

        Ok(RunOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn tool_in_path(&self, tool: &str) -> bool {
        which::which(tool).is_ok()
    }

    fn is_root(&self) -> bool {
        // Effective uid decides what apt and systemctl will permit.
        unsafe { libc::geteuid() == 0 }
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(path, bytes).await.map_err(|err| {
            SynPhiError::Filesystem(format!(
                "Failed to write {}: {err}",
                path.display()
            ))
        })
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        tokio::fs::copy(from, to).await.map(|_| ()).map_err(|err| {
            SynPhiError::Filesystem(format!(
                "Failed to copy {} to {}: {err}",
                from.display(),
                to.display()
            ))
        })
    }

    async fn remove_file(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path).await.map_err(|err| {
            SynPhiError::Filesystem(format!(
                "Failed to remove {}: {err}",
                path.display()
            ))
        })
    }

    async fn http_head(&self, url: &str, timeout: Duration) -> Result<bool> {
        // Any response, including an HTTP error status, proves the
        // network path is up.
        match self.client.head(url).timeout(timeout).send().await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    async fn http_get(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| SynPhiError::Network(format!("GET {url} failed: {err}")))?
            .error_for_status()
            .map_err(|err| SynPhiError::Network(format!("GET {url} failed: {err}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| SynPhiError::Network(format!("GET {url} failed: {err}")))?;
        Ok(bytes.to_vec())
    }
}

fn map_spawn_error(err: io::Error, command: &str) -> SynPhiError {
    if err.kind() == io::ErrorKind::NotFound {
        SynPhiError::CommandMissing {
            command: command.into(),
        }
    } else {
        SynPhiError::Operation(format!("Failed to spawn {command}: {err}"))
    }
}
