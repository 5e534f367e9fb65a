/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::diagnostics
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Read-only host introspection: the active CLI version, the
    registered alternatives, and the presence of framework-
    required extensions.

  Security / Safety Notes:
    Pure queries; nothing here mutates host state, so every
    call also runs under dry-run.

  Dependencies:
    Host trait via the execution context.

  Operational Scope:
    Backs the `current`, `list`, and `check` subcommands and
    the final report of a switch.

  Revision History:
    2025-11-19 COD  Authored diagnostics queries.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Structured parsing with clear failure modes
    - Case-insensitive matching against interpreter output
============================================================*/

use crate::alternatives::AlternativesSwitcher;
use crate::args;
use crate::context::Context;
use crate::error::{Result, SynPhiError};
use crate::version::REQUIRED_EXTENSIONS;

pub struct Diagnostics<'a> {
    ctx: &'a Context,
}

impl<'a> Diagnostics<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Active CLI version from the interpreter's own banner.
    pub async fn current_version(&self) -> Result<String> {
        let output = self.ctx.probe("php", &args!["-v"]).await?;
        if !output.success() {
            return Err(SynPhiError::CommandFailure {
                command: "php -v".to_string(),
                status: output.status,
                stderr: output.stderr,
            });
        }
        parse_banner(&output.stdout).ok_or_else(|| {
            SynPhiError::Operation("Unrecognised php -v banner".to_string())
        })
    }

    /// Versions registered in the alternatives registry, in order.
    pub async fn registered_versions(&self) -> Result<Vec<String>> {
        AlternativesSwitcher::new(self.ctx)
            .registered_php_versions()
            .await
    }

    /// Presence of each framework-required extension in the loaded
    /// module list, matched case-insensitively.
    pub async fn extension_presence(&self) -> Result<Vec<(&'static str, bool)>> {
        let output = self.ctx.probe("php", &args!["-m"]).await?;
        if !output.success() {
            return Err(SynPhiError::CommandFailure {
                command: "php -m".to_string(),
                status: output.status,
                stderr: output.stderr,
            });
        }
        let loaded: Vec<String> = output
            .stdout
            .lines()
            .map(|line| line.trim().to_ascii_lowercase())
            .filter(|line| !line.is_empty() && !line.starts_with('['))
            .collect();
        Ok(REQUIRED_EXTENSIONS
            .iter()
            .map(|ext| (*ext, loaded.iter().any(|m| m == &ext.to_lowercase())))
            .collect())
    }
}

/// Extract `8.2.12` from `PHP 8.2.12 (cli) (built: ...)`.
fn parse_banner(stdout: &str) -> Option<String> {
    let first = stdout.lines().next()?;
    let rest = first.strip_prefix("PHP ")?;
    let version = rest.split_whitespace().next()?;
    if version.is_empty() {
        None
    } else {
        Some(version.to_string())
    }
}
