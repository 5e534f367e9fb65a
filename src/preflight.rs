/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::preflight
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Gate every subcommand behind the host prerequisites: root
    privileges and the package/alternatives tooling in PATH.

  Security / Safety Notes:
    Runs before any side-effecting logic; a failed check means
    no partial work was attempted.

  Dependencies:
    Host trait for privilege and PATH queries.

  Operational Scope:
    Invoked once per run from main, after CLI parsing and
    before dispatch.

  Revision History:
    2025-11-19 COD  Authored preflight gate.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Fail fast with an actionable diagnostic
    - No subcommand logic before the gate passes
============================================================*/

use crate::context::Context;
use crate::error::{Result, SynPhiError};

/// Tools every subcommand relies on. Service control is not listed:
/// systemctl has a runtime fallback path instead.
pub const REQUIRED_TOOLS: &[&str] = &["apt-get", "dpkg-query", "update-alternatives"];

/// Verify privileges and tooling; hard failure aborts the invocation.
pub fn ensure_host_ready(ctx: &Context) -> Result<()> {
    if !ctx.host.is_root() {
        return Err(SynPhiError::Prerequisite(
            "Syn-Phi must run with root privileges (try sudo)".to_string(),
        ));
    }
    for tool in REQUIRED_TOOLS {
        if !ctx.host.tool_in_path(tool) {
            return Err(SynPhiError::Prerequisite(format!(
                "required tool `{tool}` not found in PATH"
            )));
        }
    }
    ctx.logger
        .debug("PREFLIGHT", "Privileges and required tools verified");
    Ok(())
}
