/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::error
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Centralise Syn-Phi error types to provide consistent
    diagnostics and exit semantics.

  Security / Safety Notes:
    Error contexts expose package, unit, and tool names only;
    no credentials or environment values are captured.

  Dependencies:
    thiserror for ergonomic error definitions.

  Operational Scope:
    Used across modules to propagate hard failures. Soft
    failures travel as OpOutcome values, never as errors.

  Revision History:
    2025-11-19 COD  Established shared error definitions.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit error taxonomy with actionable context
    - No silent failure paths
    - Hard/soft failure split enforced at the type level
============================================================*/

use std::io;

use thiserror::Error;

/// Result alias for Syn-Phi operations.
pub type Result<T> = std::result::Result<T, SynPhiError>;

/// Enumerates the hard-failure domains surfaced by Syn-Phi.
///
/// Every variant aborts the current subcommand with exit code 1;
/// recoverable problems are reported as soft outcomes instead.
#[derive(Debug, Error)]
pub enum SynPhiError {
    #[error("Invalid version `{0}`: expected <major>.<minor>, e.g. 8.2")]
    Validation(String),
    #[error("Prerequisite: {0}")]
    Prerequisite(String),
    #[error("Required command `{command}` not found in PATH")]
    CommandMissing { command: String },
    #[error("Command `{command}` failed with status {status}: {stderr}")]
    CommandFailure {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("Network: {0}")]
    Network(String),
    #[error("Checksum mismatch for {artifact}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        artifact: String,
        expected: String,
        actual: String,
    },
    #[error("Operation: {0}")]
    Operation(String),
    #[error("Unrecognised confirmation `{0}`; answer yes or no")]
    Prompt(String),
    #[error("Configuration: {0}")]
    Config(String),
    #[error("Filesystem: {0}")]
    Filesystem(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
