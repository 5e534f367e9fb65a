/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::logger
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1
  ------------------------------------------------------------
  Purpose:
    Provide structured, append-only logging utilities for
    Syn-Phi operations, mirrored to a colour-tagged console.

  Security / Safety Notes:
    Log lines carry package, unit, and path names only; no
    secrets pass through this module.

  Dependencies:
    std::fs::File, std::sync::Mutex, sha2 for integrity hashing.

  Operational Scope:
    Used by every component to emit RFC-3339 UTC stamped log
    entries; the file at /var/log/syn-phi.log (configurable) is
    the append-only audit trail, the console is the primary UI.

  Revision History:
    2025-11-19 COD  Established logging module for Syn-Phi.
    2025-12-02 COD  Console degrades gracefully when the log
                    file is unwritable pre-privilege-check.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Append-only logging with UTC timestamps
    - Deterministic formatting for auditability
    - Graceful error propagation on I/O failures
============================================================*/

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::{Result, SynPhiError};

const ANSI_RED: &str = "\x1b[31m";
const ANSI_YELLOW: &str = "\x1b[33m";
const ANSI_GREEN: &str = "\x1b[32m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_RESET: &str = "\x1b[0m";

/// Structured log level for Syn-Phi events.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Debug => "DEBUG",
        }
    }

    fn colour(self) -> &'static str {
        match self {
            LogLevel::Info => ANSI_GREEN,
            LogLevel::Warn => ANSI_YELLOW,
            LogLevel::Error => ANSI_RED,
            LogLevel::Debug => ANSI_CYAN,
        }
    }
}

/// Shared logger that emits append-only entries in Synavera format.
pub struct Logger {
    file: Option<Mutex<BufWriter<File>>>,
    path: Option<PathBuf>,
    verbose: bool,
}

impl Logger {
    /// Build a logger that writes to the console and optionally to a file.
    ///
    /// An unwritable log file degrades to console-only with a warning
    /// instead of failing: the privilege preflight has not run yet when
    /// the logger comes up, and its diagnostic is the one operators
    /// should see.
    pub fn new(path: Option<PathBuf>, verbose: bool) -> Self {
        let file = path.as_ref().and_then(|file_path| {
            if let Some(parent) = file_path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match OpenOptions::new().create(true).append(true).open(file_path) {
                Ok(file) => Some(Mutex::new(BufWriter::new(file))),
                Err(err) => {
                    eprintln!(
                        "{ANSI_YELLOW}[WARNING]{ANSI_RESET} [LOGGER] Cannot open log file {}: {err}; continuing console-only",
                        file_path.display()
                    );
                    None
                }
            }
        });

        Self {
            file,
            path,
            verbose,
        }
    }

    /// Emit a log entry with the given level, code, and message.
    pub fn log<S: AsRef<str>>(&self, level: LogLevel, code: &str, message: S) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let plain = format!(
            "{timestamp} [{}] [{}] {}",
            level.as_str(),
            code,
            message.as_ref()
        );

        let console = format!(
            "{}[{}]{} [{}] {}",
            level.colour(),
            level.as_str(),
            ANSI_RESET,
            code,
            message.as_ref()
        );
        match level {
            LogLevel::Info => println!("{console}"),
            LogLevel::Warn | LogLevel::Error => eprintln!("{console}"),
            LogLevel::Debug => {
                if self.verbose {
                    eprintln!("{console}");
                }
            }
        }

        if let Some(file) = &self.file {
            if let Ok(mut guard) = file.lock() {
                if writeln!(guard, "{plain}").is_err() {
                    eprintln!(
                        "{timestamp} [{}] [LOGGER] Failed to write to log file",
                        LogLevel::Error.as_str()
                    );
                }
                if guard.flush().is_err() {
                    eprintln!(
                        "{timestamp} [{}] [LOGGER] Failed to flush log writer",
                        LogLevel::Warn.as_str()
                    );
                }
            }
        }
    }

    /// Convenience wrapper for `INFO` level events.
    pub fn info<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Info, code, message);
    }

    /// Convenience wrapper for `WARNING` level events.
    pub fn warn<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Warn, code, message);
    }

    /// Convenience wrapper for `ERROR` level events.
    pub fn error<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Error, code, message);
    }

    /// Convenience wrapper for `DEBUG` level events.
    pub fn debug<S: AsRef<str>>(&self, code: &str, message: S) {
        self.log(LogLevel::Debug, code, message);
    }

    /// Return the path backing this logger, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Compute and persist SHA-256 digest of the log file.
    pub fn finalize(&self) -> Result<()> {
        if self.file.is_none() {
            return Ok(());
        }
        if let Some(path) = self.path() {
            let data = std::fs::read(path).map_err(|err| {
                SynPhiError::Filesystem(format!(
                    "Failed to read log for hashing {}: {err}",
                    path.display()
                ))
            })?;
            let mut hasher = Sha256::new();
            hasher.update(&data);
            let digest = hasher.finalize();
            let mut hash_os = path.as_os_str().to_os_string();
            hash_os.push(".hash");
            let hash_path = PathBuf::from(hash_os);
            let mut file = File::create(&hash_path).map_err(|err| {
                SynPhiError::Filesystem(format!(
                    "Failed to create hash file {}: {err}",
                    hash_path.display()
                ))
            })?;
            writeln!(
                file,
                "{:x}  {}",
                digest,
                path.file_name().unwrap_or_default().to_string_lossy()
            )
            .map_err(|err| {
                SynPhiError::Filesystem(format!(
                    "Failed to write hash file {}: {err}",
                    hash_path.display()
                ))
            })?;
        }
        Ok(())
    }
}
