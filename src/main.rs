/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Syn-Phi. Installs, switches, and retires
    PHP runtime versions on Debian/Ubuntu hosts by sequencing
    apt, systemd, and the alternatives registry.

  Security / Safety Notes:
    Requires root; refuses to proceed without it. All external
    commands are spawned with argument vectors, never a shell.

  Dependencies:
    clap for CLI parsing, tokio for the async runtime.

  Operational Scope:
    Invoked directly by operators; the console is the primary
    UI, with an append-only audit log beside it.

  Revision History:
    2025-11-19 COD  Authored Syn-Phi runtime.
    2026-01-07 COD  Exit semantics pinned to 0/1 per the
                    operator contract.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod alternatives;
mod apache;
mod config;
mod context;
mod diagnostics;
mod error;
mod host;
mod install;
mod logger;
mod preflight;
mod prompt;
mod services;
mod switcher;
mod version;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};

use config::SynPhiConfig;
use context::{Context, OpOutcome};
use diagnostics::Diagnostics;
use error::{Result, SynPhiError};
use host::SystemHost;
use install::PackageInstaller;
use logger::Logger;
use prompt::{confirm, Confirmation, StdinAnswers};
use switcher::{SwitchOrchestrator, SwitchOutcome};
use version::PhpVersion;

/// Command-line arguments for Syn-Phi.
#[derive(Debug, Parser)]
#[command(
    name = "syn-phi",
    version,
    author = "Synavera Systems",
    about = "Conscious PHP runtime switcher for Debian/Ubuntu hosts"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, global = true, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Describe mutating actions instead of performing them.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Enable verbose logging to stderr.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Install a PHP version with its extension set.
    Install { version: String },
    /// Make a PHP version the active one for CLI and web serving.
    Switch { version: String },
    /// Purge every package of a PHP version.
    Uninstall { version: String },
    /// List versions registered in the alternatives registry.
    List,
    /// Show the active CLI version.
    Current,
    /// Check presence of framework-required extensions.
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage and version requests are normal outcomes; any
            // other parse problem is an invalid invocation.
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    ExitCode::SUCCESS
                }
                _ => ExitCode::FAILURE,
            };
            let _ = err.print();
            return code;
        }
    };

    let Cli {
        config,
        log,
        dry_run,
        verbose,
        command,
    } = cli;
    let Some(command) = command else {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    };

    match run(config, log, command, dry_run, verbose).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

async fn run(
    config_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    command: CliCommand,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let config = SynPhiConfig::load_from_optional_path(config_path.as_deref())
        .map_err(|err| {
            eprintln!("[Syn-Phi] {err}");
            err
        })?;

    let log_path = log_path.unwrap_or_else(|| config.log_file.clone());
    let logger = Logger::new(Some(log_path), verbose);
    let host = Arc::new(SystemHost::new().map_err(|err| {
        logger.error("INIT", err.to_string());
        err
    })?);
    let ctx = Context::new(config, logger, dry_run, host);

    ctx.logger.debug("INIT", "Syn-Phi awakening.");
    if ctx.dry_run {
        ctx.logger
            .info("DRYRUN", "Dry-run mode: mutating actions are described only");
    }

    let result = dispatch(&ctx, command).await;
    if let Err(err) = &result {
        ctx.logger.error("FATAL", err.to_string());
    }
    if let Err(err) = ctx.logger.finalize() {
        ctx.logger.warn("LOGGER", err.to_string());
    }
    result
}

async fn dispatch(ctx: &Context, command: CliCommand) -> Result<()> {
    preflight::ensure_host_ready(ctx)?;

    match command {
        CliCommand::Install { version } => {
            let version = PhpVersion::parse(&version)?;
            let report = PackageInstaller::new(ctx).install(&version).await?;
            println!("Installed ({}):", report.installed.len());
            for package in &report.installed {
                println!("  {package}");
            }
            if !report.failed.is_empty() {
                println!("Failed ({}):", report.failed.len());
                for package in &report.failed {
                    println!("  {package}");
                }
            }
        }
        CliCommand::Switch { version } => {
            let version = PhpVersion::parse(&version)?;
            let mut answers = StdinAnswers;
            match SwitchOrchestrator::new(ctx)
                .switch(&version, &mut answers)
                .await?
            {
                SwitchOutcome::Done => {}
                SwitchOutcome::Cancelled => {
                    println!("Switch cancelled; no changes made.");
                }
            }
        }
        CliCommand::Uninstall { version } => {
            let version = PhpVersion::parse(&version)?;
            let mut answers = StdinAnswers;
            let question =
                format!("Purge every php{version} package from this host? [y/N]");
            match confirm(&mut answers, &question)? {
                Confirmation::Confirmed => {
                    if let OpOutcome::SoftFailure(reason) =
                        PackageInstaller::new(ctx).purge(&version).await?
                    {
                        ctx.logger.warn("PURGE", reason);
                    }
                }
                Confirmation::Declined => {
                    println!("Uninstall cancelled; no changes made.");
                }
                Confirmation::Invalid(answer) => {
                    return Err(SynPhiError::Prompt(answer));
                }
            }
        }
        CliCommand::List => {
            let versions = Diagnostics::new(ctx).registered_versions().await?;
            if versions.is_empty() {
                println!("No PHP alternatives registered.");
            } else {
                for version in versions {
                    println!("{version}");
                }
            }
        }
        CliCommand::Current => {
            println!("{}", Diagnostics::new(ctx).current_version().await?);
        }
        CliCommand::Check => {
            let presence = Diagnostics::new(ctx).extension_presence().await?;
            for (extension, present) in presence {
                let verdict = if present { "present" } else { "MISSING" };
                println!("{extension:<12} {verdict}");
            }
        }
    }
    Ok(())
}
