/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::switcher
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    The end-to-end "make version V the active one" workflow:
    confirmation, mandatory FPM, disabling other versions,
    Apache fragment, restart, alternatives, report.

  Security / Safety Notes:
    There is no rollback. A hard failure mid-switch leaves the
    completed steps applied; re-running the same switch is the
    documented recovery path, and every step re-checks current
    state so the retry converges.

  Dependencies:
    Sibling components composed over the shared context.

  Operational Scope:
    Backs the `switch` subcommand.

  Revision History:
    2025-11-19 COD  Authored switch orchestration.
    2026-01-07 COD  Self-version excluded from the disable set
                    by construction, not by unit probing order.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Ordered, idempotent steps with state re-checks
    - Hard failures only where serving traffic is at stake
    - Operator consent gathered before any mutation
============================================================*/

use crate::alternatives::AlternativesSwitcher;
use crate::apache::ApacheConf;
use crate::context::{Context, OpOutcome};
use crate::diagnostics::Diagnostics;
use crate::error::{Result, SynPhiError};
use crate::install::PackageInstaller;
use crate::prompt::{confirm, AnswerSource, Confirmation};
use crate::services::{ServiceAction, ServiceManager};
use crate::version::PhpVersion;

/// Terminal states of a completed switch invocation. Aborts travel
/// as errors.
#[derive(Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    Done,
    Cancelled,
}

pub struct SwitchOrchestrator<'a> {
    ctx: &'a Context,
}

impl<'a> SwitchOrchestrator<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    pub async fn switch(
        &self,
        version: &PhpVersion,
        answers: &mut dyn AnswerSource,
    ) -> Result<SwitchOutcome> {
        let ctx = self.ctx;

        // Requested: operator consent. Empty and explicit no both
        // cancel cleanly; anything unrecognised is operator error.
        let question = format!("Switch the active PHP runtime to {version}? [y/N]");
        match confirm(answers, &question)? {
            Confirmation::Confirmed => {}
            Confirmation::Declined => {
                ctx.logger.info("SWITCH", "Cancelled by operator");
                return Ok(SwitchOutcome::Cancelled);
            }
            Confirmation::Invalid(answer) => {
                return Err(SynPhiError::Prompt(answer));
            }
        }

        let installer = PackageInstaller::new(ctx);
        let services = ServiceManager::new(ctx);
        let apache = ApacheConf::new(ctx);

        // FpmEnsured: the target cannot serve traffic without its FPM,
        // so installation and boot enablement are hard requirements.
        let fpm_package = version.fpm_package();
        if installer.package_installed(&fpm_package).await? {
            ctx.logger
                .debug("FPM", format!("{fpm_package} already installed"));
        } else if let OpOutcome::SoftFailure(reason) =
            installer.install_package(&fpm_package).await?
        {
            return Err(SynPhiError::Operation(format!(
                "Mandatory package {fpm_package} could not be installed: {reason}"
            )));
        }

        let fpm_unit = version.fpm_unit();
        if let OpOutcome::SoftFailure(reason) =
            services.apply(ServiceAction::Enable, &fpm_unit).await?
        {
            return Err(SynPhiError::Operation(format!(
                "Mandatory service {fpm_unit} could not be enabled: {reason}"
            )));
        }

        // OldServicesDisabled: stop and disable every other supported
        // version whose unit exists; the target is excluded by
        // construction so a re-run never disables itself.
        for other in ctx
            .config
            .supported_versions()
            .iter()
            .filter(|v| *v != version)
        {
            let unit = other.fpm_unit();
            if !services.unit_exists(&unit).await? {
                continue;
            }
            ctx.logger
                .info("DISABLE", format!("Retiring {unit} services"));
            services.apply(ServiceAction::Stop, &unit).await?;
            services.apply(ServiceAction::Disable, &unit).await?;

            let fragment = other.apache_fragment();
            if apache.is_available(&fragment) && apache.is_enabled(&fragment) {
                apache.disable(&fragment).await?;
            }
        }

        // ApacheConfEnabled: wire the web server to the new socket
        // when the host ships a fragment for it.
        let fragment = version.apache_fragment();
        if apache.is_available(&fragment) {
            if apache.is_enabled(&fragment) {
                ctx.logger
                    .debug("APACHE", format!("{fragment} already enabled"));
            } else {
                apache.enable(&fragment).await?;
            }
            services.apply(ServiceAction::Reload, "apache2").await?;
        }

        // FpmRestarted: reported but never reverts prior steps; the
        // alternatives change below is independently correct.
        if let OpOutcome::SoftFailure(reason) =
            services.apply(ServiceAction::Restart, &fpm_unit).await?
        {
            ctx.logger.error(
                "RESTART",
                format!("{fpm_unit} restart failed ({reason}); re-run to converge"),
            );
        }

        // AlternativesSwitched.
        AlternativesSwitcher::new(ctx).switch_all(version).await?;

        // Done: report what the CLI now resolves to.
        match Diagnostics::new(ctx).current_version().await {
            Ok(active) => {
                ctx.logger
                    .info("DONE", format!("Active CLI version: {active}"));
            }
            Err(err) => {
                ctx.logger
                    .warn("DONE", format!("Could not read active version: {err}"));
            }
        }
        ctx.logger
            .info("SWITCH", format!("Switch to {version} complete"));
        Ok(SwitchOutcome::Done)
    }
}
