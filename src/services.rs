/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::services
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Service control for PHP-FPM units and the web server, with
    an ordered strategy fallback when systemctl is unavailable.

  Security / Safety Notes:
    Unit names are derived from validated versions or fixed
    constants; nothing user-controlled reaches the command line.

  Dependencies:
    Host trait via the execution context.

  Operational Scope:
    Consumed by the switch orchestrator and diagnostics. All
    failures here are soft: the alternatives change remains
    valid even when a restart fails.

  Revision History:
    2025-11-19 COD  Crafted service control layer.
    2025-12-02 COD  Unit detection widened to the union of the
                    systemctl listing and both unit-file dirs.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Explicit ordered fallback instead of nested conditionals
    - Soft-failure reporting without workflow aborts
    - State re-checked before every mutation
============================================================*/

use crate::args;
use crate::context::{Context, OpOutcome};
use crate::error::{Result, SynPhiError};

/// Verbs applied to a service unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Stop,
    Restart,
    Reload,
    Enable,
    Disable,
}

impl ServiceAction {
    pub fn verb(self) -> &'static str {
        match self {
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
            ServiceAction::Reload => "reload",
            ServiceAction::Enable => "enable",
            ServiceAction::Disable => "disable",
        }
    }

    /// Boot-state verbs fall back to update-rc.d, run-state verbs to
    /// the legacy service tool.
    fn is_boot_state(self) -> bool {
        matches!(self, ServiceAction::Enable | ServiceAction::Disable)
    }
}

/// Which control mechanism carried out an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Systemctl,
    Legacy,
}

impl Strategy {
    fn command(self, action: ServiceAction, unit: &str) -> (&'static str, Vec<String>) {
        match self {
            Strategy::Systemctl => ("systemctl", args![action.verb(), unit]),
            Strategy::Legacy if action.is_boot_state() => {
                ("update-rc.d", args![unit, action.verb()])
            }
            Strategy::Legacy => ("service", args![unit, action.verb()]),
        }
    }
}

const STRATEGIES: [Strategy; 2] = [Strategy::Systemctl, Strategy::Legacy];

pub struct ServiceManager<'a> {
    ctx: &'a Context,
}

impl<'a> ServiceManager<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Apply an action, trying each strategy in order until one
    /// succeeds. Exhausting all strategies is a soft failure.
    pub async fn apply(&self, action: ServiceAction, unit: &str) -> Result<OpOutcome> {
        if self.ctx.dry_run {
            self.ctx.logger.info(
                "DRYRUN",
                format!("Would {} service {unit}", action.verb()),
            );
            return Ok(OpOutcome::Success);
        }

        let mut last_error = String::new();
        for strategy in STRATEGIES {
            let (program, arguments) = strategy.command(action, unit);
            match self.ctx.host.run(program, &arguments).await {
                Ok(output) if output.success() => {
                    self.ctx.logger.debug(
                        "SERVICE",
                        format!("{} {unit} via {strategy:?}", action.verb()),
                    );
                    return Ok(OpOutcome::Success);
                }
                Ok(output) => {
                    last_error = format!(
                        "{program} exited {}: {}",
                        output.status, output.stderr
                    );
                }
                // Strategy binary absent: move on to the next one.
                Err(SynPhiError::CommandMissing { command }) => {
                    last_error = format!("`{command}` not available");
                }
                Err(err) => return Err(err),
            }
        }

        let reason = format!(
            "Could not {} {unit}: all control mechanisms failed ({last_error})",
            action.verb()
        );
        self.ctx.logger.error("SERVICE", &reason);
        Ok(OpOutcome::SoftFailure(reason))
    }

    /// Union of three independent signals: the systemctl unit-file
    /// listing, and the unit file present in either standard unit
    /// directory. A stale service-manager cache therefore cannot hide
    /// a unit that exists on disk.
    pub async fn unit_exists(&self, unit: &str) -> Result<bool> {
        let unit_file = format!("{unit}.service");

        for dir in &self.ctx.config.services.unit_dirs {
            if self.ctx.host.path_exists(&dir.join(&unit_file)) {
                return Ok(true);
            }
        }

        match self
            .ctx
            .probe(
                "systemctl",
                &args!["list-unit-files", "--no-legend", &unit_file],
            )
            .await
        {
            Ok(output) => Ok(output.success() && output.stdout.contains(&unit_file)),
            Err(SynPhiError::CommandMissing { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::testing::context_with;
    use crate::host::scripted::ScriptedHost;

    #[tokio::test]
    async fn systemctl_is_preferred() {
        let host = Arc::new(ScriptedHost::new());
        let ctx = context_with(host.clone(), false);
        let services = ServiceManager::new(&ctx);

        let outcome = services
            .apply(ServiceAction::Restart, "php8.2-fpm")
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(host.ran_matching("systemctl restart php8.2-fpm"));
        assert!(!host.ran_matching("service"));
    }

    #[tokio::test]
    async fn falls_back_to_legacy_service_tool() {
        let host = Arc::new(ScriptedHost::new());
        host.missing_program("systemctl");
        let ctx = context_with(host.clone(), false);
        let services = ServiceManager::new(&ctx);

        let outcome = services
            .apply(ServiceAction::Stop, "php7.4-fpm")
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(host.ran_matching("service php7.4-fpm stop"));
    }

    #[tokio::test]
    async fn boot_state_fallback_uses_update_rc_d() {
        let host = Arc::new(ScriptedHost::new());
        host.fail_on("systemctl", 1, "System has not been booted with systemd");
        let ctx = context_with(host.clone(), false);
        let services = ServiceManager::new(&ctx);

        let outcome = services
            .apply(ServiceAction::Disable, "php7.4-fpm")
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(host.ran_matching("update-rc.d php7.4-fpm disable"));
    }

    #[tokio::test]
    async fn exhausted_strategies_report_soft_failure() {
        let host = Arc::new(ScriptedHost::new());
        host.fail_on("systemctl", 1, "unit masked");
        host.fail_on("service", 1, "unknown service");
        let ctx = context_with(host, false);
        let services = ServiceManager::new(&ctx);

        let outcome = services
            .apply(ServiceAction::Restart, "php8.1-fpm")
            .await
            .unwrap();
        assert!(matches!(outcome, OpOutcome::SoftFailure(_)));
    }

    #[tokio::test]
    async fn dry_run_short_circuits_without_commands() {
        let host = Arc::new(ScriptedHost::new());
        let ctx = context_with(host.clone(), true);
        let services = ServiceManager::new(&ctx);

        let outcome = services
            .apply(ServiceAction::Enable, "php8.2-fpm")
            .await
            .unwrap();
        assert!(outcome.is_success());
        assert!(host.recorded().is_empty());
    }

    #[tokio::test]
    async fn unit_detection_unions_disk_and_listing() {
        let host = Arc::new(ScriptedHost::new());
        host.add_path("/etc/systemd/system/php7.4-fpm.service");
        let ctx = context_with(host.clone(), false);
        let services = ServiceManager::new(&ctx);

        // Disk signal alone suffices, even with an empty listing.
        assert!(services.unit_exists("php7.4-fpm").await.unwrap());

        // Listing signal alone also suffices.
        host.stdout_for(
            "systemctl list-unit-files",
            "php8.1-fpm.service enabled enabled\n",
        );
        assert!(services.unit_exists("php8.1-fpm").await.unwrap());

        // Neither signal: absent.
        let bare = Arc::new(ScriptedHost::new());
        let bare_ctx = context_with(bare, false);
        let bare_services = ServiceManager::new(&bare_ctx);
        assert!(!bare_services.unit_exists("php8.0-fpm").await.unwrap());
    }
}
