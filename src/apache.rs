/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::apache
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Enable and disable Apache PHP-FPM conf fragments, taking a
    timestamped backup before any mutation.

  Security / Safety Notes:
    Fragment names derive from validated versions only. Backups
    are written beside the original so an operator can diff and
    restore by hand.

  Dependencies:
    Host trait via the execution context, chrono for the backup
    suffix.

  Operational Scope:
    Used by the switch orchestrator; every failure here is soft
    because a missing fragment is a legitimate host state.

  Revision History:
    2025-11-19 COD  Authored conf fragment handling.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Backup before mutate
    - Soft failures logged, workflow continues
============================================================*/

use std::path::PathBuf;

use chrono::Utc;

use crate::args;
use crate::context::{Context, OpOutcome};
use crate::error::Result;

pub struct ApacheConf<'a> {
    ctx: &'a Context,
}

impl<'a> ApacheConf<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    fn available_path(&self, fragment: &str) -> PathBuf {
        self.ctx
            .config
            .apache
            .conf_available
            .join(format!("{fragment}.conf"))
    }

    fn enabled_path(&self, fragment: &str) -> PathBuf {
        self.ctx
            .config
            .apache
            .conf_enabled
            .join(format!("{fragment}.conf"))
    }

    /// Whether the fragment ships on this host at all.
    pub fn is_available(&self, fragment: &str) -> bool {
        self.ctx.host.path_exists(&self.available_path(fragment))
    }

    pub fn is_enabled(&self, fragment: &str) -> bool {
        self.ctx.host.path_exists(&self.enabled_path(fragment))
    }

    /// Copy the fragment alongside itself with a UTC-stamped suffix.
    /// Runs before every mutation; dry-run records intent only.
    async fn backup(&self, fragment: &str) -> Result<()> {
        let original = self.available_path(fragment);
        if !self.ctx.host.path_exists(&original) {
            return Ok(());
        }
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let mut backup = original.as_os_str().to_os_string();
        backup.push(format!(".bak-{stamp}"));
        let backup = PathBuf::from(backup);

        if self.ctx.dry_run {
            self.ctx.logger.info(
                "DRYRUN",
                format!(
                    "Would back up {} to {}",
                    original.display(),
                    backup.display()
                ),
            );
            return Ok(());
        }
        self.ctx.host.copy_file(&original, &backup).await?;
        self.ctx.logger.debug(
            "APACHE",
            format!("Backed up {} to {}", original.display(), backup.display()),
        );
        Ok(())
    }

    pub async fn enable(&self, fragment: &str) -> Result<OpOutcome> {
        self.backup(fragment).await?;
        self.toggle("a2enconf", fragment).await
    }

    pub async fn disable(&self, fragment: &str) -> Result<OpOutcome> {
        self.backup(fragment).await?;
        self.toggle("a2disconf", fragment).await
    }

    async fn toggle(&self, program: &str, fragment: &str) -> Result<OpOutcome> {
        match self.ctx.run_mutating(program, &args![fragment]).await {
            Ok(None) => Ok(OpOutcome::Success),
            Ok(Some(output)) if output.success() => {
                self.ctx
                    .logger
                    .info("APACHE", format!("{program} {fragment} applied"));
                Ok(OpOutcome::Success)
            }
            Ok(Some(output)) => {
                let reason =
                    format!("{program} {fragment} failed: {}", output.stderr);
                self.ctx.logger.warn("APACHE", &reason);
                Ok(OpOutcome::SoftFailure(reason))
            }
            // Host without the a2enconf helpers: soft, not fatal.
            Err(crate::error::SynPhiError::CommandMissing { command }) => {
                let reason = format!("`{command}` not available");
                self.ctx.logger.warn("APACHE", &reason);
                Ok(OpOutcome::SoftFailure(reason))
            }
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
    async fn enable_backs_up_before_mutating() {
        let host = Arc::new(ScriptedHost::new());
        host.add_path("/etc/apache2/conf-available/php8.2-fpm.conf");
        let ctx = context_with(host.clone(), false);
        let apache = ApacheConf::new(&ctx);

        let outcome = apache.enable("php8.2-fpm").await.unwrap();
        assert!(outcome.is_success());

        let calls = host.recorded();
        let backup_idx = calls
            .iter()
            .position(|c| {
                c.starts_with("copy /etc/apache2/conf-available/php8.2-fpm.conf")
            })
            .expect("backup copy issued");
        let enconf_idx = calls
            .iter()
            .position(|c| c == "a2enconf php8.2-fpm")
            .expect("a2enconf issued");
        assert!(backup_idx < enconf_idx);
    }

    #[tokio::test]
    async fn dry_run_suppresses_backup_and_toggle() {
        let host = Arc::new(ScriptedHost::new());
        host.add_path("/etc/apache2/conf-available/php8.2-fpm.conf");
        let ctx = context_with(host.clone(), true);
        let apache = ApacheConf::new(&ctx);

        let outcome = apache.disable("php8.2-fpm").await.unwrap();
        assert!(outcome.is_success());
        assert!(host.recorded().is_empty());
    }

    #[tokio::test]
    async fn missing_helper_is_soft() {
        let host = Arc::new(ScriptedHost::new());
        host.missing_program("a2disconf");
        let ctx = context_with(host, false);
        let apache = ApacheConf::new(&ctx);

        let outcome = apache.disable("php7.4-fpm").await.unwrap();
        assert!(matches!(outcome, OpOutcome::SoftFailure(_)));
    }
}
