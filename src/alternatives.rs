/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::alternatives
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Repoint the Debian alternatives registry for the PHP CLI
    tool set, and read back which versions are registered.

  Security / Safety Notes:
    Tool names come from a fixed enum and paths from validated
    versions; update-alternatives is invoked without a shell.

  Dependencies:
    Host trait via the execution context.

  Operational Scope:
    Final stage of a switch, plus the `list` subcommand.

  Revision History:
    2025-11-19 COD  Authored alternatives switcher.
    2026-01-07 COD  Register-then-set so switching works even
                    for candidates never registered before.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Skip-if-absent rather than fail-if-absent
    - Soft failures keep the loop moving
============================================================*/

use std::path::Path;

use crate::args;
use crate::context::{Context, OpOutcome};
use crate::error::{Result, SynPhiError};
use crate::version::{CliTool, PhpVersion};

/// Priority used when registering a candidate. The explicit --set
/// afterwards decides the active one, so the value only orders
/// auto-mode candidates.
const CANDIDATE_PRIORITY: &str = "100";

pub struct AlternativesSwitcher<'a> {
    ctx: &'a Context,
}

impl<'a> AlternativesSwitcher<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// Repoint every CLI tool whose versioned binary exists on disk.
    /// Absent binaries are skipped silently: not every version ships
    /// every tool. Returns the per-tool outcomes for reporting.
    pub async fn switch_all(
        &self,
        version: &PhpVersion,
    ) -> Result<Vec<(CliTool, OpOutcome)>> {
        let bin_dir = self.ctx.config.alternatives.bin_dir.clone();
        let mut outcomes = Vec::new();

        for tool in CliTool::ALL {
            let target = tool.versioned_path(&bin_dir, version);
            if !self.ctx.host.path_exists(&target) {
                self.ctx.logger.debug(
                    "ALTS",
                    format!("{} has no binary for {version}, skipping", tool.name()),
                );
                continue;
            }
            let outcome = self.set_alternative(tool, &target).await?;
            if let OpOutcome::SoftFailure(reason) = &outcome {
                self.ctx.logger.warn("ALTS", reason);
            }
            outcomes.push((tool, outcome));
        }

        Ok(outcomes)
    }

    /// Register the candidate and point the generic name at it.
    pub async fn set_alternative(
        &self,
        tool: CliTool,
        target: &Path,
    ) -> Result<OpOutcome> {
        let link = tool.link(&self.ctx.config.alternatives.bin_dir);
        let install_args = args![
            "--install",
            link.display(),
            tool.name(),
            target.display(),
            CANDIDATE_PRIORITY
        ];
        if let Some(output) = self
            .ctx
            .run_mutating("update-alternatives", &install_args)
            .await?
        {
            if !output.success() {
                return Ok(OpOutcome::SoftFailure(format!(
                    "Failed to register alternative {}: {}",
                    tool.name(),
                    output.stderr
                )));
            }
        }

        let set_args = args!["--set", tool.name(), target.display()];
        match self.ctx.run_mutating("update-alternatives", &set_args).await? {
            None => Ok(OpOutcome::Success),
            Some(output) if output.success() => {
                self.ctx.logger.info(
                    "ALTS",
                    format!("{} now points at {}", tool.name(), target.display()),
                );
                Ok(OpOutcome::Success)
            }
            Some(output) => Ok(OpOutcome::SoftFailure(format!(
                "Failed to set alternative {}: {}",
                tool.name(),
                output.stderr
            ))),
        }
    }

    /// Versions registered for the interpreter alternative, in registry
    /// order. Empty when the alternative does not exist at all.
    pub async fn registered_php_versions(&self) -> Result<Vec<String>> {
        let output = match self
            .ctx
            .probe("update-alternatives", &args!["--list", "php"])
            .await
        {
            Ok(output) => output,
            Err(SynPhiError::CommandMissing { .. }) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };
        if !output.success() {
            // `no alternatives for php` exits non-zero; that is data.
            return Ok(Vec::new());
        }
        Ok(output
            .stdout
            .lines()
            .filter_map(version_suffix)
            .collect())
    }
}

/// Extract `X.Y` from a registered candidate path like `/usr/bin/php8.2`.
fn version_suffix(line: &str) -> Option<String> {
    let name = Path::new(line.trim()).file_name()?.to_str()?;
    let suffix = name.strip_prefix("php")?;
    PhpVersion::parse(suffix).ok().map(|v| v.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::testing::context_with;
    use crate::host::scripted::ScriptedHost;

    #[tokio::test]
    async fn absent_binaries_are_skipped_silently() {
        let host = Arc::new(ScriptedHost::new());
        // Only the interpreter and phpize exist for 8.2.
        host.add_path("/usr/bin/php8.2");
        host.add_path("/usr/bin/phpize8.2");
        let ctx = context_with(host.clone(), false);
        let version = PhpVersion::parse("8.2").unwrap();

        let outcomes = AlternativesSwitcher::new(&ctx)
            .switch_all(&version)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(_, o)| o.is_success()));
        assert!(host.ran_matching("update-alternatives --set php /usr/bin/php8.2"));
        assert!(!host.ran_matching("update-alternatives --set phar"));
    }

    #[tokio::test]
    async fn registration_failure_is_soft_and_loop_continues() {
        let host = Arc::new(ScriptedHost::new());
        host.add_path("/usr/bin/php8.2");
        host.add_path("/usr/bin/phar8.2");
        host.fail_on("update-alternatives --set php /usr/bin/php8.2", 2, "broken link group");
        let ctx = context_with(host.clone(), false);
        let version = PhpVersion::parse("8.2").unwrap();

        let outcomes = AlternativesSwitcher::new(&ctx)
            .switch_all(&version)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0].1, OpOutcome::SoftFailure(_)));
        // phar still attempted after the php failure
        assert!(host.ran_matching("update-alternatives --set phar /usr/bin/phar8.2"));
    }

    #[tokio::test]
    async fn registry_listing_maps_to_versions() {
        let host = Arc::new(ScriptedHost::new());
        host.stdout_for(
            "update-alternatives --list php",
            "/usr/bin/php7.4\n/usr/bin/php8.2\n",
        );
        let ctx = context_with(host, false);

        let versions = AlternativesSwitcher::new(&ctx)
            .registered_php_versions()
            .await
            .unwrap();
        assert_eq!(versions, vec!["7.4".to_string(), "8.2".to_string()]);
    }

    #[tokio::test]
    async fn unregistered_alternative_yields_empty_list() {
        let host = Arc::new(ScriptedHost::new());
        host.fail_on("update-alternatives --list php", 2, "no alternatives for php");
        let ctx = context_with(host, false);

        let versions = AlternativesSwitcher::new(&ctx)
            .registered_php_versions()
            .await
            .unwrap();
        assert!(versions.is_empty());
    }

    #[test]
    fn suffix_extraction_ignores_non_interpreter_paths() {
        assert_eq!(version_suffix("/usr/bin/php8.2"), Some("8.2".to_string()));
        assert_eq!(version_suffix("/usr/bin/php-config8.2"), None);
        assert_eq!(version_suffix("/usr/bin/php"), None);
    }
}
