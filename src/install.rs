/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::install
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Install a PHP runtime with its extension set, the Apache
    bridge when Apache is present, and the composer dependency
    manager; purge a runtime on uninstall.

  Security / Safety Notes:
    The composer installer is executed only after its SHA-384
    matches the published signature; a mismatch removes the
    artifact and aborts. Package names derive from validated
    versions.

  Dependencies:
    Host trait via the execution context, sha2 for installer
    verification.

  Operational Scope:
    Backs the `install` and `uninstall` subcommands, and the
    mandatory-FPM step of a switch.

  Revision History:
    2025-11-19 COD  Authored package installation flow.
    2025-12-02 COD  Extension outcomes made fully independent;
                    a failed token no longer skips later ones.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Fail fast on a broken network, never mid-batch
    - Per-package outcomes recorded, batch always completes
    - Verify before execute for downloaded code
============================================================*/

use std::path::PathBuf;
use std::time::Duration;

use sha2::{Digest, Sha384};

use crate::args;
use crate::context::{Context, OpOutcome};
use crate::error::{Result, SynPhiError};
use crate::version::{PhpVersion, EXTENSION_TOKENS};

const DPKG_INSTALLED: &str = "install ok installed";

/// Final accounting of an install run. Soft failures live here;
/// they never change the exit code.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub failed: Vec<String>,
}

pub struct PackageInstaller<'a> {
    ctx: &'a Context,
}

impl<'a> PackageInstaller<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self { ctx }
    }

    /// dpkg's view of whether a package is fully installed.
    pub async fn package_installed(&self, package: &str) -> Result<bool> {
        let output = self
            .ctx
            .probe("dpkg-query", &args!["-W", "-f=${Status}", package])
            .await?;
        Ok(output.success() && output.stdout.contains(DPKG_INSTALLED))
    }

    /// One apt install attempt; non-zero exit is a soft failure.
    pub async fn install_package(&self, package: &str) -> Result<OpOutcome> {
        match self
            .ctx
            .run_mutating("apt-get", &args!["install", "-y", package])
            .await?
        {
            None => Ok(OpOutcome::Success),
            Some(output) if output.success() => {
                self.ctx
                    .logger
                    .info("INSTALL", format!("Installed {package}"));
                Ok(OpOutcome::Success)
            }
            Some(output) => Ok(OpOutcome::SoftFailure(format!(
                "apt-get install {package} failed: {}",
                output.stderr
            ))),
        }
    }

    /// Install only when dpkg does not already report the package.
    pub async fn ensure_package(&self, package: &str) -> Result<OpOutcome> {
        if self.package_installed(package).await? {
            self.ctx
                .logger
                .debug("INSTALL", format!("{package} already installed"));
            return Ok(OpOutcome::Success);
        }
        self.install_package(package).await
    }

    /// The full installation flow for one runtime version.
    pub async fn install(&self, version: &PhpVersion) -> Result<InstallReport> {
        self.probe_network().await?;
        self.register_repository().await?;

        let mut report = InstallReport::default();
        for token in EXTENSION_TOKENS {
            let package = version.extension_package(token);
            match self.ensure_package(&package).await? {
                OpOutcome::Success => report.installed.push(package),
                OpOutcome::SoftFailure(reason) => {
                    self.ctx.logger.warn("INSTALL", &reason);
                    report.failed.push(package);
                }
            }
        }

        if self.package_installed("apache2").await? {
            let bridge = version.mod_php_package();
            match self.ensure_package(&bridge).await? {
                OpOutcome::Success => report.installed.push(bridge),
                OpOutcome::SoftFailure(reason) => {
                    self.ctx.logger.warn("INSTALL", &reason);
                    report.failed.push(bridge);
                }
            }
        } else {
            self.ctx.logger.debug(
                "INSTALL",
                "Apache not installed, skipping the PHP bridge package",
            );
        }

        let composer = self.ctx.config.composer.binary_name.clone();
        if self.ctx.host.tool_in_path(&composer) {
            self.ctx
                .logger
                .debug("COMPOSER", format!("{composer} already present"));
        } else {
            match self.bootstrap_composer().await? {
                OpOutcome::Success => report.installed.push(composer),
                OpOutcome::SoftFailure(reason) => {
                    self.ctx.logger.warn("COMPOSER", &reason);
                    report.failed.push(composer);
                }
            }
        }

        self.ctx.logger.info(
            "INSTALL",
            format!(
                "PHP {version}: {} package(s) installed, {} failed",
                report.installed.len(),
                report.failed.len()
            ),
        );
        Ok(report)
    }

    /// Purge every package of a version. Outcomes are soft; the
    /// command reports and exits 0 either way.
    pub async fn purge(&self, version: &PhpVersion) -> Result<OpOutcome> {
        let glob = version.purge_glob();
        let outcome = match self
            .ctx
            .run_mutating("apt-get", &args!["purge", "-y", &glob])
            .await?
        {
            None => OpOutcome::Success,
            Some(output) if output.success() => {
                self.ctx
                    .logger
                    .info("PURGE", format!("Purged packages matching {glob}"));
                OpOutcome::Success
            }
            Some(output) => OpOutcome::SoftFailure(format!(
                "apt-get purge {glob} failed: {}",
                output.stderr
            )),
        };

        if let Some(output) = self
            .ctx
            .run_mutating("apt-get", &args!["autoremove", "-y"])
            .await?
        {
            if !output.success() {
                self.ctx.logger.warn(
                    "PURGE",
                    format!("apt-get autoremove failed: {}", output.stderr),
                );
            }
        }
        Ok(outcome)
    }

    /// Installation needs the repository; a broken network produces
    /// confusing partial states, so fail before touching anything.
    async fn probe_network(&self) -> Result<()> {
        let repo = &self.ctx.config.repository;
        let timeout = Duration::from_secs(repo.probe_timeout);
        if self.ctx.host.http_head(&repo.probe_url, timeout).await? {
            self.ctx.logger.debug("NET", "Package repository reachable");
            Ok(())
        } else {
            Err(SynPhiError::Network(format!(
                "{} unreachable; aborting before any package operation",
                repo.probe_url
            )))
        }
    }

    /// Register the upstream PHP repository and refresh indexes.
    /// Soft throughout: some environments pre-provision the PPA.
    async fn register_repository(&self) -> Result<()> {
        if let OpOutcome::SoftFailure(reason) =
            self.ensure_package("software-properties-common").await?
        {
            self.ctx.logger.warn("REPO", &reason);
        }

        let ppa = self.ctx.config.repository.ppa.clone();
        match self
            .ctx
            .run_mutating("add-apt-repository", &args!["-y", &ppa])
            .await
        {
            Ok(Some(output)) if !output.success() => {
                self.ctx.logger.warn(
                    "REPO",
                    format!("Registering {ppa} failed: {}", output.stderr),
                );
            }
            Ok(_) => {}
            Err(SynPhiError::CommandMissing { command }) => {
                self.ctx
                    .logger
                    .warn("REPO", format!("`{command}` not available, continuing"));
            }
            Err(err) => return Err(err),
        }

        if let Some(output) = self.ctx.run_mutating("apt-get", &args!["update"]).await? {
            if !output.success() {
                self.ctx.logger.warn(
                    "REPO",
                    format!("apt-get update failed: {}", output.stderr),
                );
            }
        }
        Ok(())
    }

    /// Download, verify, execute, and place the composer binary.
    /// Checksum mismatch is the one hard failure: the artifact is
    /// removed and the installer never runs.
    async fn bootstrap_composer(&self) -> Result<OpOutcome> {
        let composer = self.ctx.config.composer.clone();
        if self.ctx.dry_run {
            self.ctx.logger.info(
                "DRYRUN",
                format!(
                    "Would download {}, verify against {}, and install {}",
                    composer.installer_url,
                    composer.signature_url,
                    composer.bin_dir.join(&composer.binary_name).display()
                ),
            );
            return Ok(OpOutcome::Success);
        }

        let signature = self.ctx.host.http_get(&composer.signature_url).await?;
        let expected = String::from_utf8_lossy(&signature).trim().to_lowercase();
        let installer = self.ctx.host.http_get(&composer.installer_url).await?;
        let actual = format!("{:x}", Sha384::digest(&installer));

        let setup = std::env::temp_dir().join("composer-setup.php");
        self.ctx.host.write_file(&setup, &installer).await?;

        if actual != expected {
            self.ctx.host.remove_file(&setup).await?;
            return Err(SynPhiError::ChecksumMismatch {
                artifact: "composer installer".to_string(),
                expected,
                actual,
            });
        }
        self.ctx
            .logger
            .info("COMPOSER", "Installer signature verified");

        let temp_dir: PathBuf = std::env::temp_dir();
        let output = self
            .ctx
            .host
            .run(
                "php",
                &args![
                    setup.display(),
                    "--quiet",
                    "--install-dir",
                    temp_dir.display(),
                    "--filename",
                    "composer.phar"
                ],
            )
            .await?;
        if !output.success() {
            self.ctx.host.remove_file(&setup).await?;
            return Ok(OpOutcome::SoftFailure(format!(
                "composer installer exited {}: {}",
                output.status, output.stderr
            )));
        }

        let phar = temp_dir.join("composer.phar");
        let target = composer.bin_dir.join(&composer.binary_name);
        self.ctx.host.copy_file(&phar, &target).await?;
        self.ctx.host.remove_file(&phar).await?;
        self.ctx.host.remove_file(&setup).await?;
        self.ctx
            .logger
            .info("COMPOSER", format!("Installed {}", target.display()));
        Ok(OpOutcome::Success)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sha2::{Digest, Sha384};

    use super::*;
    use crate::context::testing::context_with;
    use crate::host::scripted::ScriptedHost;

    fn version() -> PhpVersion {
        PhpVersion::parse("8.2").unwrap()
    }

    fn serve_composer(host: &ScriptedHost, valid_signature: bool) {
        let body = b"<?php /* installer */";
        let digest = format!("{:x}", Sha384::digest(body));
        let signature = if valid_signature {
            digest
        } else {
            "0".repeat(96)
        };
        host.serve_url("https://getcomposer.org/installer", body);
        host.serve_url(
            "https://composer.github.io/installer.sig",
            signature.as_bytes(),
        );
    }

    #[tokio::test]
    async fn unreachable_network_aborts_before_any_package_call() {
        let mut host = ScriptedHost::new();
        host.network_up = false;
        let host = Arc::new(host);
        let ctx = context_with(host.clone(), false);

        let err = PackageInstaller::new(&ctx)
            .install(&version())
            .await
            .unwrap_err();
        assert!(matches!(err, SynPhiError::Network(_)));
        assert!(!host.ran_matching("apt-get"));
        assert!(!host.ran_matching("add-apt-repository"));
    }

    #[tokio::test]
    async fn extension_failures_are_independent() {
        let host = Arc::new(ScriptedHost::new());
        host.add_tool("composer");
        host.fail_on(
            "apt-get install -y php8.2-curl",
            100,
            "unable to locate package",
        );
        let ctx = context_with(host.clone(), false);

        let report = PackageInstaller::new(&ctx)
            .install(&version())
            .await
            .unwrap();

        assert_eq!(report.failed, vec!["php8.2-curl".to_string()]);
        assert!(report.installed.contains(&"php8.2-mbstring".to_string()));
        // Tokens after the failed one were still attempted.
        assert!(host.ran_matching("apt-get install -y php8.2-zip"));
    }

    #[tokio::test]
    async fn apache_bridge_installed_only_when_apache_present() {
        let host = Arc::new(ScriptedHost::new());
        host.add_tool("composer");
        host.stdout_for("dpkg-query -W -f=${Status} apache2", "install ok installed");
        let ctx = context_with(host.clone(), false);

        let report = PackageInstaller::new(&ctx)
            .install(&version())
            .await
            .unwrap();

        assert!(report
            .installed
            .contains(&"libapache2-mod-php8.2".to_string()));

        let bare = Arc::new(ScriptedHost::new());
        bare.add_tool("composer");
        let bare_ctx = context_with(bare.clone(), false);
        let report = PackageInstaller::new(&bare_ctx)
            .install(&version())
            .await
            .unwrap();
        assert!(!report
            .installed
            .contains(&"libapache2-mod-php8.2".to_string()));
        assert!(!bare.ran_matching("apt-get install -y libapache2-mod-php8.2"));
    }

    #[tokio::test]
    async fn composer_checksum_mismatch_is_hard_and_removes_artifact() {
        let host = Arc::new(ScriptedHost::new());
        serve_composer(&host, false);
        let ctx = context_with(host.clone(), false);

        let err = PackageInstaller::new(&ctx)
            .install(&version())
            .await
            .unwrap_err();
        assert!(matches!(err, SynPhiError::ChecksumMismatch { .. }));

        let setup = std::env::temp_dir().join("composer-setup.php");
        assert!(host.ran_matching(&format!("remove {}", setup.display())));
        // The unverified installer must never execute.
        assert!(!host.ran_matching("php"));
    }

    #[tokio::test]
    async fn composer_verified_install_places_binary() {
        let host = Arc::new(ScriptedHost::new());
        serve_composer(&host, true);
        let ctx = context_with(host.clone(), false);

        let report = PackageInstaller::new(&ctx)
            .install(&version())
            .await
            .unwrap();
        assert!(report.installed.contains(&"composer".to_string()));

        let phar = std::env::temp_dir().join("composer.phar");
        assert!(host.ran_matching(&format!(
            "copy {} /usr/local/bin/composer",
            phar.display()
        )));
    }

    #[tokio::test]
    async fn dry_run_issues_no_mutating_calls() {
        let host = Arc::new(ScriptedHost::new());
        let ctx = context_with(host.clone(), true);

        let report = PackageInstaller::new(&ctx)
            .install(&version())
            .await
            .unwrap();
        // Everything is described as done; nothing failed.
        assert!(report.failed.is_empty());
        for call in host.recorded() {
            assert!(
                call.starts_with("HEAD") || call.starts_with("dpkg-query"),
                "unexpected mutating call in dry-run: {call}"
            );
        }
    }

    #[tokio::test]
    async fn purge_targets_the_version_glob() {
        let host = Arc::new(ScriptedHost::new());
        let ctx = context_with(host.clone(), false);

        let outcome = PackageInstaller::new(&ctx).purge(&version()).await.unwrap();
        assert!(outcome.is_success());
        assert!(host.ran_matching("apt-get purge -y php8.2*"));
        assert!(host.ran_matching("apt-get autoremove -y"));
    }
}
