/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::version
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Validated PHP version identifiers and typed derivation of
    every package name, service unit, conf fragment, and binary
    path used by Syn-Phi.

  Security / Safety Notes:
    Raw user input never reaches a command line: all downstream
    names are built from a PhpVersion that has already passed
    the <major>.<minor> shape check.

  Dependencies:
    None beyond std.

  Operational Scope:
    Consumed by every subcommand that touches packages,
    services, or the alternatives registry.

  Revision History:
    2025-11-19 COD  Introduced PhpVersion and tool/token tables.
    2026-01-07 COD  Added phar.phar alternative after field
                    reports of stale archiver symlinks.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Parse, don't validate-in-place
    - Single source of truth for derived names
    - No string interpolation of unchecked input
============================================================*/

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, SynPhiError};

/// A PHP runtime version in `<major>.<minor>` form, e.g. `8.2`.
///
/// Construction goes through [`PhpVersion::parse`] only; holding a value
/// is proof the shape check already passed. No range check is applied:
/// any syntactically valid version is accepted, including ones the
/// package repository does not carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhpVersion(String);

impl PhpVersion {
    /// Accept exactly `<digits>.<digits>`; everything else is a
    /// validation failure before any side effect can occur.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((major, minor)) = raw.split_once('.') else {
            return Err(SynPhiError::Validation(raw.to_string()));
        };
        let all_digits =
            |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if all_digits(major) && all_digits(minor) {
            Ok(Self(raw.to_string()))
        } else {
            Err(SynPhiError::Validation(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// systemd unit name for this version's FPM pool manager.
    pub fn fpm_unit(&self) -> String {
        format!("php{}-fpm", self.0)
    }

    /// Debian package providing the FPM pool manager.
    pub fn fpm_package(&self) -> String {
        format!("php{}-fpm", self.0)
    }

    /// Debian package name for an extension token, e.g. `php8.2-curl`.
    pub fn extension_package(&self, token: &str) -> String {
        format!("php{}-{token}", self.0)
    }

    /// Apache conf fragment name consumed by a2enconf/a2disconf.
    pub fn apache_fragment(&self) -> String {
        format!("php{}-fpm", self.0)
    }

    /// Apache-PHP bridge module package.
    pub fn mod_php_package(&self) -> String {
        format!("libapache2-mod-php{}", self.0)
    }

    /// apt glob matching every package of this version, for purge.
    pub fn purge_glob(&self) -> String {
        format!("php{}*", self.0)
    }
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Versions whose FPM services are disabled when switching away from
/// them. This is an enumeration aid, not an install allow-list.
pub const DEFAULT_SUPPORTED: &[&str] = &[
    "5.6", "7.0", "7.1", "7.2", "7.3", "7.4", "8.0", "8.1", "8.2", "8.3",
    "8.4",
];

/// Extension tokens installed alongside a runtime. Availability varies
/// by version and distribution release, so each install attempt is
/// independent and failures never abort the batch.
pub const EXTENSION_TOKENS: &[&str] = &[
    "bcmath", "bz2", "cli", "common", "curl", "fpm", "gd", "imagick",
    "intl", "mbstring", "memcached", "mysql", "pgsql", "readline", "redis",
    "soap", "sqlite3", "xml", "xdebug", "zip",
];

/// Extensions a Laravel-class framework expects to find loaded.
pub const REQUIRED_EXTENSIONS: &[&str] = &[
    "bcmath", "ctype", "curl", "dom", "fileinfo", "filter", "hash",
    "mbstring", "openssl", "pcre", "pdo", "session", "tokenizer", "xml",
    "zip",
];

/// CLI tools whose alternatives are repointed on a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliTool {
    Php,
    Phar,
    PharPhar,
    PhpConfig,
    Phpize,
}

impl CliTool {
    pub const ALL: [CliTool; 5] = [
        CliTool::Php,
        CliTool::Phar,
        CliTool::PharPhar,
        CliTool::PhpConfig,
        CliTool::Phpize,
    ];

    /// Generic name registered in the alternatives registry.
    pub fn name(self) -> &'static str {
        match self {
            CliTool::Php => "php",
            CliTool::Phar => "phar",
            CliTool::PharPhar => "phar.phar",
            CliTool::PhpConfig => "php-config",
            CliTool::Phpize => "phpize",
        }
    }

    /// Generic symlink the alternative manages, e.g. `/usr/bin/php`.
    pub fn link(self, bin_dir: &Path) -> PathBuf {
        bin_dir.join(self.name())
    }

    /// Version-specific binary path, e.g. `/usr/bin/php8.2`. Not every
    /// version ships every tool; callers probe for existence first.
    pub fn versioned_path(self, bin_dir: &Path, version: &PhpVersion) -> PathBuf {
        bin_dir.join(format!("{}{}", self.name(), version.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn accepts_major_minor_shapes() {
        for raw in ["7.4", "8.3", "10.0", "5.6"] {
            let version = PhpVersion::parse(raw).expect(raw);
            assert_eq!(version.as_str(), raw);
        }
    }

    #[test]
    fn rejects_malformed_versions() {
        for raw in ["8", "php8.2", "8.2.1", "", ".", "8.", ".2", "8 .2", "8.x"] {
            assert!(
                matches!(PhpVersion::parse(raw), Err(SynPhiError::Validation(_))),
                "`{raw}` should be rejected"
            );
        }
    }

    #[test]
    fn derived_names_follow_debian_conventions() {
        let version = PhpVersion::parse("8.2").unwrap();
        assert_eq!(version.fpm_unit(), "php8.2-fpm");
        assert_eq!(version.extension_package("curl"), "php8.2-curl");
        assert_eq!(version.mod_php_package(), "libapache2-mod-php8.2");
        assert_eq!(version.purge_glob(), "php8.2*");
    }

    #[test]
    fn tool_paths_are_versioned_suffixes() {
        let version = PhpVersion::parse("8.2").unwrap();
        let bin = Path::new("/usr/bin");
        assert_eq!(
            CliTool::PharPhar.versioned_path(bin, &version),
            Path::new("/usr/bin/phar.phar8.2")
        );
        assert_eq!(CliTool::Php.link(bin), Path::new("/usr/bin/php"));
    }
}
