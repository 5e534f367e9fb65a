/*============================================================
  Synavera Project: Syn-Phi
  Module: synphi::config
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Load the optional Syn-Phi TOML configuration and supply
    host-wide defaults when no file is present.

  Security / Safety Notes:
    The configuration file lives under /etc and is expected to
    be root-owned; values are treated as operator intent and
    are not re-validated beyond parsing.

  Dependencies:
    serde + toml for deserialisation.

  Operational Scope:
    Constructed once at startup and carried inside the Context
    for the life of the invocation.

  Revision History:
    2025-11-19 COD  Authored configuration layer.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Configurable execution via CLI and config file
    - Explicit defaults, no hidden environment reads
    - Fail loudly on an explicitly named but broken file
============================================================*/

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, SynPhiError};
use crate::version::{PhpVersion, DEFAULT_SUPPORTED};

/// Default location probed when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/syn-phi/config.toml";

/// Top-level Syn-Phi configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynPhiConfig {
    /// Append-only diagnostic log.
    pub log_file: PathBuf,
    /// Versions whose services are considered during a switch.
    pub supported_versions: Vec<String>,
    pub repository: RepositoryConfig,
    pub composer: ComposerConfig,
    pub apache: ApacheConfig,
    pub services: ServicesConfig,
    pub alternatives: AlternativesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// PPA registered before installation.
    pub ppa: String,
    /// Reachability probe target; install hard-fails when unreachable.
    pub probe_url: String,
    /// Probe timeout in seconds.
    pub probe_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub installer_url: String,
    /// Published SHA-384 of the installer script.
    pub signature_url: String,
    pub bin_dir: PathBuf,
    pub binary_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApacheConfig {
    pub conf_available: PathBuf,
    pub conf_enabled: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Unit-file directories probed alongside the systemctl listing.
    pub unit_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlternativesConfig {
    /// Directory holding both generic links and versioned binaries.
    pub bin_dir: PathBuf,
}

impl Default for SynPhiConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("/var/log/syn-phi.log"),
            supported_versions: DEFAULT_SUPPORTED
                .iter()
                .map(|v| v.to_string())
                .collect(),
            repository: RepositoryConfig::default(),
            composer: ComposerConfig::default(),
            apache: ApacheConfig::default(),
            services: ServicesConfig::default(),
            alternatives: AlternativesConfig::default(),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            ppa: "ppa:ondrej/php".to_string(),
            probe_url: "https://ppa.launchpadcontent.net".to_string(),
            probe_timeout: 8,
        }
    }
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            installer_url: "https://getcomposer.org/installer".to_string(),
            signature_url: "https://composer.github.io/installer.sig".to_string(),
            bin_dir: PathBuf::from("/usr/local/bin"),
            binary_name: "composer".to_string(),
        }
    }
}

impl Default for ApacheConfig {
    fn default() -> Self {
        Self {
            conf_available: PathBuf::from("/etc/apache2/conf-available"),
            conf_enabled: PathBuf::from("/etc/apache2/conf-enabled"),
        }
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            unit_dirs: vec![
                PathBuf::from("/lib/systemd/system"),
                PathBuf::from("/etc/systemd/system"),
            ],
        }
    }
}

impl Default for AlternativesConfig {
    fn default() -> Self {
        Self {
            bin_dir: PathBuf::from("/usr/bin"),
        }
    }
}

impl SynPhiConfig {
    /// Load configuration, preferring an explicitly given path.
    ///
    /// An explicit path that cannot be read or parsed is a hard
    /// failure; the default path is best-effort and silently falls
    /// back to built-in defaults when absent.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => Self::load_file(explicit),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            SynPhiError::Config(format!(
                "Cannot read config file {}: {err}",
                path.display()
            ))
        })?;
        toml::from_str(&raw).map_err(|err| {
            SynPhiError::Config(format!(
                "Cannot parse config file {}: {err}",
                path.display()
            ))
        })
    }

    /// Supported set as validated versions; malformed entries are
    /// dropped rather than poisoning the whole invocation.
    pub fn supported_versions(&self) -> Vec<PhpVersion> {
        self.supported_versions
            .iter()
            .filter_map(|raw| PhpVersion::parse(raw).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = SynPhiConfig::default();
        assert_eq!(config.log_file, PathBuf::from("/var/log/syn-phi.log"));
        assert_eq!(config.repository.ppa, "ppa:ondrej/php");
        assert_eq!(config.composer.binary_name, "composer");
        assert_eq!(config.services.unit_dirs.len(), 2);
        assert_eq!(config.supported_versions().len(), DEFAULT_SUPPORTED.len());
    }

    #[test]
    fn partial_toml_keeps_defaults_elsewhere() {
        let config: SynPhiConfig = toml::from_str(
            r#"
            supported_versions = ["8.1", "8.2", "not-a-version"]

            [composer]
            bin_dir = "/opt/bin"
            "#,
        )
        .unwrap();
        assert_eq!(config.composer.bin_dir, PathBuf::from("/opt/bin"));
        assert_eq!(config.composer.binary_name, "composer");
        // Malformed entries are filtered out of the validated view.
        assert_eq!(config.supported_versions().len(), 2);
    }

    #[test]
    fn missing_default_path_falls_back_to_defaults() {
        let config = SynPhiConfig::load_from_optional_path(None).unwrap();
        assert_eq!(config.repository.probe_timeout, 8);
    }
}
