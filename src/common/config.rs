use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::download::DownloadSettings;
use crate::resolution::{PackageSpec, ServiceSpec, TableFile};

pub const CONFIG_ENV: &str = "PROVISIONCTL_CONFIG";

/// HTTP settings for mirror downloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl DownloadConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 600;
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

/// User configuration, read from `config.toml`.
///
/// `packages` and `services` entries are merged over the embedded resolution
/// table, replacing entries with the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub download: DownloadConfig,
    pub packages: Vec<PackageSpec>,
    pub services: Vec<ServiceSpec>,
}

impl ProvisionConfig {
    /// Load from the resolved path. A missing file is only an error when the
    /// path was given explicitly.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let Some(path) = config_path(explicit) else {
            return Ok(Self::default());
        };

        let required = explicit.is_some() || env_config_path().is_some();
        if !path.exists() && !required {
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn download_settings(&self) -> DownloadSettings {
        let defaults = DownloadSettings::default();
        DownloadSettings {
            timeout: Duration::from_secs(self.download.timeout_secs),
            user_agent: self
                .download
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
        }
    }

    pub fn table_overrides(&self) -> TableFile {
        TableFile {
            packages: self.packages.clone(),
            services: self.services.clone(),
        }
    }
}

/// `--config`, then `$PROVISIONCTL_CONFIG`, then the user config directory.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_config_path() {
        return Some(path);
    }
    dirs::config_dir().map(|dir| dir.join("provisionctl").join("config.toml"))
}

/// `$PROVISIONCTL_CONFIG`; an empty value counts as unset.
fn env_config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
}
