//! Resolution table: logical package/service names to the concrete identities
//! and remediation steps used to satisfy them.
//!
//! Tables are built once at startup (embedded per-family TOML plus config
//! overrides) and are read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ProvisionError, Result};
use crate::platform::PlatformFamily;

const WINDOWS_TABLE: &str = include_str!("windows.toml");
const DEBIAN_TABLE: &str = include_str!("debian.toml");

/// How to satisfy one installable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    /// Executable names probed on PATH, in preference order.
    #[serde(default)]
    pub lookup_candidates: Vec<String>,
    /// Mirrors tried in order until one download succeeds.
    #[serde(default)]
    pub download_sources: Vec<String>,
    /// Shell-style command run from the download directory. May be empty.
    #[serde(default)]
    pub install_invocation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Start,
    Stop,
}

impl ServiceAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

impl std::fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw invocations used when the service manager has no entry for a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectCommands {
    pub start: String,
    pub stop: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub logical_name: String,
    /// Alternate names known to the OS service manager, in order.
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub direct_commands: Option<DirectCommands>,
}

impl ServiceSpec {
    pub fn command_for(&self, action: ServiceAction) -> Option<&str> {
        self.direct_commands.as_ref().map(|c| match action {
            ServiceAction::Start => c.start.as_str(),
            ServiceAction::Stop => c.stop.as_str(),
        })
    }

    /// True when there is nothing to fall back to after the logical name fails.
    pub fn has_fallbacks(&self) -> bool {
        !self.aliases.is_empty() || self.direct_commands.is_some()
    }
}

/// On-disk shape shared by embedded tables and user config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFile {
    pub packages: Vec<PackageSpec>,
    pub services: Vec<ServiceSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct ResolutionTable {
    packages: HashMap<String, PackageSpec>,
    services: HashMap<String, ServiceSpec>,
}

impl ResolutionTable {
    /// The embedded table for a platform family.
    pub fn builtin(family: PlatformFamily) -> Result<Self> {
        let source = match family {
            PlatformFamily::Windows => WINDOWS_TABLE,
            PlatformFamily::Debian => DEBIAN_TABLE,
        };
        Self::from_toml(source)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let file: TableFile =
            toml::from_str(source).map_err(|e| ProvisionError::Table(e.to_string()))?;
        Self::from_file(file)
    }

    pub fn from_file(file: TableFile) -> Result<Self> {
        let mut table = Self::default();
        for package in file.packages {
            if package.name.trim().is_empty() {
                return Err(ProvisionError::Table("package entry without a name".to_string()));
            }
            if table.packages.contains_key(&package.name) {
                return Err(ProvisionError::Table(format!(
                    "package '{}' is defined twice",
                    package.name
                )));
            }
            table.packages.insert(package.name.clone(), package);
        }
        for service in file.services {
            if service.logical_name.trim().is_empty() {
                return Err(ProvisionError::Table("service entry without a name".to_string()));
            }
            if table.services.contains_key(&service.logical_name) {
                return Err(ProvisionError::Table(format!(
                    "service '{}' is defined twice",
                    service.logical_name
                )));
            }
            table.services.insert(service.logical_name.clone(), service);
        }
        Ok(table)
    }

    /// Add or replace entries. Consumes the table so overrides can only be
    /// applied while it is still being built.
    pub fn with_overrides(mut self, overrides: TableFile) -> Result<Self> {
        let overrides = Self::from_file(overrides)?;
        self.packages.extend(overrides.packages);
        self.services.extend(overrides.services);
        Ok(self)
    }

    pub fn package(&self, name: &str) -> Option<&PackageSpec> {
        self.packages.get(name)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.get(name)
    }

    pub fn require_package(&self, name: &str) -> Result<&PackageSpec> {
        self.package(name)
            .ok_or_else(|| ProvisionError::UnknownTarget(name.to_string()))
    }

    pub fn package_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.packages.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn service_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}
