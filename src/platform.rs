//! Platform family selection and the process-wide provisioning context.
//!
//! The family is decided once at startup; the package and service managers
//! bound here are held until the process exits.

use std::sync::Arc;

use crate::common::distro::OperatingSystem;
use crate::common::host::HostOps;
use crate::error::{ProvisionError, Result};
use crate::package::{self, PackageManager};
use crate::resolution::{ResolutionTable, TableFile};
use crate::service::{self, ServiceManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    /// apt + systemd
    Debian,
    /// Ad-hoc installers + the `sc` service control manager
    Windows,
}

impl PlatformFamily {
    /// Pick the family for an OS, failing for OSes without a manager variant.
    pub fn for_os(os: &OperatingSystem) -> Result<Self> {
        os.platform_family()
            .ok_or_else(|| ProvisionError::UnsupportedPlatform(os.to_string()))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Debian => "debian",
            Self::Windows => "windows",
        }
    }
}

impl std::fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything an orchestration layer may call, bound for one platform.
pub struct Provisioner {
    family: PlatformFamily,
    table: Arc<ResolutionTable>,
    packages: Box<dyn PackageManager>,
    services: Box<dyn ServiceManager>,
}

impl Provisioner {
    pub fn new(
        family: PlatformFamily,
        overrides: TableFile,
        host: Arc<dyn HostOps>,
    ) -> Result<Self> {
        let table = Arc::new(ResolutionTable::builtin(family)?.with_overrides(overrides)?);
        let packages = package::load(family, Arc::clone(&table), Arc::clone(&host));
        let services = service::load(family, Arc::clone(&table), host);

        Ok(Self {
            family,
            table,
            packages,
            services,
        })
    }

    pub fn family(&self) -> PlatformFamily {
        self.family
    }

    pub fn table(&self) -> &ResolutionTable {
        &self.table
    }

    pub fn packages(&self) -> &dyn PackageManager {
        self.packages.as_ref()
    }

    pub fn services(&self) -> &dyn ServiceManager {
        self.services.as_ref()
    }
}
