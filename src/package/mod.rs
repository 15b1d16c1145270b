//! Package acquisition for the bound platform.
//!
//! # Architecture
//!
//! - [`PackageManager`]: the operations callers use, one implementation per
//!   platform family, chosen once by [`load`]
//! - [`acquire::Acquirer`]: probe, download and install driven by the
//!   resolution table (Windows)
//! - [`apt::AptPackageManager`]: delegates to `apt-get` (Debian family)
//! - [`processor`]: post-install configuration keyed by logical name
//!
//! # Example
//!
//! ```ignore
//! let packages = package::load(PlatformFamily::Windows, table, host);
//! packages.install(&["nginx".to_string(), "php-extensions".to_string()])?;
//! ```

pub mod acquire;
pub mod adhoc;
pub mod apt;
pub mod cli;
pub mod processor;

use serde::Serialize;
use std::sync::Arc;

use crate::common::host::HostOps;
use crate::error::Result;
use crate::platform::PlatformFamily;
use crate::resolution::ResolutionTable;

pub use adhoc::WindowsPackageManager;
pub use apt::AptPackageManager;

/// One search hit as reported by the native package database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub name: String,
    pub status: String,
    pub architecture: String,
    pub version: String,
    pub short_description: String,
    pub installed_size_kb: Option<u64>,
}

pub trait PackageManager: Send + Sync {
    fn search(&self, name: &str) -> Result<Vec<PackageInfo>>;

    /// Make every named package available. Stops at the first hard failure.
    fn install(&self, names: &[String]) -> Result<()>;

    fn check_for_updates(&self) -> Result<()>;

    fn remove(&self, names: &[String]) -> Result<()>;

    fn purge(&self, names: &[String]) -> Result<()>;
}

pub fn load(
    family: PlatformFamily,
    table: Arc<ResolutionTable>,
    host: Arc<dyn HostOps>,
) -> Box<dyn PackageManager> {
    match family {
        PlatformFamily::Windows => Box::new(WindowsPackageManager::new(table, host)),
        PlatformFamily::Debian => Box::new(AptPackageManager::new(host)),
    }
}
