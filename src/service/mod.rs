//! Service control with alias and direct-command fallbacks.
//!
//! A [`ServiceBackend`] talks to the OS service manager (systemd or the
//! Windows SCM). [`controller::ServiceController`] layers the resolution
//! table's aliases and direct commands on top of it.

pub mod cli;
pub mod controller;
pub mod sc;
pub mod systemd;

use std::sync::Arc;

use crate::common::host::HostOps;
use crate::error::Result;
use crate::platform::PlatformFamily;
use crate::resolution::{ResolutionTable, ServiceAction};

pub use controller::ServiceController;
pub use sc::ScBackend;
pub use systemd::SystemdBackend;

pub trait ServiceManager: Send + Sync {
    fn start(&self, name: &str) -> Result<()>;

    fn stop(&self, name: &str) -> Result<()>;

    fn restart(&self, name: &str) -> Result<()>;

    /// The first of the logical name and its aliases that the OS service
    /// manager knows about.
    fn locate(&self, name: &str) -> Option<String>;
}

pub trait ServiceBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every service name the manager knows, running or not.
    fn list_services(&self) -> Result<Vec<String>>;

    fn control(&self, service: &str, action: ServiceAction) -> Result<()>;

    /// Whether a listed name refers to the wanted service.
    fn matches(&self, known: &str, wanted: &str) -> bool {
        known == wanted
    }
}

pub fn load(
    family: PlatformFamily,
    table: Arc<ResolutionTable>,
    host: Arc<dyn HostOps>,
) -> Box<dyn ServiceManager> {
    match family {
        PlatformFamily::Windows => Box::new(ServiceController::new(
            ScBackend::new(Arc::clone(&host)),
            table,
            host,
        )),
        PlatformFamily::Debian => Box::new(ServiceController::new(
            SystemdBackend::system(Arc::clone(&host)),
            table,
            host,
        )),
    }
}
