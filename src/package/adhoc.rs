//! Package manager for platforms without a native package database.

use std::sync::Arc;

use crate::common::host::HostOps;
use crate::error::{ProvisionError, Result};
use crate::resolution::ResolutionTable;

use super::acquire::Acquirer;
use super::processor::ProcessorRegistry;
use super::{PackageInfo, PackageManager};

pub struct WindowsPackageManager {
    table: Arc<ResolutionTable>,
    host: Arc<dyn HostOps>,
    processors: ProcessorRegistry,
}

impl WindowsPackageManager {
    pub fn new(table: Arc<ResolutionTable>, host: Arc<dyn HostOps>) -> Self {
        Self {
            table,
            host,
            processors: ProcessorRegistry::builtin(),
        }
    }

    fn acquirer(&self) -> Acquirer<'_> {
        Acquirer::new(&self.table, self.host.as_ref(), &self.processors)
    }
}

impl PackageManager for WindowsPackageManager {
    /// There is no package index to search.
    fn search(&self, _name: &str) -> Result<Vec<PackageInfo>> {
        Ok(Vec::new())
    }

    fn install(&self, names: &[String]) -> Result<()> {
        self.acquirer().install(names)
    }

    fn check_for_updates(&self) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _names: &[String]) -> Result<()> {
        Err(ProvisionError::unsupported(
            "Removing packages is not supported on Windows",
        ))
    }

    fn purge(&self, _names: &[String]) -> Result<()> {
        Err(ProvisionError::unsupported(
            "Purging packages is not supported on Windows",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::FakeHost;
    use crate::platform::PlatformFamily;

    fn manager(host: Arc<FakeHost>) -> WindowsPackageManager {
        let table = ResolutionTable::builtin(PlatformFamily::Windows).unwrap();
        WindowsPackageManager::new(Arc::new(table), host)
    }

    #[test]
    fn test_remove_and_purge_unsupported_for_any_input() {
        let host = Arc::new(FakeHost::new());
        let packages = manager(Arc::clone(&host));

        for names in [vec![], vec!["nginx".to_string()], vec!["unknown".to_string()]] {
            assert!(matches!(
                packages.remove(&names),
                Err(ProvisionError::UnsupportedOperation(_))
            ));
            assert!(matches!(
                packages.purge(&names),
                Err(ProvisionError::UnsupportedOperation(_))
            ));
        }
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_search_and_updates_are_noops() {
        let host = Arc::new(FakeHost::new());
        let packages = manager(Arc::clone(&host));

        assert!(packages.search("nginx").unwrap().is_empty());
        packages.check_for_updates().unwrap();
        assert!(host.commands().is_empty());
        assert!(host.downloads().is_empty());
    }

    #[test]
    fn test_php_extensions_configured_when_php_present() {
        let host = Arc::new(
            FakeHost::new()
                .with_executable("php", "C:\\php\\php.exe")
                .with_output(
                    "C:\\php\\php.exe -r 'echo php_ini_loaded_file();'",
                    "C:\\php\\php.ini",
                ),
        );
        let packages = manager(Arc::clone(&host));

        packages.install(&["php-extensions".to_string()]).unwrap();

        let edits = host.edits.lock().unwrap().clone();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].1.len(), 11);
        assert!(host.downloads().is_empty());
    }
}
