//! Post-install processors: package-specific configuration that runs after
//! acquisition, or when the package was already present.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::common::host::HostOps;
use crate::error::{ProvisionError, Result};
use crate::ui::prelude::*;

pub const PHP_EXTENSIONS_PACKAGE: &str = "php-extensions";

/// Extensions a game panel needs enabled in the PHP runtime.
pub const REQUIRED_PHP_EXTENSIONS: &[&str] = &[
    "bz2",
    "curl",
    "fileinfo",
    "gd",
    "gmp",
    "intl",
    "mbstring",
    "openssl",
    "pdo_mysql",
    "pdo_sqlite",
    "zip",
];

pub trait PostInstall: Send + Sync {
    /// `installed` is the probed executable, `None` when nothing was found.
    fn process(&self, host: &dyn HostOps, installed: Option<&Path>) -> Result<()>;
}

/// Processors keyed by logical package name.
#[derive(Default)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Box<dyn PostInstall>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            PHP_EXTENSIONS_PACKAGE,
            PhpExtensions::new(REQUIRED_PHP_EXTENSIONS),
        );
        registry
    }

    pub fn register(&mut self, package: &str, processor: impl PostInstall + 'static) {
        self.processors
            .insert(package.to_string(), Box::new(processor));
    }

    pub fn get(&self, package: &str) -> Option<&dyn PostInstall> {
        self.processors.get(package).map(|p| p.as_ref())
    }
}

/// Enables PHP extensions, either through per-extension files in the scanned
/// ini directory or by editing the loaded `php.ini`.
pub struct PhpExtensions {
    extensions: &'static [&'static str],
}

impl PhpExtensions {
    pub fn new(extensions: &'static [&'static str]) -> Self {
        Self { extensions }
    }

    fn query(host: &dyn HostOps, php: &str, expr: &str) -> Option<String> {
        let argv = vec![php.to_string(), "-r".to_string(), format!("echo {};", expr)];
        match host.capture_output(&argv) {
            Ok(out) => Some(out),
            Err(e) => {
                emit(
                    Level::Debug,
                    "package.php.query_failed",
                    &format!("{} failed: {}", expr, e),
                    None,
                );
                None
            }
        }
    }

    /// Directory of the first additional ini file PHP scans, if any.
    fn scanned_dir(host: &dyn HostOps, php: &str) -> Option<PathBuf> {
        let out = Self::query(host, php, "php_ini_scanned_files()")?;
        out.split([',', '\n'])
            .map(str::trim)
            .find(|s| !s.is_empty())
            .and_then(|first| Path::new(first).parent().map(Path::to_path_buf))
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    fn loaded_ini(host: &dyn HostOps, php: &str) -> Option<PathBuf> {
        let out = Self::query(host, php, "php_ini_loaded_file()")?;
        out.lines()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    fn ini_patterns(&self) -> Vec<(String, String)> {
        self.extensions
            .iter()
            .map(|ext| {
                (
                    format!(r"\s*;?\s*extension\s*=\s*{}\s*", regex::escape(ext)),
                    format!("extension={}", ext),
                )
            })
            .collect()
    }
}

impl PostInstall for PhpExtensions {
    fn process(&self, host: &dyn HostOps, installed: Option<&Path>) -> Result<()> {
        let php = installed
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "php".to_string());

        if let Some(dir) = Self::scanned_dir(host, &php) {
            for ext in self.extensions {
                let path = dir.join(format!("{}.ini", ext));
                host.write_file(&path, format!("extension={}\n", ext).as_bytes())?;
            }
            emit(
                Level::Info,
                "package.php.extensions",
                &format!("Enabled PHP extensions in {}", dir.display()),
                None,
            );
            return Ok(());
        }

        let ini = Self::loaded_ini(host, &php).or_else(|| {
            installed
                .and_then(Path::parent)
                .map(|dir| dir.join("php.ini"))
        });

        let Some(ini) = ini else {
            return Err(ProvisionError::processor(
                PHP_EXTENSIONS_PACKAGE,
                "failed to find a configuration file to enable PHP extensions",
            ));
        };

        host.replace_or_append_in_file(&ini, &self.ini_patterns())?;
        emit(
            Level::Info,
            "package.php.extensions",
            &format!("Enabled PHP extensions in {}", ini.display()),
            None,
        );
        Ok(())
    }
}
