//! APT-backed package manager for the Debian family.

use std::sync::Arc;

use crate::common::host::HostOps;
use crate::error::{ProvisionError, Result};
use crate::ui::prelude::*;

use super::{PackageInfo, PackageManager};

/// Logical names the archive does not carry verbatim.
const REPLACEMENTS: &[(&str, &[&str])] = &[
    (
        "php-extensions",
        &[
            "php-bz2",
            "php-curl",
            "php-gd",
            "php-gmp",
            "php-intl",
            "php-mbstring",
            "php-mysql",
            "php-sqlite3",
            "php-zip",
        ],
    ),
    ("php", &["php-cli", "php-fpm"]),
];

const NOT_INSTALLED: &str = "not-installed";

pub struct AptPackageManager {
    host: Arc<dyn HostOps>,
}

impl AptPackageManager {
    pub fn new(host: Arc<dyn HostOps>) -> Self {
        Self { host }
    }

    fn apt_get(&self, action: &str, packages: &[String]) -> Result<()> {
        let mut argv = vec!["apt-get".to_string(), action.to_string()];
        if action != "update" {
            argv.push("-y".to_string());
        }
        argv.extend(packages.iter().cloned());
        self.host.exec_command(&argv, None)
    }

    fn status_of(&self, package: &str) -> String {
        let argv = vec![
            "dpkg-query".to_string(),
            "-W".to_string(),
            "-f=${Status}".to_string(),
            package.to_string(),
        ];
        match self.host.capture_output(&argv) {
            Ok(out) => parse_status(&out),
            Err(_) => NOT_INSTALLED.to_string(),
        }
    }
}

/// Expand logical names to concrete archive package names, keeping order and
/// dropping duplicates.
pub fn expand_names(names: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = Vec::new();
    for name in names {
        let concrete = REPLACEMENTS
            .iter()
            .find(|(logical, _)| *logical == name.as_str())
            .map(|(_, packages)| packages.iter().map(|p| p.to_string()).collect())
            .unwrap_or_else(|| vec![name.clone()]);
        for package in concrete {
            if !expanded.contains(&package) {
                expanded.push(package);
            }
        }
    }
    expanded
}

/// Parse `apt-cache show` output into one entry per stanza.
pub fn parse_apt_cache_show(output: &str) -> Vec<PackageInfo> {
    let mut packages = Vec::new();
    let mut current = PackageInfo::default();

    for line in output.lines() {
        if line.trim().is_empty() {
            if !current.name.is_empty() {
                packages.push(std::mem::take(&mut current));
            }
            continue;
        }
        // Continuation lines of multi-line fields
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key {
            "Package" => current.name = value.to_string(),
            "Architecture" => current.architecture = value.to_string(),
            "Version" => current.version = value.to_string(),
            "Description" | "Description-en" if current.short_description.is_empty() => {
                current.short_description = value.to_string()
            }
            "Installed-Size" => current.installed_size_kb = value.parse().ok(),
            _ => {}
        }
    }
    if !current.name.is_empty() {
        packages.push(current);
    }
    packages
}

/// `install ok installed` becomes `installed`; anything else is kept verbatim.
fn parse_status(output: &str) -> String {
    let status = output.trim();
    match status.rsplit(' ').next() {
        Some(last) if !last.is_empty() => last.to_string(),
        _ => NOT_INSTALLED.to_string(),
    }
}

impl PackageManager for AptPackageManager {
    fn search(&self, name: &str) -> Result<Vec<PackageInfo>> {
        let argv = vec!["apt-cache".to_string(), "show".to_string(), name.to_string()];
        let output = match self.host.capture_output(&argv) {
            Ok(out) => out,
            Err(ProvisionError::CommandFailed { .. }) => {
                emit(
                    Level::Debug,
                    "package.search.none",
                    &format!("apt-cache has no entry for '{}'", name),
                    None,
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut packages = parse_apt_cache_show(&output);
        for package in &mut packages {
            package.status = self.status_of(&package.name);
        }
        Ok(packages)
    }

    fn install(&self, names: &[String]) -> Result<()> {
        let packages = expand_names(names);
        if packages.is_empty() {
            return Ok(());
        }
        self.apt_get("install", &packages)
    }

    fn check_for_updates(&self) -> Result<()> {
        self.apt_get("update", &[])
    }

    fn remove(&self, names: &[String]) -> Result<()> {
        let packages = expand_names(names);
        if packages.is_empty() {
            return Ok(());
        }
        self.apt_get("remove", &packages)
    }

    fn purge(&self, names: &[String]) -> Result<()> {
        let packages = expand_names(names);
        if packages.is_empty() {
            return Ok(());
        }
        self.apt_get("purge", &packages)
    }
}
