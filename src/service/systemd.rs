use std::sync::Arc;

use crate::common::host::HostOps;
use crate::error::Result;
use crate::resolution::ServiceAction;

use super::ServiceBackend;

const UNIT_SUFFIX: &str = ".service";

/// System-scope systemd services driven through `systemctl`.
pub struct SystemdBackend {
    host: Arc<dyn HostOps>,
}

impl SystemdBackend {
    pub fn system(host: Arc<dyn HostOps>) -> Self {
        Self { host }
    }

    fn systemctl_args(args: &[&str]) -> Vec<String> {
        std::iter::once("systemctl")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect()
    }
}

/// Unit names from `systemctl list-unit-files` without the `.service` suffix.
///
/// Template units (`foo@.service`) are skipped, they cannot be started by
/// that name.
pub fn parse_unit_files(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(|unit| unit.strip_suffix(UNIT_SUFFIX))
        .filter(|name| !name.is_empty() && !name.ends_with('@'))
        .map(str::to_string)
        .collect()
}

impl ServiceBackend for SystemdBackend {
    fn name(&self) -> &'static str {
        "systemd"
    }

    fn list_services(&self) -> Result<Vec<String>> {
        let argv = Self::systemctl_args(&[
            "list-unit-files",
            "--type=service",
            "--no-legend",
            "--no-pager",
        ]);
        let output = self.host.capture_output(&argv)?;
        Ok(parse_unit_files(&output))
    }

    fn control(&self, service: &str, action: ServiceAction) -> Result<()> {
        let argv = Self::systemctl_args(&[action.as_str(), service]);
        self.host.exec_command(&argv, None)
    }

    /// Accepts the unit name with or without its `.service` suffix.
    fn matches(&self, known: &str, wanted: &str) -> bool {
        known == wanted.strip_suffix(UNIT_SUFFIX).unwrap_or(wanted)
    }
}
