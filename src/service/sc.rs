//! Windows service control manager through `sc.exe`.

use std::sync::Arc;

use crate::common::host::HostOps;
use crate::error::Result;
use crate::resolution::ServiceAction;

use super::ServiceBackend;

pub struct ScBackend {
    host: Arc<dyn HostOps>,
}

impl ScBackend {
    pub fn new(host: Arc<dyn HostOps>) -> Self {
        Self { host }
    }
}

/// Service names from `sc queryex` output.
pub fn parse_queryex(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("SERVICE_NAME:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

impl ServiceBackend for ScBackend {
    fn name(&self) -> &'static str {
        "sc"
    }

    fn list_services(&self) -> Result<Vec<String>> {
        // sc wants the space after `type=` and `state=`
        let argv: Vec<String> = ["sc", "queryex", "type=", "service", "state=", "all"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output = self.host.capture_output(&argv)?;
        Ok(parse_queryex(&output))
    }

    fn control(&self, service: &str, action: ServiceAction) -> Result<()> {
        let argv = vec![
            "sc".to_string(),
            action.as_str().to_string(),
            service.to_string(),
        ];
        self.host.exec_command(&argv, None)
    }

    /// Service names are case-insensitive on Windows.
    fn matches(&self, known: &str, wanted: &str) -> bool {
        known.eq_ignore_ascii_case(wanted)
    }
}
