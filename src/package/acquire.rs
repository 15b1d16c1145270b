//! Probe, download and install packages described by the resolution table.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use crate::common::fallback::{Exhausted, first_hit, try_each};
use crate::common::host::HostOps;
use crate::common::shell::split_command;
use crate::error::{ProvisionError, Result};
use crate::resolution::{PackageSpec, ResolutionTable};
use crate::ui::prelude::*;

use super::processor::ProcessorRegistry;

/// Outcome of looking for an already-installed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Found(PathBuf),
    /// No candidate resolved. The package may still exist under a name the
    /// table does not list.
    Inconclusive,
}

impl Probe {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Probe::Found(path) => Some(path),
            Probe::Inconclusive => None,
        }
    }
}

pub struct Acquirer<'a> {
    table: &'a ResolutionTable,
    host: &'a dyn HostOps,
    processors: &'a ProcessorRegistry,
}

impl<'a> Acquirer<'a> {
    pub fn new(
        table: &'a ResolutionTable,
        host: &'a dyn HostOps,
        processors: &'a ProcessorRegistry,
    ) -> Self {
        Self {
            table,
            host,
            processors,
        }
    }

    /// Satisfy each name in order. Names missing from the table are skipped.
    pub fn install(&self, names: &[String]) -> Result<()> {
        for name in names {
            self.host.cancellation().check()?;

            let Some(spec) = self.table.package(name) else {
                emit(
                    Level::Debug,
                    "package.unknown",
                    &format!("No resolution entry for '{}', skipping", name),
                    None,
                );
                continue;
            };

            self.acquire(spec)?;
        }
        Ok(())
    }

    /// First lookup candidate that resolves to an executable.
    pub fn probe(&self, spec: &PackageSpec) -> Probe {
        first_hit(&spec.lookup_candidates, |candidate| {
            self.host.lookup_executable(candidate)
        })
        .map_or(Probe::Inconclusive, Probe::Found)
    }

    fn acquire(&self, spec: &PackageSpec) -> Result<()> {
        let name = spec.name.as_str();
        let probe = self.probe(spec);

        if let Some(processor) = self.processors.get(name) {
            processor
                .process(self.host, probe.path())
                .map_err(|e| match e {
                    ProvisionError::Cancelled | ProvisionError::ProcessorFailed { .. } => e,
                    other => ProvisionError::processor_caused_by(name, other),
                })?;
        }

        if let Probe::Found(path) = &probe {
            emit(
                Level::Info,
                "package.present",
                &format!("{} is already installed ({})", name, path.display()),
                None,
            );
            return Ok(());
        }

        self.host.cancellation().check()?;
        let work_dir = self.host.create_work_dir().map_err(ProvisionError::TempDir)?;

        let downloaded = try_each(
            &spec.download_sources,
            |url| {
                self.host.cancellation().check()?;
                self.host.download(url, work_dir.path())
            },
            |url, e| {
                if e.is_cancelled() {
                    return ControlFlow::Break(());
                }
                emit(
                    Level::Warn,
                    "package.download.failed",
                    &format!("Download of {} from {} failed: {}", name, url, e),
                    None,
                );
                ControlFlow::Continue(())
            },
        );
        match downloaded {
            Ok(path) => emit(
                Level::Debug,
                "package.downloaded",
                &format!("Downloaded {} to {}", name, path.display()),
                None,
            ),
            Err(Exhausted::Empty) => {}
            Err(Exhausted::Failed(ProvisionError::Cancelled)) => {
                return Err(ProvisionError::Cancelled);
            }
            Err(Exhausted::Failed(last)) => {
                return Err(ProvisionError::DownloadExhausted {
                    package: name.to_string(),
                    last: last.to_string(),
                });
            }
        }

        if spec.install_invocation.trim().is_empty() {
            return Err(ProvisionError::MissingInstallCommand(name.to_string()));
        }

        let argv = split_command(&spec.install_invocation)?;
        self.host.cancellation().check()?;
        self.host
            .exec_command(&argv, Some(work_dir.path()))
            .map_err(|e| match e {
                ProvisionError::Cancelled => e,
                source => ProvisionError::InstallExecFailed {
                    package: name.to_string(),
                    source: Box::new(source),
                },
            })?;

        emit(
            Level::Success,
            "package.installed",
            &format!("Installed {}", name),
            None,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::FakeHost;
    use crate::package::processor::PostInstall;
    use crate::platform::PlatformFamily;
    use crate::resolution::TableFile;
    use std::sync::{Arc, Mutex};

    const URL_A: &str = "https://a.example/nginx-1.22.1.zip";
    const URL_B: &str = "https://b.example/nginx-1.22.1.zip";
    const URL_C: &str = "https://c.example/nginx-1.22.1.zip";

    #[derive(Clone, Default)]
    struct RecordingProcessor {
        calls: Arc<Mutex<Vec<Option<PathBuf>>>>,
        fail: bool,
    }

    impl PostInstall for RecordingProcessor {
        fn process(&self, _host: &dyn HostOps, installed: Option<&Path>) -> Result<()> {
            self.calls.lock().unwrap().push(installed.map(Path::to_path_buf));
            if self.fail {
                return Err(ProvisionError::processor("x", "no php.ini"));
            }
            Ok(())
        }
    }

    fn spec(name: &str, lookup: &[&str], sources: &[&str], invocation: &str) -> PackageSpec {
        PackageSpec {
            name: name.to_string(),
            lookup_candidates: lookup.iter().map(|s| s.to_string()).collect(),
            download_sources: sources.iter().map(|s| s.to_string()).collect(),
            install_invocation: invocation.to_string(),
        }
    }

    fn table(packages: Vec<PackageSpec>) -> ResolutionTable {
        ResolutionTable::from_file(TableFile {
            packages,
            services: vec![],
        })
        .unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_present_package_skips_download_and_exec() {
        let table = table(vec![spec(
            "mariadb-server",
            &["mysql", "mariadb"],
            &[URL_A],
            "msiexec /i mariadb.msi /qn",
        )]);
        let host = FakeHost::new().with_executable("mariadb", "/usr/bin/mariadb");
        let processors = ProcessorRegistry::new();

        Acquirer::new(&table, &host, &processors)
            .install(&names(&["mariadb-server"]))
            .unwrap();

        assert!(host.downloads().is_empty());
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_probe_prefers_earlier_candidate() {
        let table = table(vec![]);
        let host = FakeHost::new()
            .with_executable("mysql", "/usr/bin/mysql")
            .with_executable("mariadb", "/usr/bin/mariadb");
        let processors = ProcessorRegistry::new();
        let acquirer = Acquirer::new(&table, &host, &processors);

        let probe = acquirer.probe(&spec("db", &["mysql", "mariadb"], &[], ""));
        assert_eq!(probe, Probe::Found(PathBuf::from("/usr/bin/mysql")));
        assert_eq!(
            acquirer.probe(&spec("db", &["postgres"], &[], "")),
            Probe::Inconclusive
        );
    }

    #[test]
    fn test_sources_tried_in_order_until_success() {
        let table = table(vec![spec(
            "tool",
            &["tool"],
            &[URL_A, URL_B, "https://c.example/tool.zip"],
            "unzip tool.zip",
        )]);
        let host = FakeHost::new().with_failing_url(URL_A);
        let processors = ProcessorRegistry::new();

        Acquirer::new(&table, &host, &processors)
            .install(&names(&["tool"]))
            .unwrap();

        assert_eq!(host.downloads(), vec![URL_A, URL_B]);
        assert_eq!(host.commands(), vec!["unzip tool.zip"]);
    }

    #[test]
    fn test_all_sources_failing_never_execs() {
        let table = table(vec![spec("tool", &["tool"], &[URL_A, URL_B], "unzip tool.zip")]);
        let host = FakeHost::new().with_failing_url(URL_A).with_failing_url(URL_B);
        let processors = ProcessorRegistry::new();

        let err = Acquirer::new(&table, &host, &processors)
            .install(&names(&["tool"]))
            .unwrap_err();

        match err {
            ProvisionError::DownloadExhausted { package, last } => {
                assert_eq!(package, "tool");
                assert!(last.contains(URL_B));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(host.downloads(), vec![URL_A, URL_B]);
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_empty_invocation_after_download() {
        let table = ResolutionTable::builtin(PlatformFamily::Windows).unwrap();
        let host = FakeHost::new();
        let processors = ProcessorRegistry::new();

        let err = Acquirer::new(&table, &host, &processors)
            .install(&names(&["nginx"]))
            .unwrap_err();

        assert!(matches!(err, ProvisionError::MissingInstallCommand(name) if name == "nginx"));
        assert_eq!(host.downloads().len(), 1);
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_no_sources_goes_straight_to_invocation() {
        let table = table(vec![spec("tool", &["tool"], &[], "setup-tool --quiet")]);
        let host = FakeHost::new();
        let processors = ProcessorRegistry::new();

        Acquirer::new(&table, &host, &processors)
            .install(&names(&["tool"]))
            .unwrap();

        assert!(host.downloads().is_empty());
        assert_eq!(host.commands(), vec!["setup-tool --quiet"]);
    }

    #[test]
    fn test_install_runs_inside_work_dir() {
        let table = table(vec![spec("tool", &["tool"], &[URL_A], "unzip tool.zip")]);
        let host = FakeHost::new();
        let processors = ProcessorRegistry::new();

        Acquirer::new(&table, &host, &processors)
            .install(&names(&["tool"]))
            .unwrap();

        let dirs = host.command_dirs.lock().unwrap().clone();
        assert_eq!(dirs.len(), 1);
        assert!(dirs[0].as_ref().is_some_and(|dir| dir.is_absolute()));
    }

    #[test]
    fn test_install_failure_carries_exit_status() {
        let table = ResolutionTable::builtin(PlatformFamily::Windows).unwrap();
        let host = FakeHost::new().with_failing_program("msiexec", 1603);
        let processors = ProcessorRegistry::new();

        let err = Acquirer::new(&table, &host, &processors)
            .install(&names(&["mariadb-server"]))
            .unwrap_err();

        assert!(matches!(err, ProvisionError::InstallExecFailed { .. }));
        assert_eq!(err.exit_code(), Some(1603));
        assert_eq!(host.commands().len(), 1);
    }

    #[test]
    fn test_work_dir_failure_is_fatal() {
        let table = table(vec![spec("tool", &["tool"], &[URL_A], "unzip tool.zip")]);
        let host = FakeHost::new().with_failing_work_dir();
        let processors = ProcessorRegistry::new();

        let err = Acquirer::new(&table, &host, &processors)
            .install(&names(&["tool"]))
            .unwrap_err();

        assert!(matches!(err, ProvisionError::TempDir(_)));
        assert!(host.downloads().is_empty());
    }

    #[test]
    fn test_unknown_names_are_skipped() {
        let table = table(vec![spec("tool", &["tool"], &[], "")]);
        let host = FakeHost::new().with_executable("tool", "/bin/tool");
        let processors = ProcessorRegistry::new();

        Acquirer::new(&table, &host, &processors)
            .install(&names(&["redis", "tool"]))
            .unwrap();
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_processor_runs_once_whether_present_or_not() {
        let table = table(vec![
            spec("present", &["php"], &[], ""),
            spec("absent", &["php8"], &[], "setup-php"),
        ]);
        let host = FakeHost::new().with_executable("php", "/usr/bin/php");
        let recorder = RecordingProcessor::default();
        let mut processors = ProcessorRegistry::new();
        processors.register("present", recorder.clone());
        processors.register("absent", recorder.clone());

        Acquirer::new(&table, &host, &processors)
            .install(&names(&["present", "absent"]))
            .unwrap();

        assert_eq!(
            recorder.calls.lock().unwrap().clone(),
            vec![Some(PathBuf::from("/usr/bin/php")), None]
        );
    }

    #[test]
    fn test_processor_failure_aborts_remaining_names() {
        let table = table(vec![
            spec("a", &["a"], &[], "install-a"),
            spec("b", &["b"], &[], "install-b"),
        ]);
        let host = FakeHost::new().with_executable("a", "/bin/a");
        let failing = RecordingProcessor {
            fail: true,
            ..Default::default()
        };
        let second = RecordingProcessor::default();
        let mut processors = ProcessorRegistry::new();
        processors.register("a", failing.clone());
        processors.register("b", second.clone());

        let err = Acquirer::new(&table, &host, &processors)
            .install(&names(&["a", "b"]))
            .unwrap_err();

        assert!(matches!(err, ProvisionError::ProcessorFailed { .. }));
        assert_eq!(failing.calls.lock().unwrap().len(), 1);
        assert!(second.calls.lock().unwrap().is_empty());
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let table = table(vec![spec("tool", &["tool"], &[URL_A], "unzip tool.zip")]);
        let host = FakeHost::new();
        host.cancellation().cancel();
        let processors = ProcessorRegistry::new();

        let err = Acquirer::new(&table, &host, &processors)
            .install(&names(&["tool"]))
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Cancelled));
        assert!(host.downloads().is_empty());
    }

    #[test]
    fn test_cancel_during_download_stops_mirror_chain() {
        let table = table(vec![spec("tool", &["tool"], &[URL_A, URL_B, URL_C], "unzip tool.zip")]);
        let host = FakeHost::new().with_interrupting_url(URL_A);
        let processors = ProcessorRegistry::new();

        let err = Acquirer::new(&table, &host, &processors)
            .install(&names(&["tool"]))
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Cancelled));
        assert_eq!(host.downloads(), vec![URL_A]);
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_processor_command_failure_keeps_exit_status() {
        struct FailingCommand;
        impl PostInstall for FailingCommand {
            fn process(&self, _host: &dyn HostOps, _installed: Option<&Path>) -> Result<()> {
                Err(ProvisionError::CommandFailed {
                    command: "php -r x".to_string(),
                    code: Some(255),
                })
            }
        }

        let table = table(vec![spec("php-extensions", &["php"], &[], "")]);
        let host = FakeHost::new().with_executable("php", "/usr/bin/php");
        let mut processors = ProcessorRegistry::new();
        processors.register("php-extensions", FailingCommand);

        let err = Acquirer::new(&table, &host, &processors)
            .install(&names(&["php-extensions"]))
            .unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::ProcessorFailed { source: Some(_), .. }
        ));
        assert_eq!(err.exit_code(), Some(255));
    }

    #[test]
    fn test_nginx_second_mirror_end_to_end() {
        let table = ResolutionTable::builtin(PlatformFamily::Windows)
            .unwrap()
            .with_overrides(TableFile {
                packages: vec![spec(
                    "nginx",
                    &["nginx"],
                    &[URL_A, URL_B],
                    "powershell -Command \"Expand-Archive nginx-1.22.1.zip C:\\nginx\"",
                )],
                services: vec![],
            })
            .unwrap();
        let host = FakeHost::new().with_failing_url(URL_A);
        let processors = ProcessorRegistry::builtin();

        Acquirer::new(&table, &host, &processors)
            .install(&names(&["nginx"]))
            .unwrap();

        assert_eq!(host.downloads(), vec![URL_A, URL_B]);
        let commands = host.commands.lock().unwrap().clone();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0][0], "powershell");
        assert_eq!(commands[0][2], "Expand-Archive nginx-1.22.1.zip C:\\nginx");
    }
}
