use thiserror::Error;

/// Failures surfaced by package acquisition and service control.
///
/// Lower-level failures (one mirror, one alias) are logged and discarded by the
/// fallback chains; only the terminal failure for a logical name ends up here.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Unknown package or service '{0}'")]
    UnknownTarget(String),

    #[error("All download sources failed for package '{package}': {last}")]
    DownloadExhausted { package: String, last: String },

    #[error("No install command for package '{0}'")]
    MissingInstallCommand(String),

    #[error("Install command failed for package '{package}': {source}")]
    InstallExecFailed {
        package: String,
        #[source]
        source: Box<ProvisionError>,
    },

    #[error("Post-install configuration failed for package '{package}': {message}")]
    ProcessorFailed {
        package: String,
        message: String,
        #[source]
        source: Option<Box<ProvisionError>>,
    },

    #[error("Service '{0}' not found")]
    ServiceNotFound(String),

    #[error("{0}")]
    UnsupportedOperation(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Command `{command}` failed: {}", describe_status(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("Invalid command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("Invalid line pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Failed to create temporary working directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("Invalid resolution table: {0}")]
    Table(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    pub fn processor(package: &str, msg: impl Into<String>) -> Self {
        Self::ProcessorFailed {
            package: package.to_string(),
            message: msg.into(),
            source: None,
        }
    }

    /// Wrap a lower-level failure raised while configuring `package`.
    pub fn processor_caused_by(package: &str, source: ProvisionError) -> Self {
        Self::ProcessorFailed {
            package: package.to_string(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Process exit status if this error came from a finished external command.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandFailed { code, .. } => *code,
            Self::InstallExecFailed { source, .. } => source.exit_code(),
            Self::ProcessorFailed {
                source: Some(source),
                ..
            } => source.exit_code(),
            _ => None,
        }
    }
}
