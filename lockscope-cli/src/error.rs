//! CLI-specific error types and exit code mapping

use lockscope_core::error::{LockscopeError, ScanError};
use lockscope_manifest_scanner::ManifestScannerError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The scan succeeded and found vulnerabilities at or above the threshold.
    #[error("vulnerabilities found: {0}")]
    Vulnerable(String),

    /// The manifest was rejected (intake policy or parse error code).
    #[error("manifest rejected: {0}")]
    Rejected(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from lockscope-core.
    #[error("{0}")]
    Core(#[from] LockscopeError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                        |
    /// |------|------------------------------------------------|
    /// | 0    | Success                                        |
    /// | 1    | General / command error                        |
    /// | 2    | Configuration error                            |
    /// | 4    | Vulnerabilities at or above the threshold      |
    /// | 5    | Manifest rejected (policy or parse error code) |
    /// | 10   | IO error                                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Vulnerable(_) => 4,
            Self::Rejected(_) => 5,
            Self::Io(_) => 10,
            Self::Core(core) => match core {
                LockscopeError::Config(_) => 2,
                LockscopeError::Scan(ScanError::InputRejected(_)) => 5,
                LockscopeError::Scan(ScanError::RuleDb(_)) => 1,
                LockscopeError::Io(_) => 10,
            },
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<ManifestScannerError> for CliError {
    fn from(e: ManifestScannerError) -> Self {
        Self::Core(e.into())
    }
}
