//! CLI-specific error types
//!
//! All CLI errors are fatal: the process prints one JSON error object and
//! exits non-zero.

use std::fmt;
use std::io;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// The table's log root does not exist or isn't readable.
    TableError,
    /// Table retention configuration is missing or malformed.
    ConfigError,
    /// I/O error (stdout/stderr).
    IoError,
    /// Cleanup failed with a fatal, non-skip error.
    CleanupFailed,
}

impl CliErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TableError => "LOGKEEP_CLI_TABLE_ERROR",
            Self::ConfigError => "LOGKEEP_CLI_CONFIG_ERROR",
            Self::IoError => "LOGKEEP_CLI_IO_ERROR",
            Self::CleanupFailed => "LOGKEEP_CLI_CLEANUP_FAILED",
        }
    }
}

/// CLI error.
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn table_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::TableError, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn cleanup_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::CleanupFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {e}"))
    }
}

impl From<crate::cleanup::CleanupError> for CliError {
    fn from(e: crate::cleanup::CleanupError) -> Self {
        Self::cleanup_failed(e.to_string())
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
