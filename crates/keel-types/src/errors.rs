//! Error types for Keel operations.

use crate::enums::ExitCode;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Keel operations.
///
/// Every variant that concerns a particular option or file carries the
/// offending key or path so the rendered message can point at it.
#[derive(Error, Debug)]
pub enum KeelError {
    /// An option that no descriptor declares
    #[error("Unrecognized option '{option}'{context}")]
    UnknownOption {
        /// The option as it was written
        option: String,
        /// Where it was found (empty for the command line)
        context: String,
    },

    /// A value that does not parse as the descriptor's type
    #[error("Invalid value '{value}' for option '{key}': expected {expected}")]
    InvalidValue {
        /// Option key
        key: String,
        /// The text that failed to parse
        value: String,
        /// Human-readable name of the expected type
        expected: String,
    },

    /// The configuration file could not be opened
    #[error("Cannot open configuration file {}: {source}", path.display())]
    ConfigFileNotFound {
        /// Effective configuration file path
        path: PathBuf,
        /// Underlying open failure
        #[source]
        source: std::io::Error,
    },

    /// A level name or integer outside the canonical set
    #[error("Unrecognized logging level: {0}")]
    UnrecognizedLevel(String),

    /// A file sink or other file operation failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Command line or configuration file misuse not covered above
    #[error("Usage error: {0}")]
    Usage(String),

    /// Inconsistent option schema declared by the embedding program
    #[error("Schema error: {0}")]
    Schema(String),

    /// YAML configuration file parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl KeelError {
    /// The process exit code conventionally associated with this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            KeelError::UnknownOption { .. }
            | KeelError::InvalidValue { .. }
            | KeelError::Usage(_) => ExitCode::Usage,
            KeelError::ConfigFileNotFound { .. }
            | KeelError::UnrecognizedLevel(_)
            | KeelError::Schema(_)
            | KeelError::Yaml(_) => ExitCode::Config,
            KeelError::Io { .. } => ExitCode::IoErr,
            KeelError::Other(_) => ExitCode::NotOk,
        }
    }
}

/// A specialized Result type for Keel operations.
pub type Result<T> = std::result::Result<T, KeelError>;

/// Helper macro to bail out with a KeelError
///
/// # Example
///
/// ```ignore
/// if keys.contains(key) {
///     bail!(Schema, "duplicate option '{}'", key);
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($variant:ident, $msg:expr) => {
        return Err($crate::KeelError::$variant($msg.to_string()))
    };
    ($variant:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::KeelError::$variant(format!($fmt, $($arg)*)))
    };
    ($msg:expr) => {
        return Err($crate::KeelError::Other($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::KeelError::Other(format!($fmt, $($arg)*)))
    };
}
