//! Common enumerations used throughout Keel.

use crate::errors::{KeelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity levels of the logging system.
///
/// Levels are totally ordered by their integer value. As a threshold,
/// `None` is the most restrictive (nothing passes, not even `Fatal`) and
/// `Debug` the least restrictive.
///
/// # Example
///
/// ```
/// use keel_types::Level;
///
/// assert_eq!(Level::Info.value(), 400);
/// assert_eq!(Level::from_name("warn").unwrap(), Level::Warn);
/// assert!(Level::Warn.admits(Level::Error));
/// assert!(!Level::Warn.admits(Level::Info));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// No logging
    None = 0,
    /// Unrecoverable failures
    Fatal = 100,
    /// Error messages
    Error = 200,
    /// Warnings
    Warn = 300,
    /// Informational messages
    Info = 400,
    /// Debug messages
    Debug = 500,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Level; 6] = [
        Level::None,
        Level::Fatal,
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
    ];

    /// Integer value of the level.
    pub fn value(self) -> i64 {
        self as i64
    }

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            Level::None => "NONE",
            Level::Fatal => "FATAL",
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        }
    }

    /// Parse one of the six canonical names, ignoring ASCII case.
    pub fn from_name(name: &str) -> Result<Self> {
        Level::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| KeelError::UnrecognizedLevel(name.to_string()))
    }

    /// Map one of the six canonical integers back to its level.
    pub fn from_value(value: i64) -> Result<Self> {
        Level::ALL
            .into_iter()
            .find(|level| level.value() == value)
            .ok_or_else(|| KeelError::UnrecognizedLevel(value.to_string()))
    }

    /// Whether a message at `level` passes when `self` is the threshold.
    ///
    /// `None` is never an emission level, so it is never admitted.
    pub fn admits(self, level: Level) -> bool {
        level != Level::None && level.value() <= self.value()
    }
}

impl FromStr for Level {
    type Err = KeelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl TryFrom<i64> for Level {
    type Error = KeelError;

    fn try_from(value: i64) -> Result<Self> {
        Self::from_value(value)
    }
}

/// Strongly typed process exit codes.
///
/// Values above 1 follow the BSD `sysexits.h` convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitCode {
    /// Everything is OK
    Ok = 0,
    /// Generic unknown failure
    NotOk = 1,
    /// Command line usage error
    Usage = 64,
    /// Data format error
    DataErr = 65,
    /// Cannot open input
    NoInput = 66,
    /// Input/output error
    IoErr = 74,
    /// Configuration error
    Config = 78,
}

impl ExitCode {
    /// Numeric code handed to the operating system.
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code() as u8)
    }
}
