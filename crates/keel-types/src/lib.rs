//! # Keel Types
//!
//! Core types, traits, and enums shared across all Keel crates.
//!
//! This crate provides:
//!
//! - The logging [`Level`] set and strongly typed [`ExitCode`]s
//! - Option descriptors and the resolved configuration value model
//! - The [`Program`] trait implemented by embedding applications
//! - Error types and result aliases
//!
//! ## Example
//!
//! ```
//! use keel_types::{Level, OptionDescriptor, ValueType};
//!
//! let level = Level::from_value(300).unwrap();
//! assert_eq!(level.name(), "WARN");
//!
//! let opt = OptionDescriptor::string("string-option", "", "A string option");
//! assert_eq!(opt.value_type(), ValueType::String);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod enums;
pub mod errors;
pub mod traits;

// Re-export common types for convenience
pub use config::{
    OptionDescriptor, OptionScope, ResolvedConfig, ResolvedEntry, ResolvedValue, ValueSource,
    ValueType,
};
pub use enums::{ExitCode, Level};
pub use errors::{KeelError, Result};
pub use traits::Program;
