//! # Keel Core
//!
//! Configuration resolution, program bootstrap, and leveled logging for
//! Keel programs.
//!
//! This crate provides:
//!
//! - **Logging**: a shared [`LogContext`] with a console sink, at most one
//!   file sink and a runtime threshold, addressed through named [`Logger`]s
//! - **Schema**: the generic option subset composed with program options
//! - **Resolution**: command line, configuration file and defaults merged
//!   with first-provider-wins precedence
//! - **Bootstrap**: logging initialization from the resolved values, the
//!   configuration audit and the program run lifecycle
//!
//! ## Example
//!
//! ```no_run
//! use keel_core::{Bootstrapper, GenericOptions, LogContext, OptionSchema};
//! use keel_types::OptionDescriptor;
//!
//! let generic = GenericOptions::for_program(std::env::args().next().unwrap_or_default());
//! let schema = OptionSchema::new(
//!     &generic,
//!     vec![OptionDescriptor::integer("int-option", 111, "An example int option")],
//! )?;
//!
//! let config = Bootstrapper::new(LogContext::global(), schema, "1.0").setup(std::env::args())?;
//! let value = config.integer("int-option")?;
//! # Ok::<(), keel_types::KeelError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bootstrap;
pub mod log;
pub mod resolver;
pub mod schema;
pub mod util;

// Re-export commonly used items
pub use bootstrap::{render_value, run_program, Bootstrapper};
pub use keel_types::{KeelError, Result};
pub use log::{init_tracing, LogContext, Logger};
pub use resolver::{resolve, Resolution};
pub use schema::{GenericOptions, OptionSchema};

/// Keel library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
