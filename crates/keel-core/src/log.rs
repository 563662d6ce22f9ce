//! Leveled logging for Keel programs.
//!
//! A [`LogContext`] owns the console sink, the optional single file sink and
//! the active threshold. [`Logger`]s are named handles onto a context; any
//! number of them may exist and all observe threshold changes immediately.
//!
//! Messages may be given as plain text, as printf-style templates, or built
//! up piecewise with a [`LineBuilder`] that emits when dropped:
//!
//! ```
//! use keel_core::args;
//! use keel_core::log::{CaptureBuffer, LogContext};
//! use keel_types::Level;
//!
//! let buffer = CaptureBuffer::new();
//! let ctx = LogContext::with_console(buffer.clone());
//! let log = ctx.logger("example");
//!
//! log.info("plain");
//! log.warn_fmt("%d + %d == %s ?", &args![1, 1, "two"]);
//! log.error_line().append("built ").append(3).append(" pieces");
//!
//! ctx.set_threshold(Level::Error);
//! log.info("suppressed");
//! assert_eq!(buffer.lines().len(), 3);
//! ```

mod bridge;
mod context;
mod logger;
mod message;
pub mod printf;

pub use bridge::{init_tracing, KeelLayer};
pub use context::{CaptureBuffer, ConsoleWriter, LogContext};
pub use logger::Logger;
pub use message::{LineBuilder, Message};
pub use printf::FormatArg;
