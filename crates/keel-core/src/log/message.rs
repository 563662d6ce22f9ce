//! Message input variants and the scoped line builder.

use super::logger::Logger;
use super::printf::{sprintf, FormatArg};
use keel_types::Level;
use std::borrow::Cow;
use std::fmt::{self, Write as _};

/// A log message in one of its input forms.
///
/// Every form is normalized to a single line by [`Message::render`] before
/// it reaches the sinks.
#[derive(Debug, Clone)]
pub enum Message<'a> {
    /// Text used verbatim.
    Plain(Cow<'a, str>),
    /// printf-style template with positional arguments.
    Template {
        /// Template containing `%d`, `%s`, ... placeholders
        template: &'a str,
        /// Arguments substituted in order
        args: Vec<FormatArg<'a>>,
    },
}

impl<'a> Message<'a> {
    /// A templated message.
    pub fn template(template: &'a str, args: impl IntoIterator<Item = FormatArg<'a>>) -> Self {
        Message::Template {
            template,
            args: args.into_iter().collect(),
        }
    }

    /// The rendered line content.
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            Message::Plain(text) => Cow::Borrowed(text.as_ref()),
            Message::Template { template, args } => Cow::Owned(sprintf(template, args)),
        }
    }
}

impl<'a> From<&'a str> for Message<'a> {
    fn from(text: &'a str) -> Self {
        Message::Plain(Cow::Borrowed(text))
    }
}

impl<'a> From<&'a String> for Message<'a> {
    fn from(text: &'a String) -> Self {
        Message::Plain(Cow::Borrowed(text.as_str()))
    }
}

impl From<String> for Message<'_> {
    fn from(text: String) -> Self {
        Message::Plain(Cow::Owned(text))
    }
}

impl From<fmt::Arguments<'_>> for Message<'_> {
    fn from(args: fmt::Arguments<'_>) -> Self {
        Message::Plain(Cow::Owned(args.to_string()))
    }
}

/// Accumulates pieces of one log line and emits it when dropped.
///
/// The drop also runs while unwinding, so a line started before a panic
/// or an early `?` return is still written.
///
/// ```
/// use keel_core::log::{CaptureBuffer, LogContext};
///
/// let buffer = CaptureBuffer::new();
/// let logger = LogContext::with_console(buffer.clone()).logger("demo");
/// logger.info_line().append("Info message with ").append(15).append(" value");
/// assert!(buffer.contents().ends_with("INFO demo: Info message with 15 value\n"));
/// ```
pub struct LineBuilder<'l> {
    logger: &'l Logger,
    level: Level,
    buffer: String,
}

impl<'l> LineBuilder<'l> {
    pub(crate) fn new(logger: &'l Logger, level: Level) -> Self {
        Self {
            logger,
            level,
            buffer: String::new(),
        }
    }

    /// Append a piece, consuming and returning the builder for chaining.
    pub fn append(mut self, piece: impl fmt::Display) -> Self {
        self.push(piece);
        self
    }

    /// Append a piece through a mutable borrow.
    pub fn push(&mut self, piece: impl fmt::Display) -> &mut Self {
        let _ = write!(self.buffer, "{}", piece);
        self
    }

    /// Level the line will be emitted at.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Text accumulated so far.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

impl fmt::Write for LineBuilder<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}

impl Drop for LineBuilder<'_> {
    fn drop(&mut self) {
        let line = std::mem::take(&mut self.buffer);
        self.logger.log(self.level, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::log::{CaptureBuffer, LogContext};
    use std::fmt::Write;

    fn message_part(line: &str) -> &str {
        line.split_once(": ").map(|(_, m)| m).unwrap_or("")
    }

    #[test]
    fn test_three_styles_render_identically() {
        let buffer = CaptureBuffer::new();
        let logger = LogContext::with_console(buffer.clone()).logger("TestLogger");

        logger.info("Info message with 15 value");
        logger.info(Message::template("Info message with %d value", args![15]));
        logger.info_line().append("Info message with ").append(15).append(" value");

        let lines = buffer.lines();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert!(line.contains(" INFO TestLogger: "));
            assert_eq!(message_part(line), "Info message with 15 value");
        }
    }

    #[test]
    fn test_builder_write_macro() {
        let buffer = CaptureBuffer::new();
        let logger = LogContext::with_console(buffer.clone()).logger("w");
        {
            let mut line = logger.warn_line();
            assert_eq!(line.level(), Level::Warn);
            write!(line, "{} items", 3).unwrap();
            line.push(" pending");
            assert_eq!(line.as_str(), "3 items pending");
            assert!(buffer.contents().is_empty());
        }
        assert_eq!(message_part(&buffer.lines()[0]), "3 items pending");
    }

    #[test]
    fn test_builder_flushes_on_early_return() {
        fn failing(logger: &Logger) -> Result<(), String> {
            let mut line = logger.error_line();
            line.push("partial work");
            let stop: Result<(), String> = Err("stopped".to_string());
            stop?;
            line.push(" never reached");
            Ok(())
        }

        let buffer = CaptureBuffer::new();
        let logger = LogContext::with_console(buffer.clone()).logger("e");
        assert!(failing(&logger).is_err());
        assert_eq!(message_part(&buffer.lines()[0]), "partial work");
    }

    #[test]
    fn test_builder_flushes_on_panic() {
        let buffer = CaptureBuffer::new();
        let logger = LogContext::with_console(buffer.clone()).logger("p");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _line = logger.fatal_line().append("about to panic");
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(message_part(&buffer.lines()[0]), "about to panic");
    }

    #[test]
    fn test_format_arguments() {
        let msg: Message<'_> = format_args!("{}-{}", 1, 2).into();
        assert_eq!(msg.render(), "1-2");
    }
}
