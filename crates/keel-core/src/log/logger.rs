//! Named logger handles.

use super::context::LogContext;
use super::message::{LineBuilder, Message};
use super::printf::FormatArg;
use keel_types::{Level, Result};

/// A named facade over a [`LogContext`].
///
/// Loggers hold no level of their own: every call reads the shared
/// threshold, and [`Logger::set_level`] changes it for every logger of the
/// context. Several loggers may share a name.
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    context: LogContext,
}

macro_rules! level_methods {
    ($($level:ident => $plain:ident, $templated:ident, $line:ident;)*) => {
        $(
            #[doc = concat!("Emit `message` at ", stringify!($level), ".")]
            pub fn $plain<'m>(&self, message: impl Into<Message<'m>>) {
                self.log(Level::$level, message);
            }

            #[doc = concat!("Emit a printf-style template at ", stringify!($level), ".")]
            pub fn $templated(&self, template: &str, args: &[FormatArg<'_>]) {
                self.log(Level::$level, Message::template(template, args.iter().cloned()));
            }

            #[doc = concat!("Start a line emitted at ", stringify!($level), " when dropped.")]
            pub fn $line(&self) -> LineBuilder<'_> {
                LineBuilder::new(self, Level::$level)
            }
        )*
    };
}

impl Logger {
    pub(crate) fn new(name: String, context: LogContext) -> Self {
        Self { name, context }
    }

    /// A logger bound to the process-wide context.
    pub fn get(name: impl Into<String>) -> Self {
        LogContext::global().logger(name)
    }

    /// Logger name, printed in every line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The context this logger writes through.
    pub fn context(&self) -> &LogContext {
        &self.context
    }

    /// Emit `message` at `level`.
    ///
    /// Templates are only rendered when the level passes the threshold.
    pub fn log<'m>(&self, level: Level, message: impl Into<Message<'m>>) {
        if !self.context.is_enabled(level) {
            return;
        }
        let message = message.into();
        self.context.emit(level, &self.name, &message.render());
    }

    /// Whether `level` currently passes the shared threshold.
    pub fn is_enabled(&self, level: Level) -> bool {
        self.context.is_enabled(level)
    }

    /// Change the shared threshold, affecting every logger of the context.
    pub fn set_level(&self, level: Level) {
        self.context.set_threshold(level);
    }

    /// Like [`Logger::set_level`], from a level name.
    pub fn set_level_name(&self, name: &str) -> Result<()> {
        self.set_level(Level::from_name(name)?);
        Ok(())
    }

    level_methods! {
        Debug => debug, debug_fmt, debug_line;
        Info => info, info_fmt, info_line;
        Warn => warn, warn_fmt, warn_line;
        Error => error, error_fmt, error_line;
        Fatal => fatal, fatal_fmt, fatal_line;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::log::CaptureBuffer;
    use keel_types::KeelError;

    struct Fixture {
        buffer: CaptureBuffer,
        logger: Logger,
    }

    impl Fixture {
        fn new() -> Self {
            let buffer = CaptureBuffer::new();
            let logger = LogContext::with_console(buffer.clone()).logger("TestLogger");
            Self { buffer, logger }
        }

        /// (level, name, message) of every captured line.
        fn messages(&self) -> Vec<(String, String, String)> {
            self.buffer
                .lines()
                .iter()
                .map(|line| {
                    let (_timestamp, rest) = line.split_once(' ').unwrap();
                    let (head, message) = rest.split_once(": ").unwrap();
                    let (level, name) = head.split_once(' ').unwrap();
                    (level.to_string(), name.to_string(), message.to_string())
                })
                .collect()
        }
    }

    #[test]
    fn test_logger_names() {
        let fx = Fixture::new();
        let logger2 = fx.logger.context().logger("TestLogger2");

        fx.logger.info("From logger 1");
        logger2.info("From logger 2");

        let messages = fx.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].1, "TestLogger");
        assert_eq!(messages[1].1, "TestLogger2");
    }

    #[test]
    fn test_message_text_and_level() {
        let fx = Fixture::new();
        fx.logger.set_level(Level::Debug);

        fx.logger.debug("Debug message");
        fx.logger.info("Info message");
        fx.logger.warn("Warn message");
        fx.logger.error("Error message");
        fx.logger.fatal("Fatal message");
        fx.logger.debug_fmt("Debug message with %d value", &args![15]);
        fx.logger.info_fmt("Info message with %d value", &args![15]);
        fx.logger.warn_fmt("Warn message with %d value", &args![15]);
        fx.logger.error_fmt("Error message with %d value", &args![15]);
        fx.logger.fatal_fmt("Fatal message with %d value", &args![15]);
        fx.logger.debug_line().append("Debug message with ").append(15).append(" value");
        fx.logger.info_line().append("Info message with ").append(15).append(" value");
        fx.logger.warn_line().append("Warn message with ").append(15).append(" value");
        fx.logger.error_line().append("Error message with ").append(15).append(" value");
        fx.logger.fatal_line().append("Fatal message with ").append(15).append(" value");

        let messages = fx.messages();
        assert_eq!(messages.len(), 15);
        let expected = ["DEBUG", "INFO", "WARN", "ERROR", "FATAL"];
        let words = ["Debug", "Info", "Warn", "Error", "Fatal"];
        for (i, (level, _, message)) in messages.iter().enumerate() {
            assert_eq!(level, expected[i % 5]);
            if i < 5 {
                assert_eq!(message, &format!("{} message", words[i]));
            } else {
                assert_eq!(message, &format!("{} message with 15 value", words[i % 5]));
            }
        }
    }

    #[test]
    fn test_level_is_shared_between_loggers() {
        let fx = Fixture::new();
        let other = fx.logger.context().logger("Other");

        other.set_level(Level::Error);
        fx.logger.warn("suppressed");
        fx.logger.error("visible");
        assert_eq!(fx.messages().len(), 1);

        fx.logger.set_level_name("debug").unwrap();
        other.debug("now visible");
        assert_eq!(fx.messages().len(), 2);
        assert_eq!(fx.messages()[1], ("DEBUG".into(), "Other".into(), "now visible".into()));
    }

    #[test]
    fn test_same_name_loggers_are_independent_handles() {
        let fx = Fixture::new();
        let twin = fx.logger.context().logger("TestLogger");
        twin.info("twin");
        fx.logger.info("original");
        let names: Vec<String> = fx.messages().into_iter().map(|m| m.1).collect();
        assert_eq!(names, vec!["TestLogger", "TestLogger"]);
    }

    #[test]
    fn test_set_level_name_rejects_unknown() {
        let fx = Fixture::new();
        let err = fx.logger.set_level_name("VERBOSE").unwrap_err();
        assert!(matches!(err, KeelError::UnrecognizedLevel(ref n) if n == "VERBOSE"));
        assert_eq!(fx.logger.context().threshold(), Level::Info);
    }

    #[test]
    fn test_fatal_does_not_terminate() {
        let fx = Fixture::new();
        fx.logger.fatal("still running");
        fx.logger.info("after fatal");
        assert_eq!(fx.messages().len(), 2);
    }

    #[test]
    fn test_global_logger_shares_context() {
        let a = Logger::get("A");
        let b = Logger::get("B");
        assert_eq!(a.context().threshold(), b.context().threshold());
    }
}
