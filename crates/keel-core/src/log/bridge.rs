//! Bridge from the `tracing` ecosystem into Keel sinks.
//!
//! [`KeelLayer`] forwards every `tracing` event to a [`LogContext`], using the
//! event target as the logger name. `TRACE` folds into `DEBUG`, the lowest
//! Keel level. Extra event fields are appended as `key=value` pairs after
//! the message.

use super::context::LogContext;
use keel_types::Level;
use std::fmt::{self, Write as _};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// A tracing-subscriber layer writing events through a [`LogContext`].
#[derive(Debug, Clone)]
pub struct KeelLayer {
    context: LogContext,
}

impl KeelLayer {
    /// Create a layer writing through `context`.
    pub fn new(context: LogContext) -> Self {
        Self { context }
    }

    fn map_level(level: &tracing::Level) -> Level {
        match *level {
            tracing::Level::ERROR => Level::Error,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::INFO => Level::Info,
            _ => Level::Debug,
        }
    }
}

impl<S> Layer<S> for KeelLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = Self::map_level(metadata.level());
        if !self.context.is_enabled(level) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.context.emit(level, metadata.target(), &visitor.finish());
    }
}

/// Collects the message and the remaining fields of an event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        if self.message.is_empty() {
            self.fields.trim_start().to_string()
        } else {
            format!("{}{}", self.message, self.fields)
        }
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

/// Install [`KeelLayer`] as the global `tracing` subscriber.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_tracing(context: LogContext) -> bool {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(KeelLayer::new(context))
        .try_init()
        .is_ok()
}
