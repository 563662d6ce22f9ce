//! Shared sink registry: console sink, optional file sink, and threshold.

use super::logger::Logger;
use chrono::Local;
use keel_types::{KeelError, Level, Result};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::borrow::Cow;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Console writer handed to a [`LogContext`].
pub type ConsoleWriter = Box<dyn Write + Send>;

struct FileSink {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

struct SinkState {
    threshold: Level,
    console: Mutex<ConsoleWriter>,
    file: Option<FileSink>,
}

/// Handle to a set of log sinks and the active threshold.
///
/// Cloning is cheap and every clone addresses the same state: a threshold
/// change or file sink switch made through one handle is seen by every
/// logger created from any clone, on its very next call.
///
/// Emission takes a read lock, so loggers on several threads can emit
/// concurrently; `set_threshold` and `set_file_sink` take the write lock.
#[derive(Clone)]
pub struct LogContext {
    inner: Arc<RwLock<SinkState>>,
}

impl LogContext {
    /// A context writing to standard error with an INFO threshold.
    pub fn new() -> Self {
        Self::with_console(io::stderr())
    }

    /// A context whose console sink is `writer`.
    pub fn with_console(writer: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SinkState {
                threshold: Level::Info,
                console: Mutex::new(Box::new(writer)),
                file: None,
            })),
        }
    }

    /// The process-wide context, created on first use.
    pub fn global() -> LogContext {
        static INSTANCE: Lazy<LogContext> = Lazy::new(LogContext::new);
        INSTANCE.clone()
    }

    /// A named logger bound to this context.
    pub fn logger(&self, name: impl Into<String>) -> Logger {
        Logger::new(name.into(), self.clone())
    }

    /// Active threshold.
    pub fn threshold(&self) -> Level {
        self.inner.read().threshold
    }

    /// Replace the active threshold.
    pub fn set_threshold(&self, level: Level) {
        self.inner.write().threshold = level;
    }

    /// Whether a message at `level` would currently be emitted.
    pub fn is_enabled(&self, level: Level) -> bool {
        self.threshold().admits(level)
    }

    /// Path of the active file sink, if any.
    pub fn file_sink(&self) -> Option<PathBuf> {
        self.inner.read().file.as_ref().map(|f| f.path.clone())
    }

    /// Switch the file sink.
    ///
    /// Any active file sink is flushed and closed first. `None` or an empty
    /// path leaves only the console. Otherwise the file is opened in append
    /// mode, created if missing. On failure the console keeps working and no
    /// file sink is attached.
    pub fn set_file_sink(&self, path: Option<&Path>) -> Result<()> {
        let mut state = self.inner.write();
        if let Some(previous) = state.file.take() {
            let _ = previous.writer.lock().flush();
        }

        let path = match path {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Ok(()),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| KeelError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        state.file = Some(FileSink {
            path: path.to_path_buf(),
            writer: Mutex::new(LineWriter::new(file)),
        });
        Ok(())
    }

    /// Detach the file sink, leaving only the console.
    pub fn clear_file_sink(&self) {
        // Detaching never opens a file, so it cannot fail.
        let _ = self.set_file_sink(None);
    }

    /// Render and write one line if `level` passes the threshold.
    ///
    /// Both sinks receive the identical line. Write failures are dropped:
    /// logging never fails the caller.
    pub fn emit(&self, level: Level, logger_name: &str, message: &str) {
        let state = self.inner.read();
        if !state.threshold.admits(level) {
            return;
        }

        let line = render_line(level, logger_name, message);

        {
            let mut console = state.console.lock();
            let _ = console.write_all(line.as_bytes());
            let _ = console.flush();
        }
        if let Some(file) = &state.file {
            let _ = file.writer.lock().write_all(line.as_bytes());
        }
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.read();
        f.debug_struct("LogContext")
            .field("threshold", &state.threshold)
            .field("file_sink", &state.file.as_ref().map(|s| &s.path))
            .finish()
    }
}

/// `<timestamp> <LEVEL> <loggerName>: <message>` plus the newline.
///
/// Line breaks inside the message are written as `\n` and `\r` so that
/// every emission stays one physical line.
fn render_line(level: Level, logger_name: &str, message: &str) -> String {
    let message: Cow<'_, str> = if message.contains(['\n', '\r']) {
        Cow::Owned(message.replace('\r', "\\r").replace('\n', "\\n"))
    } else {
        Cow::Borrowed(message)
    };
    format!(
        "{} {} {}: {}\n",
        Local::now().format("%Y-%m-%dT%H:%M:%S%:z"),
        level.name(),
        logger_name,
        message
    )
}

/// In-memory console sink, shareable between a context and a test.
///
/// # Example
///
/// ```
/// use keel_core::log::{CaptureBuffer, LogContext};
///
/// let buffer = CaptureBuffer::new();
/// let ctx = LogContext::with_console(buffer.clone());
/// ctx.logger("demo").info("hello");
/// assert!(buffer.contents().ends_with("INFO demo: hello\n"));
/// ```
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Written lines, without their terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Discard the captured output.
    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
