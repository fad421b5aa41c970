//! crates/logging/src/transport.rs
//! The seam between the emitter and whatever durably records a line.

use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};

use crate::severity::Severity;

/// Durable destination for formatted physical lines (syslog or an equivalent).
///
/// The emitter calls [`send`](Self::send) once per physical line, in order,
/// and blocks until it returns. Errors are reported back so the emitter can
/// note them on its diagnostic channel; they never reach the logging caller.
pub trait Transport {
    /// Records one formatted line under the program `tag`.
    ///
    /// `severity` is the record's severity so backends with a native priority
    /// (syslog) can map it.
    fn send(&self, severity: Severity, tag: &str, line: &str) -> io::Result<()>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, severity: Severity, tag: &str, line: &str) -> io::Result<()> {
        (**self).send(severity, tag, line)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, severity: Severity, tag: &str, line: &str) -> io::Result<()> {
        (**self).send(severity, tag, line)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, severity: Severity, tag: &str, line: &str) -> io::Result<()> {
        (**self).send(severity, tag, line)
    }
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(&self, severity: Severity, tag: &str, line: &str) -> io::Result<()> {
        (**self).send(severity, tag, line)
    }
}

/// A line as it was handed to a [`MemoryTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SentLine {
    /// Severity of the originating record.
    pub severity: Severity,
    /// Program tag.
    pub tag: String,
    /// Fully formatted line.
    pub line: String,
}

/// Transport that keeps every line in memory.
///
/// Used by tests and by hosts that want to inspect what would have been sent.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<SentLine>>,
}

impl MemoryTransport {
    /// Creates an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines received so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been received.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies out every received line.
    #[must_use]
    pub fn sent(&self) -> Vec<SentLine> {
        self.lock().clone()
    }

    /// Copies out only the formatted lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(|sent| sent.line.clone()).collect()
    }

    /// Removes and returns every received line.
    pub fn drain(&self) -> Vec<SentLine> {
        self.lock().drain(..).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SentLine>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn send(&self, severity: Severity, tag: &str, line: &str) -> io::Result<()> {
        self.lock().push(SentLine {
            severity,
            tag: tag.to_owned(),
            line: line.to_owned(),
        });
        Ok(())
    }
}
