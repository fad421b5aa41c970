//! crates/logging-sink/src/writer.rs
//! Transport over any byte writer.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use logging::{Severity, Transport};

/// [`Transport`] that writes `TAG: LINE` to a [`Write`] implementor.
///
/// Used with standard error when no syslog daemon is reachable (containers,
/// CI runners) and with in-memory buffers in tests.
#[derive(Debug)]
pub struct WriterTransport<W> {
    writer: Mutex<W>,
}

impl<W> WriterTransport<W> {
    /// Wraps `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WriterTransport<io::Stderr> {
    /// Writes to the process's standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn send(&self, _severity: Severity, tag: &str, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{tag}: {line}")?;
        writer.flush()
    }
}
