//! crates/logging/src/emitter.rs
//! Gates, wraps, formats and forwards one record at a time.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::config::LoggerConfig;
use crate::record::{CallSite, LogRecord, MISSING_TEXT_PLACEHOLDER};
use crate::severity::Severity;
use crate::transport::Transport;
use crate::wrap::wrap;

/// When a log call also writes its raw text to the interactive output stream.
///
/// The echo is the unprocessed text: no header, no wrapping, no indentation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum EchoPolicy {
    /// Never echo.
    #[default]
    Never,
    /// Echo only when the record passes the level gate.
    IfAllowed,
    /// Echo unconditionally, before the level gate is consulted.
    Always,
}

impl EchoPolicy {
    /// Returns the spelling accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::IfAllowed => "if-allowed",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for EchoPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no echo policy.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unrecognised echo policy '{0}' (expected never, if-allowed or always)")]
pub struct ParseEchoPolicyError(String);

impl FromStr for EchoPolicy {
    type Err = ParseEchoPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "if-allowed" | "ifallowed" | "if_allowed" => Ok(Self::IfAllowed),
            "always" => Ok(Self::Always),
            _ => Err(ParseEchoPolicyError(s.to_owned())),
        }
    }
}

/// Leveled, line-wrapping front end for a [`Transport`].
///
/// Logging through an emitter never fails from the caller's point of view:
/// transport and echo errors are absorbed. The first transport failure is
/// reported once through `tracing` so it can be seen on a diagnostic stream
/// without touching the primary log path.
///
/// # Examples
///
/// ```
/// use logging::{CallSite, EchoPolicy, Emitter, LoggerConfig, MemoryTransport, Severity};
///
/// let config = LoggerConfig::new(100, "deploy.sh", "deploy", Severity::Info);
/// let emitter = Emitter::with_echo(config, MemoryTransport::new(), Vec::new());
///
/// emitter.emit(Severity::Info, "hello\nworld", EchoPolicy::Never, &CallSite::new("main", 3));
/// emitter.emit(Severity::Debug, "hidden", EchoPolicy::Never, &CallSite::unknown());
///
/// let lines = emitter.transport().lines();
/// assert_eq!(lines.len(), 2);
/// assert!(lines[1].ends_with("        world"));
/// ```
#[derive(Debug)]
pub struct Emitter<T, W = io::Stdout> {
    config: LoggerConfig,
    transport: T,
    echo: Mutex<W>,
    transport_failed: AtomicBool,
}

impl<T> Emitter<T> {
    /// Creates an emitter that echoes to standard output.
    #[must_use]
    pub fn new(config: LoggerConfig, transport: T) -> Self {
        Self::with_echo(config, transport, io::stdout())
    }
}

impl<T, W> Emitter<T, W> {
    /// Creates an emitter with an explicit echo writer.
    #[must_use]
    pub fn with_echo(config: LoggerConfig, transport: T, echo: W) -> Self {
        Self {
            config,
            transport,
            echo: Mutex::new(echo),
            transport_failed: AtomicBool::new(false),
        }
    }

    /// Configuration the emitter was built with.
    #[must_use]
    pub const fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Borrows the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Consumes the emitter and returns the transport and echo writer.
    #[must_use]
    pub fn into_parts(self) -> (T, W) {
        let echo = self
            .echo
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        (self.transport, echo)
    }

    /// Reports whether a record at `severity` would reach the transport.
    #[must_use]
    pub const fn enabled(&self, severity: Severity) -> bool {
        self.config.max_severity.allows(severity)
    }

    /// Reports whether a transport call has failed since construction.
    #[must_use]
    pub fn transport_failed(&self) -> bool {
        self.transport_failed.load(Ordering::Relaxed)
    }
}

impl<T, W> Emitter<T, W>
where
    T: Transport,
    W: Write,
{
    /// Logs `text` at `severity` on behalf of `site`.
    ///
    /// With [`EchoPolicy::Always`] the raw text is echoed first, whatever the
    /// level. The record is then gated; if it passes, [`EchoPolicy::IfAllowed`]
    /// echoes, the text is wrapped, and each physical line goes to the
    /// transport as its own call, in order.
    pub fn emit(&self, severity: Severity, text: &str, echo: EchoPolicy, site: &CallSite) {
        let record = LogRecord::new(
            severity,
            text,
            self.config.process_id,
            &self.config.module_name,
            site,
        );
        self.dispatch(&record, echo);
    }

    /// Like [`emit`](Self::emit) but substitutes a placeholder when no text was supplied.
    pub fn emit_text(
        &self,
        severity: Severity,
        text: Option<&str>,
        echo: EchoPolicy,
        site: &CallSite,
    ) {
        self.emit(severity, text.unwrap_or(MISSING_TEXT_PLACEHOLDER), echo, site);
    }

    /// Sends an already constructed record.
    pub fn dispatch(&self, record: &LogRecord<'_>, echo: EchoPolicy) {
        if echo == EchoPolicy::Always {
            self.echo_raw(record.text());
        }

        if !self.enabled(record.severity()) {
            return;
        }

        if echo == EchoPolicy::IfAllowed {
            self.echo_raw(record.text());
        }

        for physical in wrap(record.text(), &self.config.wrap) {
            let line = record.format_line(&physical);
            if let Err(error) = self
                .transport
                .send(record.severity(), &self.config.tag, &line)
            {
                self.note_transport_failure(&error);
            }
        }
    }

    fn echo_raw(&self, text: &str) {
        let mut echo = self.echo.lock().unwrap_or_else(PoisonError::into_inner);
        let result = writeln!(echo, "{text}").and_then(|()| echo.flush());
        if let Err(error) = result {
            tracing::debug!(%error, "echo to interactive output failed");
        }
    }

    fn note_transport_failure(&self, error: &io::Error) {
        if !self.transport_failed.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                tag = %self.config.tag,
                %error,
                "log transport failed; further failures are not reported"
            );
        }
    }
}
