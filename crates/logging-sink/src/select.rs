//! crates/logging-sink/src/select.rs
//! Run-time choice of transport backend.

use std::fmt;
use std::io;
use std::str::FromStr;

use logging::Transport;

#[cfg(unix)]
use crate::logger_command::LoggerCommandTransport;
#[cfg(unix)]
use crate::syslog::{SyslogFacility, SyslogTransport};
use crate::writer::WriterTransport;

/// Variable naming the backend: `syslog`, `logger` or `stderr`.
pub const ENV_TRANSPORT: &str = "SCRIPTLOG_TRANSPORT";

/// Backends selectable at run time.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TransportKind {
    /// syslog(3) on the local daemon.
    Syslog,
    /// One `logger(1)` invocation per line.
    Logger,
    /// `TAG: LINE` on standard error.
    Stderr,
}

impl TransportKind {
    /// Spelling used in [`ENV_TRANSPORT`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Syslog => "syslog",
            Self::Logger => "logger",
            Self::Stderr => "stderr",
        }
    }

    /// Opens the selected backend under `tag`.
    ///
    /// On platforms without syslog every kind falls back to standard error.
    pub fn open(self, tag: &str) -> io::Result<Box<dyn Transport + Send + Sync>> {
        match self {
            #[cfg(unix)]
            Self::Syslog => Ok(Box::new(SyslogTransport::open(tag, SyslogFacility::User)?)),
            #[cfg(unix)]
            Self::Logger => Ok(Box::new(LoggerCommandTransport::new())),
            #[cfg(not(unix))]
            Self::Syslog | Self::Logger => {
                let _ = tag;
                Ok(Box::new(WriterTransport::stderr()))
            }
            Self::Stderr => Ok(Box::new(WriterTransport::stderr())),
        }
    }
}

impl Default for TransportKind {
    fn default() -> Self {
        if cfg!(unix) { Self::Syslog } else { Self::Stderr }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no transport backend.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown transport '{0}' (expected syslog, logger or stderr)")]
pub struct ParseTransportKindError(String);

impl FromStr for TransportKind {
    type Err = ParseTransportKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "syslog" => Ok(Self::Syslog),
            "logger" => Ok(Self::Logger),
            "stderr" => Ok(Self::Stderr),
            _ => Err(ParseTransportKindError(s.to_owned())),
        }
    }
}
