#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging/src/lib.rs
//!
//! # Overview
//!
//! `logging` is the message engine of the scriptlog workspace: it decides
//! whether a record is emitted, cuts its text into syslog-safe physical lines,
//! formats each line with the caller's process, module, function and line, and
//! hands the result to a [`Transport`].
//!
//! # Design
//!
//! - [`Severity`] ranks records from [`Severity::None`] to
//!   [`Severity::Debug`]; [`should_emit`] is the level policy.
//! - [`wrap`] turns text into physical lines according to a [`WrapConfig`].
//! - [`Emitter`] combines the two with a [`LoggerConfig`] and a transport.
//!   The configuration is an explicit value, never ambient state, so several
//!   emitters can coexist in one process.
//! - Concrete transports (syslog, the `logger` command, plain writers) live in
//!   the `logging-sink` crate; [`MemoryTransport`] is provided here for tests
//!   and inspection.
//!
//! # Invariants
//!
//! - A record is either gated out entirely or every one of its physical lines
//!   is handed to the transport, one call per line, in order.
//! - The first physical line of a record is never indented; every later one
//!   starts with the indent marker.
//! - Logging never fails from the caller's perspective.
//!
//! # Errors
//!
//! Only configuration can fail: [`LoggerConfig::from_env`] reports missing or
//! malformed variables as [`ConfigError`], and an unknown configured maximum
//! severity is one of them.
//!
//! # Examples
//!
//! ```
//! use logging::{EchoPolicy, Emitter, LoggerConfig, MemoryTransport, Severity, info};
//!
//! let config = LoggerConfig::new(4242, "backup.sh", "backup", Severity::Info);
//! let emitter = Emitter::with_echo(config, MemoryTransport::new(), Vec::new());
//!
//! info!(emitter, "archived {} files", 12);
//!
//! let lines = emitter.transport().lines();
//! assert_eq!(lines.len(), 1);
//! assert!(lines[0].starts_with("INFO (PID: 4242 , MN: backup.sh , FN: main , LI: "));
//! assert!(lines[0].ends_with("):    archived 12 files"));
//! ```
//!
//! # See also
//!
//! - `logging-sink` for the syslog and `logger(1)` transports.
//! - `lifecycle` for the crash trap and exit coordinator built on [`Emitter`].

mod config;
mod emitter;
mod macros;
mod record;
mod severity;
mod transport;
#[cfg(feature = "tracing-bridge")]
mod tracing_bridge;
mod wrap;

pub use config::{
    ConfigError, ENV_EXPAND_ESCAPES, ENV_INDENT, ENV_LEVEL, ENV_MAX_LINE, ENV_MODULE, ENV_PID,
    ENV_TAG, LoggerConfig, parse_flag,
};
pub use emitter::{EchoPolicy, Emitter, ParseEchoPolicyError};
pub use record::{CallSite, LogRecord, MISSING_TEXT_PLACEHOLDER, UNKNOWN_FUNCTION};
pub use severity::{ALL_SEVERITIES, ParseSeverityError, Severity, should_emit};
#[cfg(feature = "tracing-bridge")]
pub use tracing_bridge::ScriptLogLayer;
pub use transport::{MemoryTransport, SentLine, Transport};
pub use wrap::{
    DEFAULT_CONTINUATION_TAG, DEFAULT_INDENT_MARKER, DEFAULT_MAX_LINE_LENGTH, WrapConfig, wrap,
};
