#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/logging-sink/src/lib.rs
//!
//! # Overview
//!
//! `logging-sink` provides the concrete [`logging::Transport`] backends used by
//! scriptlog: the local syslog daemon through syslog(3), the `logger(1)`
//! command for hosts where a child process is preferred, and any
//! [`std::io::Write`] implementor for tests and containers without syslog.
//!
//! # Design
//!
//! Each backend accepts one already formatted physical line per call. None of
//! them wraps, filters or reformats; that is the emitter's job. The
//! [`TransportKind`] selector turns the `SCRIPTLOG_TRANSPORT` setting into a
//! boxed transport so callers need not name the backend type.
//!
//! # Invariants
//!
//! - Lines reach the backend in the order `send` is called.
//! - A backend failure is returned to the emitter, never raised as a panic.
//!
//! # Errors
//!
//! All operations surface [`std::io::Error`] values from the underlying
//! socket, child process, or writer.
//!
//! # Examples
//!
//! ```
//! use logging::{Severity, Transport};
//! use logging_sink::WriterTransport;
//!
//! let transport = WriterTransport::new(Vec::new());
//! transport.send(Severity::Info, "backup", "INFO (PID: 1 , MN: m , FN: f , LI: 2):    done").unwrap();
//! let written = String::from_utf8(transport.into_inner()).unwrap();
//! assert_eq!(written, "backup: INFO (PID: 1 , MN: m , FN: f , LI: 2):    done\n");
//! ```
//!
//! # See also
//!
//! - `logging` for the emitter that drives these transports.

#[cfg(unix)]
mod logger_command;
mod select;
#[cfg(unix)]
#[allow(unsafe_code)]
pub mod syslog;
mod writer;

#[cfg(unix)]
pub use logger_command::{DEFAULT_LOGGER_PROGRAM, LoggerCommandTransport};
pub use select::{ENV_TRANSPORT, ParseTransportKindError, TransportKind};
pub use writer::WriterTransport;
