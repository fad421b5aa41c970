//! crates/logging-sink/src/logger_command.rs
//! Transport that hands every line to the `logger(1)` utility.

use std::ffi::OsString;
use std::io;
use std::process::{Command, Stdio};

use logging::{Severity, Transport};

use crate::syslog::SyslogFacility;

/// Program spawned when no other path is configured.
pub const DEFAULT_LOGGER_PROGRAM: &str = "logger";

/// [`Transport`] that runs `logger -t TAG -p FACILITY.LEVEL -- LINE` once per line.
///
/// Slower than [`SyslogTransport`](crate::syslog::SyslogTransport) but works
/// where the caller has no direct access to the syslog socket, or where the
/// local `logger` forwards to a remote collector.
#[derive(Clone, Debug)]
pub struct LoggerCommandTransport {
    program: OsString,
    facility: SyslogFacility,
}

impl LoggerCommandTransport {
    /// Uses [`DEFAULT_LOGGER_PROGRAM`] under the user facility.
    pub fn new() -> Self {
        Self::with_program(DEFAULT_LOGGER_PROGRAM)
    }

    /// Uses an explicit program path.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            facility: SyslogFacility::default(),
        }
    }

    /// Replaces the facility passed with `-p`.
    #[must_use]
    pub const fn with_facility(mut self, facility: SyslogFacility) -> Self {
        self.facility = facility;
        self
    }

    /// Builds the command for one line without running it.
    pub fn command(&self, severity: Severity, tag: &str, line: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-t")
            .arg(tag)
            .arg("-p")
            .arg(format!("{}.{}", self.facility, level_name(severity)))
            .arg("--")
            .arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Default for LoggerCommandTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LoggerCommandTransport {
    fn send(&self, severity: Severity, tag: &str, line: &str) -> io::Result<()> {
        let status = self.command(severity, tag, line).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "{} exited with {status}",
                self.program.to_string_lossy()
            )))
        }
    }
}

const fn level_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "crit",
        Severity::Error => "err",
        Severity::Warning => "warning",
        Severity::Info => "info",
        Severity::None | Severity::Debug => "debug",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(command: &Command) -> Vec<String> {
        command
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn command_line_carries_tag_priority_and_text() {
        let transport = LoggerCommandTransport::new().with_facility(SyslogFacility::Local2);
        let command = transport.command(Severity::Warning, "deploy", "-rf looks like a flag");
        assert_eq!(command.get_program(), DEFAULT_LOGGER_PROGRAM);
        assert_eq!(
            args(&command),
            ["-t", "deploy", "-p", "local2.warning", "--", "-rf looks like a flag"]
        );
    }

    #[test]
    fn critical_maps_to_crit() {
        let command = LoggerCommandTransport::new().command(Severity::Critical, "t", "x");
        assert!(args(&command).contains(&"user.crit".to_owned()));
    }

    #[test]
    fn successful_program_is_ok() {
        let transport = LoggerCommandTransport::with_program("true");
        assert!(transport.send(Severity::Info, "t", "line").is_ok());
    }

    #[test]
    fn failing_program_is_reported() {
        let transport = LoggerCommandTransport::with_program("false");
        let error = transport.send(Severity::Info, "t", "line").unwrap_err();
        assert!(error.to_string().starts_with("false exited with"));
    }

    #[test]
    fn missing_program_is_reported() {
        let transport = LoggerCommandTransport::with_program("/nonexistent/scriptlog-logger");
        assert!(transport.send(Severity::Info, "t", "line").is_err());
    }
}
