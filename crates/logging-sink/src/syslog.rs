//! crates/logging-sink/src/syslog.rs
//! Syslog backend for script logging.
//!
//! Talks to the local syslog daemon through libc `openlog`/`syslog`/`closelog`
//! instead of a dedicated syslog crate. The process id is not added by syslog
//! itself: every formatted record already carries the pid of the script it was
//! logged for, which usually differs from the pid of this process.

use std::ffi::CString;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::OnceLock;

use logging::{Severity, Transport};

/// Syslog facility codes matching the POSIX syslog(3) constants.
///
/// Scripts log under [`SyslogFacility::User`] unless told otherwise.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[repr(i32)]
pub enum SyslogFacility {
    /// User-level messages (LOG_USER).
    #[default]
    User = libc::LOG_USER,
    /// System daemons (LOG_DAEMON).
    Daemon = libc::LOG_DAEMON,
    /// Security/authorization messages (LOG_AUTH).
    Auth = libc::LOG_AUTH,
    /// Clock daemon (LOG_CRON), for scripts started from crontabs.
    Cron = libc::LOG_CRON,
    /// Reserved for local use (LOG_LOCAL0).
    Local0 = libc::LOG_LOCAL0,
    /// Reserved for local use (LOG_LOCAL1).
    Local1 = libc::LOG_LOCAL1,
    /// Reserved for local use (LOG_LOCAL2).
    Local2 = libc::LOG_LOCAL2,
    /// Reserved for local use (LOG_LOCAL3).
    Local3 = libc::LOG_LOCAL3,
    /// Reserved for local use (LOG_LOCAL4).
    Local4 = libc::LOG_LOCAL4,
    /// Reserved for local use (LOG_LOCAL5).
    Local5 = libc::LOG_LOCAL5,
    /// Reserved for local use (LOG_LOCAL6).
    Local6 = libc::LOG_LOCAL6,
    /// Reserved for local use (LOG_LOCAL7).
    Local7 = libc::LOG_LOCAL7,
}

const FACILITIES: [SyslogFacility; 12] = [
    SyslogFacility::User,
    SyslogFacility::Daemon,
    SyslogFacility::Auth,
    SyslogFacility::Cron,
    SyslogFacility::Local0,
    SyslogFacility::Local1,
    SyslogFacility::Local2,
    SyslogFacility::Local3,
    SyslogFacility::Local4,
    SyslogFacility::Local5,
    SyslogFacility::Local6,
    SyslogFacility::Local7,
];

impl SyslogFacility {
    /// Name as understood by syslog.conf and `logger -p`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Daemon => "daemon",
            Self::Auth => "auth",
            Self::Cron => "cron",
            Self::Local0 => "local0",
            Self::Local1 => "local1",
            Self::Local2 => "local2",
            Self::Local3 => "local3",
            Self::Local4 => "local4",
            Self::Local5 => "local5",
            Self::Local6 => "local6",
            Self::Local7 => "local7",
        }
    }
}

impl fmt::Display for SyslogFacility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no supported facility.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unsupported syslog facility '{0}'")]
pub struct ParseFacilityError(String);

impl FromStr for SyslogFacility {
    type Err = ParseFacilityError;

    /// Parses a case-insensitive facility name.
    ///
    /// ```
    /// use logging_sink::syslog::SyslogFacility;
    ///
    /// assert_eq!("LOCAL3".parse(), Ok(SyslogFacility::Local3));
    /// assert!("kern".parse::<SyslogFacility>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FACILITIES
            .into_iter()
            .find(|facility| facility.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseFacilityError(s.to_owned()))
    }
}

/// Maps a record severity onto a syslog(3) priority.
///
/// [`Severity::None`] never reaches a transport; it maps to `LOG_DEBUG` so the
/// function stays total.
pub const fn priority_for(severity: Severity) -> libc::c_int {
    match severity {
        Severity::Critical => libc::LOG_CRIT,
        Severity::Error => libc::LOG_ERR,
        Severity::Warning => libc::LOG_WARNING,
        Severity::Info => libc::LOG_INFO,
        Severity::None | Severity::Debug => libc::LOG_DEBUG,
    }
}

/// RAII handle on the process-wide syslog connection.
///
/// Dropping the guard calls `closelog(3)`.
#[derive(Debug)]
pub struct SyslogGuard {
    _private: (),
}

impl Drop for SyslogGuard {
    fn drop(&mut self) {
        // SAFETY: closelog has no preconditions beyond a prior openlog, which
        // constructing the guard guarantees.
        unsafe {
            libc::closelog();
        }
    }
}

/// Opens the syslog connection under `tag` and `facility`.
///
/// syslog(3) keeps the ident pointer, so the first tag opened in a process is
/// kept for the process lifetime; later calls reuse it.
pub fn open(tag: &str, facility: SyslogFacility) -> io::Result<SyslogGuard> {
    static IDENT: OnceLock<CString> = OnceLock::new();

    let requested = CString::new(tag)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "syslog tag contains NUL"))?;
    let ident = IDENT.get_or_init(|| requested);
    if ident.as_bytes() != tag.as_bytes() {
        tracing::debug!(
            requested = tag,
            active = %ident.to_string_lossy(),
            "syslog ident already set for this process"
        );
    }

    // SAFETY: the ident pointer lives in a static for the process lifetime.
    // openlog is called before the transport is shared across threads.
    unsafe {
        libc::openlog(ident.as_ptr(), libc::LOG_NDELAY, facility as libc::c_int);
    }

    Ok(SyslogGuard { _private: () })
}

/// Sends one line to syslog(3) at `priority`.
///
/// Embedded NUL bytes would truncate the C string, so they are rendered as
/// `\0` instead.
pub fn send_line(priority: libc::c_int, line: &str) {
    let message = if line.contains('\0') {
        CString::new(line.replace('\0', "\\0"))
    } else {
        CString::new(line)
    };
    let Ok(message) = message else {
        return;
    };

    // SAFETY: both pointers are valid NUL-terminated strings; "%s" keeps any
    // `%` in the message from being read as a conversion.
    unsafe {
        libc::syslog(priority, c"%s".as_ptr(), message.as_ptr());
    }
}

/// [`Transport`] writing to the local syslog daemon.
///
/// ```no_run
/// use logging::{Severity, Transport};
/// use logging_sink::syslog::{SyslogFacility, SyslogTransport};
///
/// let transport = SyslogTransport::open("nightly-backup", SyslogFacility::User)?;
/// transport.send(Severity::Info, "nightly-backup", "INFO (PID: 1 , MN: m , FN: f , LI: 2):    ok")?;
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct SyslogTransport {
    facility: SyslogFacility,
    _guard: SyslogGuard,
}

impl SyslogTransport {
    /// Opens syslog under `tag` and returns a transport bound to it.
    pub fn open(tag: &str, facility: SyslogFacility) -> io::Result<Self> {
        Ok(Self {
            facility,
            _guard: open(tag, facility)?,
        })
    }

    /// Facility the connection was opened with.
    pub const fn facility(&self) -> SyslogFacility {
        self.facility
    }
}

impl Transport for SyslogTransport {
    fn send(&self, severity: Severity, _tag: &str, line: &str) -> io::Result<()> {
        send_line(priority_for(severity) | self.facility as libc::c_int, line);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_facility_is_user() {
        assert_eq!(SyslogFacility::default(), SyslogFacility::User);
    }

    #[test]
    fn facility_names_round_trip() {
        for facility in FACILITIES {
            assert_eq!(facility.as_str().parse(), Ok(facility));
            assert_eq!(facility.to_string(), facility.as_str());
        }
    }

    #[test]
    fn facility_parsing_ignores_case() {
        assert_eq!("Cron".parse(), Ok(SyslogFacility::Cron));
        assert_eq!(" local7 ".parse(), Ok(SyslogFacility::Local7));
        assert!("local8".parse::<SyslogFacility>().is_err());
    }

    #[test]
    fn facility_values_match_libc_constants() {
        assert_eq!(SyslogFacility::User as i32, libc::LOG_USER);
        assert_eq!(SyslogFacility::Cron as i32, libc::LOG_CRON);
        assert_eq!(SyslogFacility::Local0 as i32, libc::LOG_LOCAL0);
    }

    #[test]
    fn priorities_follow_severity() {
        assert_eq!(priority_for(Severity::Critical), libc::LOG_CRIT);
        assert_eq!(priority_for(Severity::Error), libc::LOG_ERR);
        assert_eq!(priority_for(Severity::Warning), libc::LOG_WARNING);
        assert_eq!(priority_for(Severity::Info), libc::LOG_INFO);
        assert_eq!(priority_for(Severity::Debug), libc::LOG_DEBUG);
    }

    #[test]
    fn nul_in_tag_is_rejected() {
        let error = SyslogTransport::open("bad\0tag", SyslogFacility::User).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn send_does_not_panic_on_awkward_text() {
        let transport = SyslogTransport::open("scriptlog-tests", SyslogFacility::User).unwrap();
        transport
            .send(Severity::Debug, "scriptlog-tests", "100% done, before\0after")
            .unwrap();
        transport.send(Severity::Debug, "scriptlog-tests", "").unwrap();
    }
}
