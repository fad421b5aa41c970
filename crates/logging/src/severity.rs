//! crates/logging/src/severity.rs
//! Severity ranks and the gating decision applied before anything reaches a transport.

use std::fmt;
use std::str::FromStr;

/// Severity of a log record, ordered from "never log" to most permissive.
///
/// The declaration order is the rank order: [`Severity::None`] is rank 0 and
/// [`Severity::Debug`] rank 5. Comparison always goes through [`Severity::rank`]
/// rather than the textual label.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Severity {
    /// Never log. As a configured maximum it silences everything.
    None,
    /// The process cannot continue.
    Critical,
    /// An operation failed.
    Error,
    /// Something unexpected that the script tolerates.
    Warning,
    /// Normal progress reporting.
    Info,
    /// Developer detail.
    Debug,
}

/// Every severity in rank order.
pub const ALL_SEVERITIES: [Severity; 6] = [
    Severity::None,
    Severity::Critical,
    Severity::Error,
    Severity::Warning,
    Severity::Info,
    Severity::Debug,
];

impl Severity {
    /// Returns the numeric rank, `0` for [`Severity::None`] up to `5` for [`Severity::Debug`].
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Critical => 1,
            Self::Error => 2,
            Self::Warning => 3,
            Self::Info => 4,
            Self::Debug => 5,
        }
    }

    /// Returns the upper-case tag rendered at the start of every formatted record.
    ///
    /// # Examples
    ///
    /// ```
    /// use logging::Severity;
    ///
    /// assert_eq!(Severity::Warning.as_upper(), "WARNING");
    /// assert_eq!(Severity::Critical.as_upper(), "CRITICAL");
    /// ```
    #[must_use]
    pub const fn as_upper(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    /// Returns the lower-case label accepted on input and used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }

    /// Parses a record severity, collapsing anything unrecognised to [`Severity::Error`].
    ///
    /// Misuse at a call site therefore shows up loudly in the log instead of
    /// disappearing. Configured maxima must go through [`FromStr`] instead so a
    /// typo is reported at startup.
    ///
    /// # Examples
    ///
    /// ```
    /// use logging::Severity;
    ///
    /// assert_eq!(Severity::parse_lossy("debug"), Severity::Debug);
    /// assert_eq!(Severity::parse_lossy("Info"), Severity::Info);
    /// assert_eq!(Severity::parse_lossy("verbose"), Severity::Error);
    /// ```
    #[must_use]
    pub fn parse_lossy(input: &str) -> Self {
        input.parse().unwrap_or(Self::Error)
    }

    /// Reports whether a record at `record` passes a logger configured with `self` as maximum.
    ///
    /// This is the whole level policy:
    ///
    /// | configured | allowed records                          |
    /// |------------|------------------------------------------|
    /// | NONE       | none                                     |
    /// | CRITICAL   | CRITICAL                                 |
    /// | ERROR      | CRITICAL, ERROR                          |
    /// | WARNING    | CRITICAL, ERROR, WARNING                 |
    /// | INFO       | CRITICAL, ERROR, WARNING, INFO           |
    /// | DEBUG      | CRITICAL, ERROR, WARNING, INFO, DEBUG    |
    ///
    /// A record tagged [`Severity::None`] is never emitted.
    #[must_use]
    pub const fn allows(self, record: Self) -> bool {
        should_emit(self, record)
    }
}

/// Gating decision between a configured maximum and a record's severity.
///
/// # Examples
///
/// ```
/// use logging::{Severity, should_emit};
///
/// assert!(should_emit(Severity::Warning, Severity::Error));
/// assert!(!should_emit(Severity::Warning, Severity::Info));
/// assert!(!should_emit(Severity::None, Severity::Critical));
/// ```
#[must_use]
pub const fn should_emit(configured_max: Severity, record: Severity) -> bool {
    let record_rank = record.rank();
    record_rank != 0 && record_rank <= configured_max.rank()
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

/// Error returned when a string names no known severity.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unrecognised severity '{input}' (expected one of none, critical, error, warning, info, debug)")]
pub struct ParseSeverityError {
    input: String,
}

impl ParseSeverityError {
    /// Returns the rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "critical" => Ok(Self::Critical),
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(ParseSeverityError {
                input: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_declaration_order() {
        for pair in ALL_SEVERITIES.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("DEBUG".parse::<Severity>(), Ok(Severity::Debug));
        assert_eq!("Warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!(" none ".parse::<Severity>(), Ok(Severity::None));
    }

    #[test]
    fn strict_parse_reports_input() {
        let error = "warn".parse::<Severity>().unwrap_err();
        assert_eq!(error.input(), "warn");
        assert!(error.to_string().contains("'warn'"));
    }

    #[test]
    fn lossy_parse_collapses_to_error() {
        assert_eq!(Severity::parse_lossy(""), Severity::Error);
        assert_eq!(Severity::parse_lossy("fatal"), Severity::Error);
        assert_eq!(Severity::parse_lossy("CRITICAL"), Severity::Critical);
    }

    #[test]
    fn display_is_upper_case() {
        assert_eq!(Severity::Info.to_string(), "INFO");
        assert_eq!(Severity::None.to_string(), "NONE");
    }

    #[test]
    fn none_record_is_never_emitted() {
        for configured in ALL_SEVERITIES {
            assert!(!should_emit(configured, Severity::None));
        }
    }
}
