//! crates/logging/src/config.rs
//! Explicit logger configuration and its loading from the caller's environment.

use std::ffi::OsString;
use std::num::NonZeroUsize;

use crate::severity::{ParseSeverityError, Severity};
use crate::wrap::WrapConfig;

/// Process id of the script being logged.
pub const ENV_PID: &str = "SCRIPTLOG_PID";
/// Module or script name.
pub const ENV_MODULE: &str = "SCRIPTLOG_MODULE";
/// Syslog program tag.
pub const ENV_TAG: &str = "SCRIPTLOG_TAG";
/// Configured maximum severity.
pub const ENV_LEVEL: &str = "SCRIPTLOG_LEVEL";
/// Maximum logical line length before wrapping.
pub const ENV_MAX_LINE: &str = "SCRIPTLOG_MAX_LINE";
/// Indent marker for continuation lines.
pub const ENV_INDENT: &str = "SCRIPTLOG_INDENT";
/// Whether `\n` escapes are expanded.
pub const ENV_EXPAND_ESCAPES: &str = "SCRIPTLOG_EXPAND_ESCAPES";

/// Error raised while assembling a [`LoggerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is not valid UTF-8.
    #[error("{0} is not valid UTF-8")]
    NotUnicode(&'static str),

    /// The configured maximum severity names no known level.
    #[error("{variable}: {source}")]
    InvalidLevel {
        /// Variable the value came from.
        variable: &'static str,
        /// Parse failure.
        #[source]
        source: ParseSeverityError,
    },

    /// A numeric variable could not be parsed or is out of range.
    #[error("{variable} must be {expected}, got '{value}'")]
    InvalidNumber {
        /// Variable the value came from.
        variable: &'static str,
        /// What an acceptable value looks like.
        expected: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Everything an [`Emitter`](crate::Emitter) needs to know about its caller.
///
/// Held by the emitter instead of being looked up from ambient state, so a
/// process may run several independent loggers.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LoggerConfig {
    /// Process the records are logged on behalf of.
    pub process_id: u32,
    /// Module or script name.
    pub module_name: String,
    /// Program tag handed to the transport.
    pub tag: String,
    /// Most permissive severity that still reaches the transport.
    pub max_severity: Severity,
    /// Line wrapping parameters.
    pub wrap: WrapConfig,
}

impl LoggerConfig {
    /// Creates a configuration with default wrapping.
    #[must_use]
    pub fn new(
        process_id: u32,
        module_name: impl Into<String>,
        tag: impl Into<String>,
        max_severity: Severity,
    ) -> Self {
        Self {
            process_id,
            module_name: module_name.into(),
            tag: tag.into(),
            max_severity,
            wrap: WrapConfig::default(),
        }
    }

    /// Replaces the wrapping parameters.
    #[must_use]
    pub fn with_wrap(mut self, wrap: WrapConfig) -> Self {
        self.wrap = wrap;
        self
    }

    /// Loads the configuration from the process environment.
    ///
    /// See [`from_lookup`](Self::from_lookup) for the variables consulted.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Loads the configuration through an arbitrary variable lookup.
    ///
    /// Required: [`ENV_PID`], [`ENV_MODULE`], [`ENV_TAG`], [`ENV_LEVEL`].
    /// Optional: [`ENV_MAX_LINE`], [`ENV_INDENT`], [`ENV_EXPAND_ESCAPES`].
    ///
    /// An unrecognised [`ENV_LEVEL`] is an error rather than a silent default,
    /// so a misconfigured script fails at startup instead of logging
    /// everything or nothing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let text = |name: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(name) {
                None => Ok(None),
                Some(value) if value.is_empty() => Ok(None),
                Some(value) => value
                    .into_string()
                    .map(Some)
                    .map_err(|_| ConfigError::NotUnicode(name)),
            }
        };
        let required =
            |name: &'static str| text(name)?.ok_or(ConfigError::Missing(name));

        let pid_text = required(ENV_PID)?;
        let process_id = pid_text
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber {
                variable: ENV_PID,
                expected: "a process id",
                value: pid_text.clone(),
            })?;
        let module_name = required(ENV_MODULE)?;
        let tag = required(ENV_TAG)?;
        let max_severity = required(ENV_LEVEL)?
            .parse::<Severity>()
            .map_err(|source| ConfigError::InvalidLevel {
                variable: ENV_LEVEL,
                source,
            })?;

        let mut wrap = WrapConfig::default();
        if let Some(max_text) = text(ENV_MAX_LINE)? {
            let max = max_text
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| ConfigError::InvalidNumber {
                    variable: ENV_MAX_LINE,
                    expected: "a positive integer",
                    value: max_text.clone(),
                })?;
            wrap = WrapConfig::new(max);
        }
        if let Some(indent) = text(ENV_INDENT)? {
            wrap = wrap.with_indent_marker(indent);
        }
        if let Some(flag) = text(ENV_EXPAND_ESCAPES)? {
            wrap = wrap.with_expand_escaped_newlines(parse_flag(&flag));
        }

        Ok(Self {
            process_id,
            module_name,
            tag,
            max_severity,
            wrap,
        })
    }
}

/// Interprets a boolean environment flag; `0`, `no`, `false` and `off` disable it.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    let trimmed = value.trim();
    !(trimmed.eq_ignore_ascii_case("0")
        || trimmed.eq_ignore_ascii_case("no")
        || trimmed.eq_ignore_ascii_case("false")
        || trimmed.eq_ignore_ascii_case("off"))
}
