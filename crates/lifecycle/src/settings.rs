//! crates/lifecycle/src/settings.rs
//! Exit-path settings read from the caller's environment.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use logging::ConfigError;

use crate::failure_file::FailureFile;

/// Path of the failure file.
pub const ENV_FAILURE_FILE: &str = "SCRIPTLOG_FAILURE_FILE";
/// Unix time, in seconds, at which the logged script started.
pub const ENV_STARTED: &str = "SCRIPTLOG_STARTED";

/// Optional inputs of the exit coordinator.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExitSettings {
    /// Where failure records go; recording is skipped when unset.
    pub failure_file: Option<FailureFile>,
    /// Start of the logged script; elapsed time is reported as 0 when unset.
    pub started_at: Option<SystemTime>,
}

impl ExitSettings {
    /// Loads the settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Loads the settings through an arbitrary variable lookup.
    ///
    /// Unset and empty variables leave the corresponding field `None`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        Ok(Self {
            failure_file: failure_file(&lookup),
            started_at: start_time(&lookup)?,
        })
    }

    /// Like [`from_lookup`](Self::from_lookup), but a malformed start time is
    /// reported through `tracing` and treated as unset.
    ///
    /// The exit and crash paths use this so a bad optional setting never
    /// keeps them from terminating.
    pub fn from_lookup_lossy<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let started_at = start_time(&lookup).unwrap_or_else(|error| {
            tracing::warn!(%error, "start time ignored; elapsed runtime reported as 0");
            None
        });
        Self {
            failure_file: failure_file(&lookup),
            started_at,
        }
    }
}

fn failure_file<F>(lookup: &F) -> Option<FailureFile>
where
    F: Fn(&str) -> Option<OsString>,
{
    lookup(ENV_FAILURE_FILE)
        .filter(|value| !value.is_empty())
        .map(|value| FailureFile::new(PathBuf::from(value)))
}

fn start_time<F>(lookup: &F) -> Result<Option<SystemTime>, ConfigError>
where
    F: Fn(&str) -> Option<OsString>,
{
    let Some(value) = lookup(ENV_STARTED).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let text = value
        .into_string()
        .map_err(|_| ConfigError::NotUnicode(ENV_STARTED))?;
    let seconds = text
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            variable: ENV_STARTED,
            expected: "unix time in seconds",
            value: text.clone(),
        })?;
    Ok(SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(seconds)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn unset_variables_leave_fields_empty() {
        let settings = ExitSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, ExitSettings::default());
    }

    #[test]
    fn values_are_parsed() {
        let settings = ExitSettings::from_lookup(|name| match name {
            ENV_FAILURE_FILE => Some("/var/tmp/failures".into()),
            ENV_STARTED => Some("1700000000".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(
            settings.failure_file.as_ref().map(FailureFile::path),
            Some(Path::new("/var/tmp/failures"))
        );
        assert_eq!(
            settings.started_at,
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
        );
    }

    #[test]
    fn bad_start_time_is_rejected() {
        let error = ExitSettings::from_lookup(|name| {
            (name == ENV_STARTED).then(|| OsString::from("yesterday"))
        })
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "SCRIPTLOG_STARTED must be unix time in seconds, got 'yesterday'"
        );
    }

    #[test]
    fn lossy_loading_drops_bad_start_time_only() {
        let settings = ExitSettings::from_lookup_lossy(|name| match name {
            ENV_FAILURE_FILE => Some("/var/tmp/failures".into()),
            ENV_STARTED => Some("12:00".into()),
            _ => None,
        });
        assert_eq!(settings.started_at, None);
        assert_eq!(
            settings.failure_file.as_ref().map(FailureFile::path),
            Some(Path::new("/var/tmp/failures"))
        );
    }
}
