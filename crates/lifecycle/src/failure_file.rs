//! crates/lifecycle/src/failure_file.rs
//! Append-only side record of fatal conditions, read by an external watchdog.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

/// Timestamp layout of a failure record.
const RECORD_TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month padding:zero]-[day padding:zero] [hour padding:zero]:[minute padding:zero]:[second padding:zero]"
);

/// Error raised while appending to a [`FailureFile`].
#[derive(Debug, thiserror::Error)]
pub enum FailureFileError {
    /// The file could not be opened or created.
    #[error("failed to open failure file {}: {source}", path.display())]
    Open {
        /// File that was being opened.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The record could not be written.
    #[error("failed to append to failure file {}: {source}", path.display())]
    Write {
        /// File that was being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
}

/// Handle on the failure file.
///
/// Records are only ever appended. Each one is written with a single
/// `write` call on a file opened in append mode, so records from concurrent
/// processes do not interleave. The file is never truncated or removed here.
///
/// # Examples
///
/// ```
/// use lifecycle::FailureFile;
///
/// let dir = tempfile::tempdir().unwrap();
/// let file = FailureFile::new(dir.path().join("failures"));
/// file.record("backup.sh", "tar exited with status 2").unwrap();
///
/// let contents = std::fs::read_to_string(file.path()).unwrap();
/// assert!(contents.ends_with("  [backup.sh]  tar exited with status 2; \n"));
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FailureFile {
    path: PathBuf,
}

impl FailureFile {
    /// Creates a handle; nothing is touched until the first record.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record stamped with the current local time.
    pub fn record(&self, module_name: &str, reason: &str) -> Result<(), FailureFileError> {
        self.record_at(current_time(), module_name, reason)
    }

    /// Appends one record stamped with `timestamp`.
    pub fn record_at(
        &self,
        timestamp: OffsetDateTime,
        module_name: &str,
        reason: &str,
    ) -> Result<(), FailureFileError> {
        let line = format_record(timestamp, module_name, reason);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| FailureFileError::Open {
                path: self.path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .map_err(|source| FailureFileError::Write {
                path: self.path.clone(),
                source,
            })
    }
}

/// Renders one record: `<timestamp>  [<module>]  <reason>; \n`.
#[must_use]
pub fn format_record(timestamp: OffsetDateTime, module_name: &str, reason: &str) -> String {
    let stamp = timestamp
        .format(RECORD_TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| timestamp.unix_timestamp().to_string());
    format!("{stamp}  [{module_name}]  {reason}; \n")
}

fn current_time() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
