//! crates/lifecycle/src/exit_code.rs
//! Exit statuses with a fixed meaning for scriptlog and the scripts it serves.
//!
//! Any other value in `0..=255` belongs to the calling script.

/// Successful completion.
pub const SUCCESS: u8 = 0;

/// Usage or configuration error reported by the `scriptlog` front end.
pub const USAGE: u8 = 1;

/// Status used when the exit trap fires without an explicit exit request.
pub const UNSPECIFIED: u8 = 150;

/// Status of the operator after a crash, matching what a shell reports for
/// a child killed by SIGKILL (128 + 9).
pub const KILLED: u8 = 137;

/// Returns a short description of the reserved codes.
///
/// # Examples
///
/// ```
/// use lifecycle::exit_code;
///
/// assert_eq!(exit_code::describe(150), Some("exit trap fired without an explicit exit"));
/// assert_eq!(exit_code::describe(42), None);
/// ```
#[must_use]
pub const fn describe(code: u8) -> Option<&'static str> {
    match code {
        SUCCESS => Some("success"),
        USAGE => Some("usage or configuration error"),
        UNSPECIFIED => Some("exit trap fired without an explicit exit"),
        KILLED => Some("terminated after a crash"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_codes_are_distinct() {
        let codes = [SUCCESS, USAGE, UNSPECIFIED, KILLED];
        for (index, code) in codes.iter().enumerate() {
            assert!(!codes[index + 1..].contains(code));
            assert!(describe(*code).is_some());
        }
    }
}
