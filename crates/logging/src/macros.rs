//! crates/logging/src/macros.rs
//! Convenience macros that format a message and record the caller's function and line.

/// Logs at an explicit severity and echo policy.
///
/// # Example
/// ```
/// use logging::{EchoPolicy, Emitter, LoggerConfig, MemoryTransport, Severity, log_at};
///
/// let emitter = Emitter::with_echo(
///     LoggerConfig::new(1, "job.sh", "job", Severity::Info),
///     MemoryTransport::new(),
///     Vec::new(),
/// );
/// log_at!(emitter, Severity::Info, EchoPolicy::Never; "copied {} files", 3);
/// assert!(emitter.transport().lines()[0].ends_with("copied 3 files"));
/// ```
#[macro_export]
macro_rules! log_at {
    ($emitter:expr, $severity:expr, $echo:expr; $($arg:tt)+) => {
        $emitter.emit(
            $severity,
            &::std::format!($($arg)+),
            $echo,
            &$crate::call_site!(),
        )
    };
}

/// Logs a critical record.
///
/// # Example
/// ```ignore
/// logging::critical!(emitter, "cannot continue: {}", reason);
/// ```
#[macro_export]
macro_rules! critical {
    ($emitter:expr, $($arg:tt)+) => {
        $crate::log_at!($emitter, $crate::Severity::Critical, $crate::EchoPolicy::Never; $($arg)+)
    };
}

/// Logs an error record.
///
/// # Example
/// ```ignore
/// logging::error!(emitter, "upload of {} failed", path.display());
/// ```
#[macro_export]
macro_rules! error {
    ($emitter:expr, $($arg:tt)+) => {
        $crate::log_at!($emitter, $crate::Severity::Error, $crate::EchoPolicy::Never; $($arg)+)
    };
}

/// Logs a warning record.
///
/// # Example
/// ```ignore
/// logging::warning!(emitter, "retrying in {}s", delay);
/// ```
#[macro_export]
macro_rules! warning {
    ($emitter:expr, $($arg:tt)+) => {
        $crate::log_at!($emitter, $crate::Severity::Warning, $crate::EchoPolicy::Never; $($arg)+)
    };
}

/// Logs an informational record.
///
/// # Example
/// ```ignore
/// logging::info!(emitter, "backup finished");
/// ```
#[macro_export]
macro_rules! info {
    ($emitter:expr, $($arg:tt)+) => {
        $crate::log_at!($emitter, $crate::Severity::Info, $crate::EchoPolicy::Never; $($arg)+)
    };
}

/// Logs a debug record.
///
/// # Example
/// ```ignore
/// logging::debug!(emitter, "state = {:?}", state);
/// ```
#[macro_export]
macro_rules! debug {
    ($emitter:expr, $($arg:tt)+) => {
        $crate::log_at!($emitter, $crate::Severity::Debug, $crate::EchoPolicy::Never; $($arg)+)
    };
}
