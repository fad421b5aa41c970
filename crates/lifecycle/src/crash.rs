//! crates/lifecycle/src/crash.rs
//! One-shot handling of an abnormal failure: record, log the forensics, kill.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::panic::Location;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};

use logging::{CallSite, EchoPolicy, Severity, Transport};

use crate::exit::ExitCoordinator;
use crate::exit_code::KILLED;
use crate::terminator::{ProcessTerminator, Terminator};

/// Forensic snapshot of a failed command.
///
/// Holds everything needed to understand the failure from the log alone:
/// where it happened, what ran, and how the caller got there.
#[derive(Clone, Debug, Default, Eq, PartialEq, thiserror::Error)]
#[error("command '{command}' exited with status {status}")]
pub struct Failure {
    line: u32,
    command: String,
    last_argument: Option<String>,
    status: i32,
    source_file: Option<String>,
    function_stack: Vec<String>,
    line_stack: Vec<u32>,
    reason: Option<String>,
}

impl Failure {
    /// Creates a snapshot of `command` failing with `status`.
    pub fn new(command: impl Into<String>, status: i32) -> Self {
        Self {
            command: command.into(),
            status,
            ..Self::default()
        }
    }

    /// Builds a snapshot from a finished child process.
    ///
    /// A child killed by a signal is reported the way a shell would, as
    /// `128 + signal`.
    pub fn from_exit_status(command: impl Into<String>, status: ExitStatus) -> Self {
        Self::new(command, status_code(status))
    }

    /// Sets the source line of the failing command.
    #[must_use]
    pub const fn with_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Sets the last expanded argument of the failing command.
    #[must_use]
    pub fn with_last_argument(mut self, argument: impl Into<String>) -> Self {
        self.last_argument = Some(argument.into());
        self
    }

    /// Sets the source file.
    #[must_use]
    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    /// Sets the calling function stack, innermost first.
    #[must_use]
    pub fn with_function_stack<I, S>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.function_stack = functions.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the call line stack, innermost first.
    #[must_use]
    pub fn with_line_stack(mut self, lines: impl IntoIterator<Item = u32>) -> Self {
        self.line_stack = lines.into_iter().collect();
        self
    }

    /// Sets the free-text reason written to the failure file.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Source line of the failing command, `0` when unknown.
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// The failing command text.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Last expanded argument, if known.
    pub fn last_argument(&self) -> Option<&str> {
        self.last_argument.as_deref()
    }

    /// Exit status of the failing command.
    pub const fn status(&self) -> i32 {
        self.status
    }

    /// Source file, if known.
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Calling function stack, innermost first.
    pub fn function_stack(&self) -> &[String] {
        &self.function_stack
    }

    /// Call line stack, innermost first.
    pub fn line_stack(&self) -> &[u32] {
        &self.line_stack
    }

    /// Reason for the failure file; derived from the command when unset.
    pub fn reason(&self) -> String {
        self.reason.clone().unwrap_or_else(|| {
            format!(
                "line {}: '{}' failed with status {}",
                self.line, self.command, self.status
            )
        })
    }

    /// First forensic record: line, command, last argument, status.
    pub fn command_record(&self) -> String {
        format!(
            "line {}: command '{}' (last argument '{}') failed with exit code {}",
            self.line,
            self.command,
            self.last_argument.as_deref().unwrap_or_default(),
            self.status
        )
    }

    /// Second forensic record: source file, function stack, line stack.
    pub fn stack_record(&self) -> String {
        let mut record = format!(
            "source '{}', function stack [{}], line stack [",
            self.source_file.as_deref().unwrap_or("unknown"),
            self.function_stack.join(" ")
        );
        for (index, line) in self.line_stack.iter().enumerate() {
            if index > 0 {
                record.push(' ');
            }
            let _ = write!(record, "{line}");
        }
        record.push(']');
        record
    }

    fn call_site(&self) -> CallSite {
        match self.function_stack.first() {
            Some(function) => CallSite::new(function.clone(), self.line),
            None => CallSite::at_line(self.line),
        }
    }
}

impl From<io::Error> for Failure {
    fn from(error: io::Error) -> Self {
        Self::new("io", error.raw_os_error().unwrap_or(1)).with_reason(error.to_string())
    }
}

#[cfg(unix)]
fn status_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn status_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// State of a [`CrashTrap`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrapState {
    /// Waiting for a failure.
    Armed,
    /// The crash sequence has run; later triggers are ignored.
    Fired,
}

/// Result of [`CrashTrap::fire`] when the terminator returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrapOutcome {
    /// The full crash sequence ran.
    Terminated,
    /// The trap had already fired; nothing was done.
    AlreadyFired,
}

/// Intercepts the first abnormal failure of the logged process.
///
/// Firing disarms the exit coordinator, appends a failure record, logs the
/// forensic snapshot as two CRITICAL records, logs which process is about to
/// be killed, kills the configured target with SIGKILL, and ends this process.
/// Recording and logging are best-effort; the kill and exit always happen.
///
/// # Examples
///
/// ```
/// use logging::{Emitter, LoggerConfig, MemoryTransport, Severity};
/// use lifecycle::{CrashTrap, ExitCoordinator, Failure, RecordingTerminator, Termination};
///
/// let emitter = Emitter::with_echo(
///     LoggerConfig::new(4000, "deploy.sh", "deploy", Severity::Error),
///     MemoryTransport::new(),
///     Vec::new(),
/// );
/// let coordinator = ExitCoordinator::new(emitter, RecordingTerminator::new());
/// let trap = CrashTrap::new(&coordinator);
///
/// let value = trap.run_guarded(|| Err::<(), _>(Failure::new("rsync -a src dst", 23)));
/// assert_eq!(value, None);
/// assert_eq!(coordinator.emitter().transport().len(), 3);
/// assert_eq!(coordinator.terminator().calls()[0], Termination::Kill(4000));
/// ```
#[derive(Debug)]
pub struct CrashTrap<'a, T, W = io::Stdout, K = ProcessTerminator> {
    coordinator: &'a ExitCoordinator<T, W, K>,
    fired: AtomicBool,
}

impl<'a, T, W, K> CrashTrap<'a, T, W, K> {
    /// Arms a trap that reports through `coordinator`.
    pub const fn new(coordinator: &'a ExitCoordinator<T, W, K>) -> Self {
        Self {
            coordinator,
            fired: AtomicBool::new(false),
        }
    }

    /// Current state.
    pub fn state(&self) -> TrapState {
        if self.fired.load(Ordering::Acquire) {
            TrapState::Fired
        } else {
            TrapState::Armed
        }
    }

    /// The coordinator the trap reports through.
    pub const fn coordinator(&self) -> &'a ExitCoordinator<T, W, K> {
        self.coordinator
    }
}

impl<T, W, K> CrashTrap<'_, T, W, K>
where
    T: Transport,
    W: Write,
    K: Terminator,
{
    /// Runs the crash sequence for `failure`, once.
    pub fn fire(&self, failure: &Failure) -> TrapOutcome {
        if self.fired.swap(true, Ordering::AcqRel) {
            tracing::debug!(command = failure.command(), "crash trap already fired");
            return TrapOutcome::AlreadyFired;
        }

        let coordinator = self.coordinator;
        coordinator.disarm();
        coordinator.record_failure_best_effort(&failure.reason());

        let emitter = coordinator.emitter();
        let site = failure.call_site();
        emitter.emit(
            Severity::Critical,
            &failure.command_record(),
            EchoPolicy::Never,
            &site,
        );
        emitter.emit(
            Severity::Critical,
            &failure.stack_record(),
            EchoPolicy::Never,
            &site,
        );

        let target = emitter.config().process_id;
        emitter.emit(
            Severity::Critical,
            &format!(
                "process {} terminating process {target}",
                std::process::id()
            ),
            EchoPolicy::Never,
            &site,
        );

        coordinator.terminate_crashed(target);
        TrapOutcome::Terminated
    }

    /// Runs `body`; an error fires the trap.
    ///
    /// A failure without a line number is attributed to the caller of
    /// `run_guarded`. Returns `None` only when the terminator returns, which
    /// the production terminator never does.
    #[track_caller]
    pub fn run_guarded<F, R, E>(&self, body: F) -> Option<R>
    where
        F: FnOnce() -> Result<R, E>,
        E: Into<Failure>,
    {
        let caller = Location::caller();
        match body() {
            Ok(value) => Some(value),
            Err(error) => {
                let mut failure: Failure = error.into();
                if failure.line == 0 {
                    failure.line = caller.line();
                }
                self.fire(&failure);
                None
            }
        }
    }
}

impl<T, W> CrashTrap<'_, T, W, ProcessTerminator>
where
    T: Transport,
    W: Write,
{
    /// Runs the crash sequence and ends the process.
    pub fn trigger(&self, failure: &Failure) -> ! {
        let _ = self.fire(failure);
        // Reached only when the trap had already fired.
        std::process::exit(i32::from(KILLED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_record_layout() {
        let failure = Failure::new("cp a b", 1)
            .with_line(12)
            .with_last_argument("b");
        assert_eq!(
            failure.command_record(),
            "line 12: command 'cp a b' (last argument 'b') failed with exit code 1"
        );
    }

    #[test]
    fn stack_record_layout() {
        let failure = Failure::new("cp a b", 1)
            .with_source_file("/opt/backup.sh")
            .with_function_stack(["copy_one", "main"])
            .with_line_stack([12, 40, 0]);
        assert_eq!(
            failure.stack_record(),
            "source '/opt/backup.sh', function stack [copy_one main], line stack [12 40 0]"
        );
    }

    #[test]
    fn reason_defaults_to_command_summary() {
        let failure = Failure::new("false", 1).with_line(3);
        assert_eq!(failure.reason(), "line 3: 'false' failed with status 1");
        assert_eq!(failure.with_reason("custom").reason(), "custom");
    }

    #[test]
    fn innermost_function_becomes_call_site() {
        let failure = Failure::new("x", 1)
            .with_line(8)
            .with_function_stack(["inner", "outer"]);
        let site = failure.call_site();
        assert_eq!(site.function(), Some("inner"));
        assert_eq!(site.line(), 8);
    }

    #[test]
    fn io_errors_convert() {
        let failure = Failure::from(io::Error::from_raw_os_error(2));
        assert_eq!(failure.status(), 2);
        assert_eq!(failure.command(), "io");
    }

    #[cfg(unix)]
    #[test]
    fn signalled_child_reports_shell_status() {
        use std::os::unix::process::ExitStatusExt;
        let status = ExitStatus::from_raw(libc::SIGKILL);
        assert_eq!(Failure::from_exit_status("sleep", status).status(), 137);
        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(Failure::from_exit_status("false", status).status(), 3);
    }
}
