//! crates/lifecycle/src/exit.rs
//! The single path by which a logged process terminates.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use logging::{CallSite, EchoPolicy, Emitter, Severity, Transport};

use crate::exit_code::{KILLED, UNSPECIFIED};
use crate::failure_file::{FailureFile, FailureFileError};
use crate::terminator::{ProcessTerminator, Terminator};

/// Reason recorded when the exit trap fires without an explicit request.
pub const UNSPECIFIED_REASON: &str = "unspecified";

/// Whether a non-zero exit writes a failure record on its own.
///
/// The default is [`FailureRecordPolicy::Explicit`]: a record is written only
/// when the exit request asks for one. Automatic recording made every
/// deliberate non-zero status look like a crash to the watchdog.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum FailureRecordPolicy {
    /// Only non-zero exits requested with [`ExitState::with_record_failure`]
    /// produce a record.
    #[default]
    Explicit,
    /// Every exit with a non-zero code produces a record.
    OnNonZeroExit,
}

/// One exit request, consumed by [`ExitCoordinator::finish`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExitState {
    /// Severity of the summary record.
    pub severity: Severity,
    /// Process exit status.
    pub code: u8,
    /// Free-text reason, carried into the summary and any failure record.
    pub reason: String,
    /// Echo policy applied to the summary record.
    pub echo: EchoPolicy,
    /// Request a failure record regardless of policy.
    pub record_failure: bool,
    /// Where the exit was requested.
    pub site: CallSite,
}

impl ExitState {
    /// Creates a request with no echo and no explicit failure record.
    pub fn new(severity: Severity, code: u8, reason: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            reason: reason.into(),
            echo: EchoPolicy::Never,
            record_failure: false,
            site: CallSite::unknown(),
        }
    }

    /// The request used by the exit trap: ERROR, code 150, reason "unspecified".
    pub fn unspecified() -> Self {
        Self::new(Severity::Error, UNSPECIFIED, UNSPECIFIED_REASON)
    }

    /// Sets the echo policy.
    #[must_use]
    pub fn with_echo(mut self, echo: EchoPolicy) -> Self {
        self.echo = echo;
        self
    }

    /// Requests a failure record.
    #[must_use]
    pub fn with_record_failure(mut self, record: bool) -> Self {
        self.record_failure = record;
        self
    }

    /// Sets the requesting call site.
    #[must_use]
    pub fn with_site(mut self, site: CallSite) -> Self {
        self.site = site;
        self
    }
}

impl Default for ExitState {
    fn default() -> Self {
        Self::unspecified()
    }
}

/// Result of [`ExitCoordinator::finish`] when the terminator returns.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitOutcome {
    /// The summary was logged and the terminator asked to exit with this code.
    Exited(u8),
    /// Another exit was already in progress; nothing was done.
    AlreadyExiting,
}

/// Owns the emitter and everything needed to end the process in an orderly way.
///
/// The coordinator is armed on construction. The first call to
/// [`finish`](Self::finish) or [`disarm`](Self::disarm) disarms it, and a
/// disarmed coordinator never runs the exit sequence again.
///
/// # Examples
///
/// ```
/// use logging::{EchoPolicy, Emitter, LoggerConfig, MemoryTransport, Severity};
/// use lifecycle::{ExitCoordinator, ExitOutcome, ExitState, RecordingTerminator};
///
/// let emitter = Emitter::with_echo(
///     LoggerConfig::new(7, "job.sh", "job", Severity::Critical),
///     MemoryTransport::new(),
///     Vec::new(),
/// );
/// let coordinator = ExitCoordinator::new(emitter, RecordingTerminator::new());
///
/// let state = ExitState::new(Severity::Info, 0, "ok").with_echo(EchoPolicy::Always);
/// assert_eq!(coordinator.finish(&state), ExitOutcome::Exited(0));
/// assert_eq!(coordinator.finish(&state), ExitOutcome::AlreadyExiting);
/// assert_eq!(coordinator.terminator().exit_code(), Some(0));
/// ```
#[derive(Debug)]
pub struct ExitCoordinator<T, W = io::Stdout, K = ProcessTerminator> {
    emitter: Emitter<T, W>,
    terminator: K,
    failure_file: Option<FailureFile>,
    policy: FailureRecordPolicy,
    started_at: Option<SystemTime>,
    armed: AtomicBool,
}

impl<T, W, K> ExitCoordinator<T, W, K> {
    /// Creates an armed coordinator with no failure file and no start time.
    pub fn new(emitter: Emitter<T, W>, terminator: K) -> Self {
        Self {
            emitter,
            terminator,
            failure_file: None,
            policy: FailureRecordPolicy::default(),
            started_at: None,
            armed: AtomicBool::new(true),
        }
    }

    /// Sets the failure file.
    #[must_use]
    pub fn with_failure_file(mut self, failure_file: Option<FailureFile>) -> Self {
        self.failure_file = failure_file;
        self
    }

    /// Sets the failure record policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: FailureRecordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the time the logged process started, for the runtime summary.
    #[must_use]
    pub const fn with_started_at(mut self, started_at: Option<SystemTime>) -> Self {
        self.started_at = started_at;
        self
    }

    /// The emitter every exit-path record goes through.
    pub const fn emitter(&self) -> &Emitter<T, W> {
        &self.emitter
    }

    /// Consumes the coordinator and returns its emitter.
    pub fn into_emitter(self) -> Emitter<T, W> {
        self.emitter
    }

    /// The terminator.
    pub const fn terminator(&self) -> &K {
        &self.terminator
    }

    /// The failure file, if one is configured.
    pub const fn failure_file(&self) -> Option<&FailureFile> {
        self.failure_file.as_ref()
    }

    /// The failure record policy.
    pub const fn policy(&self) -> FailureRecordPolicy {
        self.policy
    }

    /// Whether the exit sequence can still run.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Disarms the coordinator; returns whether it was armed.
    pub fn disarm(&self) -> bool {
        self.armed.swap(false, Ordering::AcqRel)
    }

    /// Whole seconds since the configured start time, `0` when unknown.
    pub fn elapsed_secs(&self) -> u64 {
        self.started_at
            .and_then(|started| SystemTime::now().duration_since(started).ok())
            .map_or(0, |elapsed| elapsed.as_secs())
    }

    /// Appends a failure record.
    ///
    /// Returns `Ok(false)` when no failure file is configured.
    pub fn record_failure(&self, reason: &str) -> Result<bool, FailureFileError> {
        let Some(file) = &self.failure_file else {
            return Ok(false);
        };
        file.record(&self.emitter.config().module_name, reason)?;
        Ok(true)
    }

    pub(crate) fn record_failure_best_effort(&self, reason: &str) {
        match self.record_failure(reason) {
            Ok(true) => {}
            Ok(false) => tracing::debug!(reason, "no failure file configured; record skipped"),
            Err(error) => tracing::warn!(%error, "failure record not written"),
        }
    }
}

impl<T, W, K> ExitCoordinator<T, W, K>
where
    T: Transport,
    W: Write,
    K: Terminator,
{
    /// Returns a guard that runs the default exit sequence when dropped armed.
    pub const fn exit_guard(&self) -> ExitGuard<'_, T, W, K> {
        ExitGuard { coordinator: self }
    }

    /// Runs the exit sequence for `state`.
    ///
    /// Disarms first so a re-entrant call (for example from an [`ExitGuard`]
    /// dropped during the sequence) returns [`ExitOutcome::AlreadyExiting`].
    /// Then, for a non-zero code only, writes a failure record if the request
    /// or the policy asks for one. It then logs one summary record at the
    /// requested severity and hands the code to the terminator.
    pub fn finish(&self, state: &ExitState) -> ExitOutcome {
        if !self.disarm() {
            tracing::debug!(code = state.code, "exit already in progress");
            return ExitOutcome::AlreadyExiting;
        }

        let wants_record = state.code != 0
            && (state.record_failure || self.policy == FailureRecordPolicy::OnNonZeroExit);
        if wants_record {
            self.record_failure_best_effort(&state.reason);
        }

        let summary = format!(
            "exiting after {} seconds with exit code {}: {}",
            self.elapsed_secs(),
            state.code,
            state.reason
        );
        self.emitter
            .emit(state.severity, &summary, state.echo, &state.site);

        self.terminator.exit(state.code);
        ExitOutcome::Exited(state.code)
    }

    /// Kills the crashed target, then ends this process with [`KILLED`].
    ///
    /// Termination is unconditional: a failed kill is reported and the exit
    /// still happens.
    pub(crate) fn terminate_crashed(&self, target: u32) {
        if let Err(error) = self.terminator.kill(target) {
            tracing::error!(pid = target, %error, "could not kill crashed process");
        }
        self.terminator.exit(KILLED);
    }
}

impl<T, W> ExitCoordinator<T, W, ProcessTerminator>
where
    T: Transport,
    W: Write,
{
    /// Runs the exit sequence and ends the process.
    pub fn exit(&self, state: &ExitState) -> ! {
        let _ = self.finish(state);
        // Reached only when another exit was already in progress.
        std::process::exit(i32::from(state.code))
    }
}

/// Exit trap: runs [`ExitState::unspecified`] through the coordinator when
/// dropped while the coordinator is still armed.
///
/// Keep it alive for the whole body of `main`. An explicit
/// [`ExitCoordinator::finish`] disarms the coordinator, after which dropping
/// the guard does nothing.
#[must_use = "dropping the guard immediately runs the default exit sequence"]
#[derive(Debug)]
pub struct ExitGuard<'a, T, W, K>
where
    T: Transport,
    W: Write,
    K: Terminator,
{
    coordinator: &'a ExitCoordinator<T, W, K>,
}

impl<T, W, K> Drop for ExitGuard<'_, T, W, K>
where
    T: Transport,
    W: Write,
    K: Terminator,
{
    fn drop(&mut self) {
        if self.coordinator.is_armed() {
            let _ = self.coordinator.finish(&ExitState::unspecified());
        }
    }
}
