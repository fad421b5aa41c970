//! crates/cli/src/handlers.rs
//! One function per subcommand.

use std::io::{self, Write};

use clap::ArgMatches;
use lifecycle::exit_code::{self, KILLED, SUCCESS};
use lifecycle::{CrashTrap, ExitCoordinator, ExitSettings, ExitState, Failure, FailureFileError};
use logging::{CallSite, ConfigError, EchoPolicy, Emitter, LoggerConfig, Severity, Transport};
use logging_sink::{ParseTransportKindError, TransportKind, WriterTransport};

use crate::terminator::CliTerminator;

/// Error that ends a subcommand before it does its work.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The logging or exit environment is missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transport variable names no backend.
    #[error(transparent)]
    TransportKind(#[from] ParseTransportKindError),

    /// The selected backend could not be opened.
    #[error("failed to open {kind} transport: {source}")]
    OpenTransport {
        /// Backend that was requested.
        kind: TransportKind,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// The failure file could not be written.
    #[error(transparent)]
    FailureFile(#[from] FailureFileError),
}

impl CliError {
    /// Exit status reported for the error.
    pub const fn exit_code(&self) -> u8 {
        exit_code::USAGE
    }
}

pub(crate) type BoxedTransport<'a> = Box<dyn Transport + 'a>;

/// Opens `kind`, routing the stderr backend into the caller's error stream.
pub(crate) fn open_transport<'a, Err>(
    kind: TransportKind,
    tag: &str,
    stderr: &'a mut Err,
) -> Result<BoxedTransport<'a>, CliError>
where
    Err: Write + 'a,
{
    match kind {
        TransportKind::Stderr => Ok(Box::new(WriterTransport::new(stderr))),
        other => other
            .open(tag)
            .map(|transport| transport as BoxedTransport<'a>)
            .map_err(|source| CliError::OpenTransport {
                kind: other,
                source,
            }),
    }
}

/// Opens the backend for the exit and crash paths, which must not fail.
///
/// An unknown kind or a backend that cannot be opened is reported through
/// `tracing` and replaced by the stderr backend.
pub(crate) fn open_transport_or_stderr<'a, Err>(
    kind: Result<TransportKind, ParseTransportKindError>,
    tag: &str,
    stderr: &'a mut Err,
) -> BoxedTransport<'a>
where
    Err: Write + 'a,
{
    match kind {
        Ok(TransportKind::Stderr) => {}
        Ok(kind) => match kind.open(tag) {
            Ok(transport) => return transport as BoxedTransport<'a>,
            Err(error) => {
                tracing::warn!(transport = %kind, %error, "falling back to stderr transport");
            }
        },
        Err(error) => tracing::warn!(%error, "falling back to stderr transport"),
    }
    Box::new(WriterTransport::new(stderr))
}

fn severity(matches: &ArgMatches, id: &str) -> Severity {
    matches
        .get_one::<String>(id)
        .map_or(Severity::Error, |text| Severity::parse_lossy(text))
}

fn echo(matches: &ArgMatches) -> EchoPolicy {
    matches
        .get_one::<EchoPolicy>("echo")
        .copied()
        .unwrap_or_default()
}

fn joined(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_many::<String>(id)
        .map(|words| words.map(String::as_str).collect::<Vec<_>>().join(" "))
}

/// `scriptlog log`.
pub(crate) fn log<T, W>(emitter: &Emitter<T, W>, matches: &ArgMatches) -> u8
where
    T: Transport,
    W: Write,
{
    let function = matches.get_one::<String>("function").cloned();
    let line = matches.get_one::<u32>("line").copied().unwrap_or(0);
    let site = match function {
        Some(function) if !function.is_empty() => CallSite::new(function, line),
        _ => CallSite::at_line(line),
    };

    let text = joined(matches, "text").filter(|text| !text.is_empty());
    emitter.emit_text(
        severity(matches, "severity"),
        text.as_deref(),
        echo(matches),
        &site,
    );
    SUCCESS
}

/// `scriptlog exit`: logs the runtime summary and returns the requested code.
pub(crate) fn exit<T, W>(
    coordinator: &ExitCoordinator<T, W, CliTerminator>,
    matches: &ArgMatches,
) -> u8
where
    T: Transport,
    W: Write,
{
    let code = matches
        .get_one::<u8>("code")
        .copied()
        .unwrap_or(exit_code::UNSPECIFIED);
    let reason =
        joined(matches, "reason").unwrap_or_else(|| lifecycle::UNSPECIFIED_REASON.to_owned());
    let state = ExitState::new(severity(matches, "severity"), code, reason)
        .with_echo(echo(matches))
        .with_record_failure(matches.get_flag("record-failure"));

    coordinator.finish(&state);
    coordinator.terminator().code().unwrap_or(code)
}

/// Builds the forensic snapshot from `scriptlog crash` arguments.
///
/// Never fails: `--lines` entries that are not line numbers are dropped with
/// a warning so the crash sequence still runs.
pub(crate) fn failure_from(matches: &ArgMatches) -> Failure {
    let command = matches
        .get_one::<String>("command")
        .cloned()
        .unwrap_or_default();
    let status = matches.get_one::<i32>("status").copied().unwrap_or(1);
    let mut failure = Failure::new(command, status)
        .with_line(matches.get_one::<u32>("line").copied().unwrap_or(0));

    if let Some(argument) = matches.get_one::<String>("last-arg") {
        failure = failure.with_last_argument(argument.as_str());
    }
    if let Some(source) = matches.get_one::<String>("source") {
        failure = failure.with_source_file(source.as_str());
    }
    if let Some(functions) = matches.get_one::<String>("functions") {
        failure = failure.with_function_stack(functions.split_whitespace());
    }
    if let Some(lines) = matches.get_one::<String>("lines") {
        let stack = lines.split_whitespace().filter_map(|entry| {
            let parsed = entry.parse::<u32>().ok();
            if parsed.is_none() {
                tracing::warn!(entry, "line stack entry is not a line number; dropped");
            }
            parsed
        });
        failure = failure.with_line_stack(stack);
    }
    if let Some(reason) = matches.get_one::<String>("reason") {
        failure = failure.with_reason(reason.as_str());
    }
    failure
}

/// `scriptlog crash`: runs the crash sequence against the configured pid.
pub(crate) fn crash<T, W>(
    coordinator: &ExitCoordinator<T, W, CliTerminator>,
    failure: &Failure,
) -> u8
where
    T: Transport,
    W: Write,
{
    CrashTrap::new(coordinator).fire(failure);
    coordinator.terminator().code().unwrap_or(KILLED)
}

/// `scriptlog fail`: appends a failure record and carries on.
pub(crate) fn fail(
    config: &LoggerConfig,
    settings: &ExitSettings,
    matches: &ArgMatches,
) -> Result<u8, CliError> {
    let reason = joined(matches, "reason").unwrap_or_default();
    match &settings.failure_file {
        Some(file) => file.record(&config.module_name, &reason)?,
        None => tracing::warn!(
            variable = lifecycle::ENV_FAILURE_FILE,
            "no failure file configured; record dropped"
        ),
    }
    Ok(SUCCESS)
}

/// `scriptlog enabled`: `0` when the severity passes the configured maximum.
pub(crate) fn enabled(config: &LoggerConfig, matches: &ArgMatches) -> u8 {
    if config.max_severity.allows(severity(matches, "severity")) {
        SUCCESS
    } else {
        exit_code::USAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{PROGRAM_NAME, clap_command};

    fn subcommand(args: &[&str]) -> ArgMatches {
        let mut full = vec![PROGRAM_NAME];
        full.extend_from_slice(args);
        let matches = clap_command().try_get_matches_from(full).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        sub.clone()
    }

    #[test]
    fn crash_arguments_build_failure() {
        let matches = subcommand(&[
            "crash",
            "--line",
            "12",
            "--command",
            "cp a b",
            "--last-arg",
            "b",
            "--status",
            "1",
            "--source",
            "/opt/job.sh",
            "--functions",
            "copy main",
            "--lines",
            "12 40 0",
        ]);
        let failure = failure_from(&matches);
        assert_eq!(failure.line(), 12);
        assert_eq!(failure.command(), "cp a b");
        assert_eq!(failure.last_argument(), Some("b"));
        assert_eq!(failure.function_stack(), ["copy", "main"]);
        assert_eq!(failure.line_stack(), [12, 40, 0]);
    }

    #[test]
    fn malformed_line_stack_entries_are_dropped() {
        let matches = subcommand(&[
            "crash", "--line", "1", "--command", "x", "--status", "1", "--lines", "4 four 9",
        ]);
        let failure = failure_from(&matches);
        assert_eq!(failure.line_stack(), [4, 9]);
        assert_eq!(failure.command(), "x");
    }

    #[test]
    fn unknown_transport_falls_back_to_stderr() {
        let mut stderr = Vec::new();
        let transport =
            open_transport_or_stderr("syslogd".parse::<TransportKind>(), "job", &mut stderr);
        transport
            .send(Severity::Critical, "job", "still recorded")
            .unwrap();
        drop(transport);
        assert_eq!(String::from_utf8(stderr).unwrap(), "job: still recorded\n");
    }

    #[test]
    fn words_are_joined_with_spaces() {
        let matches = subcommand(&["log", "disk", "almost", "full"]);
        assert_eq!(joined(&matches, "text").as_deref(), Some("disk almost full"));
        let matches = subcommand(&["log"]);
        assert_eq!(joined(&matches, "text"), None);
    }

    #[test]
    fn unknown_severity_falls_back_to_error() {
        let matches = subcommand(&["log", "-s", "loud", "x"]);
        assert_eq!(severity(&matches, "severity"), Severity::Error);
    }
}
