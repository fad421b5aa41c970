#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line front end that shell scripts call into. Each
//! subcommand maps onto one facility of the workspace:
//!
//! - `log` sends a leveled record through the configured transport.
//! - `exit` logs the runtime summary and returns the requested exit code.
//! - `crash` runs the crash sequence and kills the calling script.
//! - `fail` appends a failure record and carries on.
//! - `enabled` reports whether a severity would be logged.
//!
//! # Design
//!
//! [`run`] takes the argument list together with handles for standard output
//! and standard error and returns the exit status instead of exiting, so the
//! binary stays a thin wrapper and the whole front end can be driven from
//! tests. Configuration comes from `SCRIPTLOG_*` variables that the calling
//! script exports once at startup; [`run_with_lookup`] takes the variable
//! lookup as a closure.
//!
//! A script typically wires the traps like this:
//!
//! ```text
//! trap 'scriptlog crash --line "$LINENO" --command "$BASH_COMMAND" --status "$?" \
//!     --source "${BASH_SOURCE[0]}" --functions "${FUNCNAME[*]}" --lines "${BASH_LINENO[*]}"' ERR
//! trap 'trap - EXIT; scriptlog exit; exit $?' EXIT
//! ```
//!
//! # Invariants
//!
//! - `run` never panics; configuration and transport problems surface as
//!   exit status `1` with a diagnostic on standard error.
//! - Once the logging configuration loads, `exit` and `crash` always reach
//!   the terminator. A malformed start time, line stack entry or transport
//!   is reported through `tracing` and replaced by a fallback.
//! - Log records and echoes are the only output written to standard output;
//!   scriptlog's own diagnostics go through `tracing` to standard error.
//!
//! # Errors
//!
//! Parse failures and [`CliError`] values are reported on standard error and
//! mapped to exit status `1`. `enabled` returns `1` for a suppressed severity.
//!
//! # Examples
//!
//! ```
//! use std::collections::HashMap;
//! use std::ffi::OsString;
//!
//! let env: HashMap<&str, &str> = HashMap::from([
//!     ("SCRIPTLOG_PID", "4242"),
//!     ("SCRIPTLOG_MODULE", "backup.sh"),
//!     ("SCRIPTLOG_TAG", "backup"),
//!     ("SCRIPTLOG_LEVEL", "info"),
//!     ("SCRIPTLOG_TRANSPORT", "stderr"),
//! ]);
//! let lookup = |name: &str| env.get(name).map(OsString::from);
//!
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let status = cli::run_with_lookup(
//!     ["scriptlog", "log", "-s", "warning", "disk", "almost", "full"],
//!     lookup,
//!     &mut stdout,
//!     &mut stderr,
//! );
//!
//! assert_eq!(status, 0);
//! assert_eq!(
//!     String::from_utf8(stderr).unwrap(),
//!     "backup: WARNING (PID: 4242 , MN: backup.sh , FN: unknown , LI: 0):    disk almost full\n"
//! );
//! ```
//!
//! # See also
//!
//! - [`logging`] for severities, wrapping and the emitter.
//! - [`logging_sink`] for the transports.
//! - [`lifecycle`] for the exit and crash sequences.

mod command;
mod diagnostics;
mod handlers;
mod terminator;

use std::ffi::OsString;
use std::io::Write;

use clap::ArgMatches;
use lifecycle::exit_code::{SUCCESS, USAGE};
use lifecycle::{ExitCoordinator, ExitSettings};
use logging::{Emitter, LoggerConfig};
use logging_sink::{ENV_TRANSPORT, ParseTransportKindError, TransportKind};

pub use command::{PROGRAM_NAME, clap_command};
pub use diagnostics::{DEFAULT_DIAG_FILTER, ENV_DIAG, init_diagnostics};
pub use handlers::CliError;

use handlers::{BoxedTransport, open_transport};
use terminator::CliTerminator;

/// Maximum exit status representable on Unix.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Runs the front end against the process environment.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    Out: Write,
    Err: Write,
{
    run_with_lookup(arguments, |name| std::env::var_os(name), stdout, stderr)
}

/// Runs the front end, resolving `SCRIPTLOG_*` variables through `lookup`.
pub fn run_with_lookup<I, S, F, Out, Err>(
    arguments: I,
    lookup: F,
    stdout: &mut Out,
    stderr: &mut Err,
) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
    F: Fn(&str) -> Option<OsString>,
    Out: Write,
    Err: Write,
{
    let matches = match clap_command().try_get_matches_from(arguments) {
        Ok(matches) => matches,
        Err(error) => return report_parse_error(&error, stdout, stderr),
    };

    match execute(&matches, &lookup, stdout, stderr) {
        Ok(code) => i32::from(code),
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
            i32::from(error.exit_code())
        }
    }
}

/// Converts a status returned by [`run`] into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    let clamped = status.clamp(0, MAX_EXIT_CODE);
    std::process::ExitCode::from(u8::try_from(clamped).unwrap_or(u8::MAX))
}

fn report_parse_error<Out, Err>(error: &clap::Error, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    let rendered = error.render().to_string();
    if error.use_stderr() {
        let _ = write!(stderr, "{rendered}");
        i32::from(USAGE)
    } else {
        // --help and --version
        let _ = write!(stdout, "{rendered}");
        i32::from(SUCCESS)
    }
}

fn execute<F, Out, Err>(
    matches: &ArgMatches,
    lookup: &F,
    stdout: &mut Out,
    stderr: &mut Err,
) -> Result<u8, CliError>
where
    F: Fn(&str) -> Option<OsString>,
    Out: Write,
    Err: Write,
{
    let Some((name, sub)) = matches.subcommand() else {
        return Ok(USAGE);
    };
    let config = LoggerConfig::from_lookup(lookup)?;

    match name {
        "enabled" => Ok(handlers::enabled(&config, sub)),
        "fail" => handlers::fail(&config, &ExitSettings::from_lookup(lookup)?, sub),
        "log" => {
            let emitter = open_emitter(config, lookup, stdout, stderr)?;
            Ok(handlers::log(&emitter, sub))
        }
        "exit" | "crash" => {
            // Past this point nothing may keep the sequence from terminating:
            // malformed optional settings degrade instead of failing.
            let settings = ExitSettings::from_lookup_lossy(lookup);
            let failure = (name == "crash").then(|| handlers::failure_from(sub));
            let transport =
                handlers::open_transport_or_stderr(transport_kind(lookup), &config.tag, stderr);

            let emitter = Emitter::with_echo(config, transport, stdout);
            let coordinator = ExitCoordinator::new(emitter, CliTerminator::default())
                .with_failure_file(settings.failure_file)
                .with_started_at(settings.started_at);
            Ok(match failure {
                Some(failure) => handlers::crash(&coordinator, &failure),
                None => handlers::exit(&coordinator, sub),
            })
        }
        other => {
            tracing::error!(subcommand = other, "subcommand has no handler");
            Ok(USAGE)
        }
    }
}

fn transport_kind<F>(lookup: &F) -> Result<TransportKind, ParseTransportKindError>
where
    F: Fn(&str) -> Option<OsString>,
{
    match lookup(ENV_TRANSPORT).filter(|value| !value.is_empty()) {
        Some(value) => value.to_string_lossy().parse(),
        None => Ok(TransportKind::default()),
    }
}

fn open_emitter<'a, F, Out, Err>(
    config: LoggerConfig,
    lookup: &F,
    stdout: &'a mut Out,
    stderr: &'a mut Err,
) -> Result<Emitter<BoxedTransport<'a>, &'a mut Out>, CliError>
where
    F: Fn(&str) -> Option<OsString>,
    Out: Write,
    Err: Write,
{
    let kind = transport_kind(lookup)?;
    tracing::debug!(transport = %kind, tag = %config.tag, "opening transport");
    let transport = open_transport(kind, &config.tag, stderr)?;
    Ok(Emitter::with_echo(config, transport, stdout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn environment(extra: &[(&'static str, String)]) -> HashMap<&'static str, String> {
        let mut env = HashMap::from([
            ("SCRIPTLOG_PID", "4000".to_owned()),
            ("SCRIPTLOG_MODULE", "deploy.sh".to_owned()),
            ("SCRIPTLOG_TAG", "deploy".to_owned()),
            ("SCRIPTLOG_LEVEL", "info".to_owned()),
            ("SCRIPTLOG_TRANSPORT", "stderr".to_owned()),
        ]);
        env.extend(extra.iter().cloned());
        env
    }

    fn run_with_env(
        args: &[&str],
        env: &HashMap<&'static str, String>,
    ) -> (i32, String, String) {
        let mut full = vec![PROGRAM_NAME];
        full.extend_from_slice(args);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run_with_lookup(
            full,
            |name| env.get(name).map(OsString::from),
            &mut stdout,
            &mut stderr,
        );
        (
            code,
            String::from_utf8(stdout).unwrap(),
            String::from_utf8(stderr).unwrap(),
        )
    }

    #[test]
    fn version_goes_to_stdout() {
        let (code, stdout, stderr) = run_with_env(&["--version"], &environment(&[]));
        assert_eq!(code, 0);
        assert!(stdout.starts_with(PROGRAM_NAME));
        assert!(stderr.is_empty());
    }

    #[test]
    fn unknown_subcommand_is_a_usage_error() {
        let (code, stdout, stderr) = run_with_env(&["rotate"], &environment(&[]));
        assert_eq!(code, 1);
        assert!(stdout.is_empty());
        assert!(stderr.contains("rotate"));
    }

    #[test]
    fn log_line_reaches_transport() {
        let (code, stdout, stderr) = run_with_env(
            &["log", "-s", "info", "--function", "main", "--line", "7", "started"],
            &environment(&[]),
        );
        assert_eq!(code, 0);
        assert!(stdout.is_empty());
        assert_eq!(
            stderr,
            "deploy: INFO (PID: 4000 , MN: deploy.sh , FN: main , LI: 7):    started\n"
        );
    }

    #[test]
    fn suppressed_record_still_echoes_when_forced() {
        let (code, stdout, stderr) = run_with_env(
            &["log", "-s", "debug", "-e", "always", "noisy"],
            &environment(&[]),
        );
        assert_eq!(code, 0);
        assert_eq!(stdout, "noisy\n");
        assert!(stderr.is_empty());
    }

    #[test]
    fn missing_text_logs_placeholder() {
        let (_, _, stderr) = run_with_env(&["log", "-s", "error"], &environment(&[]));
        assert!(stderr.ends_with(":    <no log message text supplied>\n"));
    }

    #[test]
    fn exit_returns_requested_code() {
        let (code, _, stderr) = run_with_env(
            &["exit", "-s", "info", "-c", "3", "partial", "sync"],
            &environment(&[]),
        );
        assert_eq!(code, 3);
        assert!(stderr.ends_with("exiting after 0 seconds with exit code 3: partial sync\n"));
    }

    #[test]
    fn empty_text_logs_placeholder() {
        let (code, _, stderr) = run_with_env(&["log", "-s", "error", ""], &environment(&[]));
        assert_eq!(code, 0);
        assert!(stderr.ends_with(":    <no log message text supplied>\n"));
    }

    #[test]
    fn exit_keeps_code_despite_malformed_start_time() {
        let env = environment(&[("SCRIPTLOG_STARTED", "12:00".to_owned())]);
        let (code, _, stderr) = run_with_env(&["exit", "-s", "info", "-c", "0", "ok"], &env);
        assert_eq!(code, 0);
        assert!(stderr.ends_with("exiting after 0 seconds with exit code 0: ok\n"));
    }

    #[test]
    fn exit_falls_back_to_stderr_for_unknown_transport() {
        let env = environment(&[("SCRIPTLOG_TRANSPORT", "syslogd".to_owned())]);
        let (code, _, stderr) = run_with_env(&["exit", "-c", "7", "stale", "lock"], &env);
        assert_eq!(code, 7);
        assert!(stderr.starts_with("deploy: ERROR "));
        assert!(stderr.ends_with("with exit code 7: stale lock\n"));
    }

    #[test]
    fn exit_defaults_to_unspecified() {
        let (code, _, stderr) = run_with_env(&["exit"], &environment(&[]));
        assert_eq!(code, 150);
        assert!(stderr.starts_with("deploy: ERROR "));
    }

    #[test]
    fn enabled_follows_configured_level() {
        let env = environment(&[]);
        assert_eq!(run_with_env(&["enabled", "warning"], &env).0, 0);
        assert_eq!(run_with_env(&["enabled", "debug"], &env).0, 1);
    }

    #[test]
    fn missing_configuration_is_reported() {
        let env = HashMap::from([("SCRIPTLOG_TRANSPORT", "stderr".to_owned())]);
        let (code, _, stderr) = run_with_env(&["log", "x"], &env);
        assert_eq!(code, 1);
        assert_eq!(stderr, "scriptlog: SCRIPTLOG_PID must be set\n");
    }

    #[test]
    fn unknown_transport_is_reported() {
        let env = environment(&[("SCRIPTLOG_TRANSPORT", "carrier-pigeon".to_owned())]);
        let (code, _, stderr) = run_with_env(&["log", "x"], &env);
        assert_eq!(code, 1);
        assert!(stderr.contains("carrier-pigeon"));
    }

    #[test]
    fn fail_appends_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures");
        let env = environment(&[(
            "SCRIPTLOG_FAILURE_FILE",
            path.to_string_lossy().into_owned(),
        )]);
        let (code, _, _) = run_with_env(&["fail", "quota", "exceeded"], &env);
        assert_eq!(code, 0);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with("  [deploy.sh]  quota exceeded; \n"));
    }

    #[test]
    fn fail_without_file_is_not_an_error() {
        let (code, _, stderr) = run_with_env(&["fail", "x"], &environment(&[]));
        assert_eq!(code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_from_clamps() {
        assert_eq!(exit_code_from(-3), std::process::ExitCode::from(0));
        assert_eq!(exit_code_from(999), std::process::ExitCode::from(255));
        assert_eq!(exit_code_from(137), std::process::ExitCode::from(137));
    }
}
