//! crates/cli/src/command.rs
//! The `clap` definition of the `scriptlog` command line.

use clap::{Arg, ArgAction, Command, value_parser};
use logging::EchoPolicy;

/// Program name used in usage and error output.
pub const PROGRAM_NAME: &str = "scriptlog";

fn severity_arg(default: &'static str) -> Arg {
    Arg::new("severity")
        .long("severity")
        .short('s')
        .value_name("SEVERITY")
        .default_value(default)
        .help("none, critical, error, warning, info or debug; unknown values log as error.")
}

fn echo_arg() -> Arg {
    Arg::new("echo")
        .long("echo")
        .short('e')
        .value_name("POLICY")
        .value_parser(|value: &str| value.parse::<EchoPolicy>())
        .default_value("never")
        .help("Also print the raw text to standard output: never, if-allowed or always.")
}

fn log_command() -> Command {
    Command::new("log")
        .about("Log a message through the configured transport.")
        .arg(severity_arg("info"))
        .arg(echo_arg())
        .arg(
            Arg::new("function")
                .long("function")
                .value_name("NAME")
                .help("Calling function, usually ${FUNCNAME[0]}."),
        )
        .arg(
            Arg::new("line")
                .long("line")
                .value_name("N")
                .value_parser(value_parser!(u32))
                .default_value("0")
                .help("Calling source line, usually ${LINENO}."),
        )
        .arg(
            Arg::new("text")
                .value_name("TEXT")
                .num_args(0..)
                .help("Message text; several words are joined with spaces."),
        )
}

fn exit_command() -> Command {
    Command::new("exit")
        .about("Log a runtime summary and exit with CODE; forward it with `exit $?`.")
        .arg(severity_arg("error"))
        .arg(
            Arg::new("code")
                .long("code")
                .short('c')
                .value_name("CODE")
                .value_parser(value_parser!(u8))
                .default_value("150")
                .help("Exit status, 0 to 255."),
        )
        .arg(echo_arg())
        .arg(
            Arg::new("record-failure")
                .long("record-failure")
                .action(ArgAction::SetTrue)
                .help("Append a record to the failure file when CODE is non-zero."),
        )
        .arg(
            Arg::new("reason")
                .value_name("REASON")
                .num_args(0..)
                .help("Why the script is exiting."),
        )
}

fn crash_command() -> Command {
    Command::new("crash")
        .about("Record a failed command, log the forensics and kill the script.")
        .arg(
            Arg::new("line")
                .long("line")
                .value_name("N")
                .value_parser(value_parser!(u32))
                .required(true)
                .help("Line of the failing command, usually ${LINENO}."),
        )
        .arg(
            Arg::new("command")
                .long("command")
                .value_name("CMD")
                .required(true)
                .allow_hyphen_values(true)
                .help("Failing command text, usually ${BASH_COMMAND}."),
        )
        .arg(
            Arg::new("last-arg")
                .long("last-arg")
                .value_name("ARG")
                .allow_hyphen_values(true)
                .help("Last expanded argument, usually $_."),
        )
        .arg(
            Arg::new("status")
                .long("status")
                .value_name("N")
                .value_parser(value_parser!(i32))
                .required(true)
                .help("Exit status of the failing command."),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .value_name("FILE")
                .help("Source file, usually ${BASH_SOURCE[0]}."),
        )
        .arg(
            Arg::new("functions")
                .long("functions")
                .value_name("LIST")
                .help("Space separated function stack, usually \"${FUNCNAME[*]}\"."),
        )
        .arg(
            Arg::new("lines")
                .long("lines")
                .value_name("LIST")
                .help("Space separated call line stack, usually \"${BASH_LINENO[*]}\"."),
        )
        .arg(
            Arg::new("reason")
                .long("reason")
                .value_name("TEXT")
                .help("Reason for the failure file; derived from the command when omitted."),
        )
}

fn fail_command() -> Command {
    Command::new("fail")
        .about("Append a record to the failure file without exiting.")
        .arg(
            Arg::new("reason")
                .value_name("REASON")
                .num_args(1..)
                .required(true),
        )
}

fn enabled_command() -> Command {
    Command::new("enabled")
        .about("Exit 0 when a record at SEVERITY would be logged, 1 otherwise.")
        .arg(Arg::new("severity").value_name("SEVERITY").required(true))
}

/// Builds the `clap` command used for parsing.
pub fn clap_command() -> Command {
    Command::new(PROGRAM_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Leveled syslog logging for shell scripts.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(log_command())
        .subcommand(exit_command())
        .subcommand(crash_command())
        .subcommand(fail_command())
        .subcommand(enabled_command())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        clap_command().debug_assert();
    }

    #[test]
    fn exit_defaults_match_exit_trap() {
        let matches = clap_command()
            .try_get_matches_from([PROGRAM_NAME, "exit"])
            .unwrap();
        let (_, exit) = matches.subcommand().unwrap();
        assert_eq!(exit.get_one::<String>("severity").map(String::as_str), Some("error"));
        assert_eq!(exit.get_one::<u8>("code"), Some(&150));
        assert_eq!(exit.get_one::<EchoPolicy>("echo"), Some(&EchoPolicy::Never));
    }

    #[test]
    fn exit_code_is_range_checked() {
        assert!(clap_command()
            .try_get_matches_from([PROGRAM_NAME, "exit", "-c", "256"])
            .is_err());
    }

    #[test]
    fn crash_accepts_hyphenated_commands() {
        let matches = clap_command()
            .try_get_matches_from([
                PROGRAM_NAME, "crash", "--line", "3", "--command", "-x", "--status", "1",
            ])
            .unwrap();
        let (_, crash) = matches.subcommand().unwrap();
        assert_eq!(crash.get_one::<String>("command").map(String::as_str), Some("-x"));
    }
}
