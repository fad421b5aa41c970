#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/lifecycle/src/lib.rs
//!
//! # Overview
//!
//! `lifecycle` owns how a logged process ends. Voluntary exits go through
//! [`ExitCoordinator`], which logs a runtime summary before handing the code
//! to a [`Terminator`]. Abnormal failures go through [`CrashTrap`], which
//! appends a record to the [`FailureFile`], logs a forensic snapshot, and kills
//! the logged process.
//!
//! # Design
//!
//! The exit trap is an [`ExitGuard`]: dropping it while the coordinator is
//! still armed runs the default exit (ERROR, code 150, "unspecified").
//! The crash trap is a [`CrashTrap`] around an explicit `Result`: the first
//! error out of [`CrashTrap::run_guarded`] fires it. Process termination is
//! behind [`Terminator`] so both sequences can run to completion in tests.
//!
//! # Invariants
//!
//! - The exit sequence runs at most once per coordinator; it disarms before
//!   doing anything else.
//! - The crash sequence runs at most once per trap, and it disarms the
//!   coordinator so the exit trap cannot fire afterwards.
//! - A failure to write the failure file never prevents termination.
//!
//! # See also
//!
//! - `logging` for the emitter both sequences log through.

mod crash;
mod exit;
pub mod exit_code;
mod failure_file;
mod settings;
mod terminator;

pub use crash::{CrashTrap, Failure, TrapOutcome, TrapState};
pub use exit::{
    ExitCoordinator, ExitGuard, ExitOutcome, ExitState, FailureRecordPolicy, UNSPECIFIED_REASON,
};
pub use failure_file::{FailureFile, FailureFileError, format_record};
pub use settings::{ENV_FAILURE_FILE, ENV_STARTED, ExitSettings};
pub use terminator::{ProcessTerminator, RecordingTerminator, Termination, Terminator};
