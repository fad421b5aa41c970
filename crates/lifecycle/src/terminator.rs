//! crates/lifecycle/src/terminator.rs
//! The last step of every exit path: ending this process or killing another.

use std::io;
use std::sync::{Mutex, PoisonError};

/// Ends processes on behalf of the exit and crash paths.
///
/// [`ProcessTerminator`] is what runs in production. Tests substitute
/// [`RecordingTerminator`] so the full exit and crash sequences can be
/// observed without the test process disappearing.
pub trait Terminator {
    /// Ends the current process with `code`.
    ///
    /// The production implementation does not return.
    fn exit(&self, code: u8);

    /// Sends an uncatchable kill to process `pid`.
    fn kill(&self, pid: u32) -> io::Result<()>;
}

impl<K: Terminator + ?Sized> Terminator for &K {
    fn exit(&self, code: u8) {
        (**self).exit(code);
    }

    fn kill(&self, pid: u32) -> io::Result<()> {
        (**self).kill(pid)
    }
}

/// Terminates through [`std::process::exit`] and `kill(2)` with `SIGKILL`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn exit(&self, code: u8) {
        std::process::exit(i32::from(code));
    }

    #[cfg(unix)]
    #[allow(unsafe_code)]
    fn kill(&self, pid: u32) -> io::Result<()> {
        let pid = libc::pid_t::try_from(pid).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("pid {pid} out of range"))
        })?;
        if pid <= 0 {
            // 0 and negative values address process groups.
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to signal pid {pid}"),
            ));
        }

        // SAFETY: kill(2) takes plain integers and touches no memory of ours.
        let rc = unsafe { libc::kill(pid, libc::SIGKILL) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    fn kill(&self, pid: u32) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("cannot kill pid {pid} on this platform"),
        ))
    }
}

/// What a [`RecordingTerminator`] was asked to do.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Termination {
    /// [`Terminator::exit`] with this code.
    Exit(u8),
    /// [`Terminator::kill`] of this pid.
    Kill(u32),
}

/// Terminator that only remembers its calls.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    calls: Mutex<Vec<Termination>>,
}

impl RecordingTerminator {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Termination> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Code of the last exit request, if any.
    #[must_use]
    pub fn exit_code(&self) -> Option<u8> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Termination::Exit(code) => Some(code),
            Termination::Kill(_) => None,
        })
    }

    fn push(&self, call: Termination) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Terminator for RecordingTerminator {
    fn exit(&self, code: u8) {
        self.push(Termination::Exit(code));
    }

    fn kill(&self, pid: u32) -> io::Result<()> {
        self.push(Termination::Kill(pid));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_call_order() {
        let recorder = RecordingTerminator::new();
        recorder.kill(77).unwrap();
        recorder.exit(3);
        assert_eq!(
            recorder.calls(),
            vec![Termination::Kill(77), Termination::Exit(3)]
        );
        assert_eq!(recorder.exit_code(), Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn process_group_pids_are_refused() {
        let error = ProcessTerminator.kill(0).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[test]
    fn kill_ends_a_child() {
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .expect("spawn sleep");
        ProcessTerminator.kill(child.id()).unwrap();
        let status = child.wait().unwrap();
        assert!(!status.success());
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(status.signal(), Some(libc::SIGKILL));
    }
}
