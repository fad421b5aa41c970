//! crates/cli/src/terminator.rs
//! Terminator that turns the exit request into the front end's return value.

use std::cell::Cell;
use std::io;

use lifecycle::{ProcessTerminator, Terminator};

/// Keeps the first requested exit code instead of exiting, so `run` can
/// return it to `main`; kills go to the real process.
#[derive(Debug, Default)]
pub(crate) struct CliTerminator {
    code: Cell<Option<u8>>,
}

impl CliTerminator {
    pub(crate) const fn code(&self) -> Option<u8> {
        self.code.get()
    }
}

impl Terminator for CliTerminator {
    fn exit(&self, code: u8) {
        if self.code.get().is_none() {
            self.code.set(Some(code));
        }
    }

    fn kill(&self, pid: u32) -> io::Result<()> {
        ProcessTerminator.kill(pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_exit_code_wins() {
        let terminator = CliTerminator::default();
        assert_eq!(terminator.code(), None);
        terminator.exit(4);
        terminator.exit(9);
        assert_eq!(terminator.code(), Some(4));
    }
}
