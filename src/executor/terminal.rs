//! Terminal ownership for interactive sessions.
//!
//! The interactive shell ignores the keyboard and job-control signals so a
//! Ctrl-C only reaches the foreground job. Subshells run in their own
//! process group, so the terminal foreground is handed to them while the
//! shell waits and taken back afterwards.

use std::io::{self, IsTerminal};
use std::os::unix::io::BorrowedFd;

use log::warn;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::{self, Pid, tcgetpgrp, tcsetpgrp};

const JOB_CONTROL_SIGNALS: [Signal; 5] = [
    Signal::SIGINT,
    Signal::SIGQUIT,
    Signal::SIGTSTP,
    Signal::SIGTTIN,
    Signal::SIGTTOU,
];

fn stdin_fd() -> BorrowedFd<'static> {
    // SAFETY: fd 0 stays open for the lifetime of the process.
    unsafe { BorrowedFd::borrow_raw(0) }
}

fn set_disposition(sig: Signal, handler: SigHandler) {
    let action = SigAction::new(handler, SaFlags::empty(), SigSet::empty());
    // SAFETY: only SIG_IGN and SIG_DFL are installed, no handler code runs.
    if let Err(e) = unsafe { signal::sigaction(sig, &action) } {
        warn!("cannot set disposition of {:?}: {}", sig, e);
    }
}

/// Marker that the interpreter is attached to a terminal it may hand over.
#[derive(Debug, Clone, Copy)]
pub struct Terminal {
    _private: (),
}

impl Terminal {
    /// Returns `None` unless stdin is a terminal whose foreground group is ours.
    pub fn init() -> Option<Self> {
        if !io::stdin().is_terminal() {
            return None;
        }
        let foreground = tcgetpgrp(stdin_fd()).ok()?;
        if foreground != unistd::getpgrp() {
            return None;
        }
        for sig in JOB_CONTROL_SIGNALS {
            set_disposition(sig, SigHandler::SigIgn);
        }
        Some(Terminal { _private: () })
    }

    pub fn owns_foreground(&self) -> bool {
        tcgetpgrp(stdin_fd()).is_ok_and(|pgid| pgid == unistd::getpgrp())
    }

    pub fn give_to(&self, pgid: Pid) {
        if let Err(e) = tcsetpgrp(stdin_fd(), pgid) {
            warn!("cannot hand terminal to group {}: {}", pgid, e);
        }
    }

    /// Makes the caller's process group the foreground group again.
    pub fn reclaim(&self) {
        let own = unistd::getpgrp();
        if let Err(e) = tcsetpgrp(stdin_fd(), own) {
            warn!("cannot reclaim terminal for group {}: {}", own, e);
        }
    }

    /// Undoes `init` in a child that is about to replace its image.
    pub fn restore_default_signals(&self) {
        for sig in JOB_CONTROL_SIGNALS {
            set_disposition(sig, SigHandler::SigDfl);
        }
    }
}
