use std::io::{self, Write};

use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, fork};

use super::executor::ExecError;

/// Forks the interpreter. Buffered output is flushed first so the child
/// does not repeat it.
pub(crate) fn fork_process() -> Result<ForkResult, ExecError> {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    // SAFETY: the interpreter runs on a single thread, so no lock can be
    // held by another thread at the moment of the fork.
    unsafe { fork() }.map_err(ExecError::ForkFailed)
}

/// Maps a terminal wait status to a shell exit status.
pub(crate) fn exit_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
        _ => None,
    }
}

/// Blocks until `pid` terminates.
pub(crate) fn wait_for(pid: Pid) -> Result<i32, ExecError> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(code) = exit_code(status) {
                    log::debug!("pid {} exited with {}", pid, code);
                    return Ok(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ExecError::WaitFailed(e)),
        }
    }
}

/// Leaves a forked child without running the parent's exit-time cleanup.
pub(crate) fn exit_child(code: i32) -> ! {
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
    // SAFETY: _exit only terminates the calling process.
    unsafe { libc::_exit(code) }
}
