use std::os::unix::io::AsRawFd;

use log::{debug, info};
use nix::unistd::{ForkResult, Pid, getpid, pipe, setpgid};

use super::redirect::{self, ErrorChannel, ScopedRedirect};
use crate::ast::{AstNode, CommandNode};
use crate::executor::builtin::manager::BuiltinManager;
use crate::executor::executor::report_error;
use crate::executor::jobs::{FinishedJob, JobTable};
use crate::executor::process::{exit_child, fork_process, wait_for};
use crate::executor::terminal::Terminal;
use crate::executor::{ExecError, ExecOutcome, ExecStatus, Executor};

/// Walks the tree and realizes every node with fork, exec, pipe and wait.
pub struct RecursiveExecutor {
    builtins: BuiltinManager,
    jobs: JobTable,
    terminal: Option<Terminal>,
}

impl Default for RecursiveExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl RecursiveExecutor {
    pub fn new() -> Self {
        RecursiveExecutor {
            builtins: BuiltinManager::new(),
            jobs: JobTable::new(),
            terminal: None,
        }
    }

    pub fn with_terminal(mut self, terminal: Option<Terminal>) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn reap_jobs(&mut self) -> Vec<FinishedJob> {
        self.jobs.reap()
    }

    // Runs `node` to completion inside a forked child and leaves the process.
    fn finish_child(&mut self, node: &AstNode) -> ! {
        self.jobs.forget_all();
        let code = match self.exec(node) {
            Ok(outcome) => outcome.code(),
            Err(e) => {
                report_error(&e);
                1
            }
        };
        exit_child(code)
    }

    fn spawn_external(&mut self, cmd: &CommandNode) -> ExecStatus {
        let channel = ErrorChannel::open()?;
        match fork_process()? {
            ForkResult::Child => {
                if let Some(terminal) = &self.terminal {
                    terminal.restore_default_signals();
                }
                let failure = redirect::replace_image(cmd);
                let status = failure.status();
                redirect::send_failure(channel.into_sender(), failure);
                exit_child(status)
            }
            ForkResult::Parent { child } => {
                debug!("forked {} for `{}`", child, cmd);
                let failure = channel.receive();
                let code = wait_for(child)?;
                if let Some(failure) = failure {
                    report_error(&failure.into_error(cmd));
                }
                Ok(ExecOutcome::Code(code))
            }
        }
    }

    // Puts a freshly forked child into its own process group. Called from
    // both sides of the fork; whichever runs second gets EACCES or ESRCH.
    fn own_group(pid: Pid) {
        let _ = setpgid(pid, pid);
    }
}

impl Executor for RecursiveExecutor {
    fn exec_command(&mut self, cmd: &CommandNode) -> ExecStatus {
        let Some(builtin) = self.builtins.get(&cmd.name) else {
            return self.spawn_external(cmd);
        };
        debug!("builtin `{}`", cmd);
        let _redirects = match ScopedRedirect::apply(cmd) {
            Ok(scope) => scope,
            Err(e) => {
                report_error(&e);
                return Ok(ExecOutcome::Code(1));
            }
        };
        Ok(builtin.execute(&cmd.args, &self.jobs))
    }

    fn exec_pipe(&mut self, left: &AstNode, right: &AstNode) -> ExecStatus {
        let (read_end, write_end) = pipe().map_err(ExecError::PipeCreateFailed)?;

        let writer = match fork_process()? {
            ForkResult::Child => {
                drop(read_end);
                if let Err(source) = redirect::dup_onto(write_end.as_raw_fd(), libc::STDOUT_FILENO)
                {
                    report_error(&ExecError::DescriptorDupFailed {
                        stream: "stdout",
                        source,
                    });
                    exit_child(1);
                }
                drop(write_end);
                self.finish_child(left)
            }
            ForkResult::Parent { child } => child,
        };

        let reader = match fork_process() {
            Ok(ForkResult::Child) => {
                drop(write_end);
                if let Err(source) = redirect::dup_onto(read_end.as_raw_fd(), libc::STDIN_FILENO) {
                    report_error(&ExecError::DescriptorDupFailed {
                        stream: "stdin",
                        source,
                    });
                    exit_child(1);
                }
                drop(read_end);
                self.finish_child(right)
            }
            Ok(ForkResult::Parent { child }) => child,
            Err(e) => {
                drop(read_end);
                drop(write_end);
                let _ = wait_for(writer);
                return Err(e);
            }
        };

        // Both ends must be closed here or the reader never sees EOF.
        drop(read_end);
        drop(write_end);
        debug!("pipe {} | {}", writer, reader);

        let left_status = wait_for(writer);
        let right_status = wait_for(reader);
        left_status?;
        Ok(ExecOutcome::Code(right_status?))
    }

    fn exec_background(&mut self, inner: &AstNode) -> ExecStatus {
        match fork_process()? {
            ForkResult::Child => {
                Self::own_group(getpid());
                self.finish_child(inner)
            }
            ForkResult::Parent { child } => {
                Self::own_group(child);
                let job = self.jobs.add(child, inner.to_string());
                info!("started background job {} `{}`", job, job.command);
                Ok(ExecOutcome::Background(job))
            }
        }
    }

    fn exec_subshell(&mut self, inner: &AstNode) -> ExecStatus {
        let handoff = self.terminal.filter(|t| t.owns_foreground());
        match fork_process()? {
            ForkResult::Child => {
                let me = getpid();
                Self::own_group(me);
                if let Some(terminal) = handoff {
                    terminal.give_to(me);
                }
                self.finish_child(inner)
            }
            ForkResult::Parent { child } => {
                Self::own_group(child);
                if let Some(terminal) = handoff {
                    terminal.give_to(child);
                }
                debug!("subshell {} `{}`", child, inner);
                let status = wait_for(child);
                if let Some(terminal) = handoff {
                    terminal.reclaim();
                }
                Ok(ExecOutcome::Code(status?))
            }
        }
    }
}
