use std::io;

use nix::errno::Errno;
use thiserror::Error;

use super::jobs::Job;
use crate::ast::{AstNode, CommandNode};

pub type ExecStatus = Result<ExecOutcome, ExecError>;

/// What evaluating one subtree produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Exit status: 0-255 for a normal exit, 128 + signal number for a signal death.
    Code(i32),
    /// A job was started and not waited for. Counts as success.
    Background(Job),
    /// The `exit` builtin ran; the interpreter should stop with this code.
    Exit(i32),
}

impl ExecOutcome {
    pub fn code(&self) -> i32 {
        match self {
            ExecOutcome::Code(code) | ExecOutcome::Exit(code) => *code,
            ExecOutcome::Background(_) => 0,
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, ExecOutcome::Exit(_))
    }
}

/// Orchestration failures. The first three variants and `WaitFailed` happen
/// in the interpreter itself; the rest are reported back by a forked child.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("fork failed: {0}")]
    ForkFailed(#[source] Errno),
    #[error("pipe creation failed: {0}")]
    PipeCreateFailed(#[source] Errno),
    #[error("{path}: {source}")]
    FileOpenFailed {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot redirect {stream}: {source}")]
    DescriptorDupFailed {
        stream: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("{program}: {source}")]
    ImageReplaceFailed {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("wait failed: {0}")]
    WaitFailed(#[source] Errno),
}

pub(crate) fn report_error(err: &ExecError) {
    log::debug!("{:?}", err);
    eprintln!("minish: {}", err);
}

/// Reports a failed left operand and lets the line go on as if it exited 1.
fn recover(status: ExecStatus) -> ExecOutcome {
    status.unwrap_or_else(|e| {
        report_error(&e);
        ExecOutcome::Code(1)
    })
}

/// Realizes an AST. Implementors supply the four process-level operations;
/// the control-flow operators are shared.
pub trait Executor {
    fn exec_command(&mut self, cmd: &CommandNode) -> ExecStatus;
    fn exec_pipe(&mut self, left: &AstNode, right: &AstNode) -> ExecStatus;
    fn exec_background(&mut self, inner: &AstNode) -> ExecStatus;
    fn exec_subshell(&mut self, inner: &AstNode) -> ExecStatus;

    fn exec(&mut self, node: &AstNode) -> ExecStatus {
        match node {
            AstNode::Command(cmd) => self.exec_command(cmd),
            AstNode::Pipe(lhs, rhs) => self.exec_pipe(lhs, rhs),
            AstNode::Background(inner) => self.exec_background(inner),
            AstNode::Subshell(inner) => self.exec_subshell(inner),
            AstNode::Sequence(lhs, rhs) => {
                let left = recover(self.exec(lhs));
                if left.is_exit() {
                    return Ok(left);
                }
                self.exec(rhs)
            }
            AstNode::And(lhs, rhs) => {
                let left = self.exec(lhs)?;
                if left.is_exit() || left.code() != 0 {
                    Ok(left)
                } else {
                    self.exec(rhs)
                }
            }
            AstNode::Or(lhs, rhs) => {
                let left = recover(self.exec(lhs));
                if left.is_exit() || left.code() == 0 {
                    Ok(left)
                } else {
                    self.exec(rhs)
                }
            }
        }
    }
}
