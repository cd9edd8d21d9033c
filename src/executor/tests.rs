use nix::unistd::Pid;

use crate::ast::{AstNode, CommandNode};
use crate::executor::{ExecError, ExecOutcome, ExecStatus, Executor, Job};
use crate::parser::parse_line;

/// Records what would run instead of forking. A command's status is its
/// first argument when that parses as a number, so `st 3` "exits" with 3;
/// `boom` fails to fork and `exit N` behaves like the builtin.
pub struct MockExecutor {
    pub ran: Vec<String>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self { ran: Vec::new() }
    }

    fn run(line: &str) -> (ExecStatus, Vec<String>) {
        let ast = parse_line(line).unwrap();
        let mut mock = MockExecutor::new();
        let status = mock.exec(&ast);
        (status, mock.ran)
    }
}

impl Executor for MockExecutor {
    fn exec_command(&mut self, cmd: &CommandNode) -> ExecStatus {
        self.ran.push(cmd.to_string());
        let first = cmd.args.first().and_then(|a| a.parse::<i32>().ok());
        match cmd.name.as_str() {
            "boom" => Err(ExecError::ForkFailed(nix::errno::Errno::EAGAIN)),
            "exit" => Ok(ExecOutcome::Exit(first.unwrap_or(0))),
            _ => Ok(ExecOutcome::Code(first.unwrap_or(0))),
        }
    }

    fn exec_pipe(&mut self, left: &AstNode, right: &AstNode) -> ExecStatus {
        self.exec(left)?;
        self.exec(right)
    }

    fn exec_background(&mut self, inner: &AstNode) -> ExecStatus {
        self.ran.push(format!("bg {}", inner));
        Ok(ExecOutcome::Background(Job {
            id: 1,
            pid: Pid::from_raw(4242),
            command: inner.to_string(),
        }))
    }

    fn exec_subshell(&mut self, inner: &AstNode) -> ExecStatus {
        let outcome = self.exec(inner)?;
        // an exit inside a subshell only ends the subshell
        Ok(ExecOutcome::Code(outcome.code()))
    }
}

#[test]
fn test_and_runs_right_only_on_success() {
    let (status, ran) = MockExecutor::run("st 0 && st 5");
    assert_eq!(status.unwrap(), ExecOutcome::Code(5));
    assert_eq!(ran, vec!["st 0", "st 5"]);

    let (status, ran) = MockExecutor::run("st 1 && st 5");
    assert_eq!(status.unwrap(), ExecOutcome::Code(1));
    assert_eq!(ran, vec!["st 1"]);
}

#[test]
fn test_or_runs_right_only_on_failure() {
    let (status, ran) = MockExecutor::run("st 0 || st 5");
    assert_eq!(status.unwrap(), ExecOutcome::Code(0));
    assert_eq!(ran, vec!["st 0"]);

    let (status, ran) = MockExecutor::run("st 2 || st 0");
    assert_eq!(status.unwrap(), ExecOutcome::Code(0));
    assert_eq!(ran, vec!["st 2", "st 0"]);
}

#[test]
fn test_sequence_discards_left_status() {
    let (status, ran) = MockExecutor::run("st 7; st 0");
    assert_eq!(status.unwrap(), ExecOutcome::Code(0));
    assert_eq!(ran, vec!["st 7", "st 0"]);
}

#[test]
fn test_and_or_chain_is_right_nested() {
    // a && (b || c): a fails, so neither b nor c runs
    let (status, ran) = MockExecutor::run("st 1 && st 0 || st 9");
    assert_eq!(status.unwrap(), ExecOutcome::Code(1));
    assert_eq!(ran, vec!["st 1"]);
}

#[test]
fn test_exit_stops_the_line() {
    let (status, ran) = MockExecutor::run("exit 3; st 0");
    assert_eq!(status.unwrap(), ExecOutcome::Exit(3));
    assert_eq!(ran, vec!["exit 3"]);

    let (status, ran) = MockExecutor::run("exit 0 || st 1");
    assert_eq!(status.unwrap(), ExecOutcome::Exit(0));
    assert_eq!(ran, vec!["exit 0"]);

    let (status, ran) = MockExecutor::run("st 0 && exit 4 && st 1");
    assert_eq!(status.unwrap(), ExecOutcome::Exit(4));
    assert_eq!(ran, vec!["st 0", "exit 4"]);
}

#[test]
fn test_exit_in_subshell_does_not_leak() {
    let (status, ran) = MockExecutor::run("(exit 3); st 0");
    assert_eq!(status.unwrap(), ExecOutcome::Code(0));
    assert_eq!(ran, vec!["exit 3", "st 0"]);
}

#[test]
fn test_background_counts_as_success() {
    let (status, ran) = MockExecutor::run("st 1 && st 2 &");
    let outcome = status.unwrap();
    assert!(matches!(outcome, ExecOutcome::Background(_)));
    assert_eq!(outcome.code(), 0);
    assert_eq!(ran, vec!["bg st 1 && st 2"]);
}

#[test]
fn test_failed_left_side_still_runs_sequence() {
    let (status, ran) = MockExecutor::run("boom; st 0");
    assert_eq!(status.unwrap(), ExecOutcome::Code(0));
    assert_eq!(ran, vec!["boom", "st 0"]);
}

#[test]
fn test_failed_left_side_counts_as_failure() {
    let (status, ran) = MockExecutor::run("boom || st 0");
    assert_eq!(status.unwrap(), ExecOutcome::Code(0));
    assert_eq!(ran, vec!["boom", "st 0"]);

    let (status, ran) = MockExecutor::run("boom && st 0");
    assert!(matches!(status, Err(ExecError::ForkFailed(_))));
    assert_eq!(ran, vec!["boom"]);
}

#[test]
fn test_failed_last_operand_is_returned() {
    let (status, ran) = MockExecutor::run("st 0; boom");
    assert!(matches!(status, Err(ExecError::ForkFailed(_))));
    assert_eq!(ran, vec!["st 0", "boom"]);
}

#[test]
fn test_pipe_status_is_right_side() {
    let (status, _) = MockExecutor::run("st 1 | st 0");
    assert_eq!(status.unwrap(), ExecOutcome::Code(0));
}
