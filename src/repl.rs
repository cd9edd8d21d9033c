use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::os::unix::io::AsFd;

use log::{debug, error};

use crate::config::Config;
use crate::error::ShellError;
use crate::executor::{ExecOutcome, Executor, RecursiveExecutor, Terminal};
use crate::parser;
use crate::prompt::ShellPrompt;

/// What the driver should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineResult {
    Continue(i32),
    Exit(i32),
}

pub struct Repl {
    config: Config,
    prompt: ShellPrompt,
    executor: RecursiveExecutor,
    dump_ast: bool,
    last_status: i32,
}

impl Repl {
    pub fn new(config: Config) -> Self {
        let interactive = io::stdin().is_terminal();
        let terminal = if interactive { Terminal::init() } else { None };
        Repl {
            prompt: ShellPrompt::new(config.prompt.clone(), interactive),
            executor: RecursiveExecutor::new().with_terminal(terminal),
            config,
            dump_ast: false,
            last_status: 0,
        }
    }

    /// Print parsed trees instead of running them.
    pub fn dump_ast(mut self, enabled: bool) -> Self {
        self.dump_ast = enabled;
        self
    }

    /// Reads lines from stdin until EOF or `exit`; returns the final status.
    pub fn run(&mut self) -> i32 {
        // Unbuffered so a command reading stdin sees the rest of a piped script.
        let mut input = match io::stdin().as_fd().try_clone_to_owned() {
            Ok(fd) => BufReader::with_capacity(1, File::from(fd)),
            Err(e) => {
                eprintln!("minish: {}", ShellError::from(e));
                return 1;
            }
        };
        loop {
            self.report_finished_jobs();
            if let Err(e) = self.prompt.show_prompt() {
                debug!("cannot show prompt: {}", e);
            }
            let bytes = match self.prompt.read_line(&mut input) {
                Ok(Some(bytes)) => bytes,
                Ok(None) => break,
                Err(e) => {
                    let err = ShellError::from(e);
                    error!("{}", err);
                    eprintln!("minish: {}", err);
                    return err.status();
                }
            };
            let line = match String::from_utf8(bytes) {
                Ok(line) => line,
                Err(e) => {
                    let err = ShellError::from(e);
                    debug!("{:?}", err);
                    eprintln!("minish: {}", err);
                    self.last_status = err.status();
                    continue;
                }
            };
            if let LineResult::Exit(code) = self.run_line(&line) {
                return code;
            }
        }
        self.last_status
    }

    /// Parses and runs one line, reporting any failure on stderr.
    pub fn run_line(&mut self, line: &str) -> LineResult {
        if line.trim().is_empty() {
            return LineResult::Continue(self.last_status);
        }
        let result = match self.eval(line) {
            Ok(ExecOutcome::Exit(code)) => LineResult::Exit(code),
            Ok(ExecOutcome::Background(job)) => {
                println!("{}", job);
                LineResult::Continue(0)
            }
            Ok(ExecOutcome::Code(code)) => LineResult::Continue(code),
            Err(e) => {
                debug!("{:?}", e);
                eprintln!("minish: {}", e);
                LineResult::Continue(e.status())
            }
        };
        if let LineResult::Continue(code) = result {
            self.last_status = code;
        }
        self.report_finished_jobs();
        result
    }

    fn eval(&mut self, line: &str) -> Result<ExecOutcome, ShellError> {
        let ast = parser::parse_line(line)?;
        if self.dump_ast {
            print!("{}", ast.dump_tree());
            return Ok(ExecOutcome::Code(0));
        }
        Ok(self.executor.exec(&ast)?)
    }

    fn report_finished_jobs(&mut self) {
        for done in self.executor.reap_jobs() {
            debug!("reaped {}", done);
            if self.config.notify_jobs {
                println!("{}", done);
            }
        }
    }
}

impl LineResult {
    pub fn code(self) -> i32 {
        match self {
            LineResult::Continue(code) | LineResult::Exit(code) => code,
        }
    }
}
