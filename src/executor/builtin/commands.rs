use std::env;
use std::io::{self, Write};

use log::debug;

use super::BuiltinError;
use super::manager::BuiltinCommand;
use crate::executor::ExecOutcome;
use crate::executor::jobs::JobTable;

pub struct HelpCommand;

impl BuiltinCommand for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn run(&self, _args: &[String], _jobs: &JobTable) -> Result<ExecOutcome, BuiltinError> {
        let text = "\
Available built-in commands:
  cd [DIR]   : Change directory (defaults to $HOME)
  exit [N]   : Exit the shell with status N
  jobs       : List running background jobs
  help       : Show this help
Operators: | && || ; & ( ) < > >>
";
        io::stdout()
            .write_all(text.as_bytes())
            .map_err(|source| BuiltinError::Output {
                name: "help",
                source,
            })?;
        Ok(ExecOutcome::Code(0))
    }
}

pub struct CdCommand;

impl BuiltinCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    fn run(&self, args: &[String], _jobs: &JobTable) -> Result<ExecOutcome, BuiltinError> {
        if args.len() > 1 {
            return Err(BuiltinError::TooManyArguments { name: "cd" });
        }
        let target = match args.first() {
            Some(dir) => dir.clone(),
            None => env::var("HOME").unwrap_or_else(|_| "/".to_string()),
        };
        env::set_current_dir(&target).map_err(|source| BuiltinError::ChangeDirectoryFailed {
            path: target.clone(),
            source,
        })?;
        debug!("cwd is now {}", target);
        Ok(ExecOutcome::Code(0))
    }
}

pub struct ExitCommand;

impl BuiltinCommand for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn run(&self, args: &[String], _jobs: &JobTable) -> Result<ExecOutcome, BuiltinError> {
        if args.len() > 1 {
            return Err(BuiltinError::TooManyArguments { name: "exit" });
        }
        let code = match args.first() {
            None => 0,
            Some(arg) => match arg.parse::<i64>() {
                Ok(n) => (n & 0xff) as i32,
                Err(_) => {
                    eprintln!("minish: exit: {}: numeric argument required", arg);
                    2
                }
            },
        };
        Ok(ExecOutcome::Exit(code))
    }
}

pub struct JobsCommand;

impl BuiltinCommand for JobsCommand {
    fn name(&self) -> &'static str {
        "jobs"
    }

    fn run(&self, _args: &[String], jobs: &JobTable) -> Result<ExecOutcome, BuiltinError> {
        let mut out = io::stdout().lock();
        for job in jobs.list() {
            writeln!(out, "[{}]  Running    {}  {}", job.id, job.pid, job.command).map_err(
                |source| BuiltinError::Output {
                    name: "jobs",
                    source,
                },
            )?;
        }
        Ok(ExecOutcome::Code(0))
    }
}
