use std::collections::HashMap;

use log::warn;

use super::BuiltinError;
use super::commands::{CdCommand, ExitCommand, HelpCommand, JobsCommand};
use crate::executor::ExecOutcome;
use crate::executor::jobs::JobTable;

/// A command run inside the interpreter process instead of a child.
pub trait BuiltinCommand {
    fn name(&self) -> &'static str;
    fn run(&self, args: &[String], jobs: &JobTable) -> Result<ExecOutcome, BuiltinError>;

    /// Runs the builtin. Failures are reported here and become status 1.
    fn execute(&self, args: &[String], jobs: &JobTable) -> ExecOutcome {
        match self.run(args, jobs) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("builtin {} failed: {:?}", self.name(), e);
                eprintln!("minish: {}", e);
                ExecOutcome::Code(1)
            }
        }
    }
}

pub struct BuiltinManager {
    commands: HashMap<String, Box<dyn BuiltinCommand>>,
}

impl Default for BuiltinManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinManager {
    pub fn new() -> Self {
        let mut mgr = BuiltinManager {
            commands: HashMap::new(),
        };
        mgr.register(Box::new(HelpCommand));
        mgr.register(Box::new(CdCommand));
        mgr.register(Box::new(ExitCommand));
        mgr.register(Box::new(JobsCommand));
        mgr
    }

    pub fn register(&mut self, cmd: Box<dyn BuiltinCommand>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn BuiltinCommand> {
        self.commands.get(name).map(|cmd| &**cmd)
    }
}
