mod builtin;
mod executor;
mod jobs;
mod process;
mod recursive_executor;
mod terminal;
#[cfg(test)]
mod tests;

pub use builtin::BuiltinError;
pub use builtin::manager::{BuiltinCommand, BuiltinManager};
pub use executor::{ExecError, ExecOutcome, ExecStatus, Executor};
pub use jobs::{FinishedJob, Job, JobTable};
pub use recursive_executor::RecursiveExecutor;
pub use terminal::Terminal;
