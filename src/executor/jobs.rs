use std::fmt;

use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

use super::process::exit_code;

/// A background job handle. `id` is the small number shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub pid: Pid,
    pub command: String,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.pid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedJob {
    pub job: Job,
    pub status: i32,
}

impl fmt::Display for FinishedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.status == 0 {
            "Done".to_string()
        } else {
            format!("Exit {}", self.status)
        };
        write!(
            f,
            "[{}]  {:<10} {}  {}",
            self.job.id, state, self.job.pid, self.job.command
        )
    }
}

/// Background jobs started by this interpreter and not yet reaped.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a started job under the lowest free id.
    pub fn add(&mut self, pid: Pid, command: impl Into<String>) -> Job {
        let mut id = 1;
        while self.jobs.iter().any(|j| j.id == id) {
            id += 1;
        }
        let job = Job {
            id,
            pid,
            command: command.into(),
        };
        self.jobs.push(job.clone());
        debug!("job {} registered", job);
        job
    }

    pub fn list(&self) -> &[Job] {
        &self.jobs
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drops every entry without waiting. Used in forked children, which
    /// cannot wait for their siblings.
    pub fn forget_all(&mut self) {
        self.jobs.clear();
    }

    /// Collects jobs that have terminated, without blocking.
    pub fn reap(&mut self) -> Vec<FinishedJob> {
        let mut finished = Vec::new();
        self.jobs.retain(|job| {
            match waitpid(job.pid, Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => true,
                Ok(status) => match exit_code(status) {
                    Some(code) => {
                        finished.push(FinishedJob {
                            job: job.clone(),
                            status: code,
                        });
                        false
                    }
                    None => true,
                },
                Err(Errno::ECHILD) => {
                    warn!("job {} is no longer a child of this shell", job);
                    false
                }
                Err(e) => {
                    warn!("waiting for job {} failed: {}", job, e);
                    true
                }
            }
        });
        finished
    }
}
