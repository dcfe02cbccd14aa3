//! Bookkeeping for a single worker process.

use nix::unistd::Pid;

use super::signals::ExitReason;
use crate::error::{CoreforkError, Result};

/// Lifecycle of one worker: `Starting -> Running -> Exited`.
///
/// An exited worker is never revived; its replacement is a new
/// [`WorkerProcess`] with a new id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, process not yet spawned.
    Starting,
    /// Process spawned and not yet reaped.
    Running,
    /// Reaped by the supervisor.
    Exited(ExitReason),
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Starting => write!(f, "starting"),
            WorkerState::Running => write!(f, "running"),
            WorkerState::Exited(reason) => write!(f, "exited ({})", reason),
        }
    }
}

/// One worker owned by the supervisor.
#[derive(Debug, Clone)]
pub struct WorkerProcess {
    id: usize,
    pid: Option<Pid>,
    state: WorkerState,
}

impl WorkerProcess {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            pid: None,
            state: WorkerState::Starting,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// OS process id, known once the worker is running.
    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    #[cfg(test)]
    pub fn state(&self) -> WorkerState {
        self.state
    }

    #[cfg(test)]
    pub fn exit_reason(&self) -> Option<ExitReason> {
        match self.state {
            WorkerState::Exited(reason) => Some(reason),
            _ => None,
        }
    }

    /// Record a successful spawn.
    pub fn mark_running(&mut self, pid: Pid) -> Result<()> {
        if self.state != WorkerState::Starting {
            return Err(self.invalid("running"));
        }
        self.pid = Some(pid);
        self.state = WorkerState::Running;
        Ok(())
    }

    /// Record that the process was reaped.
    pub fn mark_exited(&mut self, reason: ExitReason) -> Result<()> {
        if self.state != WorkerState::Running {
            return Err(self.invalid("exited"));
        }
        self.state = WorkerState::Exited(reason);
        Ok(())
    }

    fn invalid(&self, to: &'static str) -> CoreforkError {
        CoreforkError::InvalidTransition {
            worker_id: self.id,
            from: self.state,
            to,
        }
    }
}
