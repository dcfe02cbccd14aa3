//! Exit analysis for worker processes and the respawn policy.

use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

/// Why a worker process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Exited with status 0.
    Clean,
    /// Exited with a non-zero status.
    Crashed { code: i32 },
    /// Terminated by a signal.
    SignalKilled { signal: Signal },
}

impl ExitReason {
    /// Classify a wait status.
    ///
    /// Returns `None` for statuses that do not mean the process is gone
    /// (still alive, stopped, continued).
    pub fn from_wait_status(status: WaitStatus) -> Option<(Pid, ExitReason)> {
        match status {
            WaitStatus::Exited(pid, 0) => Some((pid, ExitReason::Clean)),
            WaitStatus::Exited(pid, code) => Some((pid, ExitReason::Crashed { code })),
            WaitStatus::Signaled(pid, signal, _) => {
                Some((pid, ExitReason::SignalKilled { signal }))
            }
            _ => None,
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, ExitReason::Clean)
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Clean => write!(f, "exited cleanly"),
            ExitReason::Crashed { code } => write!(f, "exited with code {}", code),
            ExitReason::SignalKilled { signal } => write!(f, "killed by signal {}", signal),
        }
    }
}

/// Whether a worker that exited for `reason` gets a replacement.
///
/// Every exit is replaced immediately whatever its cause, with no backoff
/// and no restart limit. A worker that dies on startup is
/// therefore respawned in a tight loop.
pub fn should_respawn(reason: ExitReason) -> bool {
    match reason {
        ExitReason::Clean => true,
        ExitReason::Crashed { .. } => true,
        ExitReason::SignalKilled { .. } => true,
    }
}
