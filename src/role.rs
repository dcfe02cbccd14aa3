//! Process role resolution.
//!
//! Every process runs the same binary. The supervisor marks the children it
//! spawns through their environment; anything without those markers is the
//! primary. The role is resolved once in `main` and passed down by value.

use nix::unistd::Pid;

use crate::error::{CoreforkError, Result};

/// Set on workers: the supervisor-assigned worker id.
pub const ENV_WORKER_ID: &str = "COREFORK_WORKER_ID";

/// Set on workers: process id of the primary that spawned them.
pub const ENV_PRIMARY_PID: &str = "COREFORK_PRIMARY_PID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Runs the pool supervisor.
    Primary,
    /// Serves HTTP on the shared port.
    Worker { id: usize, primary_pid: Pid },
}

impl Role {
    /// Resolve the role of the current process from its environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var(ENV_WORKER_ID).ok(),
            std::env::var(ENV_PRIMARY_PID).ok(),
        )
    }

    fn from_vars(worker_id: Option<String>, primary_pid: Option<String>) -> Result<Self> {
        let Some(worker_id) = worker_id else {
            return Ok(Role::Primary);
        };

        let id = worker_id.trim().parse::<usize>().map_err(|_| {
            CoreforkError::Role(format!("{} is not a worker id: '{}'", ENV_WORKER_ID, worker_id))
        })?;

        let primary_pid = primary_pid
            .ok_or_else(|| {
                CoreforkError::Role(format!("{} is set but {} is missing", ENV_WORKER_ID, ENV_PRIMARY_PID))
            })?
            .trim()
            .parse::<i32>()
            .ok()
            .filter(|pid| *pid > 0)
            .map(Pid::from_raw)
            .ok_or_else(|| {
                CoreforkError::Role(format!("{} is not a process id", ENV_PRIMARY_PID))
            })?;

        Ok(Role::Worker { id, primary_pid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(id: Option<&str>, pid: Option<&str>) -> Result<Role> {
        Role::from_vars(id.map(String::from), pid.map(String::from))
    }

    #[test]
    fn test_no_markers_means_primary() {
        assert_eq!(vars(None, None).unwrap(), Role::Primary);
    }

    #[test]
    fn test_primary_pid_alone_is_still_primary() {
        assert_eq!(vars(None, Some("42")).unwrap(), Role::Primary);
    }

    #[test]
    fn test_worker_markers() {
        let role = vars(Some("3"), Some("1234")).unwrap();
        assert_eq!(
            role,
            Role::Worker {
                id: 3,
                primary_pid: Pid::from_raw(1234)
            }
        );
    }

    #[test]
    fn test_worker_without_primary_pid_is_rejected() {
        let err = vars(Some("1"), None).unwrap_err();
        assert!(err.to_string().contains(ENV_PRIMARY_PID));
    }

    #[test]
    fn test_garbage_worker_id_is_rejected() {
        let err = vars(Some("first"), Some("10")).unwrap_err();
        assert!(err.to_string().contains("first"));
    }

    #[test]
    fn test_non_positive_primary_pid_is_rejected() {
        assert!(vars(Some("1"), Some("0")).is_err());
        assert!(vars(Some("1"), Some("-5")).is_err());
    }
}
