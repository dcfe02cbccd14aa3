//! Spawning and reaping real worker processes.
//!
//! Workers are this same executable started again with the worker markers
//! from [`crate::role`] in their environment. They are reaped with
//! `waitpid(-1)`, so the supervisor sees every child exit regardless of
//! which worker it was.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::sys::wait::wait;
use nix::unistd::Pid;
use tracing::trace;

use super::pool::ProcessHost;
use super::signals::ExitReason;
use crate::error::{CoreforkError, Result};
use crate::logging::LogConfig;
use crate::role::{ENV_PRIMARY_PID, ENV_WORKER_ID};

/// [`ProcessHost`] backed by the operating system.
#[derive(Debug)]
pub struct OsHost {
    exe: PathBuf,
    primary_pid: Pid,
    env: Vec<(&'static str, String)>,
}

impl OsHost {
    /// Prepare to spawn copies of the running executable.
    ///
    /// Workers inherit the primary's logging settings.
    pub fn new(log: &LogConfig) -> Result<Self> {
        let exe = std::env::current_exe()
            .map_err(|e| CoreforkError::Spawn(format!("cannot locate own executable: {}", e)))?;

        let mut env = log.worker_env();
        if !log.ansi {
            env.push(("NO_COLOR", "1".to_string()));
        }

        Ok(Self {
            exe,
            primary_pid: nix::unistd::getpid(),
            env,
        })
    }

    fn command(&self, worker_id: usize) -> Command {
        let mut cmd = Command::new(&self.exe);
        cmd.env(ENV_WORKER_ID, worker_id.to_string())
            .env(ENV_PRIMARY_PID, self.primary_pid.to_string())
            .envs(self.env.iter().map(|(key, value)| (*key, value)))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl ProcessHost for OsHost {
    fn spawn_worker(&mut self, worker_id: usize) -> Result<Pid> {
        // The Child handle is dropped on purpose: exits are collected by wait_any.
        let child = self
            .command(worker_id)
            .spawn()
            .map_err(|e| CoreforkError::Spawn(format!("{}: {}", self.exe.display(), e)))?;

        Ok(Pid::from_raw(child.id() as i32))
    }

    fn wait_any(&mut self) -> Result<Option<(Pid, ExitReason)>> {
        loop {
            match wait() {
                Ok(status) => match ExitReason::from_wait_status(status) {
                    Some(exit) => return Ok(Some(exit)),
                    None => trace!(?status, "Ignoring non-exit wait status"),
                },
                Err(Errno::EINTR) => continue,
                Err(Errno::ECHILD) => return Ok(None),
                Err(e) => return Err(CoreforkError::Wait(e)),
            }
        }
    }
}
