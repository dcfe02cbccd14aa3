//! The pool supervisor.
//!
//! Keeps `pool_size` workers alive for the life of the primary: launches the
//! pool, then blocks on child exits and replaces each worker that dies.

use std::collections::HashMap;
use std::time::Duration;

use nix::unistd::Pid;
use tracing::{debug, error, info, warn};

use super::proc::WorkerProcess;
use super::signals::{ExitReason, should_respawn};
use crate::config::PoolConfig;
use crate::error::Result;

/// How long to wait before topping up a pool that has no live workers left.
const EMPTY_POOL_RETRY: Duration = Duration::from_secs(1);

/// Where worker processes come from and how their exits are observed.
pub trait ProcessHost {
    /// Start one worker, returning its process id.
    fn spawn_worker(&mut self, worker_id: usize) -> Result<Pid>;

    /// Block until any worker exits.
    ///
    /// Returns `Ok(None)` when there are no child processes left to wait for.
    fn wait_any(&mut self) -> Result<Option<(Pid, ExitReason)>>;

    /// Sleep before retrying after the pool ran dry.
    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Owns every worker process and keeps the pool at its target size.
pub struct Supervisor<H: ProcessHost> {
    config: PoolConfig,
    host: H,
    /// Running workers, keyed by process id.
    workers: HashMap<Pid, WorkerProcess>,
    /// Workers the pool should hold.
    target: usize,
    next_id: usize,
    respawns: usize,
}

impl<H: ProcessHost> Supervisor<H> {
    pub fn new(config: PoolConfig, host: H) -> Self {
        Self {
            target: config.pool_size.get(),
            config,
            host,
            workers: HashMap::new(),
            next_id: 1,
            respawns: 0,
        }
    }

    /// Number of workers currently running.
    pub fn live_count(&self) -> usize {
        self.workers.len()
    }

    #[cfg(test)]
    pub fn target(&self) -> usize {
        self.target
    }

    /// Replacement workers spawned since launch.
    #[cfg(test)]
    pub fn respawns(&self) -> usize {
        self.respawns
    }

    #[cfg(test)]
    pub fn worker(&self, pid: Pid) -> Option<&WorkerProcess> {
        self.workers.get(&pid)
    }

    #[cfg(test)]
    pub fn pids(&self) -> impl Iterator<Item = Pid> + '_ {
        self.workers.keys().copied()
    }

    /// Log the startup record and spawn the initial pool.
    ///
    /// Any spawn failure here is returned to the caller.
    pub fn launch(&mut self) -> Result<()> {
        info!(
            cpus = self.config.pool_size.get(),
            "Number of CPUs is {}",
            self.config.pool_size
        );
        let pid = std::process::id();
        info!(pid, "Primary {} is running", pid);

        for _ in 0..self.target {
            self.spawn_one()?;
        }
        debug!(workers = self.live_count(), "Pool launched");
        Ok(())
    }

    /// Launch the pool and supervise it forever.
    ///
    /// Only returns on a launch failure or an unrecoverable wait error.
    pub fn run(mut self) -> Result<()> {
        self.launch()?;
        loop {
            self.step()?;
        }
    }

    /// Wait for the next worker exit and react to it.
    pub fn step(&mut self) -> Result<()> {
        match self.host.wait_any()? {
            Some((pid, reason)) => self.handle_exit(pid, reason),
            None => {
                warn!(
                    target_workers = self.target,
                    "No live workers; retrying in {:?}", EMPTY_POOL_RETRY
                );
                self.host.pause(EMPTY_POOL_RETRY);
                self.replenish();
            }
        }
        Ok(())
    }

    /// Record a worker exit and replace the worker if the policy says so.
    pub fn handle_exit(&mut self, pid: Pid, reason: ExitReason) {
        let Some(mut worker) = self.workers.remove(&pid) else {
            debug!(%pid, %reason, "Reaped a process that is not a pool worker");
            return;
        };
        debug_assert_eq!(worker.pid(), Some(pid));

        if let Err(e) = worker.mark_exited(reason) {
            error!(%pid, error = %e, "Worker bookkeeping out of sync");
        }

        if reason.is_clean() {
            info!(%pid, worker_id = worker.id(), %reason, "worker {} died ({})", pid, reason);
        } else {
            warn!(%pid, worker_id = worker.id(), %reason, "worker {} died ({})", pid, reason);
        }

        if should_respawn(reason) {
            info!("Let's fork another worker!");
            self.respawns += self.replenish();
        } else {
            self.target = self.target.saturating_sub(1);
            info!(target_workers = self.target, "Not replacing worker {}", pid);
        }
    }

    /// Spawn workers until the pool is back at its target size.
    ///
    /// Spawn failures are logged; the next exit event tries again. One exit
    /// can therefore spawn more than one worker when an earlier replacement
    /// failed.
    fn replenish(&mut self) -> usize {
        let mut spawned = 0;
        while self.live_count() < self.target {
            match self.spawn_one() {
                Ok(_) => spawned += 1,
                Err(e) => {
                    error!(
                        error = %e,
                        live = self.live_count(),
                        target_workers = self.target,
                        "Could not replace worker"
                    );
                    break;
                }
            }
        }
        spawned
    }

    fn spawn_one(&mut self) -> Result<Pid> {
        let mut worker = WorkerProcess::new(self.next_id);
        self.next_id += 1;

        let pid = self.host.spawn_worker(worker.id())?;
        worker.mark_running(pid)?;
        debug!(%pid, worker_id = worker.id(), "Spawned worker");
        self.workers.insert(pid, worker);
        Ok(pid)
    }
}
