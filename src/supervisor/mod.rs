//! Pool supervisor run by the primary process.
//!
//! # Architecture
//!
//! ```text
//!                     ┌─────────────────┐
//!                     │ Primary Process │
//!                     │  (Supervisor)   │
//!                     └────────┬────────┘
//!                              │ spawn / waitpid
//!               ┌──────────────┼──────────────┐
//!               │              │              │
//!         ┌─────▼─────┐  ┌─────▼─────┐  ┌─────▼─────┐
//!         │ Worker 1  │  │ Worker 2  │  │ Worker N  │
//!         │ :3000     │  │ :3000     │  │ :3000     │
//!         └───────────┘  └───────────┘  └───────────┘
//!                 SO_REUSEPORT, kernel balances accepts
//! ```
//!
//! The supervisor never talks to its workers. It only spawns them and reaps
//! them, and every reaped worker is replaced (see
//! [`should_respawn`](signals::should_respawn)).

mod pool;
mod proc;
mod signals;
mod spawn;

pub use pool::Supervisor;
pub use proc::WorkerState;
pub use spawn::OsHost;
