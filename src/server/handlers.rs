//! Route handlers.
//!
//! Both routes are stateless apart from the worker's own pid. The count
//! route computes on the request thread and blocks this worker until done.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use tracing::{debug, instrument, warn};

use super::AppState;
use super::count::{CountArg, accumulate};

/// `GET /`
pub async fn hello() -> &'static str {
    "Hello World!"
}

/// `GET /api/{n}`: sum 0..=n (clamped) and name the worker that did it.
#[instrument(skip_all, fields(n = %n))]
pub async fn final_count(State(state): State<Arc<AppState>>, Path(n): Path<String>) -> String {
    let arg = CountArg::parse(&n);
    if arg == CountArg::NotANumber {
        warn!(raw = %n, "Count is not a number; summing nothing");
    }

    let limit = arg.clamped();
    let started = Instant::now();
    let count = accumulate(limit);
    debug!(
        ?limit,
        count,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Summation finished"
    );

    format!("Final count is {} {}", count, state.pid)
}
