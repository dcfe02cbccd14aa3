//! Pool configuration, computed once in the primary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroUsize;

/// Port every worker listens on.
pub const LISTEN_PORT: u16 = 3000;

/// Interface every worker listens on.
pub const LISTEN_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Immutable settings for the whole pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of workers kept alive. Never zero.
    pub pool_size: NonZeroUsize,
    pub host: IpAddr,
    pub port: u16,
}

impl PoolConfig {
    /// Size the pool from the host's logical core count.
    pub fn detect() -> Self {
        Self::with_pool_size(detect_core_count())
    }

    pub fn with_pool_size(pool_size: NonZeroUsize) -> Self {
        Self {
            pool_size,
            host: LISTEN_HOST,
            port: LISTEN_PORT,
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// The address every worker binds. Workers need nothing else from the pool.
pub fn worker_listen_addr() -> SocketAddr {
    SocketAddr::new(LISTEN_HOST, LISTEN_PORT)
}

/// Logical cores available to this process, or 1 if detection fails.
pub fn detect_core_count() -> NonZeroUsize {
    core_count_or_default(std::thread::available_parallelism().ok())
}

fn core_count_or_default(detected: Option<NonZeroUsize>) -> NonZeroUsize {
    detected.unwrap_or(NonZeroUsize::MIN)
}
