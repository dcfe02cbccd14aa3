//! Shared-port TCP listeners.
//!
//! Every worker opens its own socket on the same address with `SO_REUSEPORT`,
//! and the kernel spreads incoming connections across them.

use std::net::{SocketAddr, TcpListener};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{CoreforkError, Result};

const BACKLOG: i32 = 1024;

fn tcp_socket(addr: SocketAddr) -> std::io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    Ok(socket)
}

fn shared_socket(addr: SocketAddr) -> std::io::Result<Socket> {
    let socket = tcp_socket(addr)?;
    socket.set_reuse_port(true)?;
    socket.bind(&addr.into())?;
    Ok(socket)
}

/// Bind a non-blocking listener on `addr` that other workers can share.
pub fn bind_shared(addr: SocketAddr) -> Result<TcpListener> {
    let bind = || -> std::io::Result<TcpListener> {
        let socket = shared_socket(addr)?;
        socket.listen(BACKLOG)?;
        socket.set_nonblocking(true)?;
        Ok(socket.into())
    };
    bind().map_err(|source| CoreforkError::Bind { addr, source })
}

/// Check that nothing is listening on `addr` before any worker is started.
///
/// Binds without `SO_REUSEPORT` and without listening, then drops the
/// socket. The bind fails against any live listener on the port, including
/// another pool's shared listeners.
pub fn probe(addr: SocketAddr) -> Result<()> {
    let check = || -> std::io::Result<()> {
        let socket = tcp_socket(addr)?;
        socket.bind(&addr.into())
    };
    check().map_err(|source| CoreforkError::Bind { addr, source })
}
