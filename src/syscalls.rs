//! The syscall injection seam.
//!
//! Every operating-system primitive the transports touch — socket
//! creation, connect, read, write, writev, close, and the `TCP_NODELAY`
//! socket option — is reached through the [`Syscalls`] trait rather than
//! called directly. [`RealSyscalls`] is the default, backed by `nix`;
//! unit tests construct transports over a stub implementation to inject
//! faults (a broken pipe, a refused connect, a zero-byte read) without
//! touching the network, and [`testing::WritevRecorder`] gives
//! integration tests a loopback-backed table that additionally records
//! `writev` segment counts. A trait object collapses the whole cluster of
//! network primitives into one swappable interface.

use std::io::{self, IoSlice};
use std::net::{SocketAddr, ToSocketAddrs};
use std::os::fd::{BorrowedFd, RawFd};
use std::sync::Arc;

use nix::sys::socket::{
    self, AddressFamily, SockFlag, SockType, SockaddrIn, SockaddrIn6, UnixAddr,
};
use nix::sys::uio::writev as nix_writev;
use nix::unistd;

use crate::error::TransportError;

/// A raw, open file descriptor. `0` or negative means "not open".
pub type Fd = RawFd;

/// The seam between this crate and the host operating system.
///
/// A `Transport` stores an `Arc<dyn Syscalls>` so the same table can be
/// shared cheaply across instances (syscall tables are read-only after
/// construction).
pub trait Syscalls: Send + Sync {
    /// Resolve `host` to a list of candidate addresses for `port`.
    fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, TransportError>;

    /// Create a TCP stream socket for the given address family.
    fn socket_tcp(&self, family: AddressFamily) -> Result<Fd, TransportError>;

    /// Create a UNIX-domain stream socket.
    fn socket_unix(&self) -> Result<Fd, TransportError>;

    /// Connect `fd` to `addr` (TCP).
    fn connect_tcp(&self, fd: Fd, addr: &SocketAddr) -> Result<(), TransportError>;

    /// Connect `fd` to the UNIX socket at `path`.
    fn connect_unix(&self, fd: Fd, path: &str) -> Result<(), TransportError>;

    /// Enable `TCP_NODELAY` on `fd`.
    fn set_nodelay(&self, fd: Fd) -> Result<(), TransportError>;

    /// Read up to `buf.len()` bytes into `buf`. A `Ok(0)` here is
    /// translated by the caller into [`TransportError::ConnectionClosed`];
    /// this method itself only reports real syscall failures.
    fn read(&self, fd: Fd, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write up to `buf.len()` bytes from `buf`.
    fn write(&self, fd: Fd, buf: &[u8]) -> Result<usize, TransportError>;

    /// Scatter-write `bufs` in a single syscall.
    fn writev(&self, fd: Fd, bufs: &[IoSlice<'_>]) -> Result<usize, TransportError>;

    /// Close `fd`. Idempotent: closing an already-closed descriptor is a
    /// caller-side no-op (see [`crate::transport::Transport::close`]), not
    /// something this trait needs to guard against.
    fn close(&self, fd: Fd) -> Result<(), TransportError>;
}

/// Returns the process-wide default syscall table, backed by the real
/// host primitives.
pub fn real() -> Arc<dyn Syscalls> {
    Arc::new(RealSyscalls)
}

/// The default [`Syscalls`] implementation, backed by `nix` (which itself
/// wraps `libc`).
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSyscalls;

impl Syscalls for RealSyscalls {
    fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, TransportError> {
        // `ToSocketAddrs` resolves through the system resolver (getaddrinfo
        // on every unix target libc bundles), so this covers DNS/address
        // resolution without hand-rolling the FFI ourselves.
        (host, port)
            .to_socket_addrs()
            .map(|it| it.collect())
            .map_err(|e| TransportError::DnsFailure {
                host: host.to_string(),
                source: e,
            })
    }

    fn socket_tcp(&self, family: AddressFamily) -> Result<Fd, TransportError> {
        let owned = socket::socket(family, SockType::Stream, SockFlag::empty(), None)
            .map_err(|e| TransportError::SocketCreateFailure(io::Error::from(e)))?;
        Ok(std::os::fd::IntoRawFd::into_raw_fd(owned))
    }

    fn socket_unix(&self) -> Result<Fd, TransportError> {
        let owned = socket::socket(
            AddressFamily::Unix,
            SockType::Stream,
            SockFlag::empty(),
            None,
        )
        .map_err(|e| TransportError::SocketCreateFailure(io::Error::from(e)))?;
        Ok(std::os::fd::IntoRawFd::into_raw_fd(owned))
    }

    fn connect_tcp(&self, fd: Fd, addr: &SocketAddr) -> Result<(), TransportError> {
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        let result = match addr {
            SocketAddr::V4(v4) => socket::connect(
                std::os::fd::AsRawFd::as_raw_fd(&borrowed),
                &SockaddrIn::from(*v4),
            ),
            SocketAddr::V6(v6) => socket::connect(
                std::os::fd::AsRawFd::as_raw_fd(&borrowed),
                &SockaddrIn6::from(*v6),
            ),
        };
        result.map_err(|e| TransportError::SocketConnectFailure {
            host: addr.ip().to_string(),
            port: addr.port(),
            source: io::Error::from(e),
        })
    }

    fn connect_unix(&self, fd: Fd, path: &str) -> Result<(), TransportError> {
        let addr = UnixAddr::new(path).map_err(|e| TransportError::SocketConnectFailure {
            host: path.to_string(),
            port: 0,
            source: io::Error::from(e),
        })?;
        socket::connect(fd, &addr).map_err(|e| TransportError::SocketConnectFailure {
            host: path.to_string(),
            port: 0,
            source: io::Error::from(e),
        })
    }

    fn set_nodelay(&self, fd: Fd) -> Result<(), TransportError> {
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        socket::setsockopt(&borrowed, socket::sockopt::TcpNoDelay, &true)
            .map_err(|e| TransportError::InitFailure(format!("setsockopt(TCP_NODELAY): {e}")))
    }

    fn read(&self, fd: Fd, buf: &mut [u8]) -> Result<usize, TransportError> {
        unistd::read(fd, buf).map_err(|e| TransportError::SocketReadFailure(io::Error::from(e)))
    }

    fn write(&self, fd: Fd, buf: &[u8]) -> Result<usize, TransportError> {
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        unistd::write(borrowed, buf)
            .map_err(|e| TransportError::SocketWriteFailure(io::Error::from(e)))
    }

    fn writev(&self, fd: Fd, bufs: &[IoSlice<'_>]) -> Result<usize, TransportError> {
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
        nix_writev(&borrowed, bufs)
            .map_err(|e| TransportError::SocketWriteFailure(io::Error::from(e)))
    }

    fn close(&self, fd: Fd) -> Result<(), TransportError> {
        unistd::close(fd).map_err(|e| TransportError::SocketCloseFailure(io::Error::from(e)))
    }
}

/// Syscall-table test doubles usable from this crate's own integration
/// tests, which — unlike `#[cfg(test)]` unit tests — compile as a separate
/// crate and cannot see anything gated behind `#[cfg(test)]` here.
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// A table that loops back to [`RealSyscalls`] for every operation but
    /// records the segment count of each `writev` call, so a test can
    /// confirm a vectored write actually reached the transport as one
    /// `writev` of N segments rather than silently falling back to
    /// sequential `write` calls.
    #[derive(Default)]
    pub struct WritevRecorder {
        segment_counts: Mutex<Vec<usize>>,
    }

    impl WritevRecorder {
        pub fn new() -> Self {
            Self::default()
        }

        /// The segment count passed to each `writev` call, in order.
        pub fn segment_counts(&self) -> Vec<usize> {
            self.segment_counts.lock().unwrap().clone()
        }
    }

    impl Syscalls for WritevRecorder {
        fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>, TransportError> {
            RealSyscalls.resolve(host, port)
        }

        fn socket_tcp(&self, family: AddressFamily) -> Result<Fd, TransportError> {
            RealSyscalls.socket_tcp(family)
        }

        fn socket_unix(&self) -> Result<Fd, TransportError> {
            RealSyscalls.socket_unix()
        }

        fn connect_tcp(&self, fd: Fd, addr: &SocketAddr) -> Result<(), TransportError> {
            RealSyscalls.connect_tcp(fd, addr)
        }

        fn connect_unix(&self, fd: Fd, path: &str) -> Result<(), TransportError> {
            RealSyscalls.connect_unix(fd, path)
        }

        fn set_nodelay(&self, fd: Fd) -> Result<(), TransportError> {
            RealSyscalls.set_nodelay(fd)
        }

        fn read(&self, fd: Fd, buf: &mut [u8]) -> Result<usize, TransportError> {
            RealSyscalls.read(fd, buf)
        }

        fn write(&self, fd: Fd, buf: &[u8]) -> Result<usize, TransportError> {
            RealSyscalls.write(fd, buf)
        }

        fn writev(&self, fd: Fd, bufs: &[IoSlice<'_>]) -> Result<usize, TransportError> {
            self.segment_counts.lock().unwrap().push(bufs.len());
            RealSyscalls.writev(fd, bufs)
        }

        fn close(&self, fd: Fd) -> Result<(), TransportError> {
            RealSyscalls.close(fd)
        }
    }
}
