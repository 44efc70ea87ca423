//! Transport abstraction: one stream file descriptor behind a small,
//! uniform contract, polymorphic over TCP and UNIX-domain sockets.

pub mod tcp;
pub mod unix;

use std::io::IoSlice;
use std::sync::Arc;

pub use tcp::TcpChannel;
pub use unix::UnixChannel;

use crate::error::TransportError;
use crate::syscalls::Syscalls;

/// The five operations every transport variant exposes.
pub trait StreamChannel {
    /// Open a stream socket to `host`/`port`. For UNIX transports `host`
    /// is the socket path and `port` is ignored.
    fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    /// Write `bytes` in full, looping over partial writes and only
    /// surfacing a real syscall failure rather than treating a short
    /// write as success.
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// Scatter-write `segments` in full, the same way `write` loops over
    /// partial writes.
    fn writev(&mut self, segments: &mut [IoSlice<'_>]) -> Result<usize, TransportError>;

    /// Read up to `into.len()` bytes. A zero-byte read is reported as
    /// [`TransportError::ConnectionClosed`], never as `Ok(0)`.
    fn read(&mut self, into: &mut [u8]) -> Result<usize, TransportError>;

    /// Close the descriptor if open. Idempotent: closing twice returns
    /// `Ok(())` both times.
    fn close(&mut self) -> Result<(), TransportError>;

    /// `true` once `connect` has succeeded and `close` has not yet run.
    fn is_open(&self) -> bool;
}

/// A transport, dispatching to whichever concrete channel backs it.
///
/// Kept as a two-variant enum rather than a trait object: the set of
/// transports is closed (a TLS transport would slot in later as a third
/// variant, not an open extension point), so static dispatch costs
/// nothing and avoids a vtable on the request hot path.
pub enum Transport {
    Tcp(TcpChannel),
    Unix(UnixChannel),
}

impl Transport {
    pub fn tcp(syscalls: Arc<dyn Syscalls>) -> Self {
        Transport::Tcp(TcpChannel::new(syscalls))
    }

    pub fn unix(syscalls: Arc<dyn Syscalls>) -> Self {
        Transport::Unix(UnixChannel::new(syscalls))
    }
}

impl StreamChannel for Transport {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        match self {
            Transport::Tcp(t) => t.connect(host, port),
            Transport::Unix(u) => u.connect(host, port),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        match self {
            Transport::Tcp(t) => t.write(bytes),
            Transport::Unix(u) => u.write(bytes),
        }
    }

    fn writev(&mut self, segments: &mut [IoSlice<'_>]) -> Result<usize, TransportError> {
        match self {
            Transport::Tcp(t) => t.writev(segments),
            Transport::Unix(u) => u.writev(segments),
        }
    }

    fn read(&mut self, into: &mut [u8]) -> Result<usize, TransportError> {
        match self {
            Transport::Tcp(t) => t.read(into),
            Transport::Unix(u) => u.read(into),
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        match self {
            Transport::Tcp(t) => t.close(),
            Transport::Unix(u) => u.close(),
        }
    }

    fn is_open(&self) -> bool {
        match self {
            Transport::Tcp(t) => t.is_open(),
            Transport::Unix(u) => u.is_open(),
        }
    }
}
