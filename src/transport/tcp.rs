//! TCP variant of [`super::Transport`].

use std::io::{self, IoSlice};
use std::net::SocketAddr;
use std::sync::Arc;

use nix::sys::socket::AddressFamily;
use tracing::{debug, warn};

use super::StreamChannel;
use crate::error::TransportError;
use crate::syscalls::{Fd, Syscalls};

/// A single TCP stream socket, dependency-injected over a [`Syscalls`]
/// table.
pub struct TcpChannel {
    syscalls: Arc<dyn Syscalls>,
    fd: Fd,
}

impl TcpChannel {
    pub fn new(syscalls: Arc<dyn Syscalls>) -> Self {
        Self { syscalls, fd: -1 }
    }
}

impl StreamChannel for TcpChannel {
    fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let candidates = self.syscalls.resolve(host, port)?;
        if candidates.is_empty() {
            return Err(TransportError::DnsFailure {
                host: host.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "resolver returned no addresses"),
            });
        }

        let mut last_err = None;
        for addr in candidates {
            match self.try_connect_one(addr) {
                Ok(fd) => {
                    debug!(%addr, "TCP connect succeeded");
                    self.fd = fd;
                    return Ok(());
                }
                Err(e) => {
                    warn!(%addr, error = %e, "TCP candidate failed, trying next");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or(TransportError::SocketConnectFailure {
            host: host.to_string(),
            port,
            source: io::Error::new(io::ErrorKind::Other, "no reachable address"),
        }))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        self.require_open()?;
        let mut written = 0;
        while written < bytes.len() {
            let n = self.syscalls.write(self.fd, &bytes[written..])?;
            if n == 0 {
                return Err(TransportError::SocketWriteFailure(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "write returned 0 bytes",
                )));
            }
            written += n;
        }
        Ok(written)
    }

    fn writev(&mut self, segments: &mut [IoSlice<'_>]) -> Result<usize, TransportError> {
        self.require_open()?;
        let mut written = 0;
        let mut remaining: &mut [IoSlice<'_>] = segments;
        while !remaining.is_empty() {
            let n = self.syscalls.writev(self.fd, remaining)?;
            if n == 0 {
                return Err(TransportError::SocketWriteFailure(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "writev returned 0 bytes",
                )));
            }
            written += n;
            IoSlice::advance_slices(&mut remaining, n);
        }
        Ok(written)
    }

    fn read(&mut self, into: &mut [u8]) -> Result<usize, TransportError> {
        self.require_open()?;
        let n = self.syscalls.read(self.fd, into)?;
        if n == 0 {
            return Err(TransportError::ConnectionClosed);
        }
        Ok(n)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.fd < 0 {
            return Ok(());
        }
        let fd = self.fd;
        self.fd = -1;
        self.syscalls.close(fd)
    }

    fn is_open(&self) -> bool {
        self.fd >= 0
    }
}

impl TcpChannel {
    fn require_open(&self) -> Result<(), TransportError> {
        if self.fd < 0 {
            return Err(TransportError::SocketWriteFailure(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport is not open",
            )));
        }
        Ok(())
    }

    fn try_connect_one(&self, addr: SocketAddr) -> Result<Fd, TransportError> {
        let family = match addr {
            SocketAddr::V4(_) => AddressFamily::Inet,
            SocketAddr::V6(_) => AddressFamily::Inet6,
        };
        let fd = self.syscalls.socket_tcp(family)?;
        if let Err(e) = self.syscalls.set_nodelay(fd) {
            let _ = self.syscalls.close(fd);
            return Err(e);
        }
        if let Err(e) = self.syscalls.connect_tcp(fd, &addr) {
            let _ = self.syscalls.close(fd);
            return Err(e);
        }
        Ok(fd)
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        let _ = StreamChannel::close(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscalls::test_support::FaultInjector;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn connects_writes_and_reads_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"hello");
        });

        let mut channel = TcpChannel::new(crate::syscalls::real());
        channel.connect("127.0.0.1", port).unwrap();
        channel.write(b"hello").unwrap();
        channel.close().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn dns_failure_surfaces_as_dns_failure() {
        let injector = FaultInjector {
            fail_resolve: Some(io::ErrorKind::NotFound),
            ..Default::default()
        };
        let mut channel = TcpChannel::new(Arc::new(injector));
        let err = channel.connect("nonexistent.invalid", 80).unwrap_err();
        assert!(matches!(err, TransportError::DnsFailure { .. }));
    }

    #[test]
    fn close_is_idempotent() {
        let mut channel = TcpChannel::new(crate::syscalls::real());
        assert!(channel.close().is_ok());
        assert!(channel.close().is_ok());
    }
}
