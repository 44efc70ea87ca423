//! UNIX-domain variant of [`super::Transport`]. `port` is
//! ignored; `host` carries the socket path.

use std::io::{self, IoSlice};
use std::sync::Arc;

use super::StreamChannel;
use crate::error::TransportError;
use crate::syscalls::{Fd, Syscalls};

pub struct UnixChannel {
    syscalls: Arc<dyn Syscalls>,
    fd: Fd,
}

impl UnixChannel {
    pub fn new(syscalls: Arc<dyn Syscalls>) -> Self {
        Self { syscalls, fd: -1 }
    }

    fn require_open(&self) -> Result<(), TransportError> {
        if self.fd < 0 {
            return Err(TransportError::SocketWriteFailure(io::Error::new(
                io::ErrorKind::NotConnected,
                "transport is not open",
            )));
        }
        Ok(())
    }
}

impl StreamChannel for UnixChannel {
    fn connect(&mut self, host: &str, _port: u16) -> Result<(), TransportError> {
        let fd = self.syscalls.socket_unix()?;
        if let Err(e) = self.syscalls.connect_unix(fd, host) {
            let _ = self.syscalls.close(fd);
            return Err(e);
        }
        self.fd = fd;
        Ok(())
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

impl Drop for UnixChannel {
    fn drop(&mut self) {
        let _ = StreamChannel::close(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::os::unix::net::UnixListener;
    use std::thread;

    #[test]
    fn connects_writes_and_reads_over_a_socket_path() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("http1-engine-test-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let listener = UnixListener::bind(&path).unwrap();

        let path_clone = path.clone();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"hello");
            let _ = std::fs::remove_file(&path_clone);
        });

        let mut channel = UnixChannel::new(crate::syscalls::real());
        channel.connect(path.to_str().unwrap(), 0).unwrap();
        channel.write(b"hello").unwrap();
        channel.close().unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn connect_failure_on_missing_socket() {
        let mut channel = UnixChannel::new(crate::syscalls::real());
        let err = channel
            .connect("/nonexistent/path/does-not-exist.sock", 0)
            .unwrap_err();
        assert!(matches!(err, TransportError::SocketConnectFailure { .. }));
    }
}
