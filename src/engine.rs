//! HTTP/1.1 protocol engine: request serialization, incremental response
//! reading, response parsing, and the two memory policies.
//!
//! Slice construction is deferred until the read loop has fully completed:
//! the engine tracks only byte offsets (`header_size`, `content_length`)
//! while reading, and builds the actual `&str`/`&[u8]` views in
//! [`HttpEngine::parse_response`], once the buffer is final and will not
//! reallocate again for this response. That ordering sidesteps a whole
//! class of dangling-pointer bugs that a reader-stores-slices-as-it-goes
//! design would otherwise have to fix up after every reallocation.

use std::io::IoSlice;

use crate::buffer::{GrowableBuffer, DEFAULT_READ_AHEAD};
use crate::config::IoPolicy;
use crate::error::{Error, ProtocolError, TransportError};
use crate::request::Request;
use crate::response::{OwnedResponse, Response};
use crate::transport::StreamChannel;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Owns one transport and one growable buffer. The buffer is never shared
/// between the request and response phases of a single call:
/// [`Self::read_response`] clears it before the first read.
pub struct HttpEngine<T> {
    transport: T,
    buffer: GrowableBuffer,
    header_size: Option<usize>,
    content_length: Option<usize>,
    read_ahead: usize,
}

impl<T: StreamChannel> HttpEngine<T> {
    pub fn new(transport: T) -> Self {
        Self::with_buffer_tuning(
            transport,
            crate::buffer::DEFAULT_INITIAL_CAPACITY,
            DEFAULT_READ_AHEAD,
        )
    }

    /// Like [`Self::new`], but sizes the internal buffer from
    /// `initial_capacity` and keeps at least `read_ahead` bytes of spare
    /// capacity before each `read`, rather than the package's defaults
    /// (see [`crate::config::ClientConfig`]).
    pub fn with_buffer_tuning(transport: T, initial_capacity: usize, read_ahead: usize) -> Self {
        Self {
            transport,
            buffer: GrowableBuffer::with_min_growth(initial_capacity),
            header_size: None,
            content_length: None,
            read_ahead,
        }
    }

    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), Error> {
        Ok(self.transport.connect(host, port)?)
    }

    pub fn disconnect(&mut self) -> Result<(), Error> {
        Ok(self.transport.close()?)
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    /// Serializes and sends `request`, reads and parses the response, and
    /// returns an unsafe (borrowed) view into the engine's own buffer.
    /// Because this takes `&mut self`, the borrow checker itself enforces
    /// that a following call on the same engine invalidates the previous
    /// unsafe response: the engine cannot be used again while the returned
    /// `Response` is still held.
    pub fn perform_unsafe(
        &mut self,
        request: &Request<'_>,
        io_policy: IoPolicy,
    ) -> Result<Response<'_>, Error> {
        self.serialize_and_send(request, io_policy)?;
        self.read_response()?;
        self.parse_response()
    }

    /// Same as [`Self::perform_unsafe`], but deep-copies the result into a
    /// self-contained [`OwnedResponse`] before the engine's buffer can be
    /// reused.
    pub fn perform_safe(
        &mut self,
        request: &Request<'_>,
        io_policy: IoPolicy,
    ) -> Result<OwnedResponse, Error> {
        Ok(self.perform_unsafe(request, io_policy)?.to_owned_response())
    }

    /// Writes the request line, headers, and blank line, then the body
    /// under whichever I/O policy is in effect.
    fn serialize_and_send(&mut self, request: &Request<'_>, io_policy: IoPolicy) -> Result<(), Error> {
        self.buffer.clear();
        self.buffer.extend_from_slice(request.method.as_str().as_bytes());
        self.buffer.extend_from_slice(b" ");
        self.buffer.extend_from_slice(request.path.as_bytes());
        self.buffer.extend_from_slice(b" HTTP/1.1\r\n");
        for (key, value) in request.headers {
            self.buffer.extend_from_slice(key.as_bytes());
            self.buffer.extend_from_slice(b": ");
            self.buffer.extend_from_slice(value.as_bytes());
            self.buffer.extend_from_slice(b"\r\n");
        }
        self.buffer.extend_from_slice(b"\r\n");

        match (io_policy, request.body) {
            (IoPolicy::VectoredWrite, Some(body)) => {
                let mut segments = [IoSlice::new(self.buffer.as_slice()), IoSlice::new(body)];
                self.transport.writev(&mut segments)?;
            }
            (_, body) => {
                if let Some(body) = body {
                    self.buffer.extend_from_slice(body);
                }
                self.transport.write(self.buffer.as_slice())?;
            }
        }
        Ok(())
    }

    /// Reads into the tail of the buffer until both the header delimiter
    /// has been seen and, if `Content-Length` is known, enough body bytes
    /// have accumulated — or until the peer closes.
    fn read_response(&mut self) -> Result<(), Error> {
        self.buffer.clear();
        self.header_size = None;
        self.content_length = None;

        loop {
            self.buffer.reserve_spare(self.read_ahead);
            let spare = self.buffer.spare_mut();
            match self.transport.read(spare) {
                Ok(n) => unsafe { self.buffer.assume_filled(n) },
                Err(TransportError::ConnectionClosed) => {
                    if let Some(content_length) = self.content_length {
                        let header_size = self.header_size.unwrap_or(0);
                        if self.buffer.len() < header_size + content_length {
                            return Err(Error::Protocol(ProtocolError::HttpParseFailure(
                                "connection closed before all Content-Length bytes arrived"
                                    .to_string(),
                            )));
                        }
                    }
                    break;
                }
                Err(e) => return Err(Error::from(e)),
            }

            if self.header_size.is_none() {
                if let Some(boundary) = find_header_boundary(self.buffer.as_slice()) {
                    self.content_length = scan_content_length(&self.buffer.as_slice()[..boundary])?;
                    self.header_size = Some(boundary);
                }
            }

            if let (Some(header_size), Some(content_length)) = (self.header_size, self.content_length)
            {
                if self.buffer.len() >= header_size + content_length {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Parses the status line, headers split on the first `:`, and the
    /// body slice sized by `Content-Length` (or the buffer remainder).
    fn parse_response(&mut self) -> Result<Response<'_>, Error> {
        let header_size = self.header_size.ok_or_else(|| {
            Error::Protocol(ProtocolError::HttpParseFailure(
                "response ended before the header block was terminated".to_string(),
            ))
        })?;

        let buf = self.buffer.as_slice();
        let head = &buf[..header_size];
        let lines = split_header_lines(head);
        let mut lines = lines.into_iter();

        let status_line = lines.next().ok_or_else(|| {
            Error::Protocol(ProtocolError::HttpParseFailure("missing status line".to_string()))
        })?;
        let status_line = std::str::from_utf8(status_line).map_err(|_| {
            Error::Protocol(ProtocolError::HttpParseFailure(
                "status line is not valid UTF-8".to_string(),
            ))
        })?;
        let (status, message) = parse_status_line(status_line)?;

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let line = std::str::from_utf8(line).map_err(|_| {
                Error::Protocol(ProtocolError::HttpParseFailure(
                    "header line is not valid UTF-8".to_string(),
                ))
            })?;
            headers.push(parse_header_line(line).map_err(Error::Protocol)?);
        }

        let available = buf.len() - header_size;
        let body_len = match self.content_length {
            Some(n) => n.min(available),
            None => available,
        };
        let body = &buf[header_size..header_size + body_len];

        Ok(Response {
            status,
            message,
            headers,
            body,
            content_length: self.content_length,
        })
    }
}

fn find_header_boundary(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
        .map(|pos| pos + HEADER_TERMINATOR.len())
}

/// Extracts `Content-Length` from a head block (status line + headers +
/// terminating blank line) without allocating the full header list, so the
/// framing decision in [`HttpEngine::read_response`] stays cheap.
fn scan_content_length(head: &[u8]) -> Result<Option<usize>, Error> {
    let lines = split_header_lines(head);
    for line in lines.into_iter().skip(1) {
        if line.is_empty() {
            continue;
        }
        let line = std::str::from_utf8(line).map_err(|_| {
            Error::Protocol(ProtocolError::HttpParseFailure(
                "header line is not valid UTF-8".to_string(),
            ))
        })?;
        let (key, value) = parse_header_line(line).map_err(Error::Protocol)?;
        if key.eq_ignore_ascii_case("Content-Length") {
            let parsed = value.trim().parse::<usize>().map_err(|_| {
                Error::Protocol(ProtocolError::HttpParseFailure(format!(
                    "invalid Content-Length: {value}"
                )))
            })?;
            return Ok(Some(parsed));
        }
    }
    Ok(None)
}

/// Splits a head block on `\n`, stripping a trailing `\r` from each line
/// and dropping the empty line produced by the terminating blank line.
fn split_header_lines(block: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = block
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect();
    if matches!(lines.last(), Some(last) if last.is_empty()) {
        lines.pop();
    }
    lines
}

fn parse_status_line(line: &str) -> Result<(u16, &str), Error> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or("");
    if version != "HTTP/1.1" {
        return Err(Error::Protocol(ProtocolError::HttpParseFailure(format!(
            "unexpected HTTP version: {version}"
        ))));
    }
    let code = parts.next().ok_or_else(|| {
        Error::Protocol(ProtocolError::HttpParseFailure("missing status code".to_string()))
    })?;
    let status: u16 = code.parse().map_err(|_| {
        Error::Protocol(ProtocolError::HttpParseFailure(format!("invalid status code: {code}")))
    })?;
    let message = parts.next().unwrap_or("");
    Ok((status, message))
}

fn parse_header_line(line: &str) -> Result<(&str, &str), ProtocolError> {
    let idx = line
        .find(':')
        .ok_or_else(|| ProtocolError::HttpParseFailure(format!("header line missing ':': {line}")))?;
    let key = &line[..idx];
    let value = line[idx + 1..].trim_start();
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    fn spawn_echo_server(response: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        thread::spawn(move || {
            use std::io::Write;
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            stream.write_all(response).unwrap();
            let _ = stream.shutdown(std::net::Shutdown::Write);
        });
        port
    }

    #[test]
    fn minimal_get_round_trip() {
        let port = spawn_echo_server(
            b"HTTP/1.1 200 OK\r\nContent-Length: 13\r\nContent-Type: text/plain\r\n\r\nTest Response",
        );
        let transport = crate::transport::Transport::tcp(crate::syscalls::real());
        let mut engine = HttpEngine::new(transport);
        engine.connect("127.0.0.1", port).unwrap();

        let headers = [("Host", "api.example.com")];
        let request = Request::new("/test", &headers).with_method(Method::Get);
        let response = engine.perform_unsafe(&request, IoPolicy::CopyWrite).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.message, "OK");
        assert_eq!(response.body(), b"Test Response");
        assert_eq!(response.content_length(), Some(13));
        assert_eq!(response.header("content-type"), Some("text/plain"));
    }

    #[test]
    fn peer_close_without_content_length_succeeds() {
        let port = spawn_echo_server(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\nBody until close");
        let transport = crate::transport::Transport::tcp(crate::syscalls::real());
        let mut engine = HttpEngine::new(transport);
        engine.connect("127.0.0.1", port).unwrap();

        let headers: [(&str, &str); 0] = [];
        let request = Request::new("/", &headers);
        let response = engine.perform_safe(&request, IoPolicy::CopyWrite).unwrap();

        assert_eq!(response.body(), b"Body until close");
        assert_eq!(response.content_length(), None);
    }

    #[test]
    fn short_body_after_close_is_parse_failure() {
        let port = spawn_echo_server(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort");
        let transport = crate::transport::Transport::tcp(crate::syscalls::real());
        let mut engine = HttpEngine::new(transport);
        engine.connect("127.0.0.1", port).unwrap();

        let headers: [(&str, &str); 0] = [];
        let request = Request::new("/", &headers);
        let err = engine.perform_safe(&request, IoPolicy::CopyWrite).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::HttpParseFailure(_))
        ));
    }

    #[test]
    fn safe_response_survives_a_subsequent_request() {
        let port_one = spawn_echo_server(b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\n\r\nSafe Buffer");
        let port_two = spawn_echo_server(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nOther");
        let transport = crate::transport::Transport::tcp(crate::syscalls::real());
        let mut engine = HttpEngine::new(transport);
        engine.connect("127.0.0.1", port_one).unwrap();

        let headers: [(&str, &str); 0] = [];
        let request = Request::new("/", &headers);
        let safe = engine.perform_safe(&request, IoPolicy::CopyWrite).unwrap();
        assert_eq!(safe.body(), b"Safe Buffer");

        // A second, unrelated request reuses the engine's internal buffer
        // (disconnect/reconnect to a different server, then perform again).
        // `safe` owns its bytes independently and must be unaffected.
        engine.disconnect().unwrap();
        engine.connect("127.0.0.1", port_two).unwrap();
        let second = engine.perform_safe(&request, IoPolicy::CopyWrite).unwrap();
        assert_eq!(second.body(), b"Other");

        assert_eq!(safe.body(), b"Safe Buffer");

        // Destroying the engine entirely must not affect `safe` either.
        drop(engine);
        assert_eq!(safe.body(), b"Safe Buffer");
    }
}
