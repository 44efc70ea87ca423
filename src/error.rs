//! Error taxonomy for the HTTP/1.1 engine.
//!
//! Every fallible operation in this crate returns `Result<T, Error>`. There
//! is no exception-driven control flow across component boundaries: a
//! lower layer's error is surfaced verbatim to its caller, never silently
//! swallowed or downgraded.

use std::io;

/// Top-level error returned by every public operation in this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure originating in the transport layer (DNS, socket, I/O).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Failure originating in the protocol engine or client facade.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl Error {
    /// The coarse category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Transport(_) => ErrorCategory::Transport,
            Error::Protocol(_) => ErrorCategory::Protocol,
        }
    }
}

/// Coarse error category: transport-level (DNS, socket, I/O) vs
/// protocol-level (framing, validation). There is no `None` variant — a
/// value that carries no error is simply `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Protocol,
}

/// Transport-layer failure codes.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("DNS resolution failed for {host}: {source}")]
    DnsFailure { host: String, source: io::Error },

    #[error("failed to create socket: {0}")]
    SocketCreateFailure(io::Error),

    #[error("failed to connect to {host}:{port}: {source}")]
    SocketConnectFailure {
        host: String,
        port: u16,
        source: io::Error,
    },

    #[error("write to transport failed: {0}")]
    SocketWriteFailure(io::Error),

    #[error("read from transport failed: {0}")]
    SocketReadFailure(io::Error),

    /// A read returned zero bytes: the distinguished "orderly close" outcome.
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("failed to close socket: {0}")]
    SocketCloseFailure(io::Error),

    #[error("transport initialization failed: {0}")]
    InitFailure(String),
}

/// Protocol-layer (framing/validation) failure codes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("failed to parse URL: {0}")]
    UrlParseFailure(String),

    #[error("failed to parse HTTP response: {0}")]
    HttpParseFailure(String),

    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),

    #[error("protocol engine initialization failed: {0}")]
    InitFailure(String),
}

pub type Result<T> = std::result::Result<T, Error>;
