//! A synchronous, client-side HTTP/1.1 engine for low-latency
//! request/response over TCP and UNIX-domain stream sockets.
//!
//! Three layers, leaves first: a [`syscalls`] injection table, a
//! [`transport`] abstraction over TCP and UNIX stream sockets, an
//! [`engine`] that serializes requests and reads/parses responses under
//! one of two memory policies, and a [`client`] facade that enforces
//! GET/POST preconditions.
//!
//! Single connection, single request in flight at a time, no TLS, no
//! connection pooling, no chunked transfer-encoding, no redirects — see
//! the crate's design notes for the full list of non-goals.

pub mod buffer;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod request;
pub mod response;
pub mod syscalls;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, IoPolicy};
pub use engine::HttpEngine;
pub use error::{Error, ErrorCategory, ProtocolError, Result, TransportError};
pub use request::{Method, Request};
pub use response::{OwnedResponse, Response};
pub use transport::{StreamChannel, Transport};
