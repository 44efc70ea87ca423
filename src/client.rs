//! Client facade: a small, type-checked surface that enforces GET/POST
//! preconditions before a request ever reaches the engine.

use crate::config::ClientConfig;
use crate::engine::HttpEngine;
use crate::error::{Error, ProtocolError};
use crate::request::{Method, Request};
use crate::response::{OwnedResponse, Response};
use crate::syscalls::Syscalls;
use crate::transport::Transport;
use std::sync::Arc;

/// Owns one protocol engine over one transport. Not safe for concurrent
/// use from multiple threads: create one `Client` per thread that needs
/// an independent connection.
pub struct Client {
    config: ClientConfig,
    engine: HttpEngine<Transport>,
}

impl Client {
    /// Build a client for `config`, using the real host syscalls.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_syscalls(config, crate::syscalls::real())
    }

    /// Build a client over an injected syscall table, for tests.
    pub fn with_syscalls(config: ClientConfig, syscalls: Arc<dyn Syscalls>) -> Self {
        let transport = if config.port == 0 && config.host.starts_with('/') {
            Transport::unix(syscalls)
        } else {
            Transport::tcp(syscalls)
        };
        let engine = HttpEngine::with_buffer_tuning(
            transport,
            config.initial_capacity,
            config.read_ahead,
        );
        Self { engine, config }
    }

    /// Opens the underlying transport.
    pub fn connect(&mut self) -> Result<(), Error> {
        self.engine.connect(&self.config.host, self.config.port)
    }

    pub fn disconnect(&mut self) -> Result<(), Error> {
        self.engine.disconnect()
    }

    pub fn is_connected(&self) -> bool {
        self.engine.is_connected()
    }

    /// GET with a borrowed (unsafe) response view.
    pub fn get_unsafe<'a>(&'a mut self, request: &Request<'_>) -> Result<Response<'a>, Error> {
        let request = validate_get(request)?;
        self.engine.perform_unsafe(&request, self.config.io_policy)
    }

    /// GET with a deep-copied (safe) response.
    pub fn get_safe(&mut self, request: &Request<'_>) -> Result<OwnedResponse, Error> {
        let request = validate_get(request)?;
        self.engine.perform_safe(&request, self.config.io_policy)
    }

    /// POST with a borrowed (unsafe) response view.
    pub fn post_unsafe<'a>(&'a mut self, request: &Request<'_>) -> Result<Response<'a>, Error> {
        let request = validate_post(request)?;
        self.engine.perform_unsafe(&request, self.config.io_policy)
    }

    /// POST with a deep-copied (safe) response.
    pub fn post_safe(&mut self, request: &Request<'_>) -> Result<OwnedResponse, Error> {
        let request = validate_post(request)?;
        self.engine.perform_safe(&request, self.config.io_policy)
    }
}

/// Rejects any request whose body is non-empty and fixes the method to GET.
fn validate_get<'a>(request: &Request<'a>) -> Result<Request<'a>, Error> {
    if request.body.is_some() {
        return Err(Error::Protocol(ProtocolError::InvalidRequest(
            "GET requests must not carry a body",
        )));
    }
    Ok(request.clone().with_method(Method::Get))
}

/// Rejects an empty body or a missing case-insensitive `Content-Length`
/// header and fixes the method to POST.
fn validate_post<'a>(request: &Request<'a>) -> Result<Request<'a>, Error> {
    match request.body {
        Some(body) if !body.is_empty() => {}
        _ => {
            return Err(Error::Protocol(ProtocolError::InvalidRequest(
                "POST requests must carry a non-empty body",
            )))
        }
    }
    if request.header("Content-Length").is_none() {
        return Err(Error::Protocol(ProtocolError::InvalidRequest(
            "POST requests must carry a Content-Length header",
        )));
    }
    Ok(request.clone().with_method(Method::Post))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscalls::test_support::FaultInjector;

    #[test]
    fn get_with_body_is_rejected_before_touching_the_transport() {
        let injector = FaultInjector {
            fail_connect: Some(std::io::ErrorKind::Other),
            ..Default::default()
        };
        let mut client = Client::with_syscalls(ClientConfig::tcp("localhost", 80), Arc::new(injector));

        let headers: [(&str, &str); 0] = [];
        let body = b"not allowed";
        let request = Request::new("/", &headers).with_body(body);
        let err = client.get_unsafe(&request).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::InvalidRequest(_))
        ));
    }

    #[test]
    fn post_without_content_length_is_rejected() {
        let mut client = Client::with_syscalls(ClientConfig::tcp("localhost", 80), crate::syscalls::real());
        let headers: [(&str, &str); 0] = [];
        let body = b"{}";
        let request = Request::new("/", &headers).with_body(body);
        let err = client.post_unsafe(&request).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::InvalidRequest(_))
        ));
    }

    #[test]
    fn post_with_empty_body_is_rejected() {
        let mut client = Client::with_syscalls(ClientConfig::tcp("localhost", 80), crate::syscalls::real());
        let headers = [("Content-Length", "0")];
        let empty: &[u8] = b"";
        let request = Request::new("/", &headers).with_body(empty);
        let err = client.post_unsafe(&request).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::InvalidRequest(_))
        ));
    }
}
