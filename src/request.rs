//! The caller-facing request value.

/// HTTP method. Restricted to the two verbs this engine supports; HEAD,
/// PUT, DELETE and friends are out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A single header key/value pair, borrowed from the caller.
pub type Header<'a> = (&'a str, &'a str);

/// An HTTP/1.1 request. Every string and byte slice is borrowed from the
/// caller, who must keep them alive for the duration of the call — the
/// request value owns nothing.
///
/// The method defaults to GET; [`crate::client::Client::get`]/`post` set
/// it explicitly before the request reaches the engine, so callers rarely
/// need to set it themselves.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub method: Method,
    pub path: &'a str,
    pub headers: &'a [Header<'a>],
    pub body: Option<&'a [u8]>,
}

impl<'a> Request<'a> {
    pub fn new(path: &'a str, headers: &'a [Header<'a>]) -> Self {
        Self {
            method: Method::Get,
            path,
            headers,
            body: None,
        }
    }

    pub fn with_body(mut self, body: &'a [u8]) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Case-insensitive header lookup, used by the client facade to find
    /// `Content-Length` without recomputing it — the engine trusts the
    /// caller's value for framing rather than counting body bytes itself.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").and_then(|v| v.trim().parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = [("Content-Length", "13")];
        let req = Request::new("/x", &headers);
        assert_eq!(req.header("content-length"), Some("13"));
        assert_eq!(req.content_length(), Some(13));
    }

    #[test]
    fn missing_header_is_none() {
        let headers: [(&str, &str); 0] = [];
        let req = Request::new("/x", &headers);
        assert_eq!(req.header("Host"), None);
    }
}
