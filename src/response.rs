//! The two response memory policies: borrowed (zero-copy) and owning
//! (deep-copied).

/// A response whose fields all point into the engine's internal buffer.
///
/// Valid until the next call on the same engine, or until the engine is
/// destroyed — the engine must not reuse its buffer while a value of this
/// type is still in scope.
#[derive(Debug, Clone)]
pub struct Response<'a> {
    pub status: u16,
    pub message: &'a str,
    pub headers: Vec<(&'a str, &'a str)>,
    pub body: &'a [u8],
    pub content_length: Option<usize>,
}

impl<'a> Response<'a> {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    /// Case-insensitive header lookup, matching [`crate::request::Request::header`].
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    /// Deep-copy every field into a self-contained, engine-independent
    /// value — the "safe" form of the same response.
    pub fn to_owned_response(&self) -> OwnedResponse {
        OwnedResponse {
            status: self.status,
            message: self.message.to_string(),
            headers: self
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: self.body.to_vec(),
            content_length: self.content_length,
        }
    }
}

/// A response that owns a deep copy of every byte it reports. Its
/// lifetime is independent of the engine that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedResponse {
    pub status: u16,
    pub message: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub content_length: Option<usize>,
}

impl OwnedResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_length(&self) -> Option<usize> {
        self.content_length
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_response_is_independent_copy() {
        let body = b"hello".to_vec();
        let borrowed = Response {
            status: 200,
            message: "OK",
            headers: vec![("Content-Type", "text/plain")],
            body: &body,
            content_length: Some(5),
        };
        let owned = borrowed.to_owned_response();
        assert_ne!(owned.body.as_ptr(), borrowed.body.as_ptr());
        assert_eq!(owned.body(), borrowed.body());
        assert_eq!(owned.header("content-type"), Some("text/plain"));
    }
}
