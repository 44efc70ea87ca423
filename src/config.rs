//! Client/engine configuration.

/// How the engine places an outgoing request body on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoPolicy {
    /// Concatenate headers and body into one buffer, issue one `write`.
    #[default]
    CopyWrite,
    /// Keep the head in the engine's buffer and the body in the caller's
    /// own slice, issue one `writev` of two segments. Avoids copying a
    /// large request body.
    VectoredWrite,
}

/// Endpoint + tuning knobs for a [`crate::client::Client`].
///
/// There is no memory-policy field here: the `_safe`/`_unsafe` suffix on
/// each [`crate::client::Client`] method already fixes that choice at the
/// call site, so a config-level default would just be a second,
/// unconsulted place to set the same thing.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Hostname (TCP) or socket path (UNIX).
    pub host: String,
    /// TCP port. Ignored for UNIX transports.
    pub port: u16,
    /// Default I/O policy for requests that don't override it per call.
    pub io_policy: IoPolicy,
    /// Minimum capacity the engine's buffer grows to on first use.
    pub initial_capacity: usize,
    /// Minimum spare capacity the engine keeps available before each read.
    pub read_ahead: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            io_policy: IoPolicy::default(),
            initial_capacity: crate::buffer::DEFAULT_INITIAL_CAPACITY,
            read_ahead: crate::buffer::DEFAULT_READ_AHEAD,
        }
    }
}

impl ClientConfig {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn unix(path: impl Into<String>) -> Self {
        Self {
            host: path.into(),
            port: 0,
            ..Default::default()
        }
    }

    pub fn with_io_policy(mut self, policy: IoPolicy) -> Self {
        self.io_policy = policy;
        self
    }

    /// Override the minimum capacity the engine's buffer grows to on first
    /// use (default [`crate::buffer::DEFAULT_INITIAL_CAPACITY`]).
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Override the minimum spare capacity kept available before each read
    /// (default [`crate::buffer::DEFAULT_READ_AHEAD`]).
    pub fn with_read_ahead(mut self, read_ahead: usize) -> Self {
        self.read_ahead = read_ahead;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_copy_write() {
        let cfg = ClientConfig::tcp("localhost", 8080);
        assert_eq!(cfg.io_policy, IoPolicy::CopyWrite);
    }

    #[test]
    fn unix_config_ignores_port() {
        let cfg = ClientConfig::unix("/tmp/engine.sock");
        assert_eq!(cfg.host, "/tmp/engine.sock");
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_buffer_tuning_matches_documented_numbers() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.initial_capacity, crate::buffer::DEFAULT_INITIAL_CAPACITY);
        assert_eq!(cfg.read_ahead, crate::buffer::DEFAULT_READ_AHEAD);
    }

    #[test]
    fn builders_override_buffer_tuning() {
        let cfg = ClientConfig::tcp("localhost", 8080)
            .with_initial_capacity(4096)
            .with_read_ahead(512);
        assert_eq!(cfg.initial_capacity, 4096);
        assert_eq!(cfg.read_ahead, 512);
    }
}
