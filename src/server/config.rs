//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::http::DEFAULT_BOUNDARY;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// Multipart boundary token for the stream
    pub boundary: String,

    /// Time allowed for a complete request to arrive. Never applied to the
    /// stream itself, which runs without a timeout.
    pub request_timeout: Duration,

    /// Upper bound on request head plus body size
    pub max_request_bytes: usize,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".parse().unwrap(),
            max_connections: 0, // Unlimited
            boundary: DEFAULT_BOUNDARY.to_string(),
            request_timeout: Duration::from_secs(10),
            max_request_bytes: 16 * 1024, // 16KB
            tcp_nodelay: true, // Frames should not sit in Nagle buffers
        }
    }
}

impl ServerConfig {
    /// Config bound to `addr`, all other options at their defaults
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the connection limit
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the multipart boundary token
    pub fn boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = boundary.into();
        self
    }

    /// Set the request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the request size limit
    pub fn max_request_bytes(mut self, limit: usize) -> Self {
        self.max_request_bytes = limit;
        self
    }
}
