//! Crate-wide error types
//!
//! Module-local error types that only one subsystem produces live next to
//! that subsystem (`broadcast::SlotClosed`, `session::SessionError`); this
//! module defines the errors that cross module boundaries and the crate-wide
//! `Result` alias.

use std::fmt;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// Transport-level I/O failure
    Io(std::io::Error),
    /// HTTP request could not be read or parsed
    Http(HttpError),
    /// Pipeline lifecycle failure
    Pipeline(PipelineError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Http(e) => write!(f, "HTTP error: {}", e),
            Error::Pipeline(e) => write!(f, "Pipeline error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<HttpError> for Error {
    fn from(e: HttpError) -> Self {
        Error::Http(e)
    }
}

impl From<PipelineError> for Error {
    fn from(e: PipelineError) -> Self {
        Error::Pipeline(e)
    }
}

/// Error type for HTTP request handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// Request line or header could not be parsed
    MalformedRequest(&'static str),
    /// Request head or body exceeded the configured size limit
    RequestTooLarge,
    /// Peer closed the connection in the middle of a request
    ConnectionClosed,
    /// Complete request did not arrive within the configured window
    Timeout,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::MalformedRequest(what) => write!(f, "Malformed request: {}", what),
            HttpError::RequestTooLarge => write!(f, "Request exceeds size limit"),
            HttpError::ConnectionClosed => write!(f, "Connection closed mid-request"),
            HttpError::Timeout => write!(f, "Timed out waiting for request"),
        }
    }
}

impl std::error::Error for HttpError {}

/// Error type for pipeline lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The source failed to reach the running state
    StartFailed(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::StartFailed(reason) => {
                write!(f, "Pipeline failed to start: {}", reason)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::Http(HttpError::RequestTooLarge);
        assert_eq!(e.to_string(), "HTTP error: Request exceeds size limit");

        let e = Error::Pipeline(PipelineError::StartFailed("no device".into()));
        assert_eq!(
            e.to_string(),
            "Pipeline error: Pipeline failed to start: no device"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer gone");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn test_http_conversion() {
        let e: Error = HttpError::Timeout.into();
        assert!(matches!(e, Error::Http(HttpError::Timeout)));
    }
}
