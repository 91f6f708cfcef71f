//! HTTP responses and multipart stream framing
//!
//! Builders for the handful of responses this server sends, plus the
//! framing of the stream itself. The part framing is the wire contract
//! MJPEG viewers rely on:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <payload bytes>
//! ```
//!
//! No `Content-Length` sub-header and no separator after the payload; the
//! next part's leading `--` follows the image bytes directly.

use bytes::Bytes;

/// Boundary token used unless the server is configured with another one
pub const DEFAULT_BOUNDARY: &str = "boundarydonotcross";

/// Response head for the multipart stream
///
/// `Connection: close` because the stream never ends with the connection
/// still usable; `Cache-Control: no-cache` so intermediaries do not hold
/// frames back.
pub fn stream_head(boundary: &str) -> Bytes {
    Bytes::from(format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: multipart/x-mixed-replace; boundary={}\r\n\
         Cache-Control: no-cache\r\n\
         Connection: close\r\n\
         \r\n",
        boundary
    ))
}

/// Part head preceding each frame payload
pub fn part_head(boundary: &str) -> Bytes {
    Bytes::from(format!(
        "--{}\r\nContent-Type: image/jpeg\r\n\r\n",
        boundary
    ))
}

/// 200 response carrying an HTML page
pub fn html(body: &str) -> Bytes {
    Bytes::from(format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        body.len(),
        body
    ))
}

/// 404 with a small plain-text body
pub fn not_found() -> Bytes {
    plain("404 Not Found", "not found")
}

/// 500 carrying the failure description
pub fn server_error(reason: &str) -> Bytes {
    plain("500 Internal Server Error", reason)
}

fn plain(status: &str, body: &str) -> Bytes {
    Bytes::from(format!(
        "HTTP/1.1 {}\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         \r\n\
         {}",
        status,
        body.len(),
        body
    ))
}
