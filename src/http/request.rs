//! HTTP/1.1 request reading
//!
//! Just enough of HTTP for this server: one request line, a handful of
//! headers, an optional `Content-Length` body. The routes this server
//! exposes need nothing more, and the cap on total request size keeps a
//! misbehaving client from ballooning the read buffer.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Error, HttpError};

/// Request method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A parsed HTTP request
#[derive(Debug)]
pub struct Request {
    /// Request method
    pub method: Method,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl Request {
    /// Read one request from the transport
    ///
    /// `buf` carries bytes between calls on the same connection: whatever
    /// arrives beyond the current request stays in it, so a request the
    /// peer pipelined behind this one is served by the next call instead of
    /// being dropped. Returns `Ok(None)` when the peer closes the
    /// connection cleanly between requests. `limit` caps head and body
    /// together.
    pub async fn read<R>(
        reader: &mut R,
        buf: &mut BytesMut,
        limit: usize,
    ) -> Result<Option<Request>, Error>
    where
        R: AsyncRead + Unpin,
    {
        let head_len = loop {
            if let Some(end) = find_head_end(buf) {
                break end + 4;
            }
            if buf.len() >= limit {
                return Err(HttpError::RequestTooLarge.into());
            }
            let n = reader.read_buf(buf).await?;
            if n == 0 {
                if buf.is_empty() {
                    return Ok(None);
                }
                return Err(HttpError::ConnectionClosed.into());
            }
        };

        let head = buf.split_to(head_len);
        let mut request = parse_head(&head)?;

        let body_len = request.content_length()?.unwrap_or(0);
        if head_len + body_len > limit {
            return Err(HttpError::RequestTooLarge.into());
        }
        while buf.len() < body_len {
            let n = reader.read_buf(buf).await?;
            if n == 0 {
                return Err(HttpError::ConnectionClosed.into());
            }
        }
        request.body = buf.split_to(body_len).freeze();

        Ok(Some(request))
    }

    /// Request path with any query string stripped
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query string, if the request target carried one
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Look up a header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Request body, empty unless a `Content-Length` was given
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    fn content_length(&self) -> Result<Option<usize>, HttpError> {
        match self.header("content-length") {
            Some(value) => value
                .parse::<usize>()
                .map(Some)
                .map_err(|_| HttpError::MalformedRequest("invalid Content-Length")),
            None => Ok(None),
        }
    }
}

/// Iterate the `key=value` pairs of a form-encoded string
///
/// Splits on `&` and `=`; pairs without a `=` or with an empty key are
/// skipped. Values are taken verbatim, no percent-decoding: the fields this
/// server consumes are plain positive integers.
pub fn form_pairs(body: &str) -> impl Iterator<Item = (&str, &str)> {
    body.split('&').filter_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (!key.is_empty()).then_some((key, value))
    })
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn parse_head(head: &[u8]) -> Result<Request, HttpError> {
    let text = std::str::from_utf8(head)
        .map_err(|_| HttpError::MalformedRequest("head is not valid UTF-8"))?;
    let mut lines = text.split("\r\n");

    let request_line = lines
        .next()
        .ok_or(HttpError::MalformedRequest("empty request"))?;
    let mut parts = request_line.split(' ');
    let method = match parts.next() {
        Some("GET") => Method::Get,
        Some("POST") => Method::Post,
        _ => return Err(HttpError::MalformedRequest("unsupported method")),
    };
    let target = parts
        .next()
        .ok_or(HttpError::MalformedRequest("missing request target"))?;
    let version = parts
        .next()
        .ok_or(HttpError::MalformedRequest("missing HTTP version"))?;
    if !version.starts_with("HTTP/1.") || parts.next().is_some() {
        return Err(HttpError::MalformedRequest("malformed request line"));
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    };

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or(HttpError::MalformedRequest("malformed header"))?;
        headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
    }

    Ok(Request {
        method,
        path,
        query,
        headers,
        body: Bytes::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 16 * 1024;

    async fn read_one(raw: &[u8]) -> Result<Option<Request>, Error> {
        let mut reader = raw;
        let mut buf = BytesMut::new();
        Request::read(&mut reader, &mut buf, LIMIT).await
    }

    #[tokio::test]
    async fn test_reads_simple_get() {
        let request = read_one(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path(), "/");
        assert_eq!(request.query(), None);
        assert_eq!(request.header("host"), Some("localhost"));
        assert!(request.body().is_empty());
    }

    #[tokio::test]
    async fn test_splits_query_from_path() {
        let request = read_one(b"GET /stream?rand=0.53 HTTP/1.1\r\n\r\n")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(request.path(), "/stream");
        assert_eq!(request.query(), Some("rand=0.53"));
    }

    #[tokio::test]
    async fn test_header_lookup_is_case_insensitive() {
        let request = read_one(b"GET / HTTP/1.1\r\nContent-Type: text/plain\r\n\r\n")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(request.header("Content-Type"), Some("text/plain"));
        assert_eq!(request.header("content-type"), Some("text/plain"));
        assert_eq!(request.header("accept"), None);
    }

    #[tokio::test]
    async fn test_reads_post_body() {
        let request = read_one(
            b"POST /settings HTTP/1.1\r\nContent-Length: 13\r\n\r\nfps=15&qual=2",
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body(), b"fps=15&qual=2");
    }

    #[tokio::test]
    async fn test_pipelined_requests_survive_in_buffer() {
        let mut reader: &[u8] =
            b"POST /settings HTTP/1.1\r\nContent-Length: 6\r\n\r\nfps=10GET /stream HTTP/1.1\r\n\r\n";
        let mut buf = BytesMut::new();

        let first = Request::read(&mut reader, &mut buf, LIMIT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.method, Method::Post);
        assert_eq!(first.body(), b"fps=10");

        // The second request came in with the first and sits in the buffer;
        // it must still be served.
        let second = Request::read(&mut reader, &mut buf, LIMIT)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.method, Method::Get);
        assert_eq!(second.path(), "/stream");

        assert!(Request::read(&mut reader, &mut buf, LIMIT)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_clean_close_before_request_is_none() {
        assert!(read_one(b"").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_mid_request_is_an_error() {
        let result = read_one(b"GET / HT").await;
        assert!(matches!(
            result,
            Err(Error::Http(HttpError::ConnectionClosed))
        ));
    }

    #[tokio::test]
    async fn test_eof_mid_body_is_an_error() {
        let result = read_one(b"POST /settings HTTP/1.1\r\nContent-Length: 50\r\n\r\nshort").await;
        assert!(matches!(
            result,
            Err(Error::Http(HttpError::ConnectionClosed))
        ));
    }

    #[tokio::test]
    async fn test_oversized_head_is_rejected() {
        let mut raw = b"GET / HTTP/1.1\r\n".to_vec();
        raw.extend(std::iter::repeat(b'a').take(LIMIT));
        let mut reader = raw.as_slice();
        let mut buf = BytesMut::new();

        let result = Request::read(&mut reader, &mut buf, LIMIT).await;
        assert!(matches!(
            result,
            Err(Error::Http(HttpError::RequestTooLarge))
        ));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let raw = b"POST /settings HTTP/1.1\r\nContent-Length: 99999999\r\n\r\n";
        let mut reader = raw.as_slice();
        let mut buf = BytesMut::new();

        let result = Request::read(&mut reader, &mut buf, LIMIT).await;
        assert!(matches!(
            result,
            Err(Error::Http(HttpError::RequestTooLarge))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_method_is_malformed() {
        let result = read_one(b"BREW /coffee HTTP/1.1\r\n\r\n").await;
        assert!(matches!(
            result,
            Err(Error::Http(HttpError::MalformedRequest(_)))
        ));
    }

    #[tokio::test]
    async fn test_bad_content_length_is_malformed() {
        let result = read_one(b"POST / HTTP/1.1\r\nContent-Length: lots\r\n\r\n").await;
        assert!(matches!(
            result,
            Err(Error::Http(HttpError::MalformedRequest(_)))
        ));
    }

    #[test]
    fn test_form_pairs_splits_fields() {
        let pairs: Vec<_> = form_pairs("fps=15&quality=70&width=640").collect();
        assert_eq!(
            pairs,
            vec![("fps", "15"), ("quality", "70"), ("width", "640")]
        );
    }

    #[test]
    fn test_form_pairs_skips_malformed_fields() {
        let pairs: Vec<_> = form_pairs("fps=15&nobody&=orphan&q=").collect();
        assert_eq!(pairs, vec![("fps", "15"), ("q", "")]);
    }

    #[test]
    fn test_form_pairs_empty_body() {
        assert_eq!(form_pairs("").count(), 0);
    }
}
