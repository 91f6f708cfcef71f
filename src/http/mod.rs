//! Minimal HTTP/1.1 layer
//!
//! Hand-rolled request reading and response building, covering exactly
//! what the server's routes need: request line, headers, an optional
//! `Content-Length` body, and the multipart stream framing.

pub mod request;
pub mod response;

pub use request::{form_pairs, Method, Request};
pub use response::DEFAULT_BOUNDARY;
