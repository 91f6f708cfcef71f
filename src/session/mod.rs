//! Per-viewer streaming sessions
//!
//! A session owns one connection for its whole streaming life. Sessions
//! share nothing with each other; the only common ground is the frame slot
//! they all subscribe to.

pub mod stream;

pub use stream::{SessionError, StreamSession};
