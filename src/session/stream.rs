//! Per-viewer streaming session
//!
//! The session bridges the frame slot and one HTTP connection: wait for a
//! frame newer than the last one sent, emit it as a multipart part, repeat.
//! Waiting is raced against the connection's read side, so a viewer that
//! disconnects while no frames are arriving is torn down promptly instead
//! of sitting in the wait forever.
//!
//! Parts are written whole and flushed before the next wait begins. If the
//! transport fails mid-part the session ends; nothing of the partial part
//! survives, which is fine because the connection is never reused.

use std::fmt;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::broadcast::{Frame, FrameReceiver, SlotClosed};
use crate::http::response;
use crate::stats::SessionStats;

/// Why a session ended
#[derive(Debug)]
pub enum SessionError {
    /// Transport failed or the peer reset the connection
    Io(std::io::Error),
    /// The frame slot was dropped while the session was streaming
    SlotClosed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Io(e) => write!(f, "Session I/O error: {}", e),
            SessionError::SlotClosed => write!(f, "Frame slot closed"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(e) => Some(e),
            SessionError::SlotClosed => None,
        }
    }
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Io(e)
    }
}

/// Streaming loop for one viewer connection
///
/// The transport must already carry the multipart response head; the
/// session writes only parts.
pub struct StreamSession<T> {
    id: u64,
    transport: T,
    frames: FrameReceiver,
    part_head: Bytes,
    stats: SessionStats,
}

impl<T> StreamSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a session over an established transport
    pub fn new(id: u64, transport: T, frames: FrameReceiver, boundary: &str) -> Self {
        Self {
            id,
            transport,
            frames,
            part_head: response::part_head(boundary),
            stats: SessionStats::new(),
        }
    }

    /// Run until the viewer disconnects or the slot closes
    ///
    /// Each iteration waits for a frame newer than the last one emitted and
    /// writes it as one complete part. A session that falls behind skips
    /// straight to the newest frame; intermediate frames are never sent.
    /// Returns `Ok(())` on a clean disconnect.
    pub async fn run(self) -> Result<(), SessionError> {
        let StreamSession {
            id,
            transport,
            mut frames,
            part_head,
            mut stats,
        } = self;
        let (mut reader, mut writer) = tokio::io::split(transport);
        let mut drain = [0u8; 512];
        let mut last_seen = None;

        let result = loop {
            tokio::select! {
                next = frames.next_frame(last_seen) => {
                    let frame = match next {
                        Ok(frame) => frame,
                        Err(SlotClosed) => break Err(SessionError::SlotClosed),
                    };
                    if let Err(e) = write_part(&mut writer, &part_head, &frame).await {
                        break Err(SessionError::Io(e));
                    }
                    stats.record_part(part_head.len() + frame.size());
                    last_seen = Some(frame.version);
                    tracing::trace!(
                        session_id = id,
                        version = frame.version,
                        bytes = frame.size(),
                        "Part sent"
                    );
                }
                read = reader.read(&mut drain) => {
                    match read {
                        // Peer closed the connection
                        Ok(0) => break Ok(()),
                        // Stray bytes after the request, ignored
                        Ok(_) => continue,
                        Err(e) => break Err(SessionError::Io(e)),
                    }
                }
            }
        };

        tracing::debug!(
            session_id = id,
            frames = stats.frames_sent,
            bytes = stats.bytes_sent,
            duration_ms = stats.duration().as_millis() as u64,
            bitrate = stats.bitrate(),
            "Streaming session ended"
        );
        result
    }
}

async fn write_part<W>(writer: &mut W, head: &Bytes, frame: &Frame) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(head).await?;
    writer.write_all(&frame.payload).await?;
    writer.flush().await
}
