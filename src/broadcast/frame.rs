//! Frame type shared between the producer and viewer sessions

use bytes::Bytes;

/// One encoded image together with the version the slot assigned to it
///
/// Designed to be cheap to clone: the payload is reference-counted, so all
/// sessions streaming this frame share a single allocation.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Encoded image payload (opaque to the slot; JPEG in practice)
    pub payload: Bytes,
    /// Slot version at publication; strictly increasing, never reused
    pub version: u64,
}

impl Frame {
    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}
