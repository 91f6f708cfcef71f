//! Latest-frame broadcast between one producer and many viewer sessions
//!
//! The slot holds exactly one frame: the most recent one the capture
//! pipeline produced. Publishing replaces it and wakes every waiting
//! session; a session that was busy writing simply skips straight to the
//! current frame on its next wait. There is no queue and no backlog.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<FrameSlot>
//!                     ┌──────────────────────┐
//!                     │ current: Frame       │
//!                     │ version: u64 (+1 per │
//!                     │          publish)    │
//!                     └──────────┬───────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//!   [Producer]             [Session]                [Session]
//!   sink.publish()         next_frame(seen)         next_frame(seen)
//!        │                       │                       │
//!        └──► replace + wake ──► write part ──► TCP      │
//! ```
//!
//! # Zero-Copy Design
//!
//! Frame payloads are `bytes::Bytes`, so every session streaming a frame
//! shares one reference-counted allocation; delivering a frame clones a
//! pointer, never the image.

pub mod frame;
pub mod slot;

pub use frame::Frame;
pub use slot::{FrameReceiver, FrameSink, FrameSlot, SlotClosed};
