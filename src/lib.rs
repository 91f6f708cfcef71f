//! MJPEG-over-HTTP live streaming server library.
//!
//! One capture source feeds a shared latest-frame slot; any number of HTTP
//! viewers stream from it, each always receiving the newest frame and never
//! a backlog. Settings changes restart the capture pipeline without
//! touching the viewers, whose connections simply pick up frames from the
//! new incarnation.
//!
//! # Quick start
//!
//! ```no_run
//! use bytes::Bytes;
//! use mjpeg_rs::{MjpegServer, PipelineConfig, ServerConfig, SyntheticSource};
//!
//! #[tokio::main]
//! async fn main() -> mjpeg_rs::Result<()> {
//!     // Stand-in for a real camera/encoder backend.
//!     let source = SyntheticSource::new(|index, _config| {
//!         Bytes::from(format!("frame {}", index))
//!     });
//!
//!     let server = MjpegServer::new(
//!         ServerConfig::default(),
//!         PipelineConfig::default(),
//!         source,
//!     );
//!     server
//!         .run_until(async {
//!             tokio::signal::ctrl_c().await.ok();
//!         })
//!         .await
//! }
//! ```
//!
//! # Architecture
//!
//! [`broadcast`] holds the versioned frame slot every other piece hangs
//! off: the pipeline publishes into it, sessions wait on it. [`pipeline`]
//! is the capture side (source trait, configuration, restart coordinator),
//! [`session`] the delivery side (one multipart stream per viewer), and
//! [`server`] ties them to TCP with a small hand-rolled HTTP layer from
//! [`http`].

pub mod broadcast;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod server;
pub mod session;
pub mod stats;

pub use broadcast::{Frame, FrameReceiver, FrameSink, FrameSlot, SlotClosed};
pub use error::{Error, HttpError, PipelineError, Result};
pub use pipeline::{ConfigUpdate, PipelineConfig, PipelineController, SyntheticSource, VideoSource};
pub use server::{MjpegServer, ServerConfig};
pub use session::{SessionError, StreamSession};
pub use stats::{ServerStats, SessionStats};
