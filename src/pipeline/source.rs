//! Video source boundary
//!
//! The capture/encode pipeline hides behind this trait: the server only
//! needs lifecycle control and a stream of encoded payloads delivered
//! through the sink. A GStreamer graph, a V4L2 capture loop or a synthetic
//! generator all slot in the same way.

use std::future::Future;
use std::sync::Arc;

use crate::broadcast::FrameSink;
use crate::error::PipelineError;

use super::config::PipelineConfig;

/// Capture/encode pipeline lifecycle
///
/// Implementations deliver every successfully encoded frame through
/// [`FrameSink::publish`] from whatever execution context the backend uses.
/// A frame that fails to encode is the source's own business: drop it, log
/// it, keep producing. Viewers simply hold the previous frame until a good
/// one lands.
pub trait VideoSource: Send + Sync + 'static {
    /// Bring the pipeline to the running state under `config`
    ///
    /// Called with production fully stopped, either for the initial start or
    /// after [`stop`](Self::stop) has returned. Publishing through `sink`
    /// may begin at any point after this is invoked.
    fn start(
        &self,
        config: PipelineConfig,
        sink: FrameSink,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send;

    /// Tear production down completely
    ///
    /// Must not return until the pipeline is quiesced: once this resolves,
    /// no publish from the stopped incarnation can occur. Stopping an
    /// already-stopped source is a no-op.
    fn stop(&self) -> impl Future<Output = ()> + Send;
}

impl<S: VideoSource> VideoSource for Arc<S> {
    fn start(
        &self,
        config: PipelineConfig,
        sink: FrameSink,
    ) -> impl Future<Output = Result<(), PipelineError>> + Send {
        (**self).start(config, sink)
    }

    fn stop(&self) -> impl Future<Output = ()> + Send {
        (**self).stop()
    }
}
