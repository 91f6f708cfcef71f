//! Synthetic video source
//!
//! Produces generator-supplied payloads at the configured frame rate, so
//! the server can run and be tested without camera hardware. Doubles as
//! the reference implementation of the source lifecycle contract: `start`
//! spawns a paced task, `stop` aborts it and waits for it to terminate
//! before returning.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::broadcast::FrameSink;
use crate::error::PipelineError;

use super::config::PipelineConfig;
use super::source::VideoSource;

/// Frame generator paced by a timer
///
/// The generator closure receives the frame index (starting at 1 for each
/// start) and the active configuration, and returns the encoded payload to
/// publish.
pub struct SyntheticSource<F> {
    generator: Arc<F>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<F> SyntheticSource<F>
where
    F: Fn(u64, &PipelineConfig) -> Bytes + Send + Sync + 'static,
{
    /// Create a source producing frames from `generator`
    pub fn new(generator: F) -> Self {
        Self {
            generator: Arc::new(generator),
            task: Mutex::new(None),
        }
    }

    async fn halt(&self) {
        let previous = self.task.lock().await.take();
        if let Some(task) = previous {
            task.abort();
            // Resolves only once the task has terminated. Publishing is
            // synchronous, so cancellation always lands on the tick await,
            // never inside a publish.
            let _ = task.await;
            tracing::debug!("Synthetic source stopped");
        }
    }
}

impl<F> VideoSource for SyntheticSource<F>
where
    F: Fn(u64, &PipelineConfig) -> Bytes + Send + Sync + 'static,
{
    async fn start(&self, config: PipelineConfig, sink: FrameSink) -> Result<(), PipelineError> {
        if config.fps == 0 {
            return Err(PipelineError::StartFailed(
                "frame rate must be positive".to_string(),
            ));
        }

        self.halt().await;

        let generator = Arc::clone(&self.generator);
        let handle = tokio::spawn(async move {
            let period = Duration::from_secs(1) / config.fps;
            // interval panics on a zero period
            let period = if period.is_zero() {
                Duration::from_nanos(1)
            } else {
                period
            };
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut index = 0u64;
            loop {
                ticker.tick().await;
                index += 1;
                let version = sink.publish(generator(index, &config));
                tracing::trace!(version = version, frame = index, "Synthetic frame published");
            }
        });

        *self.task.lock().await = Some(handle);
        tracing::debug!(
            fps = config.fps,
            width = config.width,
            height = config.height,
            "Synthetic source started"
        );
        Ok(())
    }

    async fn stop(&self) {
        self.halt().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::FrameSlot;

    fn marker_source() -> SyntheticSource<impl Fn(u64, &PipelineConfig) -> Bytes> {
        SyntheticSource::new(|index, config| {
            Bytes::from(format!("{}x{}-{}", config.width, config.height, index))
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_paces_frames_at_configured_rate() {
        let slot = Arc::new(FrameSlot::new());
        let source = marker_source();

        source
            .start(PipelineConfig::default().fps(10), slot.sink())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1050)).await;

        let version = slot.version();
        assert!(version >= 10, "expected ~11 frames after a second, got {}", version);

        source.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_quiesces_production() {
        let slot = Arc::new(FrameSlot::new());
        let source = marker_source();

        source
            .start(PipelineConfig::default().fps(100), slot.sink())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        source.stop().await;

        let frozen = slot.version();
        assert!(frozen > 0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(slot.version(), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_applies_new_config() {
        let slot = Arc::new(FrameSlot::new());
        let mut rx = slot.subscribe();
        let source = marker_source();

        source
            .start(PipelineConfig::default(), slot.sink())
            .await
            .unwrap();
        let frame = rx.next_frame(None).await.unwrap();
        assert!(frame.payload.starts_with(b"1280x720-"));

        source.stop().await;
        source
            .start(PipelineConfig::default().resolution(640, 360), slot.sink())
            .await
            .unwrap();

        let frame = rx.next_frame(Some(frame.version)).await.unwrap();
        assert!(frame.payload.starts_with(b"640x360-"));

        source.stop().await;
    }

    #[tokio::test]
    async fn test_start_rejects_zero_fps() {
        let slot = Arc::new(FrameSlot::new());
        let source = marker_source();

        let result = source
            .start(PipelineConfig::default().fps(0), slot.sink())
            .await;
        assert!(matches!(result, Err(PipelineError::StartFailed(_))));
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let source = marker_source();
        source.stop().await;
        source.stop().await;
    }
}
