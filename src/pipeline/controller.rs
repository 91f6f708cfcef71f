//! Pipeline lifecycle and reconfiguration
//!
//! One lock guards the whole stop -> swap -> start sequence, so two
//! concurrent settings changes cannot interleave their restarts. Combined
//! with the source's `stop` contract (fully quiesced on return) this gives
//! the reconfiguration guarantee: after `apply` returns, every frame that
//! reaches the slot was produced under the configuration it reports.

use tokio::sync::Mutex;

use crate::broadcast::FrameSink;
use crate::error::PipelineError;

use super::config::{ConfigUpdate, PipelineConfig};
use super::source::VideoSource;

/// Serializes pipeline lifecycle against configuration changes
pub struct PipelineController<S> {
    source: S,
    sink: FrameSink,
    state: Mutex<ControllerState>,
}

#[derive(Debug)]
struct ControllerState {
    active: PipelineConfig,
    running: bool,
}

impl<S: VideoSource> PipelineController<S> {
    /// Create a controller; the pipeline starts out stopped
    pub fn new(source: S, config: PipelineConfig, sink: FrameSink) -> Self {
        Self {
            source,
            sink,
            state: Mutex::new(ControllerState {
                active: config,
                running: false,
            }),
        }
    }

    /// Currently active configuration
    pub async fn config(&self) -> PipelineConfig {
        self.state.lock().await.active
    }

    /// Whether the pipeline is currently producing
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    /// Start production under the active configuration
    ///
    /// Restarts from scratch if already running.
    pub async fn start(&self) -> Result<(), PipelineError> {
        let mut state = self.state.lock().await;
        if state.running {
            self.source.stop().await;
            state.running = false;
        }

        let config = state.active;
        if let Err(e) = self.source.start(config, self.sink.clone()).await {
            tracing::error!(error = %e, "Pipeline failed to start");
            return Err(e);
        }
        state.running = true;
        tracing::info!(
            fps = config.fps,
            quality = config.quality,
            width = config.width,
            height = config.height,
            "Pipeline running"
        );
        Ok(())
    }

    /// Stop production entirely
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        if state.running {
            self.source.stop().await;
            state.running = false;
            tracing::info!("Pipeline stopped");
        }
    }

    /// Apply a configuration change
    ///
    /// Merges `update` over the active configuration. Returns `Ok(false)`
    /// without touching the pipeline when nothing changes and production is
    /// already running; otherwise stops production, swaps the configuration
    /// in and starts again, returning `Ok(true)`.
    ///
    /// A start failure leaves production down with the new configuration
    /// recorded. Streaming sessions are unaffected either way; they simply
    /// see no new frames until a later `apply` or [`start`](Self::start)
    /// succeeds. The no-op shortcut requires a running pipeline, so retrying
    /// with unchanged values reattempts the start.
    pub async fn apply(&self, update: ConfigUpdate) -> Result<bool, PipelineError> {
        let mut state = self.state.lock().await;
        let merged = state.active.merged(&update);
        if merged == state.active && state.running {
            tracing::debug!("Configuration unchanged, pipeline untouched");
            return Ok(false);
        }

        tracing::info!(
            fps = merged.fps,
            quality = merged.quality,
            width = merged.width,
            height = merged.height,
            "Applying pipeline configuration"
        );
        if state.running {
            self.source.stop().await;
            state.running = false;
        }
        state.active = merged;

        if let Err(e) = self.source.start(merged, self.sink.clone()).await {
            tracing::error!(error = %e, "Pipeline failed to restart");
            return Err(e);
        }
        state.running = true;
        Ok(true)
    }
}
