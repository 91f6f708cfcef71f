//! MJPEG server listener
//!
//! Handles the TCP accept loop and spawns connection handlers.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::broadcast::FrameSlot;
use crate::error::Result;
use crate::pipeline::{PipelineConfig, PipelineController, VideoSource};
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::stats::ServerStats;

/// MJPEG streaming server
///
/// Owns the frame slot and the pipeline controller. `run` starts the
/// capture pipeline and accepts viewers, one spawned task per connection;
/// any number of viewers may stream concurrently while settings changes go
/// through the controller.
pub struct MjpegServer<S: VideoSource> {
    config: ServerConfig,
    slot: Arc<FrameSlot>,
    controller: Arc<PipelineController<S>>,
    next_session_id: AtomicU64,
    total_connections: AtomicU64,
    active_connections: Arc<AtomicU64>,
    started_at: Instant,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl<S: VideoSource> MjpegServer<S> {
    /// Create a new server from configurations and a video source
    pub fn new(config: ServerConfig, pipeline: PipelineConfig, source: S) -> Self {
        let slot = Arc::new(FrameSlot::new());
        let controller = Arc::new(PipelineController::new(source, pipeline, slot.sink()));

        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            slot,
            controller,
            next_session_id: AtomicU64::new(1),
            total_connections: AtomicU64::new(0),
            active_connections: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
            connection_semaphore,
        }
    }

    /// Get a reference to the shared frame slot
    ///
    /// Custom producers and tests can publish frames through it directly.
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    /// Get a reference to the pipeline controller
    pub fn controller(&self) -> &Arc<PipelineController<S>> {
        &self.controller
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Server-wide statistics snapshot
    pub fn stats(&self) -> ServerStats {
        ServerStats {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            streaming_sessions: self.slot.receiver_count() as u64,
            uptime: self.started_at.elapsed(),
        }
    }

    /// Run the server
    ///
    /// Starts the capture pipeline, then accepts connections until the
    /// task is cancelled.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "MJPEG server listening");

        self.controller.start().await?;
        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    ///
    /// Starts the capture pipeline, serves until `shutdown` resolves, then
    /// stops the pipeline.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "MJPEG server listening");

        self.controller.start().await?;

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        self.controller.stop().await;
        result
    }

    /// Serve on an already-bound listener
    ///
    /// Pipeline lifecycle is left to the caller; frames can also be
    /// published directly through [`slot`](Self::slot).
    pub async fn run_on(&self, listener: TcpListener) -> Result<()> {
        tracing::info!(addr = %listener.local_addr()?, "MJPEG server listening");
        self.accept_loop(&listener).await
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            self.active_connections.fetch_sub(1, Ordering::Relaxed);
            return;
        }

        let config = self.config.clone();
        let slot = Arc::clone(&self.slot);
        let controller = Arc::clone(&self.controller);
        let active = Arc::clone(&self.active_connections);

        tokio::spawn(async move {
            // The permit rides with the task so the limit counts live
            // connections, streaming sessions included.
            let _permit = permit;

            let connection =
                Connection::new(session_id, socket, peer_addr, config, slot, controller);
            if let Err(e) = connection.run().await {
                tracing::debug!(
                    session_id = session_id,
                    error = %e,
                    "Connection error"
                );
            }

            active.fetch_sub(1, Ordering::Relaxed);
            tracing::debug!(session_id = session_id, "Connection closed");
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }
}
