//! Per-connection request handling
//!
//! Serves requests on one accepted connection until the peer leaves.
//! `GET /stream` is the special case: it hands the transport over to a
//! [`StreamSession`] and never comes back, because the multipart response
//! runs until the viewer disconnects.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::broadcast::FrameSlot;
use crate::error::{Error, HttpError, Result};
use crate::http::{form_pairs, response, Method, Request};
use crate::pipeline::{ConfigUpdate, PipelineController, VideoSource};
use crate::session::{SessionError, StreamSession};

use super::config::ServerConfig;
use super::pages;

/// Handler for one accepted connection
pub struct Connection<T, S: VideoSource> {
    session_id: u64,
    transport: T,
    peer_addr: SocketAddr,
    config: ServerConfig,
    slot: Arc<FrameSlot>,
    controller: Arc<PipelineController<S>>,
}

impl<T, S> Connection<T, S>
where
    T: AsyncRead + AsyncWrite + Unpin,
    S: VideoSource,
{
    pub fn new(
        session_id: u64,
        transport: T,
        peer_addr: SocketAddr,
        config: ServerConfig,
        slot: Arc<FrameSlot>,
        controller: Arc<PipelineController<S>>,
    ) -> Self {
        Self {
            session_id,
            transport,
            peer_addr,
            config,
            slot,
            controller,
        }
    }

    /// Serve requests until the peer leaves or the stream route takes over
    ///
    /// The request timeout applies to each request read; once a session is
    /// streaming there is no timeout left in the path.
    pub async fn run(mut self) -> Result<()> {
        // One read buffer for the whole connection, so bytes the peer sent
        // ahead of time are kept for the next request.
        let mut buf = BytesMut::with_capacity(1024);
        loop {
            let request = match timeout(
                self.config.request_timeout,
                Request::read(&mut self.transport, &mut buf, self.config.max_request_bytes),
            )
            .await
            {
                Ok(Ok(Some(request))) => request,
                // Clean end of a keep-alive connection
                Ok(Ok(None)) => return Ok(()),
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(HttpError::Timeout.into()),
            };

            tracing::debug!(
                session_id = self.session_id,
                peer = %self.peer_addr,
                method = ?request.method,
                path = request.path(),
                "Request"
            );

            match (request.method, request.path()) {
                (Method::Get, "/") => self.send_index().await?,
                (Method::Get, "/stream") => return self.stream().await,
                (Method::Post, "/settings") => self.apply_settings(&request).await?,
                _ => self.send(&response::not_found()).await?,
            }
        }
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.transport.write_all(bytes).await?;
        self.transport.flush().await?;
        Ok(())
    }

    async fn send_index(&mut self) -> Result<()> {
        let page = pages::index(&self.controller.config().await);
        self.send(&response::html(&page)).await
    }

    async fn stream(mut self) -> Result<()> {
        self.send(&response::stream_head(&self.config.boundary)).await?;

        let frames = self.slot.subscribe();
        tracing::debug!(
            session_id = self.session_id,
            peer = %self.peer_addr,
            viewers = self.slot.receiver_count(),
            "Streaming session started"
        );

        let session = StreamSession::new(
            self.session_id,
            self.transport,
            frames,
            &self.config.boundary,
        );
        match session.run().await {
            Ok(()) => Ok(()),
            // Server shutting down; not a connection failure
            Err(SessionError::SlotClosed) => Ok(()),
            Err(SessionError::Io(e)) => Err(Error::Io(e)),
        }
    }

    async fn apply_settings(&mut self, request: &Request) -> Result<()> {
        let body = std::str::from_utf8(request.body()).unwrap_or("");
        let update = ConfigUpdate::from_pairs(form_pairs(body));
        if update.is_empty() {
            tracing::debug!(
                session_id = self.session_id,
                "Settings request carried no usable fields"
            );
        }

        match self.controller.apply(update).await {
            Ok(applied) => {
                if applied {
                    tracing::info!(session_id = self.session_id, "Settings applied");
                }
                let page = pages::index(&self.controller.config().await);
                self.send(&response::html(&page)).await
            }
            Err(e) => {
                tracing::error!(
                    session_id = self.session_id,
                    error = %e,
                    "Reconfiguration failed"
                );
                self.send(&response::server_error(&e.to_string())).await
            }
        }
    }
}
