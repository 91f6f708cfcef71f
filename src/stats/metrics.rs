//! Statistics for streaming sessions and the server

use std::time::{Duration, Instant};

/// Per-viewer session statistics
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// When the session started streaming
    pub started_at: Instant,
    /// Frames emitted to this viewer
    pub frames_sent: u64,
    /// Bytes written to this viewer, part heads included
    pub bytes_sent: u64,
}

impl SessionStats {
    /// Create a stats tracker starting now
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            frames_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Record one emitted part
    pub fn record_part(&mut self, bytes: usize) {
        self.frames_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Session duration so far
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Outgoing bitrate estimate in bits per second
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration().as_secs();
        if secs > 0 {
            (self.bytes_sent * 8) / secs
        } else {
            0
        }
    }

    /// Delivered frame rate estimate
    pub fn framerate(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.frames_sent as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Server-wide statistics snapshot
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Total connections ever accepted
    pub total_connections: u64,
    /// Connections currently open
    pub active_connections: u64,
    /// Viewers currently streaming
    pub streaming_sessions: u64,
    /// Server uptime
    pub uptime: Duration,
}

impl ServerStats {
    pub fn new() -> Self {
        Self::default()
    }
}
