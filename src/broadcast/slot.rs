//! Shared latest-frame slot
//!
//! Built on `tokio::sync::watch`: the channel's cell is the slot, its
//! internal lock is the monitor, and `changed()` is the suspension point
//! that every publish wakes. Receivers re-check the version predicate on
//! each wake, so a wake that races another reader (or fires spuriously)
//! just goes back to waiting: no missed update, no early return.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::watch;

use super::frame::Frame;

/// Shared slot holding the most recent encoded frame
///
/// One writer role (the capture pipeline) and any number of concurrent
/// readers. The slot retains the latest frame even while nobody is
/// subscribed, so a late-joining session starts from the current image
/// instead of waiting for the next one.
#[derive(Debug)]
pub struct FrameSlot {
    tx: watch::Sender<Option<Frame>>,
}

impl FrameSlot {
    /// Create an empty slot (version 0, no frame)
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// Publish a new frame, waking every waiting receiver
    ///
    /// Atomically replaces the current frame, bumps the version by exactly
    /// one and notifies all waiters. Returns the version assigned to this
    /// frame. The superseded frame's storage is released as soon as the last
    /// in-flight reference to it drops.
    pub fn publish(&self, payload: Bytes) -> u64 {
        let mut version = 0;
        self.tx.send_modify(|current| {
            version = current.as_ref().map_or(0, |frame| frame.version) + 1;
            *current = Some(Frame { payload, version });
        });
        tracing::trace!(version = version, "Frame published");
        version
    }

    /// Create a receiver for waiting on new frames
    pub fn subscribe(&self) -> FrameReceiver {
        FrameReceiver {
            rx: self.tx.subscribe(),
        }
    }

    /// Publish-only handle for handing to a video source
    pub fn sink(self: &Arc<Self>) -> FrameSink {
        FrameSink {
            slot: Arc::clone(self),
        }
    }

    /// Snapshot of the current frame, if any
    pub fn current(&self) -> Option<Frame> {
        self.tx.borrow().clone()
    }

    /// Version of the current frame (0 while the slot is empty)
    pub fn version(&self) -> u64 {
        self.tx.borrow().as_ref().map_or(0, |frame| frame.version)
    }

    /// Number of live receivers (streaming sessions)
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`FrameSlot`]
///
/// Each session owns one receiver and tracks the last version it emitted;
/// the slot itself never tracks per-reader progress.
#[derive(Debug)]
pub struct FrameReceiver {
    rx: watch::Receiver<Option<Frame>>,
}

impl FrameReceiver {
    /// Wait until the slot holds a frame newer than `since`, then return it
    ///
    /// `None` accepts whatever frame is current, or the first one published
    /// if the slot is still empty. The returned payload and version are a
    /// consistent snapshot, and the version is always strictly greater than
    /// `since`; the predicate is re-checked after every wake.
    ///
    /// Cancel safe: dropping the future loses nothing, the next call
    /// re-examines the slot. If the `FrameSlot` has been dropped, a current
    /// frame this receiver has not yet taken is still returned; after that
    /// the call errors with [`SlotClosed`].
    pub async fn next_frame(&mut self, since: Option<u64>) -> Result<Frame, SlotClosed> {
        loop {
            {
                let current = self.rx.borrow_and_update();
                if let Some(frame) = current.as_ref() {
                    if since.map_or(true, |version| frame.version > version) {
                        return Ok(frame.clone());
                    }
                }
            }
            self.rx.changed().await.map_err(|_| SlotClosed)?;
        }
    }
}

/// Publish-only handle handed to a video source
///
/// Cloneable and cheap; keeps the subscribe/inspect surface of the slot out
/// of producer hands.
#[derive(Debug, Clone)]
pub struct FrameSink {
    slot: Arc<FrameSlot>,
}

impl FrameSink {
    /// Publish one encoded frame; returns the assigned version
    pub fn publish(&self, payload: Bytes) -> u64 {
        self.slot.publish(payload)
    }
}

/// Error returned by [`FrameReceiver::next_frame`] once the slot is gone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotClosed;

impl fmt::Display for SlotClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame slot closed")
    }
}

impl std::error::Error for SlotClosed {}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;
    use tokio_test::{assert_pending, assert_ready};

    use super::*;

    fn payload(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn test_publish_increments_version_by_one() {
        let slot = FrameSlot::new();
        assert_eq!(slot.version(), 0);
        assert!(slot.current().is_none());

        assert_eq!(slot.publish(payload("F1")), 1);
        assert_eq!(slot.publish(payload("F2")), 2);

        assert_eq!(slot.version(), 2);
        assert_eq!(slot.current().unwrap().payload, payload("F2"));
    }

    #[test]
    fn test_empty_slot_blocks_until_first_publish() {
        let slot = FrameSlot::new();
        let mut rx = slot.subscribe();

        let mut wait = tokio_test::task::spawn(rx.next_frame(None));
        assert_pending!(wait.poll());

        slot.publish(payload("F1"));

        assert!(wait.is_woken());
        let frame = assert_ready!(wait.poll()).unwrap();
        assert_eq!(frame.version, 1);
        assert_eq!(frame.payload, payload("F1"));
    }

    #[test]
    fn test_first_wait_yields_current_frame() {
        let slot = FrameSlot::new();
        slot.publish(payload("F1"));

        // A session that subscribes after the publish still starts from the
        // frame that is already there.
        let mut rx = slot.subscribe();
        let mut wait = tokio_test::task::spawn(rx.next_frame(None));
        let frame = assert_ready!(wait.poll()).unwrap();
        assert_eq!(frame.version, 1);
        assert_eq!(frame.payload, payload("F1"));
    }

    #[test]
    fn test_never_returns_version_at_or_below_since() {
        let slot = FrameSlot::new();
        slot.publish(payload("F1"));

        let mut rx = slot.subscribe();
        let mut wait = tokio_test::task::spawn(rx.next_frame(Some(1)));
        assert_pending!(wait.poll());

        slot.publish(payload("F2"));

        assert!(wait.is_woken());
        let frame = assert_ready!(wait.poll()).unwrap();
        assert_eq!(frame.version, 2);
        assert_eq!(frame.payload, payload("F2"));
    }

    #[test]
    fn test_latest_wins_coalescing() {
        let slot = FrameSlot::new();
        let mut rx = slot.subscribe();

        // Five publishes while the reader is away: only the newest survives.
        for i in 1..=5 {
            slot.publish(payload(&format!("F{}", i)));
        }

        let mut wait = tokio_test::task::spawn(rx.next_frame(None));
        let frame = assert_ready!(wait.poll()).unwrap();
        assert_eq!(frame.version, 5);
        assert_eq!(frame.payload, payload("F5"));
        drop(wait);

        // Nothing queued behind it.
        let mut wait = tokio_test::task::spawn(rx.next_frame(Some(5)));
        assert_pending!(wait.poll());
    }

    #[test]
    fn test_frames_delivered_in_order_exactly_once() {
        let slot = FrameSlot::new();
        let mut rx = slot.subscribe();
        let mut last_seen = None;

        slot.publish(payload("F1"));
        let mut wait = tokio_test::task::spawn(rx.next_frame(last_seen));
        let frame = assert_ready!(wait.poll()).unwrap();
        drop(wait);
        assert_eq!(frame.payload, payload("F1"));
        last_seen = Some(frame.version);

        slot.publish(payload("F2"));
        let mut wait = tokio_test::task::spawn(rx.next_frame(last_seen));
        let frame = assert_ready!(wait.poll()).unwrap();
        drop(wait);
        assert_eq!(frame.payload, payload("F2"));
        assert_eq!(frame.version, 2);
        last_seen = Some(frame.version);

        // Each frame exactly once: nothing further to deliver.
        let mut wait = tokio_test::task::spawn(rx.next_frame(last_seen));
        assert_pending!(wait.poll());
    }

    #[test]
    fn test_publish_wakes_every_waiter() {
        let slot = FrameSlot::new();
        let mut rx_a = slot.subscribe();
        let mut rx_b = slot.subscribe();

        let mut wait_a = tokio_test::task::spawn(rx_a.next_frame(None));
        let mut wait_b = tokio_test::task::spawn(rx_b.next_frame(None));
        assert_pending!(wait_a.poll());
        assert_pending!(wait_b.poll());

        slot.publish(payload("F1"));

        assert!(wait_a.is_woken());
        assert!(wait_b.is_woken());
        let frame_a = assert_ready!(wait_a.poll()).unwrap();
        let frame_b = assert_ready!(wait_b.poll()).unwrap();
        assert_eq!(frame_a.version, 1);
        assert_eq!(frame_b.version, 1);
        assert_eq!(frame_a.payload, frame_b.payload);
        drop(wait_a);
        drop(wait_b);

        // Both block again afterwards.
        let mut wait_a = tokio_test::task::spawn(rx_a.next_frame(Some(1)));
        let mut wait_b = tokio_test::task::spawn(rx_b.next_frame(Some(1)));
        assert_pending!(wait_a.poll());
        assert_pending!(wait_b.poll());
    }

    #[tokio::test]
    async fn test_no_lost_wakeup_under_concurrent_publish() {
        let slot = Arc::new(FrameSlot::new());

        // A waiter that enters the wait before (or while) the publish runs
        // must come back with the new frame, whatever the interleaving.
        for round in 0..100u64 {
            let mut rx = slot.subscribe();
            let since = Some(slot.version());
            let waiter = tokio::spawn(async move { rx.next_frame(since).await });

            let publisher = {
                let slot = Arc::clone(&slot);
                tokio::spawn(async move { slot.publish(Bytes::from_static(b"frame")) })
            };

            let frame = timeout(Duration::from_secs(1), waiter)
                .await
                .expect("wait must not hang past the publish")
                .unwrap()
                .unwrap();
            assert_eq!(frame.version, round + 1);
            publisher.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_versions_strictly_increase_and_match_payloads() {
        let slot = Arc::new(FrameSlot::new());
        let mut rx = slot.subscribe();

        let reader = tokio::spawn(async move {
            let mut last_seen = None;
            let mut observed = Vec::new();
            loop {
                let frame = rx.next_frame(last_seen).await.unwrap();
                // Payload and version must come from the same publish.
                assert_eq!(frame.payload, Bytes::from(format!("frame-{}", frame.version)));
                observed.push(frame.version);
                last_seen = Some(frame.version);
                if frame.version >= 200 {
                    break;
                }
            }
            observed
        });

        for version in 1..=200u64 {
            slot.publish(Bytes::from(format!("frame-{}", version)));
            if version % 7 == 0 {
                tokio::task::yield_now().await;
            }
        }

        let observed = timeout(Duration::from_secs(5), reader)
            .await
            .expect("reader must reach the final frame")
            .unwrap();
        assert_eq!(*observed.last().unwrap(), 200);
        for pair in observed.windows(2) {
            assert!(pair[1] > pair[0], "versions must strictly increase");
        }
    }

    #[test]
    fn test_dropped_slot_still_delivers_final_frame() {
        let slot = FrameSlot::new();
        slot.publish(payload("F1"));
        let mut rx = slot.subscribe();
        drop(slot);

        let mut wait = tokio_test::task::spawn(rx.next_frame(None));
        let frame = assert_ready!(wait.poll()).unwrap();
        assert_eq!(frame.version, 1);
        drop(wait);

        let mut wait = tokio_test::task::spawn(rx.next_frame(Some(1)));
        assert!(matches!(assert_ready!(wait.poll()), Err(SlotClosed)));
    }

    #[test]
    fn test_dropped_empty_slot_errors_waiter() {
        let slot = FrameSlot::new();
        let mut rx = slot.subscribe();
        drop(slot);

        let mut wait = tokio_test::task::spawn(rx.next_frame(None));
        assert!(matches!(assert_ready!(wait.poll()), Err(SlotClosed)));
    }

    #[test]
    fn test_receiver_count_tracks_subscribers() {
        let slot = FrameSlot::new();
        assert_eq!(slot.receiver_count(), 0);

        let rx_a = slot.subscribe();
        let rx_b = slot.subscribe();
        assert_eq!(slot.receiver_count(), 2);

        drop(rx_a);
        drop(rx_b);
        assert_eq!(slot.receiver_count(), 0);
    }

    #[test]
    fn test_sink_publishes_to_slot() {
        let slot = Arc::new(FrameSlot::new());
        let sink = slot.sink();
        let other = sink.clone();

        assert_eq!(sink.publish(payload("F1")), 1);
        assert_eq!(other.publish(payload("F2")), 2);
        assert_eq!(slot.version(), 2);
    }

    #[test]
    fn test_publish_with_no_receivers_is_kept() {
        let slot = FrameSlot::new();
        slot.publish(payload("F1"));
        assert_eq!(slot.receiver_count(), 0);

        // The frame is retained for whoever subscribes later.
        let mut rx = slot.subscribe();
        let mut wait = tokio_test::task::spawn(rx.next_frame(None));
        let frame = assert_ready!(wait.poll()).unwrap();
        assert_eq!(frame.payload, payload("F1"));
    }
}
