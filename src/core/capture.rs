//! Edge capture buffer
//!
//! Ordered record of rising/falling edge timestamps accumulated during one
//! receive window. The edge notifier records through an [`EdgeSink`] while
//! it is attached; after detach the capture is drained exactly once by the
//! decoder. Single producer, single consumer, no concurrent reads during
//! capture.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;

/// Direction of an observed line transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    /// Low-to-high transition.
    Rising,
    /// High-to-low transition.
    Falling,
}

/// One timestamped transition observed on the receive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Microsecond timestamp of the transition.
    pub timestamp_us: u32,
    /// Transition direction.
    pub direction: EdgeDirection,
}

/// Recording handle handed to the edge notifier.
#[derive(Debug, Clone)]
pub struct EdgeSink {
    tx: Sender<EdgeEvent>,
}

impl EdgeSink {
    /// Record one edge. Never blocks: an edge past the capture bound is
    /// dropped with a warning, and an edge recorded after the capture was
    /// discarded is ignored.
    pub fn record(&self, timestamp_us: u32, direction: EdgeDirection) {
        match self.tx.try_send(EdgeEvent {
            timestamp_us,
            direction,
        }) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(timestamp_us = event.timestamp_us, "edge capture full, dropping edge");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// Append-only record of edges for one receive window.
///
/// Created empty at the start of a read transaction, populated solely by
/// the notifier through [`EdgeSink::record`], then handed once to the
/// decoder via [`EdgeCapture::finish`].
#[derive(Debug)]
pub struct EdgeCapture {
    tx: Sender<EdgeEvent>,
    rx: Receiver<EdgeEvent>,
}

impl EdgeCapture {
    /// Default capture bound. A maximal frame is 2 * (10 + 64) pulses, so
    /// this leaves plenty of headroom for noise edges.
    pub const DEFAULT_CAPACITY: usize = 256;

    /// Create an empty capture with the default bound.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create an empty capture bounded to `capacity` edges.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// Handle for the notifier side.
    pub fn sink(&self) -> EdgeSink {
        EdgeSink {
            tx: self.tx.clone(),
        }
    }

    /// Drain the capture into ordered rising and falling timestamp
    /// sequences. Call only after the notifier has been detached; edges
    /// recorded through a surviving sink after this point go nowhere.
    pub fn finish(self) -> (Vec<u32>, Vec<u32>) {
        drop(self.tx);
        let mut rising = Vec::new();
        let mut falling = Vec::new();
        for event in self.rx.try_iter() {
            match event.direction {
                EdgeDirection::Rising => rising.push(event.timestamp_us),
                EdgeDirection::Falling => falling.push(event.timestamp_us),
            }
        }
        (rising, falling)
    }
}

impl Default for EdgeCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_finish_preserve_order() {
        let capture = EdgeCapture::new();
        let sink = capture.sink();

        sink.record(100, EdgeDirection::Rising);
        sink.record(300, EdgeDirection::Falling);
        sink.record(400, EdgeDirection::Rising);
        sink.record(500, EdgeDirection::Falling);

        let (rising, falling) = capture.finish();
        assert_eq!(rising, vec![100, 400]);
        assert_eq!(falling, vec![300, 500]);
    }

    #[test]
    fn test_empty_capture_finishes_empty() {
        let capture = EdgeCapture::new();
        let (rising, falling) = capture.finish();
        assert!(rising.is_empty());
        assert!(falling.is_empty());
    }

    #[test]
    fn test_overflow_drops_instead_of_blocking() {
        let capture = EdgeCapture::with_capacity(2);
        let sink = capture.sink();

        sink.record(1, EdgeDirection::Rising);
        sink.record(2, EdgeDirection::Falling);
        sink.record(3, EdgeDirection::Rising); // over the bound

        let (rising, falling) = capture.finish();
        assert_eq!(rising, vec![1]);
        assert_eq!(falling, vec![2]);
    }

    #[test]
    fn test_record_after_finish_is_ignored() {
        let capture = EdgeCapture::new();
        let sink = capture.sink();
        drop(capture);
        // Must not panic or block.
        sink.record(42, EdgeDirection::Rising);
    }
}
