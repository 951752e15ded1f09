//! Fan-out of unsolicited frames to every live connection.

use easel_protocol::{BroadcastFrame, BroadcastType, FrameError};
use tracing::{debug, warn};

use super::{ConnectionId, ConnectionSet, LISTENER_TARGET};

/// Outcome of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections that received the frame.
    pub delivered: usize,
    /// Connections whose write failed.
    pub failed: Vec<ConnectionId>,
}

impl BroadcastReport {
    /// Returns `true` when every write succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl ConnectionSet {
    /// Sends a broadcast frame to every live connection.
    ///
    /// The frame is encoded once and written to each connection in turn
    /// while the set is locked, so the recipients are exactly the
    /// connections live when the broadcast began. A failed write is logged
    /// and does not stop delivery to the others; the failing connection is
    /// left to its own read loop to clean up.
    ///
    /// # Errors
    ///
    /// Fails only when the payload cannot be encoded.
    pub fn broadcast(
        &self,
        broadcast_type: BroadcastType,
        payload: Vec<u8>,
    ) -> Result<BroadcastReport, FrameError> {
        let bytes = BroadcastFrame::new(broadcast_type, payload).encode()?;
        let mut report = BroadcastReport::default();
        let live = self.live();
        for connection in live.values() {
            match connection.send(&bytes) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    warn!(
                        target: LISTENER_TARGET,
                        connection = %connection.id(),
                        broadcast_type = %broadcast_type,
                        error = %error,
                        "broadcast write failed"
                    );
                    report.failed.push(connection.id());
                }
            }
        }
        drop(live);
        debug!(
            target: LISTENER_TARGET,
            broadcast_type = %broadcast_type,
            delivered = report.delivered,
            failed = report.failed.len(),
            "broadcast sent"
        );
        Ok(report)
    }
}
