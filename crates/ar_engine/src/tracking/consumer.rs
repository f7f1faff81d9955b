//! Frame snapshot consumer
//!
//! The tracking service captures at its own cadence; the render tick polls
//! whatever snapshot is current. Each snapshot is reported as new at most
//! once, and snapshots captured between two polls are counted as dropped.

use std::sync::Arc;

use super::frame::FrameSnapshot;
use super::session::TrackingSession;

/// Snapshot handed to one tick
#[derive(Debug, Clone)]
pub struct ConsumedFrame {
    /// The current snapshot, owned by the tick
    pub frame: Arc<FrameSnapshot>,
    /// False when the same snapshot was already seen by an earlier tick
    pub is_new: bool,
}

/// Tracks which snapshots the render tick has already consumed
#[derive(Debug, Default)]
pub struct FrameConsumer {
    last_sequence: Option<u64>,
    frames_consumed: u64,
    frames_dropped: u64,
}

impl FrameConsumer {
    /// Create a consumer that has not seen any frame yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Poll the session for its current snapshot
    ///
    /// Returns `None` when the session has no frame yet; that tick simply
    /// skips frame-dependent work.
    pub fn poll<S: TrackingSession + ?Sized>(&mut self, session: &S) -> Option<ConsumedFrame> {
        let frame = session.current_frame()?;
        let is_new = self.last_sequence != Some(frame.sequence);

        if is_new {
            if let Some(last) = self.last_sequence {
                let skipped = frame.sequence.saturating_sub(last).saturating_sub(1);
                if skipped > 0 {
                    log::trace!("Skipped {} camera frames between ticks", skipped);
                    self.frames_dropped += skipped;
                }
            }
            self.last_sequence = Some(frame.sequence);
            self.frames_consumed += 1;
        }

        Some(ConsumedFrame { frame, is_new })
    }

    /// Whether at least one frame has been consumed
    pub fn has_consumed_frame(&self) -> bool {
        self.frames_consumed > 0
    }

    /// Distinct frames consumed so far
    pub fn frames_consumed(&self) -> u64 {
        self.frames_consumed
    }

    /// Frames captured but never seen by a tick
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    /// Forget the last seen sequence (after a session restart the service may reuse numbers)
    pub fn reset(&mut self) {
        self.last_sequence = None;
    }
}
