//! Tracking fault recovery
//!
//! Every session failure restarts the session. An alignment-incompatible
//! failure first falls back to gravity-only world alignment; every other
//! cause restarts with the configuration unchanged. [`RestartMonitor`]
//! counts restarts in a rolling window so restart loops show up in the log.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::core::config::{SessionConfiguration, WorldAlignment};
use crate::tracking::session::TrackingFailure;

/// What to do before restarting after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// World alignment was changed; restart with the new configuration
    Reconfigured { from: WorldAlignment, to: WorldAlignment },
    /// Restart with the configuration as it is
    RestartUnchanged,
}

/// Decide the recovery for `cause`, updating `configuration` in place
pub fn plan_recovery(cause: &TrackingFailure, configuration: &mut SessionConfiguration) -> RecoveryAction {
    if cause.is_alignment_incompatible() {
        let from = configuration.world_alignment;
        configuration.world_alignment = WorldAlignment::Gravity;
        RecoveryAction::Reconfigured { from, to: WorldAlignment::Gravity }
    } else {
        RecoveryAction::RestartUnchanged
    }
}

/// Restart counts at the time of one restart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartRecord {
    /// Restarts inside the rolling window, including this one
    pub recent: usize,
    /// Restarts since creation
    pub total: u64,
    /// Whether `recent` reached the warning threshold
    pub threshold_reached: bool,
}

/// Rolling-window restart counter
#[derive(Debug, Clone)]
pub struct RestartMonitor {
    window: Duration,
    threshold: u32,
    recent: VecDeque<Instant>,
    total: u64,
}

impl RestartMonitor {
    /// One-minute window
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

    /// Monitor with the default one-minute window
    pub fn new(threshold: u32) -> Self {
        Self::with_window(threshold, Self::DEFAULT_WINDOW)
    }

    /// Monitor with a custom window
    pub fn with_window(threshold: u32, window: Duration) -> Self {
        Self {
            window,
            threshold,
            recent: VecDeque::new(),
            total: 0,
        }
    }

    /// Record a restart now
    pub fn record(&mut self) -> RestartRecord {
        self.record_at(Instant::now())
    }

    /// Record a restart at `now`
    pub fn record_at(&mut self, now: Instant) -> RestartRecord {
        while let Some(&oldest) = self.recent.front() {
            if now.saturating_duration_since(oldest) > self.window {
                self.recent.pop_front();
            } else {
                break;
            }
        }
        self.recent.push_back(now);
        self.total += 1;

        let recent = self.recent.len();
        let threshold_reached = self.threshold > 0 && recent >= self.threshold as usize;
        if threshold_reached {
            log::error!(
                "Tracking session restarted {} times in the last {}s ({} total); possible restart loop",
                recent, self.window.as_secs(), self.total
            );
        }
        RestartRecord { recent, total: self.total, threshold_reached }
    }

    /// Restarts recorded over the monitor's lifetime
    pub fn total(&self) -> u64 {
        self.total
    }
}
