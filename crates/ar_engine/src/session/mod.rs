//! AR session lifecycle: orchestration and fault recovery

pub mod faults;
pub mod renderer;

pub use faults::{plan_recovery, RecoveryAction, RestartMonitor, RestartRecord};
pub use renderer::{ArRenderer, TickReport};
