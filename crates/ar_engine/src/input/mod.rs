//! Touch input and content placement

pub mod placement;
pub mod touch;

pub use placement::{IgnoreReason, PlacementOutcome, PlacementResolver, PlacementState};
pub use touch::{normalize_point, TouchOrigin, TouchPoint};
