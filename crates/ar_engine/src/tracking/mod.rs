//! Tracking service boundary
//!
//! Value types for frame snapshots, the [`TrackingSession`] /
//! [`SessionObserver`] interfaces, the per-tick [`FrameConsumer`] and a
//! [`SimulatedSession`] that runs without a device.

pub mod consumer;
pub mod frame;
pub mod session;
pub mod simulated;

pub use consumer::{ConsumedFrame, FrameConsumer};
pub use frame::{
    CameraIntrinsics, FrameSnapshot, ImagePlane, PlanarImage, PlaneFormat, TrackedCamera,
    TrackingState,
};
pub use session::{
    dispatch, AnchorId, PlaneAlignment, RaycastHit, RaycastQuery, RaycastTarget, SessionEvent,
    SessionObserver, TrackingFailure, TrackingSession,
};
pub use simulated::{DetectedPlane, SimulatedSession};
