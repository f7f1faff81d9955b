//! Tracking service interface
//!
//! The tracking service (pose estimation, plane detection, anchors,
//! hit-testing) is an external collaborator. [`TrackingSession`] is the
//! narrow surface the renderer consumes; [`SessionObserver`] is the
//! per-event callback interface the renderer implements.
//!
//! Callbacks are not invoked re-entrantly from inside session methods.
//! Sessions queue [`SessionEvent`]s and the owner drains them with
//! [`TrackingSession::drain_events`] on its own serialized queue, then
//! hands each one to [`dispatch`].

use std::sync::Arc;

use slotmap::new_key_type;
use thiserror::Error;

use crate::core::config::SessionConfiguration;
use crate::foundation::math::{Mat4, Vec3};
use crate::physics::Ray;

use super::frame::{FrameSnapshot, TrackingState};

new_key_type! {
    /// Identifier of an anchor registered with a tracking session
    pub struct AnchorId;
}

/// Which detected geometry a raycast may hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaycastTarget {
    /// Only planes the session has already detected, clipped to their extent
    ExistingPlaneGeometry,
    /// Detected planes extended to infinity
    ExistingPlaneInfinite,
}

/// Orientation of the planes a raycast may hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneAlignment {
    /// Horizontal planes only
    Horizontal,
    /// Vertical planes only
    Vertical,
    /// Any plane
    Any,
}

/// A raycast request against detected geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastQuery {
    /// Ray origin in world space
    pub origin: Vec3,
    /// Ray direction in world space (normalized)
    pub direction: Vec3,
    /// Geometry the ray may hit
    pub target: RaycastTarget,
    /// Plane orientation filter
    pub alignment: PlaneAlignment,
}

impl RaycastQuery {
    /// Build a query from a world-space ray
    pub fn from_ray(ray: &Ray, target: RaycastTarget, alignment: PlaneAlignment) -> Self {
        Self {
            origin: ray.origin,
            direction: ray.direction,
            target,
            alignment,
        }
    }
}

/// One raycast intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Pose of the intersection: translation at the hit point, Y along the surface normal
    pub world_transform: Mat4,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Causes reported with a session failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingFailure {
    /// The requested world alignment cannot be honored (for example no heading available)
    #[error("world alignment is incompatible with the device state")]
    GravityAlignmentIncompatible,
    /// A required sensor is unavailable
    #[error("required sensor unavailable")]
    SensorUnavailable,
    /// A sensor stopped delivering data
    #[error("sensor failed")]
    SensorFailed,
    /// Camera permission was denied
    #[error("camera access not authorized")]
    CameraUnauthorized,
    /// World tracking lost its map
    #[error("world tracking failed")]
    WorldTrackingFailed,
    /// Any other cause reported by the service
    #[error("tracking failure: {0}")]
    Other(String),
}

impl TrackingFailure {
    /// Whether reconfiguring the world alignment is the known remedy
    pub const fn is_alignment_incompatible(&self) -> bool {
        matches!(self, Self::GravityAlignmentIncompatible)
    }
}

/// Notifications queued by a tracking session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session stopped with an error
    Failed(TrackingFailure),
    /// Capture was interrupted (for example by another app taking the camera)
    Interrupted,
    /// Capture resumed after an interruption
    InterruptionEnded,
    /// Anchors were registered
    AnchorsAdded(Vec<AnchorId>),
    /// Anchor poses were refined
    AnchorsUpdated(Vec<AnchorId>),
    /// Anchors were removed
    AnchorsRemoved(Vec<AnchorId>),
    /// Camera pose quality changed
    TrackingStateChanged(TrackingState),
}

/// External tracking service
pub trait TrackingSession {
    /// Whether world tracking is possible on this device
    fn is_supported(&self) -> bool;

    /// Start or restart tracking with the given configuration
    fn run(&mut self, configuration: &SessionConfiguration);

    /// Stop tracking; frames stop updating
    fn pause(&mut self);

    /// Whether the session is currently running
    fn is_running(&self) -> bool;

    /// Most recent frame, if any (non-blocking poll)
    fn current_frame(&self) -> Option<Arc<FrameSnapshot>>;

    /// Hit-test a ray against detected geometry; nearest hit first, empty when nothing is hit
    fn raycast(&self, query: &RaycastQuery) -> Vec<RaycastHit>;

    /// Register an anchor at a world transform
    fn add_anchor(&mut self, transform: Mat4) -> AnchorId;

    /// Remove an anchor; false if it was unknown
    fn remove_anchor(&mut self, anchor: AnchorId) -> bool;

    /// Current (possibly refined) world transform of an anchor
    fn anchor_transform(&self, anchor: AnchorId) -> Option<Mat4>;

    /// Take all queued notifications in delivery order
    fn drain_events(&mut self) -> Vec<SessionEvent>;
}

/// Per-event callbacks for session notifications
///
/// Everything except [`on_failure`](Self::on_failure) defaults to a no-op.
pub trait SessionObserver {
    /// The session failed
    fn on_failure(&mut self, cause: &TrackingFailure);

    /// Capture was interrupted
    fn on_interrupt(&mut self) {}

    /// Capture resumed
    fn on_interruption_ended(&mut self) {}

    /// Anchors were added
    fn on_anchors_added(&mut self, _anchors: &[AnchorId]) {}

    /// Anchors were refined
    fn on_anchors_updated(&mut self, _anchors: &[AnchorId]) {}

    /// Anchors were removed
    fn on_anchors_removed(&mut self, _anchors: &[AnchorId]) {}

    /// Pose quality changed
    fn on_tracking_state_changed(&mut self, _state: TrackingState) {}
}

/// Route one queued event to the matching observer method
pub fn dispatch<O: SessionObserver + ?Sized>(observer: &mut O, event: &SessionEvent) {
    match event {
        SessionEvent::Failed(cause) => observer.on_failure(cause),
        SessionEvent::Interrupted => observer.on_interrupt(),
        SessionEvent::InterruptionEnded => observer.on_interruption_ended(),
        SessionEvent::AnchorsAdded(anchors) => observer.on_anchors_added(anchors),
        SessionEvent::AnchorsUpdated(anchors) => observer.on_anchors_updated(anchors),
        SessionEvent::AnchorsRemoved(anchors) => observer.on_anchors_removed(anchors),
        SessionEvent::TrackingStateChanged(state) => observer.on_tracking_state_changed(*state),
    }
}
