//! Touch-to-placement resolution
//!
//! A single-finger touch casts a ray through the camera against detected
//! horizontal plane geometry. On the nearest hit the content container is
//! moved to the hit pose, an anchor is created at the world origin and the
//! scene root is bound to that anchor, so later anchor refinements carry the
//! content along.
//!
//! State machine: `Idle -> AwaitingHit -> Placed`. A miss returns to the
//! previous resting state, and touches with more than one finger are
//! ignored.

use crate::foundation::math::{Mat4, Vec2};
use crate::render::camera::Camera;
use crate::scene::ar_scene::ArScene;
use crate::tracking::session::{AnchorId, PlaneAlignment, RaycastHit, RaycastQuery, RaycastTarget, TrackingSession};

use super::touch::{normalize_point, TouchOrigin, TouchPoint};

/// Placement state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementState {
    /// No placement gesture in flight and nothing placed
    #[default]
    Idle,
    /// A hit-test is being resolved
    AwaitingHit,
    /// Content is placed and bound to an anchor
    Placed,
}

/// Why a touch did not start a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not exactly one active touch
    TouchCount(usize),
    /// The tracking session is not running
    SessionNotRunning,
    /// The touch could not be turned into a ray
    NoRay,
}

/// Result of one touch-began event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    /// The event was not a placement gesture
    Ignored(IgnoreReason),
    /// The hit-test returned nothing
    NoHit,
    /// Content was placed
    Placed {
        /// Anchor created at the hit
        anchor: AnchorId,
        /// The first hit of the raycast
        hit: RaycastHit,
        /// Anchor of the previous placement, now removed
        replaced: Option<AnchorId>,
    },
}

/// Resolves touches into anchored placements
#[derive(Debug, Default)]
pub struct PlacementResolver {
    state: PlacementState,
    origin: TouchOrigin,
    placements: u32,
}

impl PlacementResolver {
    /// Idle resolver for touches reported with `origin`
    pub fn new(origin: TouchOrigin) -> Self {
        Self { origin, ..Self::default() }
    }

    /// Current state
    pub fn state(&self) -> PlacementState {
        self.state
    }

    /// Coordinate origin touches are reported in
    pub fn origin(&self) -> TouchOrigin {
        self.origin
    }

    /// Successful placements so far
    pub fn placements(&self) -> u32 {
        self.placements
    }

    /// Handle a touch-began event carrying every active touch
    pub fn touches_began<S: TrackingSession + ?Sized>(
        &mut self,
        touches: &[TouchPoint],
        view_size: Vec2,
        camera: &Camera,
        session: &mut S,
        scene: &mut ArScene,
    ) -> PlacementOutcome {
        let [touch] = touches else {
            log::debug!("Ignoring touch event with {} touches", touches.len());
            return PlacementOutcome::Ignored(IgnoreReason::TouchCount(touches.len()));
        };
        let Some(ndc) = normalize_point(touch.location, view_size, self.origin) else {
            return PlacementOutcome::Ignored(IgnoreReason::NoRay);
        };
        self.place_at(ndc, camera, session, scene)
    }

    /// Resolve a placement at a normalized device coordinate (y up)
    pub fn place_at<S: TrackingSession + ?Sized>(
        &mut self,
        ndc: Vec2,
        camera: &Camera,
        session: &mut S,
        scene: &mut ArScene,
    ) -> PlacementOutcome {
        if !session.is_running() {
            return PlacementOutcome::Ignored(IgnoreReason::SessionNotRunning);
        }
        let Some(ray) = camera.screen_to_world_ray(ndc) else {
            return PlacementOutcome::Ignored(IgnoreReason::NoRay);
        };

        let resting = self.resting_state(scene);
        self.state = PlacementState::AwaitingHit;

        let query = RaycastQuery::from_ray(&ray, RaycastTarget::ExistingPlaneGeometry, PlaneAlignment::Horizontal);
        let Some(hit) = session.raycast(&query).into_iter().next() else {
            log::debug!("Placement ray at ({:.3}, {:.3}) hit nothing", ndc.x, ndc.y);
            self.state = resting;
            return PlacementOutcome::NoHit;
        };

        let anchor = session.add_anchor(Mat4::identity());
        scene.place_content(hit.world_transform);
        let replaced = scene
            .bind_to_anchor(anchor, scene.root())
            .map(|previous| previous.anchor);
        if let Some(previous) = replaced {
            session.remove_anchor(previous);
        }

        self.state = PlacementState::Placed;
        self.placements += 1;
        log::info!("Content placed {:.2} m from camera (placement {})", hit.distance, self.placements);

        PlacementOutcome::Placed { anchor, hit, replaced }
    }

    fn resting_state(&self, scene: &ArScene) -> PlacementState {
        if scene.binding().is_some() {
            PlacementState::Placed
        } else {
            PlacementState::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SessionConfiguration;
    use crate::foundation::math::Vec3;
    use crate::render::camera::update_pose;
    use crate::render::display::InterfaceOrientation;
    use crate::tracking::simulated::SimulatedSession;
    use approx::assert_relative_eq;
    use ash::vk;

    fn setup() -> (SimulatedSession, Camera, ArScene) {
        let mut session = SimulatedSession::new();
        session.run(&SessionConfiguration::default());
        session.capture_frame();
        let frame = session.current_frame().unwrap();
        let pose = update_pose(
            &frame.camera,
            Some(InterfaceOrientation::Portrait),
            vk::Extent2D { width: 1170, height: 2532 },
            0.01,
            100.0,
        )
        .unwrap();
        let mut camera = Camera::default();
        camera.apply_pose(pose);
        (session, camera, ArScene::build())
    }

    #[test]
    fn test_center_touch_places_at_floor_origin() {
        let (mut session, camera, mut scene) = setup();
        let mut resolver = PlacementResolver::new(TouchOrigin::TopLeft);
        let view = Vec2::new(390.0, 844.0);

        let outcome = resolver.touches_began(&[TouchPoint::new(1, 195.0, 422.0)], view, &camera, &mut session, &mut scene);
        let PlacementOutcome::Placed { anchor, hit, replaced } = outcome else {
            panic!("expected placement, got {:?}", outcome);
        };
        assert!(replaced.is_none());
        assert_eq!(resolver.state(), PlacementState::Placed);
        assert_eq!(scene.content_transform().unwrap(), hit.world_transform);
        assert_relative_eq!(hit.world_transform, Mat4::identity(), epsilon = 1e-4);
        assert!(scene.is_content_visible());
        assert_eq!(scene.binding().unwrap().anchor, anchor);
        assert_eq!(session.anchor_transform(anchor), Some(Mat4::identity()));
    }

    #[test]
    fn test_multi_touch_never_places() {
        let (mut session, camera, mut scene) = setup();
        let mut resolver = PlacementResolver::default();
        let touches = [TouchPoint::new(1, 195.0, 422.0), TouchPoint::new(2, 200.0, 430.0)];
        let outcome = resolver.touches_began(&touches, Vec2::new(390.0, 844.0), &camera, &mut session, &mut scene);
        assert_eq!(outcome, PlacementOutcome::Ignored(IgnoreReason::TouchCount(2)));
        assert_eq!(resolver.state(), PlacementState::Idle);
        assert_eq!(session.anchor_count(), 0);
        assert!(!scene.is_content_visible());
    }

    fn sky_camera() -> Camera {
        let mut camera = Camera::default();
        camera.position = Vec3::new(0.0, 1.0, 0.0);
        camera.target = Vec3::new(0.0, 2.0, -1.0);
        camera
    }

    #[test]
    fn test_miss_returns_to_idle() {
        let (mut session, _, mut scene) = setup();
        let mut resolver = PlacementResolver::default();
        let outcome = resolver.place_at(Vec2::zeros(), &sky_camera(), &mut session, &mut scene);
        assert_eq!(outcome, PlacementOutcome::NoHit);
        assert_eq!(resolver.state(), PlacementState::Idle);
        assert!(scene.binding().is_none());
    }

    #[test]
    fn test_second_placement_replaces_anchor() {
        let (mut session, camera, mut scene) = setup();
        let mut resolver = PlacementResolver::default();
        let first = resolver.place_at(Vec2::zeros(), &camera, &mut session, &mut scene);
        let PlacementOutcome::Placed { anchor: first_anchor, .. } = first else {
            panic!("first placement failed: {:?}", first);
        };

        let second = resolver.place_at(Vec2::new(0.1, -0.1), &camera, &mut session, &mut scene);
        let PlacementOutcome::Placed { replaced, hit, .. } = second else {
            panic!("second placement failed: {:?}", second);
        };
        assert_eq!(replaced, Some(first_anchor));
        assert_eq!(session.anchor_count(), 1);
        assert_eq!(scene.content_transform().unwrap(), hit.world_transform);

        // A miss afterwards keeps the placement.
        let miss = resolver.place_at(Vec2::zeros(), &sky_camera(), &mut session, &mut scene);
        assert_eq!(miss, PlacementOutcome::NoHit);
        assert_eq!(resolver.state(), PlacementState::Placed);
    }

    #[test]
    fn test_stopped_session_is_not_ray_castable() {
        let (mut session, camera, mut scene) = setup();
        session.pause();
        let mut resolver = PlacementResolver::default();
        let outcome = resolver.place_at(Vec2::zeros(), &camera, &mut session, &mut scene);
        assert_eq!(outcome, PlacementOutcome::Ignored(IgnoreReason::SessionNotRunning));
    }
}
