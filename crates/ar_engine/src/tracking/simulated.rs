//! Deterministic in-process tracking session
//!
//! Stands in for a device tracking service in tests and in the headless
//! viewer. It captures frames at its own cadence independent of the render
//! tick, serves a synthetic bi-planar YCbCr image, hit-tests against a list
//! of detected planes, refines anchors with a configurable drift and can be
//! told to fail or be interrupted.

use std::sync::Arc;

use slotmap::SlotMap;

use crate::core::config::{PlaneDetection, SessionConfiguration};
use crate::foundation::math::{utils, Mat4, Vec3, Vec4};
use crate::physics::Ray;

use super::frame::{
    CameraIntrinsics, FrameSnapshot, ImagePlane, PlanarImage, PlaneFormat, TrackedCamera,
    TrackingState,
};
use super::session::{
    AnchorId, PlaneAlignment, RaycastHit, RaycastQuery, RaycastTarget, SessionEvent,
    TrackingFailure, TrackingSession,
};

/// A plane the simulated service has "detected"
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedPlane {
    /// Plane pose; local Y is the surface normal, local X/Z span the surface
    pub transform: Mat4,
    /// Half extents along local X and Z
    pub half_extents: (f32, f32),
    /// Orientation class
    pub alignment: PlaneAlignment,
}

impl DetectedPlane {
    /// Horizontal plane (normal +Y) centered at `center`
    pub fn horizontal(center: Vec3, half_x: f32, half_z: f32) -> Self {
        Self {
            transform: Mat4::new_translation(&center),
            half_extents: (half_x, half_z),
            alignment: PlaneAlignment::Horizontal,
        }
    }

    /// Vertical plane facing +Z (normal +Z) centered at `center`
    pub fn vertical(center: Vec3, half_width: f32, half_height: f32) -> Self {
        let rotation = Mat4::from_axis_angle(&Vec3::x_axis(), std::f32::consts::FRAC_PI_2);
        Self {
            transform: Mat4::new_translation(&center) * rotation,
            half_extents: (half_width, half_height),
            alignment: PlaneAlignment::Vertical,
        }
    }

    fn normal(&self) -> Vec3 {
        self.transform.transform_vector(&Vec3::y()).normalize()
    }

    fn detectable_with(&self, detection: PlaneDetection) -> bool {
        match self.alignment {
            PlaneAlignment::Horizontal => detection.contains(PlaneDetection::HORIZONTAL),
            PlaneAlignment::Vertical => detection.contains(PlaneDetection::VERTICAL),
            PlaneAlignment::Any => !detection.is_empty(),
        }
    }

    fn matches(&self, filter: PlaneAlignment) -> bool {
        filter == PlaneAlignment::Any || filter == self.alignment
    }

    fn contains_local(&self, world_point: Vec3) -> bool {
        let Some(inverse) = self.transform.try_inverse() else {
            return false;
        };
        let local = inverse * Vec4::new(world_point.x, world_point.y, world_point.z, 1.0);
        local.x.abs() <= self.half_extents.0 && local.z.abs() <= self.half_extents.1
    }

    fn hit(&self, ray: &Ray, target: RaycastTarget) -> Option<RaycastHit> {
        let distance = ray.intersect_plane(utils::translation_of(&self.transform), self.normal())?;
        let point = ray.point_at(distance);
        if target == RaycastTarget::ExistingPlaneGeometry && !self.contains_local(point) {
            return None;
        }

        let mut world_transform = self.transform;
        world_transform.m14 = point.x;
        world_transform.m24 = point.y;
        world_transform.m34 = point.z;
        Some(RaycastHit { world_transform, distance })
    }
}

/// Camera pose 1.5 m above and behind the origin, pitched 45 degrees down
///
/// Its optical axis passes through the world origin.
pub fn default_camera_pose() -> Mat4 {
    Mat4::new_translation(&Vec3::new(0.0, 1.5, 1.5))
        * Mat4::from_axis_angle(&Vec3::x_axis(), -std::f32::consts::FRAC_PI_4)
}

/// Simulated tracking session
#[derive(Debug)]
pub struct SimulatedSession {
    supported: bool,
    running: bool,
    configuration: Option<SessionConfiguration>,
    run_count: u32,
    camera: TrackedCamera,
    image: PlanarImage,
    sequence: u64,
    renumber_on_run: bool,
    clock: f64,
    capture_interval: f64,
    capture_accumulator: f64,
    current: Option<Arc<FrameSnapshot>>,
    planes: Vec<DetectedPlane>,
    anchors: SlotMap<AnchorId, Mat4>,
    anchor_drift: Vec3,
    events: Vec<SessionEvent>,
}

impl Default for SimulatedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSession {
    /// Session with a 640x480 sensor, 60 Hz capture and a 4 m x 4 m floor at the origin
    pub fn new() -> Self {
        let (width, height) = (640, 480);
        Self {
            supported: true,
            running: false,
            configuration: None,
            run_count: 0,
            camera: TrackedCamera {
                transform: default_camera_pose(),
                intrinsics: CameraIntrinsics::centered(width as f32 * 0.8, width, height),
                image_resolution: (width, height),
                tracking_state: TrackingState::NotAvailable,
            },
            image: synthetic_ycbcr(width, height),
            sequence: 0,
            renumber_on_run: false,
            clock: 0.0,
            capture_interval: 1.0 / 60.0,
            capture_accumulator: 0.0,
            current: None,
            planes: vec![DetectedPlane::horizontal(Vec3::zeros(), 2.0, 2.0)],
            anchors: SlotMap::with_key(),
            anchor_drift: Vec3::zeros(),
            events: Vec::new(),
        }
    }

    /// Report world tracking as unavailable on this "device"
    #[must_use]
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    /// Use a different sensor resolution (the synthetic image is regenerated)
    #[must_use]
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.camera.image_resolution = (width, height);
        self.camera.intrinsics = CameraIntrinsics::centered(width as f32 * 0.8, width, height);
        self.image = synthetic_ycbcr(width, height);
        self
    }

    /// Replace the detected planes
    #[must_use]
    pub fn with_planes(mut self, planes: Vec<DetectedPlane>) -> Self {
        self.planes = planes;
        self
    }

    /// Restart frame numbering from 1 on every `run` after the first
    #[must_use]
    pub fn renumbering_frames_on_run(mut self) -> Self {
        self.renumber_on_run = true;
        self
    }

    /// Capture rate of the simulated camera
    #[must_use]
    pub fn with_capture_rate(mut self, frames_per_second: f64) -> Self {
        self.capture_interval = 1.0 / frames_per_second.max(1.0);
        self
    }

    /// Replace the captured image (for example with fewer than two planes)
    pub fn set_captured_image(&mut self, image: PlanarImage) {
        self.image = image;
    }

    /// Move the camera
    pub fn set_camera_pose(&mut self, transform: Mat4) {
        self.camera.transform = transform;
    }

    /// Anchor refinement applied per second of [`advance`](Self::advance)
    pub fn set_anchor_drift(&mut self, drift_per_second: Vec3) {
        self.anchor_drift = drift_per_second;
    }

    /// Overwrite an anchor's pose as a refinement would
    pub fn refine_anchor(&mut self, anchor: AnchorId, transform: Mat4) -> bool {
        let Some(slot) = self.anchors.get_mut(anchor) else {
            return false;
        };
        *slot = transform;
        self.events.push(SessionEvent::AnchorsUpdated(vec![anchor]));
        true
    }

    /// Stop the session with a failure
    pub fn inject_failure(&mut self, cause: TrackingFailure) {
        log::debug!("Simulated session failing: {}", cause);
        self.running = false;
        self.events.push(SessionEvent::Failed(cause));
    }

    /// Simulate losing the camera to another client
    pub fn interrupt(&mut self) {
        self.events.push(SessionEvent::Interrupted);
    }

    /// Simulate regaining the camera
    pub fn end_interruption(&mut self) {
        self.events.push(SessionEvent::InterruptionEnded);
    }

    /// Configuration passed to the latest `run`
    pub fn configuration(&self) -> Option<&SessionConfiguration> {
        self.configuration.as_ref()
    }

    /// How many times `run` was called
    pub fn run_count(&self) -> u32 {
        self.run_count
    }

    /// Number of live anchors
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    /// Advance simulated time, capturing frames at the capture rate and refining anchors
    pub fn advance(&mut self, delta_seconds: f64) {
        if !self.running {
            return;
        }
        self.clock += delta_seconds;
        self.capture_accumulator += delta_seconds;
        while self.capture_accumulator >= self.capture_interval {
            self.capture_accumulator -= self.capture_interval;
            self.capture_frame();
        }

        if self.anchor_drift != Vec3::zeros() && !self.anchors.is_empty() {
            let offset = self.anchor_drift * delta_seconds as f32;
            let mut refined = Vec::with_capacity(self.anchors.len());
            for (id, transform) in &mut self.anchors {
                *transform = Mat4::new_translation(&offset) * *transform;
                refined.push(id);
            }
            self.events.push(SessionEvent::AnchorsUpdated(refined));
        }
    }

    /// Capture one frame immediately (no-op while stopped)
    pub fn capture_frame(&mut self) {
        if !self.running {
            return;
        }
        if self.camera.tracking_state != TrackingState::Normal {
            self.camera.tracking_state = TrackingState::Normal;
            self.events.push(SessionEvent::TrackingStateChanged(TrackingState::Normal));
        }
        self.sequence += 1;
        self.current = Some(Arc::new(FrameSnapshot {
            sequence: self.sequence,
            timestamp: self.clock,
            camera: self.camera.clone(),
            captured_image: self.image.clone(),
        }));
    }
}

impl TrackingSession for SimulatedSession {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn run(&mut self, configuration: &SessionConfiguration) {
        log::debug!(
            "Simulated session running (planes: {:?}, alignment: {:?})",
            configuration.plane_detection, configuration.world_alignment
        );
        if self.renumber_on_run && self.run_count > 0 {
            self.sequence = 0;
            self.current = None;
        }
        self.configuration = Some(configuration.clone());
        self.running = true;
        self.run_count += 1;
    }

    fn pause(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn current_frame(&self) -> Option<Arc<FrameSnapshot>> {
        self.current.clone()
    }

    fn raycast(&self, query: &RaycastQuery) -> Vec<RaycastHit> {
        let detection = self
            .configuration
            .as_ref()
            .map_or_else(PlaneDetection::empty, |config| config.plane_detection);
        let ray = Ray::new(query.origin, query.direction);

        let mut hits: Vec<RaycastHit> = self
            .planes
            .iter()
            .filter(|plane| plane.detectable_with(detection) && plane.matches(query.alignment))
            .filter_map(|plane| plane.hit(&ray, query.target))
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn add_anchor(&mut self, transform: Mat4) -> AnchorId {
        let id = self.anchors.insert(transform);
        self.events.push(SessionEvent::AnchorsAdded(vec![id]));
        id
    }

    fn remove_anchor(&mut self, anchor: AnchorId) -> bool {
        let removed = self.anchors.remove(anchor).is_some();
        if removed {
            self.events.push(SessionEvent::AnchorsRemoved(vec![anchor]));
        }
        removed
    }

    fn anchor_transform(&self, anchor: AnchorId) -> Option<Mat4> {
        self.anchors.get(anchor).copied()
    }

    fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Synthetic bi-planar image: a luma gradient with a neutral, slightly tinted chroma plane
/// at half resolution
pub fn synthetic_ycbcr(width: u32, height: u32) -> PlanarImage {
    let mut luma = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            luma.push((((x + y) * 255) / (width + height).max(1)) as u8);
        }
    }

    let (chroma_width, chroma_height) = (width.div_ceil(2), height.div_ceil(2));
    let mut chroma = Vec::with_capacity(chroma_width as usize * chroma_height as usize * 2);
    for y in 0..chroma_height {
        for x in 0..chroma_width {
            chroma.push(128 + ((x * 16) / chroma_width.max(1)) as u8);
            chroma.push(128 - ((y * 16) / chroma_height.max(1)) as u8);
        }
    }

    PlanarImage {
        planes: vec![
            ImagePlane::packed(width, height, PlaneFormat::Luma8, luma),
            ImagePlane::packed(chroma_width, chroma_height, PlaneFormat::Chroma8x2, chroma),
        ],
    }
}
