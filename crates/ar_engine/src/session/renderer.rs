//! AR renderer orchestration
//!
//! [`ArRenderer`] owns the tracking session, the GPU collaborator and all
//! per-frame state. The host drives it from one serialized queue:
//!
//! 1. [`resize`](ArRenderer::resize) / [`set_orientation`](ArRenderer::set_orientation)
//!    when the display surface changes
//! 2. [`update`](ArRenderer::update) once per tick
//! 3. [`draw`](ArRenderer::draw) once per tick, after `update`
//! 4. [`touches_began`](ArRenderer::touches_began) whenever touches arrive
//!
//! Session notifications are drained at the start of every `update` and
//! dispatched to the [`SessionObserver`] implementation below, so the
//! session never calls back into the renderer re-entrantly.

use ash::vk;

use crate::core::config::ArConfig;
use crate::error::ArError;
use crate::foundation::math::{Vec2, Vec3};
use crate::foundation::time::Timer;
use crate::input::placement::{PlacementOutcome, PlacementResolver, PlacementState};
use crate::input::touch::{TouchOrigin, TouchPoint};
use crate::render::background::{BackgroundUvRemapper, RemapOutcome};
use crate::render::camera::{Camera, CameraPoseAdapter};
use crate::render::compositor::FrameCompositor;
use crate::render::display::InterfaceOrientation;
use crate::render::gpu::{GpuBackend, RenderTarget};
use crate::render::texture_bridge::{BridgeOutcome, BridgedTextures, PlanarTextureBridge};
use crate::scene::ar_scene::ArScene;
use crate::tracking::consumer::FrameConsumer;
use crate::tracking::frame::TrackingState;
use crate::tracking::session::{dispatch, AnchorId, SessionObserver, TrackingFailure, TrackingSession};

use super::faults::{plan_recovery, RecoveryAction, RestartMonitor};

/// What one [`ArRenderer::update`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Sequence of the frame processed this tick
    pub frame: Option<u64>,
    /// Whether that frame had not been seen by an earlier tick
    pub new_frame: bool,
    /// Whether the camera took the tracked pose
    pub pose_updated: bool,
    /// Texture bridging result, if a texture cache exists
    pub bridge: Option<BridgeOutcome>,
    /// Background remap result
    pub remap: Option<RemapOutcome>,
    /// Whether an anchor binding was applied
    pub anchor_applied: bool,
}

/// Camera-feed augmentation renderer
pub struct ArRenderer<S: TrackingSession, G: GpuBackend> {
    config: ArConfig,
    session: S,
    gpu: G,
    texture_cache: Option<G::TextureCache>,
    frames: FrameConsumer,
    bridge: PlanarTextureBridge,
    remapper: BackgroundUvRemapper,
    pose_adapter: CameraPoseAdapter,
    camera: Camera,
    scene: ArScene,
    placement: PlacementResolver,
    compositor: FrameCompositor,
    restarts: RestartMonitor,
    timer: Timer,
    orientation: Option<InterfaceOrientation>,
    viewport: vk::Extent2D,
    active: bool,
}

impl<S: TrackingSession, G: GpuBackend> ArRenderer<S, G> {
    /// Validate the configuration, check device capability, create the
    /// texture cache and start the session
    ///
    /// # Errors
    /// [`ArError::UnsupportedDevice`] if world tracking is unavailable,
    /// [`ArError::Config`] for an invalid configuration, [`ArError::Gpu`] if
    /// the texture cache cannot be created.
    pub fn new(config: ArConfig, mut session: S, mut gpu: G) -> Result<Self, ArError> {
        config.validate()?;

        if !session.is_supported() {
            log::error!("World tracking is not supported on this device");
            return Err(ArError::UnsupportedDevice);
        }

        let texture_cache = gpu.create_texture_cache()?;
        log::info!("Texture cache created");

        let render = &config.render;
        let camera = Camera::perspective(Vec3::new(0.0, 0.0, 3.0), 60.0, 1.0, render.near, render.far);
        let pose_adapter = CameraPoseAdapter::new(render.near, render.far);
        let compositor = FrameCompositor::new(render);
        let restarts = RestartMonitor::new(config.diagnostics.restart_warning_threshold);

        let scene = ArScene::build();

        session.run(&config.session);
        log::info!(
            "AR session started (planes: {:?}, alignment: {:?})",
            config.session.plane_detection, config.session.world_alignment
        );

        Ok(Self {
            config,
            session,
            gpu,
            texture_cache: Some(texture_cache),
            frames: FrameConsumer::new(),
            bridge: PlanarTextureBridge::new(),
            remapper: BackgroundUvRemapper::new(),
            pose_adapter,
            camera,
            scene,
            placement: PlacementResolver::new(TouchOrigin::default()),
            compositor,
            restarts,
            timer: Timer::new(),
            orientation: None,
            viewport: vk::Extent2D::default(),
            active: true,
        })
    }

    /// Use a different touch coordinate origin
    #[must_use]
    pub fn with_touch_origin(mut self, origin: TouchOrigin) -> Self {
        self.placement = PlacementResolver::new(origin);
        self
    }

    /// The drawable surface changed size
    pub fn resize(&mut self, width: u32, height: u32) {
        let extent = vk::Extent2D { width, height };
        if height > 0 {
            self.camera.set_aspect_ratio(width as f32 / height as f32);
        }
        self.gpu.resize(extent);
        self.viewport = extent;
        self.remapper.mark_dirty();
        log::debug!("Viewport resized to {}x{}", width, height);
    }

    /// The interface orientation changed; `None` when no display surface is active
    pub fn set_orientation(&mut self, orientation: Option<InterfaceOrientation>) {
        if self.orientation != orientation {
            log::debug!("Interface orientation {:?} -> {:?}", self.orientation, orientation);
            self.orientation = orientation;
            self.remapper.mark_dirty();
        }
    }

    /// Run one tick
    pub fn update(&mut self) -> TickReport {
        self.scene.set_time(self.timer.elapsed());

        for event in self.session.drain_events() {
            dispatch(self, &event);
        }

        let mut report = TickReport {
            anchor_applied: self.scene.evaluate_binding(&self.session),
            ..TickReport::default()
        };

        if !self.active {
            return report;
        }

        let Some(consumed) = self.frames.poll(&self.session) else {
            log::trace!("No camera frame available yet");
            return report;
        };
        let frame = consumed.frame;
        report.frame = Some(frame.sequence);
        report.new_frame = consumed.is_new;

        report.pose_updated = self
            .pose_adapter
            .update(&mut self.camera, &frame.camera, self.orientation, self.viewport);

        if let Some(cache) = self.texture_cache.as_mut() {
            report.bridge = Some(self.bridge.update(cache, &frame));
        }

        report.remap = Some(self.remapper.remap(
            self.scene.background_quad_mut(),
            frame.camera.image_resolution,
            self.orientation,
            self.viewport,
        ));

        self.scene.mark_frame_available();

        log::trace!("Tick processed frame {} ({:?})", frame.sequence, report);
        report
    }

    /// Composite the background and scene passes into `target`
    ///
    /// Returns false when nothing was submitted.
    pub fn draw(&mut self, target: &RenderTarget) -> bool {
        if !self.active {
            return false;
        }
        let textures = self.bridge.textures();
        match self.compositor.draw(&mut self.gpu, target, &self.scene, &self.camera, &textures) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Frame composition failed: {}", e);
                false
            }
        }
    }

    /// Handle a touch-began event carrying every active touch
    pub fn touches_began(&mut self, touches: &[TouchPoint], view_size: Vec2) -> PlacementOutcome {
        self.placement
            .touches_began(touches, view_size, &self.camera, &mut self.session, &mut self.scene)
    }

    /// Pause the session and release the texture cache
    ///
    /// The anchor subscription is dropped and the camera returns to its free
    /// perspective pose.
    pub fn teardown(&mut self) {
        if !self.active {
            return;
        }
        self.session.pause();
        self.scene.clear_binding();
        self.camera.clear_pose();
        self.bridge.clear();
        self.texture_cache = None;
        self.active = false;
        log::info!("AR session torn down after {} frames", self.frames.frames_consumed());
    }

    /// Whether the renderer has not been torn down
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Configuration, including any world-alignment fallback
    pub fn config(&self) -> &ArConfig {
        &self.config
    }

    /// Tracking session
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Mutable tracking session
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// GPU collaborator
    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    /// Mutable GPU collaborator
    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    /// Texture cache; `None` after teardown
    pub fn texture_cache(&self) -> Option<&G::TextureCache> {
        self.texture_cache.as_ref()
    }

    /// Mutable texture cache
    pub fn texture_cache_mut(&mut self) -> Option<&mut G::TextureCache> {
        self.texture_cache.as_mut()
    }

    /// Scene nodes and anchor binding
    pub fn scene(&self) -> &ArScene {
        &self.scene
    }

    /// Camera used for the scene pass and touch rays
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Textures bound for the background
    pub fn textures(&self) -> BridgedTextures {
        self.bridge.textures()
    }

    /// State of the placement resolver
    pub fn placement_state(&self) -> PlacementState {
        self.placement.state()
    }

    /// Last size passed to `resize`
    pub fn viewport(&self) -> vk::Extent2D {
        self.viewport
    }

    /// Current interface orientation
    pub fn orientation(&self) -> Option<InterfaceOrientation> {
        self.orientation
    }

    /// Session restarts since creation
    pub fn restart_count(&self) -> u64 {
        self.restarts.total()
    }

    /// Distinct camera frames processed
    pub fn frames_consumed(&self) -> u64 {
        self.frames.frames_consumed()
    }

    /// Camera frames captured but never processed
    pub fn frames_dropped(&self) -> u64 {
        self.frames.frames_dropped()
    }
}

impl<S: TrackingSession, G: GpuBackend> SessionObserver for ArRenderer<S, G> {
    fn on_failure(&mut self, cause: &TrackingFailure) {
        log::warn!("Tracking session failed: {}", cause);
        if !self.active {
            return;
        }

        match plan_recovery(cause, &mut self.config.session) {
            RecoveryAction::Reconfigured { from, to } => {
                log::info!("Switching world alignment {:?} -> {:?} and restarting", from, to);
            }
            RecoveryAction::RestartUnchanged => {
                log::warn!("No known remedy for '{}'; restarting with unchanged configuration", cause);
            }
        }

        self.restarts.record();
        self.frames.reset();
        self.bridge.forget_sequence();
        self.session.run(&self.config.session);
    }

    fn on_interrupt(&mut self) {
        log::info!("Tracking session interrupted");
    }

    fn on_interruption_ended(&mut self) {
        log::info!("Tracking session interruption ended");
    }

    fn on_anchors_added(&mut self, anchors: &[AnchorId]) {
        log::trace!("Anchors added: {:?}", anchors);
    }

    fn on_anchors_updated(&mut self, anchors: &[AnchorId]) {
        log::trace!("Anchors updated: {:?}", anchors);
    }

    fn on_anchors_removed(&mut self, anchors: &[AnchorId]) {
        log::trace!("Anchors removed: {:?}", anchors);
    }

    fn on_tracking_state_changed(&mut self, state: TrackingState) {
        log::debug!("Tracking state: {:?}", state);
    }
}

impl<S: TrackingSession, G: GpuBackend> Drop for ArRenderer<S, G> {
    fn drop(&mut self) {
        self.teardown();
    }
}
