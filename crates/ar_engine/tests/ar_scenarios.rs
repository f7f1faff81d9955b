//! End-to-end scenarios driven through `ArRenderer` with the simulated
//! tracking session and the headless GPU backend.

use approx::assert_relative_eq;
use ash::vk;
use nalgebra::{Matrix4, Vector3, Vector4};

use ar_engine::core::config::{ArConfig, WorldAlignment};
use ar_engine::foundation::math::{Mat4, Vec2, Vec3};
use ar_engine::input::{PlacementOutcome, PlacementState, TouchPoint};
use ar_engine::render::background::{remap_quad, RemapOutcome};
use ar_engine::render::camera::update_pose;
use ar_engine::render::texture_bridge::BridgeOutcome;
use ar_engine::render::{Camera, HeadlessGpu, InterfaceOrientation, RenderTarget};
use ar_engine::session::ArRenderer;
use ar_engine::tracking::frame::TrackedCamera;
use ar_engine::tracking::simulated::{default_camera_pose, synthetic_ycbcr};
use ar_engine::tracking::{SimulatedSession, TrackingFailure, TrackingSession};

type TestRenderer = ArRenderer<SimulatedSession, HeadlessGpu>;

fn portrait_renderer(width: u32, height: u32) -> TestRenderer {
    let mut renderer = ArRenderer::new(ArConfig::default(), SimulatedSession::new(), HeadlessGpu::new())
        .expect("simulated device is supported");
    renderer.resize(width, height);
    renderer.set_orientation(Some(InterfaceOrientation::Portrait));
    renderer
}

fn tick(renderer: &mut TestRenderer) -> ar_engine::session::TickReport {
    renderer.session_mut().capture_frame();
    renderer.update()
}

#[test]
fn portrait_center_touch_places_content_at_plane_origin() {
    let mut renderer = portrait_renderer(1170, 2532);
    tick(&mut renderer);
    assert_eq!(renderer.placement_state(), PlacementState::Idle);
    assert!(!renderer.scene().is_content_visible());

    let view = Vec2::new(1170.0, 2532.0);
    let outcome = renderer.touches_began(&[TouchPoint::new(7, 585.0, 1266.0)], view);

    let PlacementOutcome::Placed { hit, .. } = outcome else {
        panic!("expected a placement, got {:?}", outcome);
    };
    assert_eq!(renderer.placement_state(), PlacementState::Placed);
    assert_eq!(renderer.scene().content_transform(), Some(hit.world_transform));
    assert_relative_eq!(hit.world_transform, Mat4::identity(), epsilon = 1e-4);
    assert!(renderer.scene().is_root_visible());
    assert!(renderer.scene().is_content_visible());
}

#[test]
fn multi_touch_never_places_even_over_a_plane() {
    let mut renderer = portrait_renderer(1170, 2532);
    tick(&mut renderer);

    let view = Vec2::new(1170.0, 2532.0);
    let touches = [TouchPoint::new(1, 585.0, 1266.0), TouchPoint::new(2, 585.0, 1266.0)];
    for _ in 0..3 {
        let outcome = renderer.touches_began(&touches, view);
        assert!(matches!(outcome, PlacementOutcome::Ignored(_)));
    }
    assert_eq!(renderer.placement_state(), PlacementState::Idle);
    assert_eq!(renderer.session().anchor_count(), 0);
}

#[test]
fn gravity_alignment_failure_reconfigures_and_resumes() {
    let mut renderer = portrait_renderer(1170, 2532);
    let first = tick(&mut renderer);
    assert!(first.new_frame);

    renderer.session_mut().inject_failure(TrackingFailure::GravityAlignmentIncompatible);
    assert!(!renderer.session().is_running());
    renderer.update();

    assert_eq!(renderer.config().session.world_alignment, WorldAlignment::Gravity);
    assert_eq!(
        renderer.session().configuration().map(|config| config.world_alignment),
        Some(WorldAlignment::Gravity)
    );
    assert_eq!(renderer.session().run_count(), 2);
    assert_eq!(renderer.restart_count(), 1);

    let resumed = tick(&mut renderer);
    assert!(resumed.new_frame);
    assert!(resumed.pose_updated);
    assert!(resumed.frame > first.frame);
}

#[test]
fn unrecoverable_failure_restarts_with_same_configuration() {
    let mut renderer = portrait_renderer(1170, 2532);
    renderer.session_mut().inject_failure(TrackingFailure::WorldTrackingFailed);
    renderer.update();

    assert!(renderer.session().is_running());
    assert_eq!(renderer.config().session.world_alignment, WorldAlignment::GravityAndHeading);
    assert_eq!(renderer.session().run_count(), 2);
}

#[test]
fn resize_recomputes_background_uvs() {
    let mut renderer = portrait_renderer(750, 1334);
    let report = tick(&mut renderer);
    assert_eq!(report.remap, Some(RemapOutcome::Remapped));
    let before = renderer.scene().background_quad().uvs();

    assert_eq!(tick(&mut renderer).remap, Some(RemapOutcome::Clean));

    renderer.resize(1170, 2532);
    let report = tick(&mut renderer);
    assert_eq!(report.remap, Some(RemapOutcome::Remapped));
    let after = renderer.scene().background_quad().uvs();
    assert_ne!(before, after);
}

#[test]
fn orientation_change_recomputes_background_uvs() {
    let mut renderer = portrait_renderer(1170, 2532);
    assert_eq!(tick(&mut renderer).remap, Some(RemapOutcome::Remapped));
    assert_eq!(tick(&mut renderer).remap, Some(RemapOutcome::Clean));
    let before = renderer.scene().background_quad().uvs();

    renderer.set_orientation(Some(InterfaceOrientation::PortraitUpsideDown));
    assert_eq!(tick(&mut renderer).remap, Some(RemapOutcome::Remapped));
    assert_ne!(renderer.scene().background_quad().uvs(), before);
}

#[test]
fn same_orientation_keeps_background_clean() {
    let mut renderer = portrait_renderer(1170, 2532);
    tick(&mut renderer);
    let before = renderer.scene().background_quad().uvs();

    renderer.set_orientation(Some(InterfaceOrientation::Portrait));
    assert_eq!(tick(&mut renderer).remap, Some(RemapOutcome::Clean));
    assert_eq!(renderer.scene().background_quad().uvs(), before);
}

#[test]
fn restart_with_reused_frame_numbers_rebridges_textures() {
    let session = SimulatedSession::new().renumbering_frames_on_run();
    let mut renderer = ArRenderer::new(ArConfig::default(), session, HeadlessGpu::new())
        .expect("simulated device is supported");
    renderer.resize(1170, 2532);
    renderer.set_orientation(Some(InterfaceOrientation::Portrait));

    let first = tick(&mut renderer);
    assert_eq!(first.frame, Some(1));
    let before = renderer.textures();

    renderer.session_mut().inject_failure(TrackingFailure::SensorFailed);
    assert_eq!(renderer.update().frame, None);

    let resumed = tick(&mut renderer);
    assert_eq!(resumed.frame, Some(1));
    assert!(resumed.new_frame);
    assert_eq!(resumed.bridge, Some(BridgeOutcome::Bridged));
    assert!(renderer.textures().pair().is_some());
    assert_ne!(renderer.textures(), before);
}

#[test]
fn single_plane_frame_keeps_previous_textures() {
    let mut renderer = portrait_renderer(1170, 2532);
    assert_eq!(tick(&mut renderer).bridge, Some(BridgeOutcome::Bridged));
    let bridged = renderer.textures();
    assert!(bridged.pair().is_some());

    let mut luma_only = synthetic_ycbcr(640, 480);
    luma_only.planes.truncate(1);
    renderer.session_mut().set_captured_image(luma_only);
    assert_eq!(tick(&mut renderer).bridge, Some(BridgeOutcome::InsufficientPlanes(1)));
    assert_eq!(renderer.textures(), bridged);
}

#[test]
fn background_is_hidden_until_first_frame() {
    let mut renderer = portrait_renderer(1170, 2532);
    renderer.update();
    assert!(!renderer.scene().is_background_visible());

    tick(&mut renderer);
    assert!(renderer.scene().is_background_visible());
}

#[test]
fn draw_submits_background_then_scene() {
    let mut renderer = portrait_renderer(1170, 2532);
    tick(&mut renderer);
    assert!(renderer.draw(&RenderTarget::new(1170, 2532)));

    let passes = renderer.gpu_mut().take_passes();
    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0].pass.label, "Background");
    assert_eq!(passes[0].draws.len(), 1);
    assert_eq!(passes[1].pass.label, "Scene");
    assert_eq!(passes[1].pass.color_load_op, vk::AttachmentLoadOp::LOAD);
    // Nothing placed yet.
    assert!(passes[1].draws.is_empty());
}

#[test]
fn placed_content_follows_anchor_refinement() {
    let mut renderer = portrait_renderer(1170, 2532);
    tick(&mut renderer);
    let outcome = renderer.touches_began(&[TouchPoint::new(1, 585.0, 1266.0)], Vec2::new(1170.0, 2532.0));
    let PlacementOutcome::Placed { anchor, .. } = outcome else {
        panic!("expected a placement, got {:?}", outcome);
    };

    let refined = Mat4::new_translation(&Vec3::new(0.05, 0.0, -0.02));
    renderer.session_mut().refine_anchor(anchor, refined);
    let report = tick(&mut renderer);
    assert!(report.anchor_applied);

    let root = renderer.scene().root();
    assert_relative_eq!(renderer.scene().graph().world_transform(root).unwrap(), refined);
}

#[test]
fn remapped_uvs_stay_inside_the_image() {
    let sizes = [(1, 1), (320, 240), (750, 1334), (1170, 2532), (2532, 1170), (4096, 17), (17, 4096)];
    for orientation in InterfaceOrientation::ALL {
        for &(width, height) in &sizes {
            let quad = remap_quad((1920, 1440), orientation, vk::Extent2D { width, height }).unwrap();
            for uv in quad.uvs() {
                assert!(uv.x >= -1e-5 && uv.x <= 1.0 + 1e-5, "{:?} {}x{} -> {:?}", orientation, width, height, uv);
                assert!(uv.y >= -1e-5 && uv.y <= 1.0 + 1e-5, "{:?} {}x{} -> {:?}", orientation, width, height, uv);
            }
        }
    }
}

#[test]
fn unprojected_rays_start_at_the_camera() {
    let poses = [
        default_camera_pose(),
        Mat4::new_translation(&Vec3::new(0.3, 1.2, -0.7)) * Mat4::from_axis_angle(&Vec3::y_axis(), 1.1),
        Mat4::new_translation(&Vec3::new(-2.0, 0.4, 1.0))
            * Mat4::from_axis_angle(&Vec3::x_axis(), -0.3)
            * Mat4::from_axis_angle(&Vec3::z_axis(), 0.2),
    ];
    for transform in poses {
        let tracked = TrackedCamera { transform, ..simulated_camera() };
        for orientation in InterfaceOrientation::ALL {
            let pose = update_pose(&tracked, Some(orientation), vk::Extent2D { width: 1170, height: 2532 }, 0.01, 100.0)
                .expect("valid pose");
            let mut camera = Camera::default();
            camera.apply_pose(pose);

            for ndc in [Vec2::zeros(), Vec2::new(0.5, -0.25), Vec2::new(-0.9, 0.9)] {
                let ray = camera.screen_to_world_ray(ndc).expect("invertible camera");
                assert_relative_eq!(ray.origin, tracked.position(), epsilon = 1e-4);
                // The far-plane point lies on the ray.
                let far = camera.unproject(ndc, 1.0).unwrap();
                assert!(ray.distance_to_point(far) < 1e-2 * (far - ray.origin).norm());
            }
        }
    }
}

#[test]
fn inverse_projection_recovers_camera_position() {
    let poses = [
        default_camera_pose(),
        Mat4::new_translation(&Vec3::new(0.3, 1.2, -0.7)) * Mat4::from_axis_angle(&Vec3::y_axis(), 1.1),
        Mat4::new_translation(&Vec3::new(-2.0, 0.4, 1.0))
            * Mat4::from_axis_angle(&Vec3::x_axis(), -0.3)
            * Mat4::from_axis_angle(&Vec3::z_axis(), 0.2),
    ];
    for transform in poses {
        let tracked = TrackedCamera { transform, ..simulated_camera() };
        let expected = tracked.position().cast::<f64>();
        for orientation in InterfaceOrientation::ALL {
            let pose = update_pose(&tracked, Some(orientation), vk::Extent2D { width: 1170, height: 2532 }, 0.01, 100.0)
                .expect("valid pose");
            let mut camera = Camera::default();
            camera.apply_pose(pose);
            let inverse = camera
                .get_view_projection_matrix()
                .cast::<f64>()
                .try_inverse()
                .expect("invertible view-projection");

            for ndc in [Vec2::zeros(), Vec2::new(0.5, -0.25), Vec2::new(-0.9, 0.9)] {
                let near = unproject(&inverse, ndc, 0.0);
                let far = unproject(&inverse, ndc, 1.0);
                let direction = (far - near).normalize();
                let offset = expected - near;
                let distance = (offset - direction * offset.dot(&direction)).norm();
                assert!(distance < 1e-3, "{:?} {:?}: camera is {} m off the ray", orientation, ndc, distance);
                // The camera sits behind the near plane.
                assert!(offset.dot(&direction) < 0.0);
            }
        }
    }
}

fn unproject(inverse: &Matrix4<f64>, ndc: Vec2, depth: f64) -> Vector3<f64> {
    // Vulkan clip space is y-down.
    let world = inverse * Vector4::new(f64::from(ndc.x), -f64::from(ndc.y), depth, 1.0);
    world.xyz() / world.w
}

fn simulated_camera() -> TrackedCamera {
    let mut session = SimulatedSession::new();
    session.run(&ArConfig::default().session);
    session.capture_frame();
    session.current_frame().map(|frame| frame.camera.clone()).expect("frame captured")
}
