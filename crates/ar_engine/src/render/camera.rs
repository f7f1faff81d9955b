//! # AR Camera
//!
//! Virtual camera whose matrices follow the tracked device camera, with a
//! free perspective fallback until the first frame arrives.
//!
//! ## Coordinate System
//! World and camera space are right-handed, Y-up, with the camera looking
//! down -Z. Projection matrices are built in Vulkan view space (Y down,
//! +Z forward, depth in `[0, 1]`) and the combined transform is
//! `P × X × V`, where X is [`Mat4Ext::vulkan_coordinate_transform`].
//!
//! ## Orientation
//! The tracked pose and intrinsics describe the sensor's native
//! landscape-right orientation. [`oriented_view_matrix`] rolls the camera
//! about its optical axis to match the interface orientation and
//! [`oriented_projection_matrix`] rotates the intrinsics the same way,
//! then aspect-fills the viewport exactly like the background image.

use ash::vk;

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec2, Vec3, Vec4};
use crate::physics::Ray;
use crate::tracking::frame::{CameraIntrinsics, TrackedCamera};

use super::display::{aspect_fill_scale, InterfaceOrientation};

/// View and projection derived from a tracked camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// World to camera (Y-up, -Z forward)
    pub view: Mat4,
    /// Vulkan view space to clip space
    pub projection: Mat4,
}

/// View matrix for the tracked camera rolled into `orientation`
///
/// `None` if the camera transform is not invertible.
pub fn oriented_view_matrix(camera_transform: &Mat4, orientation: InterfaceOrientation) -> Option<Mat4> {
    (camera_transform * Mat4::rotation_z(orientation.rotation_angle())).try_inverse()
}

/// Projection matrix from pinhole intrinsics for `orientation` and `viewport`
///
/// The image is scaled to aspect-fill the viewport and centered, matching the
/// background remap. Returns `None` for degenerate sizes.
///
/// # Mathematical Notes
/// With `s` the aspect-fill scale and `(fx, fy, cx, cy)` the intrinsics rotated
/// into the interface orientation (image size `w × h`):
///
/// ```text
/// | 2s·fx/vw   0          2s·(cx − w/2)/vw   0          |
/// | 0          2s·fy/vh   2s·(cy − h/2)/vh   0          |
/// | 0          0          f/(f − n)          −n·f/(f − n) |
/// | 0          0          1                  0          |
/// ```
pub fn oriented_projection_matrix(
    intrinsics: &CameraIntrinsics,
    image_resolution: (u32, u32),
    orientation: InterfaceOrientation,
    viewport: vk::Extent2D,
    near: f32,
    far: f32,
) -> Option<Mat4> {
    let (image_width, image_height) = image_resolution;
    if image_width == 0 || image_height == 0 || far <= near {
        return None;
    }
    let (oriented_width, oriented_height) = orientation.oriented_size(image_resolution);
    let scale = aspect_fill_scale((oriented_width, oriented_height), viewport)?;

    let (fx, fy) = if orientation.is_portrait() {
        (intrinsics.fy, intrinsics.fx)
    } else {
        (intrinsics.fx, intrinsics.fy)
    };
    let principal = orientation.rotate_image_point(Vec2::new(
        intrinsics.cx / image_width as f32,
        intrinsics.cy / image_height as f32,
    ));
    let cx = principal.x * oriented_width;
    let cy = principal.y * oriented_height;

    let viewport_width = viewport.width as f32;
    let viewport_height = viewport.height as f32;

    let mut result = Mat4::zeros();
    result[(0, 0)] = 2.0 * scale * fx / viewport_width;
    result[(0, 2)] = 2.0 * scale * (cx - oriented_width * 0.5) / viewport_width;
    result[(1, 1)] = 2.0 * scale * fy / viewport_height;
    result[(1, 2)] = 2.0 * scale * (cy - oriented_height * 0.5) / viewport_height;
    result[(2, 2)] = far / (far - near);
    result[(2, 3)] = -(near * far) / (far - near);
    result[(3, 2)] = 1.0;
    Some(result)
}

/// Derive view and projection from a tracked camera
///
/// Returns `None` when the orientation is unknown or the viewport is
/// degenerate. The caller keeps its previous matrices in that case.
pub fn update_pose(
    camera: &TrackedCamera,
    orientation: Option<InterfaceOrientation>,
    viewport: vk::Extent2D,
    near: f32,
    far: f32,
) -> Option<CameraPose> {
    let orientation = orientation?;
    let view = oriented_view_matrix(&camera.transform, orientation)?;
    let projection = oriented_projection_matrix(
        &camera.intrinsics,
        camera.image_resolution,
        orientation,
        viewport,
        near,
        far,
    )?;
    Some(CameraPose { view, projection })
}

/// Applies tracked poses to a [`Camera`] with fixed clipping planes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPoseAdapter {
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl CameraPoseAdapter {
    /// Adapter producing projections with these clip distances
    pub fn new(near: f32, far: f32) -> Self {
        Self { near, far }
    }

    /// Update `camera` from the tracked camera; false if skipped
    pub fn update(
        &self,
        camera: &mut Camera,
        tracked: &TrackedCamera,
        orientation: Option<InterfaceOrientation>,
        viewport: vk::Extent2D,
    ) -> bool {
        match update_pose(tracked, orientation, viewport, self.near, self.far) {
            Some(pose) => {
                camera.apply_pose(pose);
                true
            }
            None => {
                log::trace!("Camera pose not updated (orientation {:?}, viewport {:?})", orientation, viewport);
                false
            }
        }
    }
}

/// Virtual camera for the AR scene
///
/// Starts as a free perspective camera. Once a tracked pose is applied, its
/// view and projection take over until [`Camera::clear_pose`].
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera position in world space (fallback camera)
    pub position: Vec3,

    /// Point the fallback camera looks at
    pub target: Vec3,

    /// Up vector of the fallback camera
    pub up: Vec3,

    /// Vertical field of view in radians (fallback camera)
    pub fov: f32,

    /// Aspect ratio (width / height)
    pub aspect: f32,

    /// Distance to near clipping plane
    pub near: f32,

    /// Distance to far clipping plane
    pub far: f32,

    tracked: Option<CameraPose>,
}

impl Camera {
    /// Create a perspective camera looking at the origin
    ///
    /// # Arguments
    /// * `position` - Camera position in world space
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Aspect ratio (width / height) of the viewport
    /// * `near` - Distance to near clipping plane (must be > 0)
    /// * `far` - Distance to far clipping plane (must be > near)
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::new(0.0, 1.0, 0.0),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
            tracked: None,
        }
    }

    /// Update aspect ratio for viewport changes
    ///
    /// Only logs changes larger than 0.01 to avoid noise during resizes.
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::info!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Take view and projection from a tracked pose
    pub fn apply_pose(&mut self, pose: CameraPose) {
        self.tracked = Some(pose);
    }

    /// Return to the free perspective camera
    pub fn clear_pose(&mut self) {
        self.tracked = None;
    }

    /// Whether a tracked pose drives this camera
    pub fn is_tracked(&self) -> bool {
        self.tracked.is_some()
    }

    /// World-to-camera matrix
    pub fn get_view_matrix(&self) -> Mat4 {
        match &self.tracked {
            Some(pose) => pose.view,
            None => Mat4::look_at(self.position, self.target, self.up),
        }
    }

    /// Projection matrix (Vulkan view space to clip space)
    pub fn get_projection_matrix(&self) -> Mat4 {
        match &self.tracked {
            Some(pose) => pose.projection,
            None => Mat4::perspective(self.fov, self.aspect, self.near, self.far),
        }
    }

    /// Combined `P × X × V`
    pub fn get_view_projection_matrix(&self) -> Mat4 {
        self.get_projection_matrix() * Mat4::vulkan_coordinate_transform() * self.get_view_matrix()
    }

    /// Camera position in world space
    pub fn world_position(&self) -> Vec3 {
        match &self.tracked {
            Some(pose) => pose
                .view
                .try_inverse()
                .map_or(self.position, |camera_to_world| utils::translation_of(&camera_to_world)),
            None => self.position,
        }
    }

    /// Unproject an NDC point (y up) at Vulkan depth `depth` to world space
    pub fn unproject(&self, ndc: Vec2, depth: f32) -> Option<Vec3> {
        let inverse = self.get_view_projection_matrix().try_inverse()?;
        // Vulkan clip space is y-down.
        let world = inverse * Vec4::new(ndc.x, -ndc.y, depth, 1.0);
        if world.w.abs() <= f32::EPSILON {
            return None;
        }
        Some(world.xyz() / world.w)
    }

    /// Convert normalized device coordinates to a world-space ray
    ///
    /// # Arguments
    /// * `ndc` - Screen position in NDC (-1 to 1, x left to right, y bottom to top)
    ///
    /// # Returns
    /// Ray from the camera position through the screen point, or `None` if the
    /// view-projection matrix is singular.
    ///
    /// # Mathematical Process
    /// 1. Unproject the point at the near (depth 0) and far (depth 1) planes
    /// 2. Direction is near to far, normalized
    /// 3. Origin is the camera's world position
    pub fn screen_to_world_ray(&self, ndc: Vec2) -> Option<Ray> {
        let near = self.unproject(ndc, 0.0)?;
        let far = self.unproject(ndc, 1.0)?;
        let direction = far - near;
        if direction.norm_squared() <= f32::EPSILON {
            return None;
        }
        Some(Ray::new(self.world_position(), direction))
    }
}

impl Default for Camera {
    /// Free camera 3 m in front of the origin, used until the first tracked frame
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 0.0, 3.0), 60.0, 1.0, 0.01, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::frame::TrackingState;
    use crate::tracking::simulated::default_camera_pose;
    use approx::assert_relative_eq;

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    fn tracked(transform: Mat4) -> TrackedCamera {
        TrackedCamera {
            transform,
            intrinsics: CameraIntrinsics { fx: 1500.0, fy: 1490.0, cx: 950.0, cy: 725.0 },
            image_resolution: (1920, 1440),
            tracking_state: TrackingState::Normal,
        }
    }

    fn project(camera: &Camera, point: Vec3) -> Vec2 {
        let clip = camera.get_view_projection_matrix() * Vec4::new(point.x, point.y, point.z, 1.0);
        Vec2::new(clip.x / clip.w, clip.y / clip.w)
    }

    /// Pixel coordinates of a world point in the sensor image
    fn sensor_pixel(tracked: &TrackedCamera, point: Vec3) -> Vec2 {
        let local = tracked.transform.try_inverse().unwrap() * Vec4::new(point.x, point.y, point.z, 1.0);
        let depth = -local.z;
        Vec2::new(
            tracked.intrinsics.fx * local.x / depth + tracked.intrinsics.cx,
            -tracked.intrinsics.fy * local.y / depth + tracked.intrinsics.cy,
        )
    }

    #[test]
    fn test_fallback_camera_projects_origin_to_center() {
        let camera = Camera::default();
        assert!(!camera.is_tracked());
        assert_relative_eq!(project(&camera, Vec3::zeros()), Vec2::zeros(), epsilon = 1e-6);
    }

    #[test]
    fn test_no_pose_without_orientation_or_viewport() {
        let camera = tracked(Mat4::identity());
        assert!(update_pose(&camera, None, extent(100, 100), 0.01, 100.0).is_none());
        assert!(update_pose(&camera, Some(InterfaceOrientation::Portrait), extent(0, 100), 0.01, 100.0).is_none());
    }

    #[test]
    fn test_projection_matches_background_for_every_orientation() {
        use crate::render::display::DisplayTransform;

        let tracked = tracked(default_camera_pose());
        let point = Vec3::new(0.2, 0.1, -0.3);
        let pixel = sensor_pixel(&tracked, point);
        let image_uv = Vec2::new(pixel.x / 1920.0, pixel.y / 1440.0);

        for orientation in InterfaceOrientation::ALL {
            for viewport in [extent(1170, 2532), extent(2532, 1170), extent(800, 800)] {
                let pose = update_pose(&tracked, Some(orientation), viewport, 0.01, 100.0).unwrap();
                let mut camera = Camera::default();
                camera.apply_pose(pose);

                let ndc = project(&camera, point);
                let view_from_projection = (ndc + Vec2::new(1.0, 1.0)) * 0.5;
                let view_from_image = DisplayTransform::for_orientation((1920, 1440), orientation, viewport)
                    .unwrap()
                    .apply(image_uv);
                assert_relative_eq!(view_from_projection, view_from_image, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_screen_ray_passes_through_projected_point() {
        let tracked = tracked(default_camera_pose());
        let pose = update_pose(&tracked, Some(InterfaceOrientation::Portrait), extent(1170, 2532), 0.01, 100.0).unwrap();
        let mut camera = Camera::default();
        camera.apply_pose(pose);

        let point = Vec3::new(-0.4, 0.0, 0.25);
        let ndc = project(&camera, point);
        let ray = camera.screen_to_world_ray(Vec2::new(ndc.x, -ndc.y)).unwrap();

        assert_relative_eq!(ray.origin, tracked.position(), epsilon = 1e-4);
        assert!(ray.distance_to_point(point) < 1e-3);
    }

    #[test]
    fn test_center_ray_follows_optical_axis_in_landscape_right() {
        let mut tracked = tracked(default_camera_pose());
        tracked.intrinsics = CameraIntrinsics::centered(1500.0, 1920, 1440);
        let pose = update_pose(&tracked, Some(InterfaceOrientation::LandscapeRight), extent(1920, 1440), 0.01, 100.0).unwrap();
        let mut camera = Camera::default();
        camera.apply_pose(pose);

        let ray = camera.screen_to_world_ray(Vec2::zeros()).unwrap();
        let forward = -tracked.transform.column(2).xyz();
        assert_relative_eq!(ray.direction, forward.normalize(), epsilon = 1e-4);
    }

    #[test]
    fn test_portrait_view_rolls_camera() {
        let view = oriented_view_matrix(&Mat4::identity(), InterfaceOrientation::Portrait).unwrap();
        // Sensor +X (landscape right) is "down" in portrait camera space.
        let rolled = view * Vec4::new(1.0, 0.0, -1.0, 1.0);
        assert_relative_eq!(rolled.xyz(), Vec3::new(0.0, -1.0, -1.0), epsilon = 1e-6);
    }
}
