//! Display orientation and the image-to-view display transform
//!
//! The camera sensor always captures in its native landscape-right
//! orientation. [`DisplayTransform`] maps normalized captured-image
//! coordinates (origin top-left, `[0, 1]` on both axes) to normalized view
//! coordinates for a given interface orientation and viewport, rotating the
//! image upright and scaling it to aspect-fill the viewport.
//!
//! The rotation used here and the camera rotation in
//! [`camera`](super::camera) describe the same physical turn, which keeps
//! the background image and the projected scene aligned.

use ash::vk;

use crate::foundation::math::{constants, Mat2x3, Mat3, Vec2, Vec3};

/// Interface orientation of the display surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceOrientation {
    /// Upright portrait
    Portrait,
    /// Portrait, rotated 180 degrees
    PortraitUpsideDown,
    /// Landscape, top of the device to the left
    LandscapeLeft,
    /// Landscape, top of the device to the right (the sensor's native orientation)
    LandscapeRight,
}

impl InterfaceOrientation {
    /// All four cardinal orientations
    pub const ALL: [Self; 4] = [
        Self::Portrait,
        Self::PortraitUpsideDown,
        Self::LandscapeLeft,
        Self::LandscapeRight,
    ];

    /// Rotation about the camera's Z axis from the sensor orientation to this one, in radians
    pub fn rotation_angle(self) -> f32 {
        match self {
            Self::LandscapeRight => 0.0,
            Self::Portrait => constants::HALF_PI,
            Self::LandscapeLeft => constants::PI,
            Self::PortraitUpsideDown => -constants::HALF_PI,
        }
    }

    /// Whether width and height swap relative to the sensor image
    pub const fn is_portrait(self) -> bool {
        matches!(self, Self::Portrait | Self::PortraitUpsideDown)
    }

    /// Rotation of normalized image coordinates into this orientation
    #[rustfmt::skip]
    fn image_rotation(self) -> Mat3 {
        match self {
            Self::LandscapeRight => Mat3::identity(),
            Self::Portrait => Mat3::new(
                0.0, -1.0, 1.0,
                1.0,  0.0, 0.0,
                0.0,  0.0, 1.0,
            ),
            Self::LandscapeLeft => Mat3::new(
                -1.0,  0.0, 1.0,
                 0.0, -1.0, 1.0,
                 0.0,  0.0, 1.0,
            ),
            Self::PortraitUpsideDown => Mat3::new(
                 0.0, 1.0, 0.0,
                -1.0, 0.0, 1.0,
                 0.0, 0.0, 1.0,
            ),
        }
    }

    /// Rotate a normalized sensor-image point into this orientation
    pub fn rotate_image_point(self, point: Vec2) -> Vec2 {
        let rotated = self.image_rotation() * Vec3::new(point.x, point.y, 1.0);
        Vec2::new(rotated.x, rotated.y)
    }

    /// Image size as seen in this orientation
    pub fn oriented_size(self, (width, height): (u32, u32)) -> (f32, f32) {
        if self.is_portrait() {
            (height as f32, width as f32)
        } else {
            (width as f32, height as f32)
        }
    }
}

/// Aspect-fill scale: image pixels to viewport pixels
///
/// `None` when either size is degenerate.
pub fn aspect_fill_scale(oriented_image: (f32, f32), viewport: vk::Extent2D) -> Option<f32> {
    let (image_width, image_height) = oriented_image;
    if viewport.width == 0 || viewport.height == 0 || image_width <= 0.0 || image_height <= 0.0 {
        return None;
    }
    let scale_x = viewport.width as f32 / image_width;
    let scale_y = viewport.height as f32 / image_height;
    Some(scale_x.max(scale_y))
}

/// 2D affine transform between normalized image and view coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    matrix: Mat3,
}

impl DisplayTransform {
    /// Identity transform
    pub fn identity() -> Self {
        Self { matrix: Mat3::identity() }
    }

    /// Transform for an image of `image_resolution` (sensor orientation) shown
    /// upright in `orientation`, aspect-filling `viewport`
    pub fn for_orientation(
        image_resolution: (u32, u32),
        orientation: InterfaceOrientation,
        viewport: vk::Extent2D,
    ) -> Option<Self> {
        let oriented = orientation.oriented_size(image_resolution);
        let scale = aspect_fill_scale(oriented, viewport)?;

        // Fraction of the oriented image visible along each axis (<= 1).
        let visible_x = viewport.width as f32 / (scale * oriented.0);
        let visible_y = viewport.height as f32 / (scale * oriented.1);

        #[rustfmt::skip]
        let fill = Mat3::new(
            1.0 / visible_x, 0.0, 0.5 - 0.5 / visible_x,
            0.0, 1.0 / visible_y, 0.5 - 0.5 / visible_y,
            0.0, 0.0, 1.0,
        );

        Some(Self { matrix: fill * orientation.image_rotation() })
    }

    /// Apply to a point
    pub fn apply(&self, point: Vec2) -> Vec2 {
        let transformed = self.matrix * Vec3::new(point.x, point.y, 1.0);
        Vec2::new(transformed.x, transformed.y)
    }

    /// Inverse transform (view to image); `None` if degenerate
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }

    /// The 2x3 affine form `[a c tx; b d ty]`
    pub fn affine(&self) -> Mat2x3 {
        self.matrix.fixed_view::<2, 3>(0, 0).into_owned()
    }
}

impl Default for DisplayTransform {
    fn default() -> Self {
        Self::identity()
    }
}
