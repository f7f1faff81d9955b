//! Frame snapshots delivered by the tracking service
//!
//! A [`FrameSnapshot`] is immutable once captured. The tick that polls it
//! owns the `Arc` for the remainder of that tick and drops it at tick end.

use std::sync::Arc;

use ash::vk;

use crate::foundation::math::{utils, Mat4, Vec3};

/// Sample layout of one plane of a planar camera image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneFormat {
    /// Single-channel 8-bit (Y / luma)
    Luma8,
    /// Two-channel 8-bit interleaved (CbCr / chroma)
    Chroma8x2,
}

impl PlaneFormat {
    /// Bytes per sample
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Luma8 => 1,
            Self::Chroma8x2 => 2,
        }
    }

    /// Sampleable Vulkan format for a texture view of this plane
    pub const fn to_vk(self) -> vk::Format {
        match self {
            Self::Luma8 => vk::Format::R8_UNORM,
            Self::Chroma8x2 => vk::Format::R8G8_UNORM,
        }
    }
}

/// One 2D sample plane of a camera image
#[derive(Debug, Clone)]
pub struct ImagePlane {
    /// Width in samples
    pub width: u32,
    /// Height in rows
    pub height: u32,
    /// Row stride in bytes (may exceed `width * bytes_per_pixel`)
    pub bytes_per_row: usize,
    /// Sample layout
    pub format: PlaneFormat,
    /// Raw plane bytes, `bytes_per_row * height` long
    pub data: Arc<[u8]>,
}

impl ImagePlane {
    /// Create a tightly packed plane
    pub fn packed(width: u32, height: u32, format: PlaneFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bytes_per_row: width as usize * format.bytes_per_pixel(),
            format,
            data: data.into(),
        }
    }

    /// Whether the plane is non-empty and `data` covers every row at its stride
    pub fn is_complete(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.bytes_per_row >= self.width as usize * self.format.bytes_per_pixel()
            && self.data.len() >= self.bytes_per_row * self.height as usize
    }

    /// Sample bytes at `(x, y)`; `None` outside the plane
    pub fn sample(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.bytes_per_row + x as usize * bpp;
        self.data.get(offset..offset + bpp)
    }
}

/// A camera image made of separate luma and chroma planes (bi-planar YCbCr)
#[derive(Debug, Clone, Default)]
pub struct PlanarImage {
    /// Planes in capture order: luma first, chroma second
    pub planes: Vec<ImagePlane>,
}

impl PlanarImage {
    /// Number of planes
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Plane at `index`
    pub fn plane(&self, index: usize) -> Option<&ImagePlane> {
        self.planes.get(index)
    }

    /// Full-resolution size (size of the luma plane)
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.planes.first().map(|plane| (plane.width, plane.height))
    }
}

/// Pinhole intrinsics in image pixels of the sensor-oriented image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraIntrinsics {
    /// Focal length along x in pixels
    pub fx: f32,
    /// Focal length along y in pixels
    pub fy: f32,
    /// Principal point x in pixels
    pub cx: f32,
    /// Principal point y in pixels
    pub cy: f32,
}

impl CameraIntrinsics {
    /// Intrinsics with the principal point at the image center
    pub fn centered(focal_length: f32, width: u32, height: u32) -> Self {
        Self {
            fx: focal_length,
            fy: focal_length,
            cx: width as f32 * 0.5,
            cy: height as f32 * 0.5,
        }
    }
}

/// Quality of the tracking service's pose estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    /// No pose available
    #[default]
    NotAvailable,
    /// Pose available but of questionable quality
    Limited,
    /// Pose is reliable
    Normal,
}

/// Camera state captured with a frame
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedCamera {
    /// Camera-to-world transform in the sensor's native (landscape-right) orientation.
    /// Camera space is right-handed: +X right, +Y up, -Z forward.
    pub transform: Mat4,
    /// Pinhole intrinsics of the captured image
    pub intrinsics: CameraIntrinsics,
    /// Captured image size in pixels (sensor orientation)
    pub image_resolution: (u32, u32),
    /// Pose quality
    pub tracking_state: TrackingState,
}

impl TrackedCamera {
    /// Camera position in world space
    pub fn position(&self) -> Vec3 {
        utils::translation_of(&self.transform)
    }
}

/// One frame from the tracking service
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    /// Monotonic frame counter assigned by the tracking service
    pub sequence: u64,
    /// Capture time in seconds
    pub timestamp: f64,
    /// Camera pose and projection parameters
    pub camera: TrackedCamera,
    /// Captured camera image
    pub captured_image: PlanarImage,
}
