//! GPU collaborator interface
//!
//! Device, swapchain and command submission live outside this crate. The
//! renderer talks to them through [`GpuBackend`] (pass submission, resize)
//! and [`TextureCache`] (zero-copy texture views over camera image planes).

use ash::vk;
use thiserror::Error;

use crate::core::config::RenderConfig;
use crate::foundation::math::Mat4;
use crate::tracking::frame::PlanarImage;

/// Handle to a GPU texture created by a [`TextureCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Texture-cache errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextureCacheError {
    /// The image has no plane at this index
    #[error("image has no plane {0}")]
    MissingPlane(usize),
    /// The plane has zero width or height
    #[error("plane {plane} has zero extent")]
    EmptyPlane { plane: usize },
    /// The requested format does not match the plane layout
    #[error("format {requested:?} does not match plane {plane}")]
    FormatMismatch { plane: usize, requested: vk::Format },
    /// The backend refused to create the texture
    #[error("texture creation failed: {0}")]
    CreationFailed(String),
}

/// GPU backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GpuError {
    /// The device could not provide a texture cache
    #[error("texture cache creation failed: {0}")]
    TextureCacheCreation(String),
    /// The backend rejected a pass
    #[error("pass '{label}' submission failed: {reason}")]
    Submission { label: String, reason: String },
    /// The render target has no pixels
    #[error("render target has zero extent")]
    EmptyTarget,
}

/// Creates GPU textures that alias camera image planes without copying
pub trait TextureCache {
    /// Create a texture viewing plane `plane_index` of `image` as `format`
    fn create_texture_from_plane(
        &mut self,
        image: &PlanarImage,
        plane_index: usize,
        format: vk::Format,
    ) -> Result<TextureHandle, TextureCacheError>;
}

/// How a draw's output combines with the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Overwrite; source alpha is ignored
    #[default]
    Opaque,
    /// Premultiplied-alpha "over"
    PremultipliedAlpha,
}

/// Depth-test state of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthState {
    /// Depth attachment format
    pub format: vk::Format,
    /// Depth load operation
    pub load_op: vk::AttachmentLoadOp,
    /// Depth comparison
    pub compare_op: vk::CompareOp,
    /// Whether passing fragments write depth
    pub write: bool,
}

/// Render pass description handed to the backend
#[derive(Debug, Clone, PartialEq)]
pub struct PassDescriptor {
    /// Pass name for logs and inspection
    pub label: &'static str,
    /// Color attachment load operation
    pub color_load_op: vk::AttachmentLoadOp,
    /// Only used when `color_load_op` is `CLEAR`
    pub clear_color: [f32; 4],
    /// `None` disables depth testing
    pub depth: Option<DepthState>,
    /// Color blending
    pub blend: BlendMode,
    /// MSAA sample count
    pub samples: vk::SampleCountFlags,
}

impl PassDescriptor {
    /// Full-screen camera background: keeps existing target contents, no depth test
    pub fn background() -> Self {
        Self {
            label: "Background",
            color_load_op: vk::AttachmentLoadOp::LOAD,
            clear_color: [0.0; 4],
            depth: None,
            blend: BlendMode::Opaque,
            samples: vk::SampleCountFlags::TYPE_1,
        }
    }

    /// Virtual content drawn over the background with depth testing
    pub fn scene(config: &RenderConfig) -> Self {
        Self {
            label: "Scene",
            color_load_op: vk::AttachmentLoadOp::LOAD,
            clear_color: config.clear_color,
            depth: Some(DepthState {
                format: config.depth_format.to_vk(),
                load_op: vk::AttachmentLoadOp::CLEAR,
                compare_op: vk::CompareOp::LESS,
                write: true,
            }),
            blend: BlendMode::PremultipliedAlpha,
            samples: sample_count_flags(config.sample_count),
        }
    }
}

/// Map a sample count to Vulkan flags, falling back to single sampling
pub fn sample_count_flags(samples: u32) -> vk::SampleCountFlags {
    match samples {
        2 => vk::SampleCountFlags::TYPE_2,
        4 => vk::SampleCountFlags::TYPE_4,
        8 => vk::SampleCountFlags::TYPE_8,
        _ => vk::SampleCountFlags::TYPE_1,
    }
}

/// Geometry referenced by a draw
#[derive(Debug, Clone, PartialEq)]
pub enum DrawGeometry {
    /// Interleaved quad vertices (triangle strip), already in clip space
    Quad { vertex_bytes: Vec<u8>, vertex_count: u32 },
    /// Procedural icosphere
    IcoSphere { radius: f32, subdivisions: u32 },
}

/// Named shader parameter
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// Scalar
    Float(f32),
    /// 4x4 matrix
    Mat4(Mat4),
}

/// One draw submitted within a pass
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    /// Label of the drawn node
    pub label: String,
    /// Geometry to draw
    pub geometry: DrawGeometry,
    /// Model-to-world transform
    pub model: Mat4,
    /// World-to-clip transform
    pub view_projection: Mat4,
    /// Texture bindings as `(slot, handle)`
    pub textures: Vec<(u32, TextureHandle)>,
    /// Named shader parameters
    pub uniforms: Vec<(&'static str, UniformValue)>,
}

/// Surface a tick renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    /// Size in pixels
    pub extent: vk::Extent2D,
    /// Color attachment format
    pub color_format: vk::Format,
}

impl RenderTarget {
    /// Target of the given size in the default color format
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            extent: vk::Extent2D { width, height },
            color_format: vk::Format::B8G8R8A8_UNORM,
        }
    }
}

/// Device-side collaborator
pub trait GpuBackend {
    type TextureCache: TextureCache;

    /// Create the texture cache used to view camera image planes
    fn create_texture_cache(&mut self) -> Result<Self::TextureCache, GpuError>;

    /// Record and submit one pass
    fn submit_pass(
        &mut self,
        target: &RenderTarget,
        pass: &PassDescriptor,
        draws: &[DrawItem],
    ) -> Result<(), GpuError>;

    /// The drawable surface changed size
    fn resize(&mut self, extent: vk::Extent2D);
}
