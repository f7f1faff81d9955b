//! Rendering: camera image bridging, background remapping, camera math and composition

pub mod background;
pub mod camera;
pub mod compositor;
pub mod display;
pub mod gpu;
pub mod headless;
pub mod texture_bridge;
pub mod ycbcr;

pub use background::{BackgroundQuad, BackgroundUvRemapper, QuadVertex, RemapOutcome};
pub use camera::{Camera, CameraPose, CameraPoseAdapter};
pub use compositor::FrameCompositor;
pub use display::{DisplayTransform, InterfaceOrientation};
pub use gpu::{
    DrawGeometry, DrawItem, GpuBackend, GpuError, PassDescriptor, RenderTarget, TextureCache,
    TextureCacheError, TextureHandle,
};
pub use headless::{HeadlessGpu, HeadlessTextureCache};
pub use texture_bridge::{BridgeOutcome, BridgedTextures, PlanarTextureBridge};
