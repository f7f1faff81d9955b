//! Headless GPU backend
//!
//! Records submitted passes instead of executing them. Used by the viewer
//! when no device is attached and by tests to observe what the renderer
//! would have drawn.

use std::collections::HashMap;

use ash::vk;

use crate::tracking::frame::PlanarImage;

use super::gpu::{
    DrawItem, GpuBackend, GpuError, PassDescriptor, RenderTarget, TextureCache, TextureCacheError,
    TextureHandle,
};

/// Metadata of a texture created by [`HeadlessTextureCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    /// Source plane
    pub plane_index: usize,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Texel format
    pub format: vk::Format,
}

/// Texture cache that hands out handles without touching a device
///
/// Creating a texture for a plane index releases the previous texture for
/// that index, so at most one texture per plane is live.
#[derive(Debug, Default)]
pub struct HeadlessTextureCache {
    next_handle: u64,
    live: HashMap<TextureHandle, TextureInfo>,
    by_plane: HashMap<usize, TextureHandle>,
    created: u64,
    fail_creation: bool,
}

impl HeadlessTextureCache {
    /// Empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent creation fail (fault injection)
    pub fn set_fail_creation(&mut self, fail: bool) {
        self.fail_creation = fail;
    }

    /// Metadata of a live texture
    pub fn texture(&self, handle: TextureHandle) -> Option<&TextureInfo> {
        self.live.get(&handle)
    }

    /// Textures currently alive
    pub fn live_texture_count(&self) -> usize {
        self.live.len()
    }

    /// Textures created over the cache's lifetime
    pub fn textures_created(&self) -> u64 {
        self.created
    }
}

impl TextureCache for HeadlessTextureCache {
    fn create_texture_from_plane(
        &mut self,
        image: &PlanarImage,
        plane_index: usize,
        format: vk::Format,
    ) -> Result<TextureHandle, TextureCacheError> {
        if self.fail_creation {
            return Err(TextureCacheError::CreationFailed("creation disabled".into()));
        }

        let plane = image
            .plane(plane_index)
            .ok_or(TextureCacheError::MissingPlane(plane_index))?;
        if plane.width == 0 || plane.height == 0 {
            return Err(TextureCacheError::EmptyPlane { plane: plane_index });
        }
        if plane.format.to_vk() != format {
            return Err(TextureCacheError::FormatMismatch { plane: plane_index, requested: format });
        }

        self.next_handle += 1;
        let handle = TextureHandle(self.next_handle);
        self.live.insert(handle, TextureInfo {
            plane_index,
            width: plane.width,
            height: plane.height,
            format,
        });
        if let Some(previous) = self.by_plane.insert(plane_index, handle) {
            self.live.remove(&previous);
        }
        self.created += 1;

        log::trace!("Created {:?} texture {:?} for plane {}", format, handle, plane_index);
        Ok(handle)
    }
}

impl Drop for HeadlessTextureCache {
    fn drop(&mut self) {
        if !self.live.is_empty() {
            log::debug!("Releasing {} headless textures", self.live.len());
        }
    }
}

/// A pass as received by [`HeadlessGpu`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPass {
    /// Target the pass rendered into
    pub target: RenderTarget,
    /// Pass state
    pub pass: PassDescriptor,
    /// Draws in submission order
    pub draws: Vec<DrawItem>,
}

/// GPU backend that records passes
#[derive(Debug, Default)]
pub struct HeadlessGpu {
    extent: vk::Extent2D,
    passes: Vec<RecordedPass>,
    fail_cache_creation: bool,
}

impl HeadlessGpu {
    /// Backend with no passes recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to create texture caches (fault injection)
    #[must_use]
    pub fn without_texture_cache(mut self) -> Self {
        self.fail_cache_creation = true;
        self
    }

    /// Passes submitted since the last [`take_passes`](Self::take_passes)
    pub fn passes(&self) -> &[RecordedPass] {
        &self.passes
    }

    /// Drain recorded passes
    pub fn take_passes(&mut self) -> Vec<RecordedPass> {
        std::mem::take(&mut self.passes)
    }

    /// Last size reported through [`GpuBackend::resize`]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl GpuBackend for HeadlessGpu {
    type TextureCache = HeadlessTextureCache;

    fn create_texture_cache(&mut self) -> Result<HeadlessTextureCache, GpuError> {
        if self.fail_cache_creation {
            return Err(GpuError::TextureCacheCreation("no device".into()));
        }
        Ok(HeadlessTextureCache::new())
    }

    fn submit_pass(
        &mut self,
        target: &RenderTarget,
        pass: &PassDescriptor,
        draws: &[DrawItem],
    ) -> Result<(), GpuError> {
        if target.extent.width == 0 || target.extent.height == 0 {
            return Err(GpuError::EmptyTarget);
        }
        self.passes.push(RecordedPass {
            target: *target,
            pass: pass.clone(),
            draws: draws.to_vec(),
        });
        Ok(())
    }

    fn resize(&mut self, extent: vk::Extent2D) {
        self.extent = extent;
    }
}
