//! Planar YCbCr texture bridge
//!
//! Turns the luma and chroma planes of a captured camera image into two
//! GPU textures through a [`TextureCache`]. Frames with fewer than two
//! planes are ignored and the previously bridged textures stay bound.

use crate::tracking::frame::{FrameSnapshot, PlanarImage, PlaneFormat};

use super::gpu::{TextureCache, TextureHandle};

/// Plane index of the luma (Y) plane
pub const LUMA_PLANE: usize = 0;
/// Plane index of the chroma (CbCr) plane
pub const CHROMA_PLANE: usize = 1;

/// Textures currently bound for the background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BridgedTextures {
    /// Luma (Y) texture, bound to slot 0
    pub luma: Option<TextureHandle>,
    /// Chroma (CbCr) texture, bound to slot 1
    pub chroma: Option<TextureHandle>,
}

impl BridgedTextures {
    /// Both textures, if both exist
    pub fn pair(&self) -> Option<(TextureHandle, TextureHandle)> {
        Some((self.luma?, self.chroma?))
    }
}

/// Result of [`PlanarTextureBridge::update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// Textures were recreated from the frame
    Bridged,
    /// The frame was already bridged on an earlier tick
    AlreadyCurrent,
    /// The image had fewer than two planes; textures are unchanged
    InsufficientPlanes(usize),
}

/// Create a texture for one plane
///
/// Returns `None` when the plane is missing, has an unexpected layout, or the
/// cache fails. Failures are logged and never escalate.
pub fn bridge_plane<C: TextureCache + ?Sized>(
    cache: &mut C,
    image: &PlanarImage,
    plane_index: usize,
    format: PlaneFormat,
) -> Option<TextureHandle> {
    let plane = image.plane(plane_index)?;
    if plane.format != format {
        log::warn!(
            "Plane {} has layout {:?}, expected {:?}; not bridging",
            plane_index, plane.format, format
        );
        return None;
    }

    match cache.create_texture_from_plane(image, plane_index, format.to_vk()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("Failed to create texture for plane {}: {}", plane_index, e);
            None
        }
    }
}

/// Keeps the luma/chroma texture pair in step with captured frames
#[derive(Debug, Default)]
pub struct PlanarTextureBridge {
    textures: BridgedTextures,
    last_sequence: Option<u64>,
}

impl PlanarTextureBridge {
    /// Bridge with no textures
    pub fn new() -> Self {
        Self::default()
    }

    /// Bridge the frame's captured image if it has not been bridged yet
    pub fn update<C: TextureCache + ?Sized>(&mut self, cache: &mut C, frame: &FrameSnapshot) -> BridgeOutcome {
        let image = &frame.captured_image;
        let planes = image.plane_count();
        if planes < 2 {
            log::debug!("Frame {} has {} image plane(s); keeping previous textures", frame.sequence, planes);
            return BridgeOutcome::InsufficientPlanes(planes);
        }
        if self.last_sequence == Some(frame.sequence) {
            return BridgeOutcome::AlreadyCurrent;
        }

        self.textures = BridgedTextures {
            luma: bridge_plane(cache, image, LUMA_PLANE, PlaneFormat::Luma8),
            chroma: bridge_plane(cache, image, CHROMA_PLANE, PlaneFormat::Chroma8x2),
        };
        self.last_sequence = Some(frame.sequence);
        BridgeOutcome::Bridged
    }

    /// Currently bound textures
    pub fn textures(&self) -> BridgedTextures {
        self.textures
    }

    /// Forget which frame was bridged last but keep the textures bound
    ///
    /// Called when the session restarts and may reuse frame sequence numbers.
    pub fn forget_sequence(&mut self) {
        self.last_sequence = None;
    }

    /// Forget all textures (the cache that created them is going away)
    pub fn clear(&mut self) {
        self.textures = BridgedTextures::default();
        self.last_sequence = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4;
    use crate::render::headless::HeadlessTextureCache;
    use crate::tracking::frame::{CameraIntrinsics, TrackedCamera, TrackingState};
    use crate::tracking::simulated::synthetic_ycbcr;

    fn frame(sequence: u64, image: PlanarImage) -> FrameSnapshot {
        FrameSnapshot {
            sequence,
            timestamp: sequence as f64 / 60.0,
            camera: TrackedCamera {
                transform: Mat4::identity(),
                intrinsics: CameraIntrinsics::centered(100.0, 16, 16),
                image_resolution: (16, 16),
                tracking_state: TrackingState::Normal,
            },
            captured_image: image,
        }
    }

    #[test]
    fn test_two_plane_frame_yields_both_textures() {
        let mut cache = HeadlessTextureCache::new();
        let mut bridge = PlanarTextureBridge::new();
        assert_eq!(bridge.update(&mut cache, &frame(1, synthetic_ycbcr(16, 16))), BridgeOutcome::Bridged);

        let (luma, chroma) = bridge.textures().pair().unwrap();
        assert_eq!(cache.texture(luma).unwrap().width, 16);
        assert_eq!(cache.texture(chroma).unwrap().width, 8);
    }

    #[test]
    fn test_single_plane_frame_keeps_previous_textures() {
        let mut cache = HeadlessTextureCache::new();
        let mut bridge = PlanarTextureBridge::new();
        bridge.update(&mut cache, &frame(1, synthetic_ycbcr(16, 16)));
        let before = bridge.textures();

        let mut luma_only = synthetic_ycbcr(16, 16);
        luma_only.planes.truncate(1);
        assert_eq!(bridge.update(&mut cache, &frame(2, luma_only)), BridgeOutcome::InsufficientPlanes(1));
        assert_eq!(bridge.textures(), before);
        assert_eq!(cache.textures_created(), 2);
    }

    #[test]
    fn test_same_frame_is_bridged_once() {
        let mut cache = HeadlessTextureCache::new();
        let mut bridge = PlanarTextureBridge::new();
        let snapshot = frame(7, synthetic_ycbcr(16, 16));
        bridge.update(&mut cache, &snapshot);
        assert_eq!(bridge.update(&mut cache, &snapshot), BridgeOutcome::AlreadyCurrent);
        assert_eq!(cache.textures_created(), 2);
    }

    #[test]
    fn test_forgotten_sequence_bridges_reused_number() {
        let mut cache = HeadlessTextureCache::new();
        let mut bridge = PlanarTextureBridge::new();
        bridge.update(&mut cache, &frame(1, synthetic_ycbcr(16, 16)));
        let before = bridge.textures();

        bridge.forget_sequence();
        assert_eq!(bridge.textures(), before);
        assert_eq!(bridge.update(&mut cache, &frame(1, synthetic_ycbcr(16, 16))), BridgeOutcome::Bridged);
        assert_ne!(bridge.textures(), before);
        assert_eq!(cache.textures_created(), 4);
    }

    #[test]
    fn test_failed_creation_leaves_handle_absent() {
        let mut cache = HeadlessTextureCache::new();
        cache.set_fail_creation(true);
        let mut bridge = PlanarTextureBridge::new();
        assert_eq!(bridge.update(&mut cache, &frame(1, synthetic_ycbcr(16, 16))), BridgeOutcome::Bridged);
        assert_eq!(bridge.textures(), BridgedTextures::default());
        assert!(bridge.textures().pair().is_none());
    }

    #[test]
    fn test_bridge_plane_rejects_wrong_layout() {
        let mut cache = HeadlessTextureCache::new();
        let image = synthetic_ycbcr(16, 16);
        assert!(bridge_plane(&mut cache, &image, CHROMA_PLANE, PlaneFormat::Luma8).is_none());
        assert!(bridge_plane(&mut cache, &image, 3, PlaneFormat::Luma8).is_none());
    }
}
