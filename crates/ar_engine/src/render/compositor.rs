//! Frame compositor
//!
//! Every frame is two passes into the same target, always in this order:
//! the camera background, then the virtual scene on top of it. Both passes
//! load the target instead of clearing it.

use crate::core::config::RenderConfig;
use crate::foundation::math::Mat4;
use crate::scene::ar_scene::ArScene;
use crate::scene::graph::Geometry;

use super::camera::Camera;
use super::gpu::{DrawGeometry, DrawItem, GpuBackend, GpuError, PassDescriptor, RenderTarget, UniformValue};
use super::texture_bridge::BridgedTextures;
use super::ycbcr::ycbcr_to_rgb_matrix;

/// Texture slot of the luma plane in the background shader
pub const LUMA_SLOT: u32 = 0;
/// Texture slot of the chroma plane in the background shader
pub const CHROMA_SLOT: u32 = 1;

/// Builds and submits the background and scene passes
#[derive(Debug, Clone)]
pub struct FrameCompositor {
    background_pass: PassDescriptor,
    scene_pass: PassDescriptor,
    frames_composited: u64,
}

impl FrameCompositor {
    /// Compositor for the configured pass state
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            background_pass: PassDescriptor::background(),
            scene_pass: PassDescriptor::scene(config),
            frames_composited: 0,
        }
    }

    /// Frames fully submitted so far
    pub fn frames_composited(&self) -> u64 {
        self.frames_composited
    }

    /// Background quad draw, if the background is visible and both textures exist
    pub fn background_draws(scene: &ArScene, textures: &BridgedTextures) -> Vec<DrawItem> {
        if !scene.is_background_visible() {
            return Vec::new();
        }
        let Some((luma, chroma)) = textures.pair() else {
            log::trace!("Background textures incomplete; skipping background draw");
            return Vec::new();
        };

        let quad = scene.background_quad();
        vec![DrawItem {
            label: "Video Mesh".to_string(),
            geometry: DrawGeometry::Quad {
                vertex_bytes: quad.as_bytes().to_vec(),
                vertex_count: quad.vertices().len() as u32,
            },
            model: Mat4::identity(),
            // Orthographic identity camera: vertices are already in clip space.
            view_projection: Mat4::identity(),
            textures: vec![(LUMA_SLOT, luma), (CHROMA_SLOT, chroma)],
            uniforms: vec![("ycbcrToRgb", UniformValue::Mat4(ycbcr_to_rgb_matrix()))],
        }]
    }

    /// Draws for every visible mesh under the scene root
    pub fn scene_draws(scene: &ArScene, camera: &Camera) -> Vec<DrawItem> {
        let view_projection = camera.get_view_projection_matrix();
        let time = scene.material().time;

        scene
            .graph()
            .collect_drawables(scene.root())
            .into_iter()
            .filter_map(|drawable| {
                let geometry = match drawable.geometry {
                    Geometry::IcoSphere { radius, subdivisions } => DrawGeometry::IcoSphere { radius, subdivisions },
                    Geometry::BackgroundQuad => return None,
                };
                Some(DrawItem {
                    label: drawable.label,
                    geometry,
                    model: drawable.world_transform,
                    view_projection,
                    textures: Vec::new(),
                    uniforms: vec![("time", UniformValue::Float(time))],
                })
            })
            .collect()
    }

    /// Submit the background pass, then the scene pass
    pub fn draw<G: GpuBackend + ?Sized>(
        &mut self,
        gpu: &mut G,
        target: &RenderTarget,
        scene: &ArScene,
        camera: &Camera,
        textures: &BridgedTextures,
    ) -> Result<(), GpuError> {
        let background = Self::background_draws(scene, textures);
        gpu.submit_pass(target, &self.background_pass, &background)?;

        let content = Self::scene_draws(scene, camera);
        gpu.submit_pass(target, &self.scene_pass, &content)?;

        self.frames_composited += 1;
        log::trace!(
            "Composited frame {} ({} background, {} scene draws)",
            self.frames_composited, background.len(), content.len()
        );
        Ok(())
    }
}
