//! Background quad and UV remapping
//!
//! The camera image is drawn on a full-screen quad. Its texture coordinates
//! are recomputed whenever the viewport or orientation changes, so the
//! upright, aspect-filled image covers the viewport exactly.

use ash::vk;
use bytemuck::{Pod, Zeroable};

use crate::foundation::math::Vec2;

use super::display::{DisplayTransform, InterfaceOrientation};

/// Background quad vertex: clip-space position and image UV
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    /// Clip-space position
    pub position: [f32; 4],
    /// Camera image coordinate
    pub uv: [f32; 2],
}

impl QuadVertex {
    const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { position: [x, y, 0.0, 1.0], uv: [u, v] }
    }
}

/// Full-screen quad as a triangle strip: top-left, top-right, bottom-left, bottom-right
///
/// Positions are in Vulkan clip space (y down), so view-normalized
/// coordinates equal the canonical UVs.
pub const CANONICAL_QUAD: [QuadVertex; 4] = [
    QuadVertex::new(-1.0, -1.0, 0.0, 0.0),
    QuadVertex::new(1.0, -1.0, 1.0, 0.0),
    QuadVertex::new(-1.0, 1.0, 0.0, 1.0),
    QuadVertex::new(1.0, 1.0, 1.0, 1.0),
];

/// The background geometry
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundQuad {
    vertices: [QuadVertex; 4],
}

impl Default for BackgroundQuad {
    fn default() -> Self {
        Self { vertices: CANONICAL_QUAD }
    }
}

impl BackgroundQuad {
    /// The four vertices in strip order
    pub fn vertices(&self) -> &[QuadVertex; 4] {
        &self.vertices
    }

    /// Current texture coordinates in vertex order
    pub fn uvs(&self) -> [Vec2; 4] {
        self.vertices.map(|vertex| Vec2::new(vertex.uv[0], vertex.uv[1]))
    }

    /// Vertex data as uploaded to the GPU
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Map every canonical UV through `view_to_image`
    fn apply(&mut self, view_to_image: &DisplayTransform) {
        for (vertex, canonical) in self.vertices.iter_mut().zip(CANONICAL_QUAD.iter()) {
            let uv = view_to_image.apply(Vec2::new(canonical.uv[0], canonical.uv[1]));
            vertex.uv = [uv.x, uv.y];
        }
    }
}

/// Compute the background quad for an image shown in `orientation` on `viewport`
///
/// `None` when the sizes are degenerate.
pub fn remap_quad(
    image_resolution: (u32, u32),
    orientation: InterfaceOrientation,
    viewport: vk::Extent2D,
) -> Option<BackgroundQuad> {
    let view_to_image = DisplayTransform::for_orientation(image_resolution, orientation, viewport)?.inverse()?;
    let mut quad = BackgroundQuad::default();
    quad.apply(&view_to_image);
    Some(quad)
}

/// Result of [`BackgroundUvRemapper::remap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapOutcome {
    /// UVs were recomputed
    Remapped,
    /// Nothing changed since the last remap
    Clean,
    /// A remap is pending but orientation or viewport is unknown
    Deferred,
}

/// Recomputes background UVs when the viewport or orientation changes
#[derive(Debug)]
pub struct BackgroundUvRemapper {
    dirty: bool,
}

impl Default for BackgroundUvRemapper {
    fn default() -> Self {
        Self { dirty: true }
    }
}

impl BackgroundUvRemapper {
    /// New remapper; the first frame always triggers a remap
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a remap on the next frame
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the next remap will recompute UVs
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Remap `quad` if a change is pending
    ///
    /// A pending remap stays pending until orientation and viewport are both
    /// known.
    pub fn remap(
        &mut self,
        quad: &mut BackgroundQuad,
        image_resolution: (u32, u32),
        orientation: Option<InterfaceOrientation>,
        viewport: vk::Extent2D,
    ) -> RemapOutcome {
        if !self.dirty {
            return RemapOutcome::Clean;
        }
        let Some(orientation) = orientation else {
            log::debug!("Interface orientation unknown; deferring background remap");
            return RemapOutcome::Deferred;
        };
        let Some(remapped) = remap_quad(image_resolution, orientation, viewport) else {
            log::debug!(
                "Cannot remap {:?} image into {}x{} viewport yet",
                image_resolution, viewport.width, viewport.height
            );
            return RemapOutcome::Deferred;
        };

        *quad = remapped;
        self.dirty = false;
        log::debug!(
            "Background remapped for {:?} at {}x{}",
            orientation, viewport.width, viewport.height
        );
        RemapOutcome::Remapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    #[test]
    fn test_vertex_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 24);
        assert_eq!(BackgroundQuad::default().as_bytes().len(), 96);
    }

    #[test]
    fn test_portrait_remap_rotates_corners() {
        let quad = remap_quad((640, 480), InterfaceOrientation::Portrait, extent(480, 640)).unwrap();
        let uvs = quad.uvs();
        // View top-left samples the sensor's bottom-left.
        assert_relative_eq!(uvs[0], Vec2::new(0.0, 1.0), epsilon = 1e-6);
        assert_relative_eq!(uvs[1], Vec2::new(0.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(uvs[3], Vec2::new(1.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_remapped_uvs_stay_in_unit_square() {
        for orientation in InterfaceOrientation::ALL {
            for &(w, h) in &[(1170, 2532), (2532, 1170), (750, 1334), (1, 1000), (1000, 1)] {
                let quad = remap_quad((1920, 1440), orientation, extent(w, h)).unwrap();
                for uv in quad.uvs() {
                    assert!((-1e-5..=1.0 + 1e-5).contains(&uv.x), "{:?} {}x{}: {:?}", orientation, w, h, uv);
                    assert!((-1e-5..=1.0 + 1e-5).contains(&uv.y), "{:?} {}x{}: {:?}", orientation, w, h, uv);
                }
            }
        }
    }

    #[test]
    fn test_remap_without_orientation_stays_dirty() {
        let mut remapper = BackgroundUvRemapper::new();
        let mut quad = BackgroundQuad::default();
        assert_eq!(remapper.remap(&mut quad, (640, 480), None, extent(480, 640)), RemapOutcome::Deferred);
        assert!(remapper.is_dirty());
        assert_eq!(quad, BackgroundQuad::default());

        assert_eq!(
            remapper.remap(&mut quad, (640, 480), Some(InterfaceOrientation::Portrait), extent(480, 640)),
            RemapOutcome::Remapped
        );
        assert!(!remapper.is_dirty());
        assert_eq!(
            remapper.remap(&mut quad, (640, 480), Some(InterfaceOrientation::Portrait), extent(480, 640)),
            RemapOutcome::Clean
        );
    }

    #[test]
    fn test_zero_viewport_defers() {
        let mut remapper = BackgroundUvRemapper::new();
        let mut quad = BackgroundQuad::default();
        let outcome = remapper.remap(&mut quad, (640, 480), Some(InterfaceOrientation::Portrait), extent(0, 0));
        assert_eq!(outcome, RemapOutcome::Deferred);
        assert!(remapper.is_dirty());
    }
}
