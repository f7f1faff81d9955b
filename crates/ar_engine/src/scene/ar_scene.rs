//! AR scene: build phase, visibility gates and anchor binding
//!
//! The scene is built once, before the first tick:
//!
//! ```text
//! Scene (root, hidden until a frame or placement)
//! └── Content Container (hidden until placement)
//!     └── Content (icosphere, lifted to rest on the container origin)
//! Video Mesh (background quad, hidden until a frame)
//! ```
//!
//! After a placement the root follows an anchor. The [`AnchorBinding`] is a
//! plain record re-evaluated every tick, so anchor refinements move the
//! content without anyone holding a reference into the scene.

use crate::foundation::math::{Mat4, Vec3};
use crate::render::background::BackgroundQuad;
use crate::tracking::session::{AnchorId, TrackingSession};

use super::graph::{Geometry, NodeId, SceneGraph, SceneNode};

/// Radius of the placed content sphere in meters
pub const CONTENT_RADIUS: f32 = 0.25;

/// Subdivision level of the content sphere
pub const CONTENT_SUBDIVISIONS: u32 = 5;

/// Subscription of a scene node's transform to an anchor's transform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorBinding {
    /// Anchor whose transform is followed
    pub anchor: AnchorId,
    /// Node that receives the transform
    pub target: NodeId,
}

/// Parameters of the content material
#[derive(Debug, Clone, PartialEq)]
pub struct ContentMaterial {
    /// Material name
    pub label: String,
    /// Seconds since the renderer was created
    pub time: f32,
}

/// The AR scene
#[derive(Debug)]
pub struct ArScene {
    graph: SceneGraph,
    root: NodeId,
    content_container: NodeId,
    content: NodeId,
    background: NodeId,
    background_quad: BackgroundQuad,
    material: ContentMaterial,
    binding: Option<AnchorBinding>,
}

impl Default for ArScene {
    fn default() -> Self {
        Self::build()
    }
}

impl ArScene {
    /// Construct every node in dependency order
    pub fn build() -> Self {
        let mut graph = SceneGraph::new();

        let root = graph.add_root(SceneNode::new("Scene").hidden());
        let sphere = Geometry::IcoSphere { radius: CONTENT_RADIUS, subdivisions: CONTENT_SUBDIVISIONS };
        let lift = sphere
            .bounds()
            .map_or(0.0, |bounds| bounds.extents().y * 2.0);

        // Parents are inserted just above; a missing parent degrades to a top-level node.
        let content_container = graph
            .add_child(root, SceneNode::new("Content Container").hidden())
            .unwrap_or_else(|| graph.add_root(SceneNode::new("Content Container").hidden()));
        let content_node = SceneNode::new("Content")
            .with_geometry(sphere)
            .with_transform(Mat4::new_translation(&Vec3::new(0.0, lift, 0.0)));
        let content = graph
            .add_child(content_container, content_node.clone())
            .unwrap_or_else(|| graph.add_root(content_node));

        let background = graph.add_root(
            SceneNode::new("Video Mesh")
                .with_geometry(Geometry::BackgroundQuad)
                .hidden(),
        );

        log::debug!("AR scene built with {} nodes", graph.len());

        Self {
            graph,
            root,
            content_container,
            content,
            background,
            background_quad: BackgroundQuad::default(),
            material: ContentMaterial { label: "Blob".to_string(), time: 0.0 },
            binding: None,
        }
    }

    /// Underlying scene graph
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// The "Scene" root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node moved by placements
    pub fn content_container(&self) -> NodeId {
        self.content_container
    }

    /// The content sphere
    pub fn content(&self) -> NodeId {
        self.content
    }

    /// The "Video Mesh" background node
    pub fn background(&self) -> NodeId {
        self.background
    }

    /// Background vertices as last remapped
    pub fn background_quad(&self) -> &BackgroundQuad {
        &self.background_quad
    }

    /// Mutable background vertices for the remapper
    pub fn background_quad_mut(&mut self) -> &mut BackgroundQuad {
        &mut self.background_quad
    }

    /// Content material parameters
    pub fn material(&self) -> &ContentMaterial {
        &self.material
    }

    /// Write the time parameter of the content material
    pub fn set_time(&mut self, seconds: f32) {
        self.material.time = seconds;
    }

    /// A frame was processed: the root and the background become visible
    pub fn mark_frame_available(&mut self) {
        self.graph.set_visible(self.root, true);
        self.graph.set_visible(self.background, true);
    }

    /// Whether the background node is visible
    pub fn is_background_visible(&self) -> bool {
        self.graph.is_effectively_visible(self.background)
    }

    /// Whether the scene root is visible
    pub fn is_root_visible(&self) -> bool {
        self.graph.is_effectively_visible(self.root)
    }

    /// Whether the content is visible through its ancestors
    pub fn is_content_visible(&self) -> bool {
        self.graph.is_effectively_visible(self.content)
    }

    /// Local transform of the placed-content container
    pub fn content_transform(&self) -> Option<Mat4> {
        self.graph.node(self.content_container).map(|node| node.local_transform)
    }

    /// Apply a successful placement: position the container at `hit_transform`
    /// and show it along with the root
    pub fn place_content(&mut self, hit_transform: Mat4) {
        self.graph.set_local_transform(self.content_container, hit_transform);
        self.graph.set_visible(self.content_container, true);
        self.graph.set_visible(self.root, true);
    }

    /// Subscribe `target` to `anchor`; returns the binding it replaces
    pub fn bind_to_anchor(&mut self, anchor: AnchorId, target: NodeId) -> Option<AnchorBinding> {
        self.binding.replace(AnchorBinding { anchor, target })
    }

    /// Current anchor subscription
    pub fn binding(&self) -> Option<AnchorBinding> {
        self.binding
    }

    /// Drop the anchor subscription
    pub fn clear_binding(&mut self) -> Option<AnchorBinding> {
        self.binding.take()
    }

    /// Copy the bound anchor's current transform onto its target node
    ///
    /// Returns false when there is no binding or the anchor is unknown to the
    /// session; the target then keeps its last transform.
    pub fn evaluate_binding<S: TrackingSession + ?Sized>(&mut self, session: &S) -> bool {
        let Some(binding) = self.binding else {
            return false;
        };
        match session.anchor_transform(binding.anchor) {
            Some(transform) => self.graph.set_local_transform(binding.target, transform),
            None => {
                log::trace!("Bound anchor {:?} not available this tick", binding.anchor);
                false
            }
        }
    }
}
