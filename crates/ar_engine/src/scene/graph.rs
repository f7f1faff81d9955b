//! Hierarchical scene graph
//!
//! Nodes live in a slot map and reference each other by [`NodeId`]. A node's
//! world transform is the product of its ancestors' local transforms, and a
//! hidden node hides its whole subtree.

use slotmap::{new_key_type, SlotMap};

use crate::foundation::math::{Mat4, Vec3};

new_key_type! {
    /// Identifier of a node in a [`SceneGraph`]
    pub struct NodeId;
}

/// Axis-aligned bounding box in a node's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Box centered at `center` with half-size `extents`
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// Renderable geometry attached to a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// Full-screen camera background quad
    BackgroundQuad,
    /// Icosphere of the given radius
    IcoSphere { radius: f32, subdivisions: u32 },
}

impl Geometry {
    /// Local-space bounds; `None` for screen-space geometry
    pub fn bounds(&self) -> Option<Aabb> {
        match *self {
            Self::BackgroundQuad => None,
            Self::IcoSphere { radius, .. } => Some(Aabb::from_center_extents(Vec3::zeros(), Vec3::repeat(radius))),
        }
    }
}

/// One node of the scene graph
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Display name
    pub label: String,
    /// Transform relative to the parent
    pub local_transform: Mat4,
    /// Visibility of this node (hidden nodes hide their subtree)
    pub visible: bool,
    /// Drawable geometry, if any
    pub geometry: Option<Geometry>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    /// Visible node with identity transform and no geometry
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            local_transform: Mat4::identity(),
            visible: true,
            geometry: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Attach geometry
    #[must_use]
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Set the local transform
    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.local_transform = transform;
        self
    }

    /// Start hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Parent node, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A visible node with geometry, resolved to world space
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    /// Node the drawable came from
    pub node: NodeId,
    /// Label of that node
    pub label: String,
    /// Accumulated world transform
    pub world_transform: Mat4,
    /// Geometry to draw
    pub geometry: Geometry,
}

/// Scene graph storage
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
}

impl SceneGraph {
    /// Empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a parentless node
    pub fn add_root(&mut self, node: SceneNode) -> NodeId {
        self.nodes.insert(node)
    }

    /// Insert `node` under `parent`; `None` if the parent does not exist
    pub fn add_child(&mut self, parent: NodeId, mut node: SceneNode) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        node.parent = Some(parent);
        let id = self.nodes.insert(node);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        Some(id)
    }

    /// Node by id
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Set a node's local transform; false if the node does not exist
    pub fn set_local_transform(&mut self, id: NodeId, transform: Mat4) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.local_transform = transform;
                true
            }
            None => false,
        }
    }

    /// Show or hide a node; false if the node does not exist
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Product of the local transforms from the root down to `id`
    pub fn world_transform(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(id)?;
        let mut transform = node.local_transform;
        while let Some(parent) = node.parent {
            node = self.nodes.get(parent)?;
            transform = node.local_transform * transform;
        }
        Some(transform)
    }

    /// Whether the node and all its ancestors are visible
    pub fn is_effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.nodes.get(node_id) {
                Some(node) if node.visible => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Visible geometry under `root` in depth-first order
    pub fn collect_drawables(&self, root: NodeId) -> Vec<Drawable> {
        let mut drawables = Vec::new();
        let Some(root_node) = self.nodes.get(root) else {
            return drawables;
        };
        let parent_transform = match root_node.parent {
            Some(parent) => self.world_transform(parent).unwrap_or_else(Mat4::identity),
            None => Mat4::identity(),
        };
        self.collect_into(root, parent_transform, &mut drawables);
        drawables
    }

    fn collect_into(&self, id: NodeId, parent_transform: Mat4, out: &mut Vec<Drawable>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let world = parent_transform * node.local_transform;
        if let Some(geometry) = node.geometry {
            out.push(Drawable {
                node: id,
                label: node.label.clone(),
                world_transform: world,
                geometry,
            });
        }
        for &child in &node.children {
            self.collect_into(child, world, out);
        }
    }
}
