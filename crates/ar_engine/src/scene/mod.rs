//! Scene graph and the AR scene built on it

pub mod ar_scene;
pub mod graph;

pub use ar_scene::{AnchorBinding, ArScene, ContentMaterial};
pub use graph::{Aabb, Drawable, Geometry, NodeId, SceneGraph, SceneNode};
