//! Touch input and normalization
//!
//! Converts view-space touch locations into normalized device coordinates
//! for ray casting.

use crate::foundation::math::Vec2;

/// Where the view's coordinate origin sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchOrigin {
    /// Origin top-left, y grows downward
    #[default]
    TopLeft,
    /// Origin bottom-left, y grows upward
    BottomLeft,
}

/// One active touch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Platform identifier of the touch
    pub id: u64,
    /// Location in view coordinates (points)
    pub location: Vec2,
}

impl TouchPoint {
    /// Touch `id` at view point `(x, y)`
    pub fn new(id: u64, x: f32, y: f32) -> Self {
        Self { id, location: Vec2::new(x, y) }
    }
}

/// Convert a view location to NDC
///
/// NDC range: [-1, 1] where:
/// - X: -1 = left, +1 = right
/// - Y: -1 = bottom, +1 = top
///
/// Returns `None` for an empty view.
pub fn normalize_point(location: Vec2, view_size: Vec2, origin: TouchOrigin) -> Option<Vec2> {
    if view_size.x <= 0.0 || view_size.y <= 0.0 {
        return None;
    }
    let x = location.x / view_size.x;
    let y = location.y / view_size.y;
    let y = match origin {
        TouchOrigin::TopLeft => 1.0 - y,
        TouchOrigin::BottomLeft => y,
    };
    Some(Vec2::new(x, y) * 2.0 - Vec2::new(1.0, 1.0))
}
