//! World-space rays

use crate::foundation::math::Vec3;

/// A ray in 3D space for hit-testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to an infinite plane, if it is hit in front of the origin
    ///
    /// Rays parallel to the plane never hit it.
    pub fn intersect_plane(&self, plane_point: Vec3, plane_normal: Vec3) -> Option<f32> {
        let denom = plane_normal.dot(&self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = plane_normal.dot(&(plane_point - self.origin)) / denom;
        (t >= 0.0).then_some(t)
    }

    /// Shortest distance from a point to the infinite line through this ray
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        (point - self.origin).cross(&self.direction).magnitude()
    }
}
