//! Primitive shapes and intersection algorithms
//!
//! Rays and triangles in world space, with the Möller–Trumbore ray/triangle
//! test used by mouse picking.

use crate::foundation::math::Vec3;

/// A ray for ray casting and picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// The origin point of the ray in world space
    pub origin: Vec3,
    /// The direction of the ray (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    ///
    /// Returns `None` when `direction` has no length.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize(0.0)?;
        Some(Self { origin, direction })
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Parameters of an accepted ray/triangle intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray
    pub t: f32,
    /// Barycentric weight of the second vertex
    pub u: f32,
    /// Barycentric weight of the third vertex
    pub v: f32,
}

/// Outcome of a ray/triangle test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleTest {
    /// The ray crosses the triangle in front of its origin
    Hit(TriangleHit),
    /// The ray misses the triangle or crosses it at or behind the origin
    Miss,
    /// The ray runs parallel to the triangle plane
    Parallel,
    /// The triangle has no area
    Degenerate,
}

impl TriangleTest {
    /// The hit, if any
    pub const fn hit(self) -> Option<TriangleHit> {
        match self {
            Self::Hit(hit) => Some(hit),
            _ => None,
        }
    }
}

/// A triangle in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub const fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    /// Whether the vertices are collinear or coincident
    ///
    /// Compares the edge cross product against the edge lengths so the check
    /// does not depend on the triangle's scale.
    pub fn is_degenerate(&self, epsilon: f32) -> bool {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).norm() <= epsilon * edge1.norm() * edge2.norm()
    }

    /// Möller–Trumbore ray/triangle intersection
    ///
    /// `epsilon` bounds both the determinant (rays closer to parallel are
    /// rejected) and the hit distance (only `t > epsilon` is accepted).
    /// Barycentric bounds are inclusive, so rays through an edge shared by
    /// two triangles hit at least one of them.
    pub fn intersect_ray(&self, ray: &Ray, epsilon: f32) -> TriangleTest {
        if self.is_degenerate(epsilon) {
            return TriangleTest::Degenerate;
        }

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);
        if a.abs() < epsilon {
            return TriangleTest::Parallel;
        }

        let f = 1.0 / a;
        let s = ray.origin - self.v0;
        let u = f * s.dot(&h);
        if !(0.0..=1.0).contains(&u) {
            return TriangleTest::Miss;
        }

        let q = s.cross(&edge1);
        let v = f * ray.direction.dot(&q);
        if v < 0.0 || u + v > 1.0 {
            return TriangleTest::Miss;
        }

        let t = f * edge2.dot(&q);
        if t > epsilon {
            TriangleTest::Hit(TriangleHit { t, u, v })
        } else {
            TriangleTest::Miss
        }
    }
}
