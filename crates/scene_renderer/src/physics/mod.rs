//! Physics module
//!
//! Geometric primitives and intersection tests used by picking.

pub mod primitives;

pub use primitives::{Ray, Triangle, TriangleHit, TriangleTest};
