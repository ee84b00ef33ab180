//! Core rendering primitives
//!
//! Geometry data and projection math shared by drawing and picking.

pub mod mesh;
pub mod camera;

pub use mesh::{Vertex, VertexAttribute, VertexLayout, MeshData};
pub use camera::Projection;
