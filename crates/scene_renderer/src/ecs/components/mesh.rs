//! Mesh component
//!
//! Geometry is uploaded once and shared. The CPU copy is kept alongside the
//! vertex array handle because picking tests rays against it; both are
//! reference counted so the data outlives every handle that refers to it.

use std::sync::Arc;

use crate::render::backend::{BackendResult, RenderBackend, VertexArrayHandle};
use crate::render::primitives::{MeshData, Vertex};

/// Uploaded geometry of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct MeshComponent {
    /// CPU copy of the vertices
    pub vertices: Arc<[Vertex]>,
    /// CPU copy of the triangle list indices
    pub indices: Arc<[u32]>,
    /// GPU vertex array
    pub vertex_array: VertexArrayHandle,
    /// Number of indices drawn
    pub index_count: u32,
}

impl MeshComponent {
    /// Upload `data` through `backend` and keep the CPU copy
    pub fn upload(backend: &mut dyn RenderBackend, data: MeshData) -> BackendResult<Self> {
        let vertex_array = backend.create_vertex_array(&data.vertices, &data.indices)?;
        let index_count = u32::try_from(data.indices.len()).unwrap_or(u32::MAX);
        Ok(Self {
            vertices: data.vertices.into(),
            indices: data.indices.into(),
            vertex_array,
            index_count,
        })
    }

    /// Share already-uploaded geometry with another entity
    pub fn share(&self) -> Self {
        self.clone()
    }

    /// Check that the drawn range is backed by CPU data
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.index_count as usize > self.indices.len() {
            return Err(format!(
                "index count {} exceeds {} stored indices",
                self.index_count,
                self.indices.len()
            ));
        }
        if self.index_count > 0 && self.vertices.is_empty() {
            return Err("indices reference an empty vertex list".to_string());
        }
        Ok(())
    }
}
