//! # Recording Backend
//!
//! An in-memory [`RenderBackend`] that records every call instead of talking to
//! a GPU. It hands out sequential handles, keeps uploaded geometry and
//! textures so they can be inspected, and reports a settable framebuffer size.
//!
//! Used by the pipeline tests to observe draw ordering and state changes, and
//! by the headless viewer.

use std::any::Any;

use crate::render::backend::{
    BackendError, BackendResult, BlendState, BufferHandle, ClearFlags, DepthState, ProgramHandle,
    RenderBackend, ShaderSource, StencilState, TextureHandle, TextureImage, TextureKind,
    VertexArrayHandle,
};
use crate::render::primitives::Vertex;
use crate::render::uniforms::{UniformFormat, UNIFORMS_BINDING_POINT};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// `create_uniform_buffer`
    CreateUniformBuffer {
        /// Returned handle
        buffer: BufferHandle,
        /// Requested size in bytes
        size: usize,
    },
    /// `create_vertex_array`
    CreateVertexArray {
        /// Returned handle
        vertex_array: VertexArrayHandle,
        /// Uploaded vertex count
        vertex_count: usize,
        /// Uploaded index count
        index_count: usize,
    },
    /// `create_program`
    CreateProgram(ProgramHandle),
    /// `create_texture_2d` or `create_cube_map`
    CreateTexture {
        /// Returned handle
        texture: TextureHandle,
        /// Binding target
        kind: TextureKind,
    },
    /// `enable_seamless_cube_maps`
    EnableSeamlessCubeMaps,
    /// `set_clear_color`
    SetClearColor([f32; 4]),
    /// `clear`
    Clear(ClearFlags),
    /// `apply_depth_state`
    DepthState(DepthState),
    /// `apply_stencil_state`
    StencilState(StencilState),
    /// `apply_blend_state`
    BlendState(BlendState),
    /// `use_program`
    UseProgram(ProgramHandle),
    /// `set_sampler`
    SetSampler {
        /// Target program
        program: ProgramHandle,
        /// Uniform name
        name: String,
        /// Texture unit
        unit: u32,
    },
    /// `bind_texture`
    BindTexture {
        /// Texture unit
        unit: u32,
        /// Binding target
        kind: TextureKind,
        /// Bound texture
        texture: TextureHandle,
    },
    /// `bind_uniform_block`
    BindUniformBlock {
        /// Target program
        program: ProgramHandle,
        /// Block name
        block: String,
        /// Binding point
        binding: u32,
        /// Attached buffer
        buffer: BufferHandle,
    },
    /// `update_uniform_buffer`
    UpdateUniformBuffer {
        /// Written buffer
        buffer: BufferHandle,
        /// Written bytes
        data: Vec<u8>,
    },
    /// `bind_vertex_array`
    BindVertexArray(VertexArrayHandle),
    /// `draw_indexed`
    DrawIndexed {
        /// Indices drawn
        index_count: u32,
    },
    /// `present`
    Present,
}

/// A draw reconstructed from the recorded state at the time it was issued
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    /// Vertex array bound for the draw
    pub vertex_array: Option<VertexArrayHandle>,
    /// Program in use
    pub program: Option<ProgramHandle>,
    /// Last applied depth state
    pub depth: Option<DepthState>,
    /// Last applied stencil state
    pub stencil: Option<StencilState>,
    /// Last applied blend state
    pub blend: Option<BlendState>,
    /// Last `Uniforms` block written to the transform buffer
    pub uniforms: Option<UniformFormat>,
    /// Indices drawn
    pub index_count: u32,
}

/// Backend that records calls instead of rendering
#[derive(Debug)]
pub struct RecordingBackend {
    framebuffer_size: (u32, u32),
    calls: Vec<BackendCall>,
    next_handle: u32,
    transform_buffer: Option<BufferHandle>,
    textures: Vec<(TextureHandle, Vec<TextureImage>)>,
    geometry: Vec<(VertexArrayHandle, Vec<Vertex>, Vec<u32>)>,
    fail_present: bool,
}

impl RecordingBackend {
    /// Create a backend reporting a `width` × `height` framebuffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            framebuffer_size: (width, height),
            calls: Vec::new(),
            next_handle: 1,
            transform_buffer: None,
            textures: Vec::new(),
            geometry: Vec::new(),
            fail_present: false,
        }
    }

    /// Simulate a window resize
    pub fn set_framebuffer_size(&mut self, width: u32, height: u32) {
        self.framebuffer_size = (width, height);
    }

    /// Make every later `present` fail
    pub fn set_fail_present(&mut self, fail: bool) {
        self.fail_present = fail;
    }

    /// All recorded calls in issue order
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Forget recorded calls; handles and uploads are kept
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `predicate`
    pub fn count_calls(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    /// Images uploaded for `texture`
    pub fn texture_images(&self, texture: TextureHandle) -> Option<&[TextureImage]> {
        self.textures
            .iter()
            .find(|(handle, _)| *handle == texture)
            .map(|(_, images)| images.as_slice())
    }

    /// Geometry uploaded for `vertex_array`
    pub fn vertex_array_data(&self, vertex_array: VertexArrayHandle) -> Option<(&[Vertex], &[u32])> {
        self.geometry
            .iter()
            .find(|(handle, _, _)| *handle == vertex_array)
            .map(|(_, vertices, indices)| (vertices.as_slice(), indices.as_slice()))
    }

    /// Replay recorded calls and reconstruct the state of every draw
    pub fn draws(&self) -> Vec<RecordedDraw> {
        let mut current = RecordedDraw {
            vertex_array: None,
            program: None,
            depth: None,
            stencil: None,
            blend: None,
            uniforms: None,
            index_count: 0,
        };
        let mut draws = Vec::new();

        for call in &self.calls {
            match call {
                BackendCall::BindVertexArray(vertex_array) => current.vertex_array = Some(*vertex_array),
                BackendCall::UseProgram(program) => current.program = Some(*program),
                BackendCall::DepthState(state) => current.depth = Some(*state),
                BackendCall::StencilState(state) => current.stencil = Some(*state),
                BackendCall::BlendState(state) => current.blend = Some(*state),
                BackendCall::UpdateUniformBuffer { buffer, data }
                    if Some(*buffer) == self.transform_buffer
                        && data.len() == std::mem::size_of::<UniformFormat>() =>
                {
                    current.uniforms = Some(bytemuck::pod_read_unaligned(data));
                }
                BackendCall::DrawIndexed { index_count } => {
                    current.index_count = *index_count;
                    draws.push(current.clone());
                }
                _ => {}
            }
        }

        draws
    }

    /// Vertex arrays in draw order
    pub fn drawn_vertex_arrays(&self) -> Vec<VertexArrayHandle> {
        self.draws().into_iter().filter_map(|draw| draw.vertex_array).collect()
    }

    fn allocate(&mut self) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(800, 800)
    }
}

impl RenderBackend for RecordingBackend {
    fn framebuffer_size(&self) -> (u32, u32) {
        self.framebuffer_size
    }

    fn create_uniform_buffer(&mut self, size: usize) -> BackendResult<BufferHandle> {
        if size == 0 {
            return Err(BackendError::BufferCreationFailed("zero-sized uniform buffer".to_string()));
        }
        let buffer = BufferHandle(self.allocate());
        self.calls.push(BackendCall::CreateUniformBuffer { buffer, size });
        Ok(buffer)
    }

    fn create_vertex_array(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<VertexArrayHandle> {
        let vertex_array = VertexArrayHandle(self.allocate());
        self.geometry.push((vertex_array, vertices.to_vec(), indices.to_vec()));
        self.calls.push(BackendCall::CreateVertexArray {
            vertex_array,
            vertex_count: vertices.len(),
            index_count: indices.len(),
        });
        Ok(vertex_array)
    }

    fn create_program(&mut self, _source: &ShaderSource) -> BackendResult<ProgramHandle> {
        let program = ProgramHandle(self.allocate());
        self.calls.push(BackendCall::CreateProgram(program));
        Ok(program)
    }

    fn create_texture_2d(&mut self, image: &TextureImage) -> BackendResult<TextureHandle> {
        let texture = TextureHandle(self.allocate());
        self.textures.push((texture, vec![image.clone()]));
        self.calls.push(BackendCall::CreateTexture { texture, kind: TextureKind::Texture2D });
        Ok(texture)
    }

    fn create_cube_map(&mut self, faces: &[TextureImage; 6]) -> BackendResult<TextureHandle> {
        let texture = TextureHandle(self.allocate());
        self.textures.push((texture, faces.to_vec()));
        self.calls.push(BackendCall::CreateTexture { texture, kind: TextureKind::CubeMap });
        Ok(texture)
    }

    fn enable_seamless_cube_maps(&mut self) {
        self.calls.push(BackendCall::EnableSeamlessCubeMaps);
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.calls.push(BackendCall::SetClearColor(color));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.calls.push(BackendCall::Clear(flags));
    }

    fn apply_depth_state(&mut self, state: &DepthState) {
        self.calls.push(BackendCall::DepthState(*state));
    }

    fn apply_stencil_state(&mut self, state: &StencilState) {
        self.calls.push(BackendCall::StencilState(*state));
    }

    fn apply_blend_state(&mut self, state: &BlendState) {
        self.calls.push(BackendCall::BlendState(*state));
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.calls.push(BackendCall::UseProgram(program));
    }

    fn set_sampler(&mut self, program: ProgramHandle, name: &str, unit: u32) {
        self.calls.push(BackendCall::SetSampler { program, name: name.to_string(), unit });
    }

    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: TextureHandle) {
        self.calls.push(BackendCall::BindTexture { unit, kind, texture });
    }

    fn bind_uniform_block(&mut self, program: ProgramHandle, block_name: &str, binding: u32, buffer: BufferHandle) {
        if binding == UNIFORMS_BINDING_POINT {
            self.transform_buffer = Some(buffer);
        }
        self.calls.push(BackendCall::BindUniformBlock {
            program,
            block: block_name.to_string(),
            binding,
            buffer,
        });
    }

    fn update_uniform_buffer(&mut self, buffer: BufferHandle, data: &[u8]) {
        self.calls.push(BackendCall::UpdateUniformBuffer { buffer, data: data.to_vec() });
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayHandle) {
        self.calls.push(BackendCall::BindVertexArray(vertex_array));
    }

    fn draw_indexed(&mut self, index_count: u32) -> BackendResult<()> {
        self.calls.push(BackendCall::DrawIndexed { index_count });
        Ok(())
    }

    fn present(&mut self) -> BackendResult<()> {
        if self.fail_present {
            return Err(BackendError::PresentFailed("simulated present failure".to_string()));
        }
        self.calls.push(BackendCall::Present);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let mut backend = RecordingBackend::default();
        let a = backend.create_program(&ShaderSource::new("", "")).unwrap();
        let b = backend.create_program(&ShaderSource::new("", "")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_draws_capture_bound_state() {
        let mut backend = RecordingBackend::default();
        backend.use_program(ProgramHandle(9));
        backend.bind_vertex_array(VertexArrayHandle(3));
        backend.draw_indexed(36).unwrap();
        backend.bind_vertex_array(VertexArrayHandle(4));
        backend.draw_indexed(6).unwrap();

        let draws = backend.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].program, Some(ProgramHandle(9)));
        assert_eq!(draws[1].vertex_array, Some(VertexArrayHandle(4)));
        assert_eq!(draws[1].index_count, 6);
    }

    #[test]
    fn test_present_failure_is_reported() {
        let mut backend = RecordingBackend::default();
        backend.set_fail_present(true);
        assert!(matches!(backend.present(), Err(BackendError::PresentFailed(_))));
    }
}
