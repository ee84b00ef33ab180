//! Backend abstraction traits for the rendering system
//!
//! This module defines the trait that graphics backends implement to give
//! the render pipeline a consistent, GL-like state interface. The pipeline
//! decides *what* state each draw needs; the backend decides how the graphics
//! API expresses it.
//!
//! ## State Contract
//!
//! - [`RenderBackend::clear`] clears the requested buffers regardless of the
//!   current depth and stencil write masks.
//! - [`StencilState::Mark`] means: stencil test on, always pass, replace on
//!   depth pass, write mask `0xFF`.
//! - [`StencilState::ExcludeMarked`] means: stencil test on, pass where the
//!   stored value is not equal to the reference, keep on every outcome, write
//!   mask `0x00`.
//! - [`BlendState::Alpha`] is `src_alpha, one_minus_src_alpha`.
//! - All state persists until changed; nothing is reset between draws.

use std::any::Any;

use bitflags::bitflags;
use thiserror::Error;

use crate::render::primitives::Vertex;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A GPU buffer could not be created
    #[error("Failed to create buffer: {0}")]
    BufferCreationFailed(String),

    /// A texture or cube map could not be created
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),

    /// Shader compilation or program linking failed
    #[error("Failed to create shader program: {0}")]
    ProgramCreationFailed(String),

    /// A draw call was rejected
    #[error("Draw failed: {0}")]
    DrawFailed(String),

    /// Swapping the frame buffer failed
    #[error("Failed to present: {0}")]
    PresentFailed(String),

    /// The graphics context is gone
    #[error("Context lost")]
    ContextLost,
}

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Handle to a 2D texture or cube map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Handle to a vertex array (vertex buffer + index buffer + attribute layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayHandle(pub u32);

/// Handle to a uniform buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Texture binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    /// Ordinary 2D texture
    #[default]
    Texture2D,
    /// Six-face cube map
    CubeMap,
}

bitflags! {
    /// Frame buffer attachments to clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u8 {
        /// Colour attachment
        const COLOR = 0b001;
        /// Depth attachment
        const DEPTH = 0b010;
        /// Stencil attachment
        const STENCIL = 0b100;
    }
}

/// Which faces are culled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullFace {
    /// Cull back faces
    Back,
    /// Cull front faces
    Front,
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    /// Pass when the incoming depth is less than the stored depth
    Less,
    /// Pass when the incoming depth is less than or equal to the stored depth
    LessOrEqual,
}

/// Face culling and depth buffer state for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    /// Faces discarded before rasterisation
    pub cull: CullFace,
    /// Whether passing fragments write depth
    pub depth_write: bool,
    /// Depth comparison
    pub depth_func: DepthFunc,
}

/// Stencil state for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilState {
    /// Stencil test disabled
    Disabled,
    /// Write `reference` into every covered pixel
    Mark {
        /// Value written
        reference: u8,
    },
    /// Draw only where the stored value differs from `reference`
    ExcludeMarked {
        /// Value compared against
        reference: u8,
    },
}

/// Colour blending state for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendState {
    /// Blending disabled
    Disabled,
    /// Standard alpha blending
    Alpha,
}

/// Pixel layout of decoded texture data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// One 8-bit channel
    R8,
    /// Two 8-bit channels
    Rg8,
    /// Three 8-bit channels
    Rgb8,
    /// Four 8-bit channels
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub const fn channels(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rg8 => 2,
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Decoded texture pixels ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Channel layout of `pixels`
    pub format: PixelFormat,
    /// Tightly packed rows, top row first
    pub pixels: Vec<u8>,
}

/// Shader program sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    /// Vertex stage source text
    pub vertex: String,
    /// Fragment stage source text
    pub fragment: String,
}

impl ShaderSource {
    /// Create a program source pair
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }
}

/// Main rendering backend trait
///
/// State setters are fire-and-forget, mirroring a single ordered command
/// stream. Resource creation, draws and presentation can fail.
pub trait RenderBackend {
    /// Current framebuffer size in pixels (width, height)
    fn framebuffer_size(&self) -> (u32, u32);

    /// Create a dynamic uniform buffer of `size` bytes
    fn create_uniform_buffer(&mut self, size: usize) -> BackendResult<BufferHandle>;

    /// Upload static vertex and index data and record the attribute layout
    ///
    /// Attribute locations follow [`crate::render::primitives::VertexLayout`].
    fn create_vertex_array(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<VertexArrayHandle>;

    /// Compile and link a shader program
    fn create_program(&mut self, source: &ShaderSource) -> BackendResult<ProgramHandle>;

    /// Upload a mipmapped, repeating 2D texture
    fn create_texture_2d(&mut self, image: &TextureImage) -> BackendResult<TextureHandle>;

    /// Upload a clamped cube map; faces ordered +X, -X, +Y, -Y, +Z, -Z
    fn create_cube_map(&mut self, faces: &[TextureImage; 6]) -> BackendResult<TextureHandle>;

    /// Enable seamless filtering across cube map faces
    fn enable_seamless_cube_maps(&mut self);

    /// Set the colour used by [`RenderBackend::clear`]
    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Clear the requested attachments
    fn clear(&mut self, flags: ClearFlags);

    /// Apply face culling and depth state
    fn apply_depth_state(&mut self, state: &DepthState);

    /// Apply stencil state
    fn apply_stencil_state(&mut self, state: &StencilState);

    /// Apply blend state
    fn apply_blend_state(&mut self, state: &BlendState);

    /// Make `program` current
    fn use_program(&mut self, program: ProgramHandle);

    /// Point the sampler uniform `name` of `program` at texture `unit`
    fn set_sampler(&mut self, program: ProgramHandle, name: &str, unit: u32);

    /// Bind `texture` to texture `unit` as `kind`
    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: TextureHandle);

    /// Route the uniform block `block_name` of `program` to `binding` and
    /// attach `buffer` to that binding point
    fn bind_uniform_block(&mut self, program: ProgramHandle, block_name: &str, binding: u32, buffer: BufferHandle);

    /// Overwrite the start of `buffer` with `data`
    fn update_uniform_buffer(&mut self, buffer: BufferHandle, data: &[u8]);

    /// Bind a vertex array for the next draw
    fn bind_vertex_array(&mut self, vertex_array: VertexArrayHandle);

    /// Draw `index_count` indices of the bound vertex array as a triangle list
    fn draw_indexed(&mut self, index_count: u32) -> BackendResult<()>;

    /// Swap the frame buffer
    fn present(&mut self) -> BackendResult<()>;

    /// Downcast to the concrete backend type
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast to the concrete backend type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
