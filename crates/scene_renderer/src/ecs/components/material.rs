//! Material component
//!
//! Shader program, texture and the flags that select depth, stencil and
//! blend state for every draw of the entity.

use crate::render::backend::{ProgramHandle, TextureHandle, TextureKind};
use crate::render::uniforms::ShaderParams;

/// Material of a renderable entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialComponent {
    /// Program used for the primary draw
    pub shader: ProgramHandle,
    /// Texture bound to the material unit
    pub texture: TextureHandle,
    /// Target `texture` is bound as
    pub texture_kind: TextureKind,
    /// Depth test with back-face culling when set; front-face culling
    /// without depth writes otherwise
    pub enable_depth: bool,
    /// Draw a stencil-masked outline copy after the primary draw
    pub has_outline: bool,
    /// Draw only outside silhouettes marked by outline owners
    pub is_outline: bool,
    /// Defer to the back-to-front transparency flush
    pub is_transparent: bool,
    /// Contents of the `ShaderParams` block
    pub shader_params: ShaderParams,
}

impl MaterialComponent {
    /// Opaque, depth-tested material without outline
    pub const fn new(shader: ProgramHandle, texture: TextureHandle) -> Self {
        Self {
            shader,
            texture,
            texture_kind: TextureKind::Texture2D,
            enable_depth: true,
            has_outline: false,
            is_outline: false,
            is_transparent: false,
            shader_params: ShaderParams::new(0.0),
        }
    }

    /// Bind the texture as `kind`
    pub const fn with_texture_kind(mut self, kind: TextureKind) -> Self {
        self.texture_kind = kind;
        self
    }

    /// Request an outline
    pub const fn with_outline(mut self) -> Self {
        self.has_outline = true;
        self
    }

    /// Mark as a standalone outline render
    pub const fn as_outline(mut self) -> Self {
        self.is_outline = true;
        self
    }

    /// Defer to the transparency flush
    pub const fn transparent(mut self) -> Self {
        self.is_transparent = true;
        self
    }

    /// Disable depth testing (front-face culling, no depth writes)
    pub const fn without_depth(mut self) -> Self {
        self.enable_depth = false;
        self
    }

    /// Set the environment reflection strength
    pub const fn with_metallicness(mut self, metallicness: f32) -> Self {
        self.shader_params = ShaderParams::new(metallicness);
        self
    }
}
