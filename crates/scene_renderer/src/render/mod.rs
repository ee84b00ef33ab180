//! # Rendering System
//!
//! Everything between the scene store and the graphics API.
//!
//! ## Architecture
//!
//! - **Backend**: [`RenderBackend`] is the GL-like command interface the
//!   pipeline drives; [`RecordingBackend`] implements it in memory
//! - **Draw state**: pure derivation of depth, stencil and blend state from
//!   material flags and the draw pass
//! - **Transparency**: the per-frame back-to-front worklist
//! - **Uniforms**: block layouts and the fixed binding points shared with
//!   every shader program
//! - **Resources**: memoised shader programs and textures
//!
//! The per-frame pipeline itself lives in
//! [`crate::ecs::systems::RenderSystem`].

use thiserror::Error;

use crate::config::ConfigError;
use crate::ecs::{Entity, SceneError};

pub mod backend;
pub mod draw_state;
pub mod primitives;
pub mod recording;
pub mod resources;
pub mod transparency;
pub mod uniforms;


pub use backend::{
    BackendError, BackendResult, BlendState, BufferHandle, ClearFlags, CullFace, DepthFunc, DepthState,
    PixelFormat, ProgramHandle, RenderBackend, ShaderSource, StencilState, TextureHandle, TextureImage,
    TextureKind, VertexArrayHandle,
};
pub use draw_state::{DrawPass, DrawRole, DrawState};
pub use primitives::{MeshData, Projection, Vertex, VertexLayout};
pub use recording::{BackendCall, RecordedDraw, RecordingBackend};
pub use resources::{ResourceError, ResourceRegistry, ShaderKind};
pub use transparency::TransparencyQueue;
pub use uniforms::{ShaderParams, UniformFormat};

/// Render pipeline and picking errors
#[derive(Error, Debug)]
pub enum RenderError {
    /// A frame or pick was requested before a camera was set
    #[error("No active camera")]
    CameraNotSet,

    /// The camera entity has no transform to read a view from
    #[error("{0} cannot be used as a camera: it has no transform")]
    InvalidCamera(Entity),

    /// The environment map entity does not carry a cube map
    #[error("{entity} cannot be used as an environment map: {reason}")]
    EnvironmentMapInvalid {
        /// Entity passed in
        entity: Entity,
        /// What is missing
        reason: String,
    },

    /// The entity's mask and component data disagree
    #[error("Malformed {entity}: {source}")]
    MalformedEntity {
        /// Offending entity
        entity: Entity,
        /// Scene store diagnosis
        source: SceneError,
    },

    /// The framebuffer has a zero dimension
    #[error("Degenerate viewport {width}x{height}")]
    DegenerateViewport {
        /// Framebuffer width
        width: u32,
        /// Framebuffer height
        height: u32,
    },

    /// A matrix that must be invertible is not
    #[error("Singular {0} matrix")]
    SingularMatrix(&'static str),

    /// The graphics backend failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Renderer settings violate a constraint
    #[error("Invalid renderer configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl RenderError {
    /// Whether the error concerns a single entity and the frame can continue
    pub const fn is_per_entity(&self) -> bool {
        matches!(self, Self::MalformedEntity { .. })
    }
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
