//! # Draw State Resolution
//!
//! Derives the depth, stencil and blend state of one draw from the material
//! flags and an explicit [`DrawPass`]. Nothing here touches component storage:
//! the outline copy is expressed by the pass role, not by flipping material
//! flags and restoring them afterwards.

use crate::ecs::components::MaterialComponent;
use crate::render::backend::{BlendState, CullFace, DepthFunc, DepthState, StencilState};

/// What a draw is rendering for its entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawRole {
    /// The entity itself
    Primary,
    /// The scaled-up silhouette copy drawn after an outline owner
    Outline,
}

/// Per-draw parameters passed down the draw recursion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawPass {
    /// What is being drawn
    pub role: DrawRole,
    /// Whether this draw belongs to the deferred transparency flush
    pub blended: bool,
}

impl DrawPass {
    /// Primary draw issued during the per-entity loop
    pub const fn immediate() -> Self {
        Self { role: DrawRole::Primary, blended: false }
    }

    /// Primary draw issued while flushing deferred transparency
    pub const fn deferred() -> Self {
        Self { role: DrawRole::Primary, blended: true }
    }

    /// Outline copy of this pass; keeps the blend decision of its owner
    pub const fn outline_copy(self) -> Self {
        Self { role: DrawRole::Outline, blended: self.blended }
    }
}

/// Complete fixed-function state for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawState {
    /// Culling and depth
    pub depth: DepthState,
    /// Stencil
    pub stencil: StencilState,
    /// Blending
    pub blend: BlendState,
}

impl DrawState {
    /// Resolve state for `material` drawn in `pass`
    ///
    /// `outline_reference` is the stencil value outline owners write and the
    /// outline copy excludes.
    pub fn resolve(material: &MaterialComponent, pass: DrawPass, outline_reference: u8) -> Self {
        let depth = if material.enable_depth {
            DepthState { cull: CullFace::Back, depth_write: true, depth_func: DepthFunc::Less }
        } else {
            DepthState { cull: CullFace::Front, depth_write: false, depth_func: DepthFunc::LessOrEqual }
        };

        let (owns_outline, is_outline) = match pass.role {
            DrawRole::Primary => (material.has_outline, material.is_outline),
            DrawRole::Outline => (false, true),
        };
        let stencil = if owns_outline {
            StencilState::Mark { reference: outline_reference }
        } else if is_outline {
            StencilState::ExcludeMarked { reference: outline_reference }
        } else {
            StencilState::Disabled
        };

        let blend = if pass.blended { BlendState::Alpha } else { BlendState::Disabled };

        Self { depth, stencil, blend }
    }
}
