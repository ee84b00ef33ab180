//! # Scene Renderer
//!
//! A real-time 3D scene renderer built on an entity-component data model.
//!
//! ## Features
//!
//! - **Scene Store**: Dense entity ids with component masks and parallel containers
//! - **Frame Sequencer**: Deterministic begin/update/end ordering across systems
//! - **Render Pipeline**: Per-material depth, stencil and blend state, deferred
//!   back-to-front transparency and stencil-masked outlines
//! - **Picking**: Mouse ray reconstruction with Möller–Trumbore triangle tests
//! - **Resource Registry**: Memoised shader programs and textures per context
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_renderer::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut backend = RecordingBackend::new(800, 800);
//!     let outline = backend.create_program(&ShaderSource::new("", ""))?;
//!
//!     let mut scene = Scene::new();
//!     let camera = scene.create_entity();
//!     scene.set_transform(camera, Mat4::new_translation(&Vec3::new(0.0, 0.0, 6.0)))?;
//!
//!     let mut renderer = RenderSystem::new(Box::new(backend), RendererConfig::default(), outline)?;
//!     renderer.set_camera(&scene, camera)?;
//!
//!     let mut sequencer = FrameSequencer::new();
//!     sequencer.add_system(renderer);
//!     sequencer.run_frame(&mut scene)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod foundation;
pub mod config;
pub mod ecs;
pub mod render;
pub mod input;
pub mod physics;

/// Common imports for renderer users
pub mod prelude {
    pub use crate::{
        foundation::math::{Vec3, Vec4, Mat4, Point3},
        ecs::{
            Scene, Entity, ComponentMask, System, SystemError, FrameSequencer, FrameReport,
            components::{MeshComponent, MaterialComponent, TextureKind},
            systems::{RenderSystem, PickMode, PickReport},
        },
        render::{
            RenderBackend, RecordingBackend, BackendCall, RenderError, RenderResult,
            ProgramHandle, TextureHandle, ShaderSource, ShaderParams,
            resources::{ResourceRegistry, ShaderKind},
        },
        input::CursorPosition,
        config::Config,
        core::config::RendererConfig,
    };
}
