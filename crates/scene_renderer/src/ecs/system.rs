//! System trait
//!
//! Systems are driven by the [`crate::ecs::FrameSequencer`]: one
//! `begin_frame`, one `update` per entity slot, one `end_frame`, every frame.

use std::any::Any;

use thiserror::Error;

use super::{Entity, Scene};
use crate::render::RenderError;

/// System failure reported to the frame sequencer
#[derive(Error, Debug)]
pub enum SystemError {
    /// Render pipeline failure
    #[error("render system: {0}")]
    Render(#[from] RenderError),

    /// Failure in any other system
    #[error("{system}: {message}")]
    Other {
        /// System name
        system: &'static str,
        /// What went wrong
        message: String,
    },
}

impl SystemError {
    /// Whether the fault concerns a single entity and the frame can continue
    pub fn is_per_entity(&self) -> bool {
        match self {
            Self::Render(error) => error.is_per_entity(),
            Self::Other { .. } => false,
        }
    }
}

/// A participant in the frame loop
pub trait System {
    /// Called once at the start of every frame
    fn begin_frame(&mut self, scene: &mut Scene) -> Result<(), SystemError>;

    /// Called once per entity slot, in id order
    fn update(&mut self, scene: &mut Scene, entity: Entity) -> Result<(), SystemError>;

    /// Called once at the end of every frame
    fn end_frame(&mut self, scene: &mut Scene) -> Result<(), SystemError>;

    /// Name used in logs and reports
    fn name(&self) -> &'static str;

    /// Downcast to the concrete system type
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::SceneError;

    #[test]
    fn test_only_malformed_entities_are_per_entity() {
        let mut scene = Scene::new();
        let entity = scene.create_entity();
        let malformed = RenderError::MalformedEntity {
            entity,
            source: SceneError::MissingComponentData { entity, kind: "mesh" },
        };

        assert!(SystemError::from(malformed).is_per_entity());
        assert!(!SystemError::from(RenderError::CameraNotSet).is_per_entity());
        assert!(!SystemError::Other { system: "spin", message: "stalled".to_string() }.is_per_entity());
    }

    #[test]
    fn test_render_failures_name_the_render_system() {
        let error = SystemError::from(RenderError::SingularMatrix("view"));
        assert_eq!(error.to_string(), "render system: Singular view matrix");
    }
}
