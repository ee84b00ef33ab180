//! ECS Systems
//!
//! Systems that process entities every frame.

pub mod rendering_system;
pub mod picking_system;

pub use rendering_system::RenderSystem;
pub use picking_system::{
    cursor_ray, PickDiagnostic, PickHit, PickMode, PickReport, Picker,
};
