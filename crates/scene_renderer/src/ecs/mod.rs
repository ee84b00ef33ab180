//! Entity-Component-System implementation
//!
//! Dense entity ids, a component mask per entity, parallel component
//! containers, and a sequencer that drives systems over every entity once
//! per frame.

pub mod world;
pub mod entity;
pub mod component;
pub mod components;
pub mod system;
pub mod scheduler;
pub mod systems;

pub use world::{Scene, SceneError, SceneResult, Renderable};
pub use entity::Entity;
pub use component::ComponentMask;
pub use system::{System, SystemError};
pub use scheduler::{FrameSequencer, FrameReport, EntityFault};
