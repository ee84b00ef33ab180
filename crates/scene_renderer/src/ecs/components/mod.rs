//! ECS Components module
//!
//! Data the render pipeline and picking read from the scene store.

pub mod transform;
pub mod mesh;
pub mod material;

pub use transform::{TransformComponent, TransformFactory};
pub use mesh::MeshComponent;
pub use material::MaterialComponent;
pub use crate::render::backend::TextureKind;
