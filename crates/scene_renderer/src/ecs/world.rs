//! Scene store
//!
//! Entities are dense slots. Each slot has a component mask and one entry in
//! every per-kind container; an entry is meaningful only while its mask bit is
//! set. Scene construction and gameplay code write through the setters, the
//! render pipeline and picking read through the checked accessors.

use thiserror::Error;

use super::components::{MaterialComponent, MeshComponent, TransformComponent};
use super::{ComponentMask, Entity};
use crate::foundation::math::Mat4;

/// Result type for scene lookups
pub type SceneResult<T> = Result<T, SceneError>;

/// Scene store error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The entity id is past the last allocated slot
    #[error("{0} does not exist")]
    UnknownEntity(Entity),

    /// The mask claims a component whose container entry is empty
    #[error("{entity} has the {kind} bit set but no {kind} data")]
    MissingComponentData {
        /// Offending entity
        entity: Entity,
        /// Component kind name
        kind: &'static str,
    },

    /// Mesh data cannot back its draw range
    #[error("{entity} has a malformed mesh: {reason}")]
    MalformedMesh {
        /// Offending entity
        entity: Entity,
        /// What is wrong
        reason: String,
    },
}

/// Mesh and material of a renderable entity, borrowed from the scene
#[derive(Debug, Clone, Copy)]
pub struct Renderable<'a> {
    /// Geometry
    pub mesh: &'a MeshComponent,
    /// Material
    pub material: &'a MaterialComponent,
    /// Model matrix; identity without a transform component
    pub model: Mat4,
}

/// Component storage for all entities
#[derive(Debug, Default)]
pub struct Scene {
    masks: Vec<ComponentMask>,
    transforms: Vec<TransformComponent>,
    meshes: Vec<Option<MeshComponent>>,
    materials: Vec<Option<MaterialComponent>>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next dense entity id with no components
    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity::new(self.masks.len());
        self.masks.push(ComponentMask::empty());
        self.transforms.push(Mat4::identity());
        self.meshes.push(None);
        self.materials.push(None);
        entity
    }

    /// Number of allocated entity slots
    pub fn entity_count(&self) -> usize {
        self.masks.len()
    }

    /// Every allocated entity in id order
    pub fn entities(&self) -> impl Iterator<Item = Entity> {
        (0..self.masks.len()).map(Entity::new)
    }

    /// Component mask of `entity`; empty for unknown ids
    pub fn mask(&self, entity: Entity) -> ComponentMask {
        self.masks.get(entity.index()).copied().unwrap_or_default()
    }

    /// Whether `entity` has every component in `mask`
    pub fn has_components(&self, entity: Entity, mask: ComponentMask) -> bool {
        self.mask(entity).contains(mask)
    }

    /// Set or replace the transform
    pub fn set_transform(&mut self, entity: Entity, transform: TransformComponent) -> SceneResult<()> {
        let index = self.slot(entity)?;
        self.transforms[index] = transform;
        self.masks[index].insert(ComponentMask::TRANSFORM);
        Ok(())
    }

    /// Set or replace the mesh
    pub fn set_mesh(&mut self, entity: Entity, mesh: MeshComponent) -> SceneResult<()> {
        let index = self.slot(entity)?;
        self.meshes[index] = Some(mesh);
        self.masks[index].insert(ComponentMask::MESH);
        Ok(())
    }

    /// Set or replace the material
    pub fn set_material(&mut self, entity: Entity, material: MaterialComponent) -> SceneResult<()> {
        let index = self.slot(entity)?;
        self.materials[index] = Some(material);
        self.masks[index].insert(ComponentMask::MATERIAL);
        Ok(())
    }

    /// Mark as eligible for gameplay systems
    pub fn add_logic(&mut self, entity: Entity) -> SceneResult<()> {
        let index = self.slot(entity)?;
        self.masks[index].insert(ComponentMask::LOGIC);
        Ok(())
    }

    /// Remove the components in `mask`, dropping their data
    pub fn remove_components(&mut self, entity: Entity, mask: ComponentMask) -> SceneResult<()> {
        let index = self.slot(entity)?;
        self.masks[index].remove(mask);
        if mask.contains(ComponentMask::TRANSFORM) {
            self.transforms[index] = Mat4::identity();
        }
        if mask.contains(ComponentMask::MESH) {
            self.meshes[index] = None;
        }
        if mask.contains(ComponentMask::MATERIAL) {
            self.materials[index] = None;
        }
        Ok(())
    }

    /// Transform of `entity` if its transform bit is set
    pub fn transform(&self, entity: Entity) -> Option<&TransformComponent> {
        if self.has_components(entity, ComponentMask::TRANSFORM) {
            self.transforms.get(entity.index())
        } else {
            None
        }
    }

    /// Mutable transform of `entity` if its transform bit is set
    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut TransformComponent> {
        if self.has_components(entity, ComponentMask::TRANSFORM) {
            self.transforms.get_mut(entity.index())
        } else {
            None
        }
    }

    /// Model matrix: the transform when present, identity otherwise
    pub fn model_matrix(&self, entity: Entity) -> Mat4 {
        self.transform(entity).copied().unwrap_or_else(Mat4::identity)
    }

    /// Mesh of `entity` if its mesh bit is set
    pub fn mesh(&self, entity: Entity) -> Option<&MeshComponent> {
        if self.has_components(entity, ComponentMask::MESH) {
            self.meshes.get(entity.index()).and_then(Option::as_ref)
        } else {
            None
        }
    }

    /// Material of `entity` if its material bit is set
    pub fn material(&self, entity: Entity) -> Option<&MaterialComponent> {
        if self.has_components(entity, ComponentMask::MATERIAL) {
            self.materials.get(entity.index()).and_then(Option::as_ref)
        } else {
            None
        }
    }

    /// Mutable material of `entity` if its material bit is set
    pub fn material_mut(&mut self, entity: Entity) -> Option<&mut MaterialComponent> {
        if self.has_components(entity, ComponentMask::MATERIAL) {
            self.materials.get_mut(entity.index()).and_then(Option::as_mut)
        } else {
            None
        }
    }

    /// Mesh, material and model matrix of a renderable entity
    ///
    /// Returns `Ok(None)` when the mask lacks mesh or material; that is the
    /// normal case for cameras and logic-only entities. A mask that claims
    /// data the containers do not hold is an error.
    pub fn renderable(&self, entity: Entity) -> SceneResult<Option<Renderable<'_>>> {
        let index = self.slot(entity)?;
        if !self.masks[index].contains(ComponentMask::RENDERABLE) {
            return Ok(None);
        }

        let mesh = self.meshes[index].as_ref().ok_or(SceneError::MissingComponentData {
            entity,
            kind: ComponentMask::MESH.kind_name(),
        })?;
        let material = self.materials[index].as_ref().ok_or(SceneError::MissingComponentData {
            entity,
            kind: ComponentMask::MATERIAL.kind_name(),
        })?;
        mesh.check_consistency()
            .map_err(|reason| SceneError::MalformedMesh { entity, reason })?;

        Ok(Some(Renderable {
            mesh,
            material,
            model: self.model_matrix(entity),
        }))
    }

    /// Raw mask override, for scene loaders restoring saved state
    pub fn set_mask(&mut self, entity: Entity, mask: ComponentMask) -> SceneResult<()> {
        let index = self.slot(entity)?;
        self.masks[index] = mask;
        Ok(())
    }

    fn slot(&self, entity: Entity) -> SceneResult<usize> {
        if entity.index() < self.masks.len() {
            Ok(entity.index())
        } else {
            Err(SceneError::UnknownEntity(entity))
        }
    }
}
