//! # Deferred Transparency
//!
//! Transparent entities are not drawn when the per-entity loop reaches them.
//! They are queued with their distance to the camera position captured at
//! frame start and drawn after every opaque entity, farthest first
//! (painter's algorithm).
//!
//! Distances are computed once, when an entity is queued, and stored by value.
//! Sorting therefore never reads scene data and cannot observe a transform
//! that changed after the entity was queued.

use crate::ecs::Entity;
use crate::foundation::math::Vec3;

#[derive(Debug, Clone, Copy)]
struct DeferredDraw {
    entity: Entity,
    distance: f32,
}

/// Per-frame worklist of transparent entities
#[derive(Debug, Default)]
pub struct TransparencyQueue {
    camera_position: Vec3,
    entries: Vec<DeferredDraw>,
}

impl TransparencyQueue {
    /// Create an empty queue anchored at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any queued entries and anchor distances at `camera_position`
    pub fn reset(&mut self, camera_position: Vec3) {
        self.entries.clear();
        self.camera_position = camera_position;
    }

    /// Camera position distances are measured from
    pub const fn camera_position(&self) -> Vec3 {
        self.camera_position
    }

    /// Queue `entity` located at `world_position`
    pub fn push(&mut self, entity: Entity, world_position: Vec3) {
        let distance = (world_position - self.camera_position).norm();
        self.entries.push(DeferredDraw { entity, distance });
    }

    /// Number of queued entities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is queued
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Empty the queue, returning entities farthest first
    ///
    /// Equal distances keep their queueing order.
    pub fn drain_back_to_front(&mut self) -> Vec<Entity> {
        self.entries.sort_by(|a, b| b.distance.total_cmp(&a.distance));
        self.entries.drain(..).map(|draw| draw.entity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drains_farthest_first() {
        let mut queue = TransparencyQueue::new();
        queue.reset(Vec3::new(0.0, 0.0, 6.0));
        queue.push(Entity::new(0), Vec3::new(0.0, 0.0, 5.0));
        queue.push(Entity::new(1), Vec3::new(0.0, 0.0, -10.0));
        queue.push(Entity::new(2), Vec3::new(3.0, 0.0, 0.0));

        let order = queue.drain_back_to_front();
        assert_eq!(order, vec![Entity::new(1), Entity::new(2), Entity::new(0)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ties_keep_queue_order() {
        let mut queue = TransparencyQueue::new();
        queue.reset(Vec3::zeros());
        queue.push(Entity::new(4), Vec3::new(1.0, 0.0, 0.0));
        queue.push(Entity::new(2), Vec3::new(0.0, 1.0, 0.0));

        assert_eq!(queue.drain_back_to_front(), vec![Entity::new(4), Entity::new(2)]);
    }

    #[test]
    fn test_reset_discards_stale_entries() {
        let mut queue = TransparencyQueue::new();
        queue.push(Entity::new(0), Vec3::zeros());
        queue.reset(Vec3::new(1.0, 2.0, 3.0));
        assert!(queue.is_empty());
        assert_eq!(queue.camera_position(), Vec3::new(1.0, 2.0, 3.0));
    }
}
