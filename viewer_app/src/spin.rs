//! Spins logic entities about their local Y axis

use std::any::Any;

use scene_renderer::prelude::*;

/// Rotates every entity carrying the logic component by a fixed step per frame
pub struct SpinSystem {
    step: Mat4,
    spun: usize,
}

impl SpinSystem {
    /// Spin by `degrees_per_frame` about local Y
    pub fn new(degrees_per_frame: f32) -> Self {
        Self {
            step: Mat4::from_axis_angle(&Vec3::y_axis(), degrees_per_frame.to_radians()),
            spun: 0,
        }
    }

    /// Entities rotated during the last frame
    pub const fn spun_last_frame(&self) -> usize {
        self.spun
    }
}

impl System for SpinSystem {
    fn begin_frame(&mut self, _scene: &mut Scene) -> Result<(), SystemError> {
        self.spun = 0;
        Ok(())
    }

    fn update(&mut self, scene: &mut Scene, entity: Entity) -> Result<(), SystemError> {
        if !scene.has_components(entity, ComponentMask::TRANSFORM | ComponentMask::LOGIC) {
            return Ok(());
        }
        match scene.transform_mut(entity) {
            Some(transform) => {
                *transform = *transform * self.step;
                self.spun += 1;
            }
            None => log::warn!("{} has a logic mask but no transform data", entity),
        }
        Ok(())
    }

    fn end_frame(&mut self, _scene: &mut Scene) -> Result<(), SystemError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "spin"
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
