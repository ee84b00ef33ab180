//! Frame sequencing
//!
//! Runs registered systems in a fixed order every frame:
//!
//! 1. `begin_frame` on every system, in registration order
//! 2. for every entity slot in id order, `update` on every system in
//!    registration order
//! 3. `end_frame` on every system, in registration order
//!
//! The slot count is re-read after each entity, so entities created by an
//! earlier system during the frame are still visited. Per-entity faults are
//! logged and collected; any other failure aborts the frame.

use crate::foundation::logging::{debug, warn};

use super::{Entity, Scene, System, SystemError};

/// A per-entity fault that did not stop the frame
#[derive(Debug)]
pub struct EntityFault {
    /// System that reported the fault
    pub system: &'static str,
    /// Entity being updated
    pub entity: Entity,
    /// The reported error
    pub error: SystemError,
}

/// Summary of one completed frame
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Zero-based frame number
    pub frame: u64,
    /// Entity slots visited
    pub entities_visited: usize,
    /// Faults reported and skipped
    pub faults: Vec<EntityFault>,
}

impl FrameReport {
    /// Whether the frame completed without any fault
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Drives systems through begin/update/end every frame
#[derive(Default)]
pub struct FrameSequencer {
    systems: Vec<Box<dyn System>>,
    frame_count: u64,
}

impl FrameSequencer {
    /// Create a sequencer with no systems
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system; systems run in registration order
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Number of frames completed
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// First registered system of type `T`
    pub fn system_mut<T: System + 'static>(&mut self) -> Option<&mut T> {
        self.systems
            .iter_mut()
            .find_map(|system| system.as_any_mut().downcast_mut::<T>())
    }

    /// Run one frame over `scene`
    pub fn run_frame(&mut self, scene: &mut Scene) -> Result<FrameReport, SystemError> {
        let mut report = FrameReport {
            frame: self.frame_count,
            ..FrameReport::default()
        };

        for system in &mut self.systems {
            system.begin_frame(scene)?;
        }

        let mut index = 0;
        while index < scene.entity_count() {
            let entity = Entity::new(index);
            for system in &mut self.systems {
                match system.update(scene, entity) {
                    Ok(()) => {}
                    Err(error) if error.is_per_entity() => {
                        warn!("{} skipped {}: {}", system.name(), entity, error);
                        report.faults.push(EntityFault { system: system.name(), entity, error });
                    }
                    Err(error) => return Err(error),
                }
            }
            index += 1;
        }
        report.entities_visited = index;

        for system in &mut self.systems {
            system.end_frame(scene)?;
        }

        debug!(
            "frame {} done: {} entities, {} faults",
            report.frame,
            report.entities_visited,
            report.faults.len()
        );
        self.frame_count += 1;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::SceneError;
    use crate::render::RenderError;
    use std::any::Any;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct ScriptedSystem {
        name: &'static str,
        log: Log,
        fail_on: Option<Entity>,
        fatal: bool,
    }

    impl ScriptedSystem {
        fn new(name: &'static str, log: &Log) -> Self {
            Self { name, log: Rc::clone(log), fail_on: None, fatal: false }
        }
    }

    impl System for ScriptedSystem {
        fn begin_frame(&mut self, _scene: &mut Scene) -> Result<(), SystemError> {
            self.log.borrow_mut().push(format!("{}:begin", self.name));
            Ok(())
        }

        fn update(&mut self, _scene: &mut Scene, entity: Entity) -> Result<(), SystemError> {
            self.log.borrow_mut().push(format!("{}:{}", self.name, entity.index()));
            if self.fail_on == Some(entity) {
                if self.fatal {
                    return Err(SystemError::Other { system: self.name, message: "boom".to_string() });
                }
                return Err(RenderError::MalformedEntity {
                    entity,
                    source: SceneError::UnknownEntity(entity),
                }
                .into());
            }
            Ok(())
        }

        fn end_frame(&mut self, _scene: &mut Scene) -> Result<(), SystemError> {
            self.log.borrow_mut().push(format!("{}:end", self.name));
            Ok(())
        }

        fn name(&self) -> &'static str {
            self.name
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn scene_with(count: usize) -> Scene {
        let mut scene = Scene::new();
        for _ in 0..count {
            scene.create_entity();
        }
        scene
    }

    #[test]
    fn test_systems_run_in_fixed_order() {
        let log: Log = Rc::default();
        let mut sequencer = FrameSequencer::new();
        sequencer.add_system(ScriptedSystem::new("a", &log));
        sequencer.add_system(ScriptedSystem::new("b", &log));

        let report = sequencer.run_frame(&mut scene_with(2)).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["a:begin", "b:begin", "a:0", "b:0", "a:1", "b:1", "a:end", "b:end"]
        );
        assert_eq!(report.entities_visited, 2);
        assert!(report.is_clean());
        assert_eq!(sequencer.frame_count(), 1);
    }

    #[test]
    fn test_per_entity_fault_is_collected() {
        let log: Log = Rc::default();
        let mut system = ScriptedSystem::new("render", &log);
        system.fail_on = Some(Entity::new(0));
        let mut sequencer = FrameSequencer::new();
        sequencer.add_system(system);

        let report = sequencer.run_frame(&mut scene_with(2)).unwrap();

        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].entity, Entity::new(0));
        assert!(log.borrow().contains(&"render:end".to_string()));
    }

    #[test]
    fn test_fatal_error_aborts_frame() {
        let log: Log = Rc::default();
        let mut system = ScriptedSystem::new("input", &log);
        system.fail_on = Some(Entity::new(0));
        system.fatal = true;
        let mut sequencer = FrameSequencer::new();
        sequencer.add_system(system);

        assert!(sequencer.run_frame(&mut scene_with(2)).is_err());
        assert!(!log.borrow().contains(&"input:end".to_string()));
        assert_eq!(sequencer.frame_count(), 0);
    }

    #[test]
    fn test_typed_system_access() {
        let log: Log = Rc::default();
        let mut sequencer = FrameSequencer::new();
        sequencer.add_system(ScriptedSystem::new("a", &log));

        let system = sequencer.system_mut::<ScriptedSystem>().unwrap();
        assert_eq!(system.name, "a");
    }
}
