//! Entity implementation

use std::fmt;

/// Entity identifier
///
/// A dense index into every component container of a [`crate::ecs::Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    id: usize,
}

impl Entity {
    /// Create an entity handle for slot `id`
    pub const fn new(id: usize) -> Self {
        Self { id }
    }

    /// Slot index inside the scene containers
    pub const fn index(self) -> usize {
        self.id
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.id)
    }
}
