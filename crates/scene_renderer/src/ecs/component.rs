//! Component presence mask

use bitflags::bitflags;

bitflags! {
    /// Which component kinds an entity currently has
    ///
    /// A container entry is meaningful only while its bit is set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ComponentMask: u32 {
        /// Model-to-world transform
        const TRANSFORM = 1 << 0;
        /// Uploaded geometry
        const MESH = 1 << 1;
        /// Shader, texture and draw flags
        const MATERIAL = 1 << 2;
        /// Eligible for gameplay systems
        const LOGIC = 1 << 3;

        /// What the render pipeline and picking need
        const RENDERABLE = Self::MESH.bits() | Self::MATERIAL.bits();
    }
}

impl ComponentMask {
    /// Human-readable name of a single component bit
    pub fn kind_name(self) -> &'static str {
        if self == Self::TRANSFORM {
            "transform"
        } else if self == Self::MESH {
            "mesh"
        } else if self == Self::MATERIAL {
            "material"
        } else if self == Self::LOGIC {
            "logic"
        } else {
            "component set"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderable_needs_mesh_and_material() {
        assert!(!ComponentMask::MESH.contains(ComponentMask::RENDERABLE));
        assert!((ComponentMask::MESH | ComponentMask::MATERIAL).contains(ComponentMask::RENDERABLE));
        assert!((ComponentMask::all()).contains(ComponentMask::RENDERABLE));
    }
}
