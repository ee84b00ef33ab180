//! Uniform block layouts and binding points
//!
//! Two uniform buffers are shared by every program: one for the per-draw
//! transform block and one for the per-material parameter block. Both are
//! rewritten before every draw call because their contents differ per entity.
//! Layouts follow std140: `vec3` members are padded to 16 bytes.

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Vec3};

/// Binding point of the `Uniforms` block
pub const UNIFORMS_BINDING_POINT: u32 = 0;

/// Binding point of the `ShaderParams` block
pub const SHADER_PARAMS_BINDING_POINT: u32 = 1;

/// Block name of the transform uniforms in shader source
pub const UNIFORMS_BLOCK_NAME: &str = "Uniforms";

/// Block name of the material parameters in shader source
pub const SHADER_PARAMS_BLOCK_NAME: &str = "ShaderParams";

/// Sampler uniform reading the material texture
pub const SAMPLER_UNIFORM: &str = "sampler";

/// Sampler uniform reading the environment cube map
pub const ENVIRONMENT_SAMPLER_UNIFORM: &str = "environmentSampler";

/// Texture unit of the material texture
pub const MATERIAL_TEXTURE_UNIT: u32 = 0;

/// Texture unit of the environment cube map
pub const ENVIRONMENT_TEXTURE_UNIT: u32 = 1;

/// Contents of the `Uniforms` block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct UniformFormat {
    /// Model-to-world matrix, column major
    pub model: [[f32; 4]; 4],
    /// World-to-view matrix, column major
    pub view: [[f32; 4]; 4],
    /// View-to-clip matrix, column major
    pub projection: [[f32; 4]; 4],
    /// Camera world position, `w` unused
    pub camera_pos: [f32; 4],
}

impl UniformFormat {
    /// Pack matrices and camera position into block layout
    pub fn new(model: &Mat4, view: &Mat4, projection: &Mat4, camera_pos: &Vec3) -> Self {
        Self {
            model: (*model).into(),
            view: (*view).into(),
            projection: (*projection).into(),
            camera_pos: [camera_pos.x, camera_pos.y, camera_pos.z, 1.0],
        }
    }

    /// Model matrix as a nalgebra matrix
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from(self.model)
    }
}

/// Contents of the `ShaderParams` block
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct ShaderParams {
    /// How strongly the surface reflects the environment map, 0..=1
    pub metallicness: f32,
    padding: [f32; 3],
}

impl ShaderParams {
    /// Create a parameter block
    pub const fn new(metallicness: f32) -> Self {
        Self { metallicness, padding: [0.0; 3] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_sizes_are_std140_aligned() {
        assert_eq!(std::mem::size_of::<UniformFormat>(), 3 * 64 + 16);
        assert_eq!(std::mem::size_of::<ShaderParams>(), 16);
    }

    #[test]
    fn test_model_matrix_survives_packing() {
        let model = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let block = UniformFormat::new(&model, &Mat4::identity(), &Mat4::identity(), &Vec3::zeros());
        let bytes = bytemuck::bytes_of(&block);
        let decoded: UniformFormat = bytemuck::pod_read_unaligned(bytes);
        assert_eq!(decoded.model_matrix(), model);
    }
}
