//! Transform component
//!
//! A transform is a plain model-to-world matrix. Movement and gameplay code
//! mutate it between frames; the renderer and picking only read it.

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Model-to-world matrix of an entity
pub type TransformComponent = Mat4;

/// Factory for common transforms
pub struct TransformFactory;

impl TransformFactory {
    /// Pure translation
    pub fn at(position: Vec3) -> TransformComponent {
        Mat4::new_translation(&position)
    }

    /// Translation followed by a non-uniform scale about the model origin
    pub fn at_scaled(position: Vec3, scale: Vec3) -> TransformComponent {
        Mat4::new_translation(&position) * Mat4::new_nonuniform_scaling(&scale)
    }

    /// Camera world transform for a camera at `eye` looking at `target`
    pub fn camera_looking_at(eye: Vec3, target: Vec3, up: Vec3) -> TransformComponent {
        Mat4::camera_looking_at(eye, target, up)
    }

    /// World position of a transform
    pub fn position(transform: &TransformComponent) -> Vec3 {
        transform.translation_part()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_position_reads_translation() {
        let transform = TransformFactory::at_scaled(Vec3::new(1.0, -2.0, 3.0), Vec3::new(4.0, 4.0, 4.0));
        assert_relative_eq!(TransformFactory::position(&transform), Vec3::new(1.0, -2.0, 3.0));
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let transform = TransformFactory::at_scaled(Vec3::new(0.0, 0.0, -1.0), Vec3::new(2.0, 1.0, 1.0));
        let point = transform.transform_point(&crate::foundation::math::Point3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(point.coords, Vec3::new(2.0, 1.0, -1.0));
    }
}
