//! Math utilities and types
//!
//! Provides the math aliases and matrix helpers shared by the render pipeline
//! and the picking code. Both must agree on the projection convention, so the
//! perspective helpers live here rather than next to either consumer.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix4,
    Perspective3,
    Isometry3,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Right-handed OpenGL-style perspective projection (clip z in [-w, w])
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Analytic inverse of [`Mat4Ext::perspective`] for the same parameters
    fn inverse_perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Camera world transform for a camera at `eye` looking at `target`
    ///
    /// This is the inverse of a right-handed look-at view matrix: the camera
    /// looks down its local -Z axis and its translation column is `eye`.
    fn camera_looking_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Translation column of an affine transform
    fn translation_part(&self) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Perspective3::new(aspect, fov_y, near, far).to_homogeneous()
    }

    fn inverse_perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Perspective3::new(aspect, fov_y, near, far).inverse()
    }

    fn camera_looking_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Isometry3::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
            .inverse()
            .to_homogeneous()
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perspective_inverse_round_trip() {
        let fov = utils::deg_to_rad(60.0);
        let proj = Mat4::perspective(fov, 1.5, 0.5, 100.0);
        let inv = Mat4::inverse_perspective(fov, 1.5, 0.5, 100.0);
        assert_relative_eq!(proj * inv, Mat4::identity(), epsilon = 1e-4);
    }

    #[test]
    fn test_camera_looking_at_translation_is_eye() {
        let eye = Vec3::new(0.0, 2.0, 6.0);
        let camera = Mat4::camera_looking_at(eye, Vec3::zeros(), Vec3::y());
        assert_relative_eq!(camera.translation_part(), eye, epsilon = 1e-5);
    }

    #[test]
    fn test_camera_looks_down_negative_z() {
        let camera = Mat4::camera_looking_at(Vec3::new(0.0, 0.0, 6.0), Vec3::zeros(), Vec3::y());
        let forward = camera.transform_vector(&Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(forward, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }
}
