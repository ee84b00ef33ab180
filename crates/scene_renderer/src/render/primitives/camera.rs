//! # Camera Projection
//!
//! The projection used to draw a frame and the one used to unproject a cursor
//! must be identical, otherwise picks drift away from what is on screen. Both
//! paths build their matrices through [`Projection`].
//!
//! The camera itself is an entity: its transform is the camera-to-world matrix,
//! so the view matrix is its inverse and its translation column is the eye.

use crate::core::config::ProjectionConfig;
use crate::foundation::math::{Mat4, Mat4Ext, utils};
use crate::render::{RenderError, RenderResult};

/// Symmetric perspective projection with a fixed vertical field of view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in radians
    pub fov_y: f32,
    /// Near clipping plane distance
    pub near: f32,
    /// Far clipping plane distance
    pub far: f32,
}

impl Projection {
    /// Build from configuration (degrees are converted to radians)
    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self {
            fov_y: utils::deg_to_rad(config.fov_degrees),
            near: config.near,
            far: config.far,
        }
    }

    /// Aspect ratio of a framebuffer, rejecting empty sizes
    ///
    /// A minimised window reports a zero dimension; the aspect ratio is then
    /// undefined and nothing sensible can be drawn or picked.
    pub fn aspect_ratio(width: u32, height: u32) -> RenderResult<f32> {
        if width == 0 || height == 0 {
            return Err(RenderError::DegenerateViewport { width, height });
        }
        Ok(width as f32 / height as f32)
    }

    /// Projection matrix for `aspect`
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(self.fov_y, aspect, self.near, self.far)
    }

    /// Inverse projection matrix for `aspect`
    pub fn inverse_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::inverse_perspective(self.fov_y, aspect, self.near, self.far)
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::from_config(&ProjectionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_projection_constants() {
        let projection = Projection::default();
        assert_relative_eq!(projection.fov_y, 60.0_f32.to_radians(), epsilon = 1e-6);
        assert_eq!(projection.near, 0.5);
        assert_eq!(projection.far, 100.0);
    }

    #[test]
    fn test_aspect_ratio_rejects_empty_framebuffer() {
        assert!(matches!(
            Projection::aspect_ratio(800, 0),
            Err(RenderError::DegenerateViewport { width: 800, height: 0 })
        ));
        assert_relative_eq!(Projection::aspect_ratio(1600, 900).unwrap(), 16.0 / 9.0);
    }

    #[test]
    fn test_only_horizontal_scale_depends_on_aspect() {
        let projection = Projection::default();
        let square = projection.matrix(1.0);
        let wide = projection.matrix(2.0);
        assert_relative_eq!(wide[(0, 0)] * 2.0, square[(0, 0)], epsilon = 1e-6);
        assert_relative_eq!(wide[(1, 1)], square[(1, 1)]);
        assert_relative_eq!(wide[(2, 2)], square[(2, 2)]);
    }
}
