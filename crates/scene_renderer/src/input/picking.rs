//! Cursor state for picking operations
//!
//! Converts window-space cursor coordinates to Normalized Device Coordinates
//! (NDC) for ray casting.

use crate::foundation::math::Vec2;
use crate::render::primitives::Projection;
use crate::render::RenderResult;

/// Cursor position in window pixels, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CursorPosition {
    /// Pixels from the left edge
    pub x: f64,
    /// Pixels from the top edge
    pub y: f64,
}

impl CursorPosition {
    /// Create a cursor position
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Centre of a `width` × `height` window
    pub fn center_of(width: u32, height: u32) -> Self {
        Self::new(f64::from(width) / 2.0, f64::from(height) / 2.0)
    }

    /// Convert to NDC for a `width` × `height` framebuffer
    ///
    /// NDC range: [-1, 1] where:
    /// - X: -1 = left, +1 = right
    /// - Y: +1 = top, -1 = bottom (window y grows downwards, NDC y upwards)
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_ndc(self, width: u32, height: u32) -> RenderResult<Vec2> {
        Projection::aspect_ratio(width, height)?;
        let ndc_x = 2.0 * self.x / f64::from(width) - 1.0;
        let ndc_y = 1.0 - 2.0 * self.y / f64::from(height);
        Ok(Vec2::new(ndc_x as f32, ndc_y as f32))
    }
}

impl From<(f64, f64)> for CursorPosition {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}
