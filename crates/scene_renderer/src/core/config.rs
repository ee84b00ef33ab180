//! # Renderer Configuration
//!
//! Configuration structures for the render pipeline, outline pass, picking and
//! shader program sources. Every structure has working defaults so a renderer
//! can be created without a config file; files in TOML or RON override any
//! subset of fields.
//!
//! ## Example (TOML)
//!
//! ```toml
//! clear_color = [0.1, 0.1, 0.1, 1.0]
//!
//! [projection]
//! fov_degrees = 75.0
//!
//! [picking]
//! mode = "first_hit"
//! ```

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// Perspective projection parameters shared by drawing and picking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Distance to the near clipping plane
    pub near: f32,
    /// Distance to the far clipping plane
    pub far: f32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.5,
            far: 100.0,
        }
    }
}

/// Outline pass parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    /// Uniform scale applied about the model origin for the outline copy
    pub scale: f32,
    /// Stencil value written by outline owners and tested by the outline copy
    pub stencil_reference: u8,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            scale: 1.1,
            stencil_reference: 0xFF,
        }
    }
}

/// Which intersection a pick returns when several triangles are hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickMode {
    /// Smallest ray distance across every entity and triangle
    #[default]
    Nearest,
    /// First accepted triangle in entity/index scan order
    FirstHit,
}

/// Picking parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickingConfig {
    /// Hit selection policy
    pub mode: PickMode,
    /// Determinant and minimum ray distance threshold
    pub epsilon: f32,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            mode: PickMode::Nearest,
            epsilon: 1e-7,
        }
    }
}

/// # Shader Configuration
///
/// Vertex and fragment source paths for one shader program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderConfig {
    /// Path to the vertex shader source
    pub vertex_shader_path: String,
    /// Path to the fragment shader source
    pub fragment_shader_path: String,
}

impl ShaderConfig {
    /// Create a new shader configuration
    pub fn new(vertex_path: impl Into<String>, fragment_path: impl Into<String>) -> Self {
        Self {
            vertex_shader_path: vertex_path.into(),
            fragment_shader_path: fragment_path.into(),
        }
    }
}

/// Source paths for every program the renderer and scene setup select from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSetConfig {
    /// Lit, textured, environment-reflective program
    pub default: ShaderConfig,
    /// Flat colour program used by the outline copy
    pub outline: ShaderConfig,
    /// Animated reflective water surface
    pub water: ShaderConfig,
    /// Alpha-threshold cut-out program
    pub threshold: ShaderConfig,
    /// Cube-map skybox program
    pub skybox: ShaderConfig,
}

impl Default for ShaderSetConfig {
    fn default() -> Self {
        Self {
            default: ShaderConfig::new("assets/shaders/default_vert.glsl", "assets/shaders/default_frag.glsl"),
            outline: ShaderConfig::new("assets/shaders/default_vert.glsl", "assets/shaders/outline_frag.glsl"),
            water: ShaderConfig::new("assets/shaders/default_vert.glsl", "assets/shaders/water_frag.glsl"),
            threshold: ShaderConfig::new("assets/shaders/default_vert.glsl", "assets/shaders/threshold_frag.glsl"),
            skybox: ShaderConfig::new("assets/shaders/skybox_vert.glsl", "assets/shaders/skybox_frag.glsl"),
        }
    }
}

/// Top-level render pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Projection used for both drawing and picking
    pub projection: ProjectionConfig,
    /// Outline pass parameters
    pub outline: OutlineConfig,
    /// Colour the frame is cleared to
    pub clear_color: [f32; 4],
    /// Picking parameters
    pub picking: PickingConfig,
    /// Shader program sources
    pub shaders: ShaderSetConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionConfig::default(),
            outline: OutlineConfig::default(),
            clear_color: [0.2, 0.3, 0.3, 1.0],
            picking: PickingConfig::default(),
            shaders: ShaderSetConfig::default(),
        }
    }
}

impl RendererConfig {
    /// Check value constraints that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let projection = &self.projection;
        let values = [
            ("fov_degrees", projection.fov_degrees),
            ("near", projection.near),
            ("far", projection.far),
            ("outline scale", self.outline.scale),
            ("picking epsilon", self.picking.epsilon),
        ];
        if let Some((name, value)) = values.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::Invalid(format!("{name} must be finite, got {value}")));
        }

        if !(projection.fov_degrees > 0.0 && projection.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov_degrees must be in (0, 180), got {}", projection.fov_degrees
            )));
        }
        if !(projection.near > 0.0 && projection.near < projection.far) {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                projection.near, projection.far
            )));
        }
        // Perspective3 rejects planes that compare equal within epsilon
        if !approx::relative_ne!(projection.far - projection.near, 0.0) {
            return Err(ConfigError::Invalid(format!(
                "clip planes are too close together, got near={} far={}",
                projection.near, projection.far
            )));
        }
        if self.outline.scale <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "outline scale must be positive, got {}", self.outline.scale
            )));
        }
        if self.picking.epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "picking epsilon must not be negative, got {}", self.picking.epsilon
            )));
        }
        Ok(())
    }
}

impl Config for RendererConfig {}
