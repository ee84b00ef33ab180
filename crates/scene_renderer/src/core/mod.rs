//! # Core Renderer Settings
//!
//! Concrete configuration types consumed by the render pipeline and picking.
//! The generic load/save machinery lives in [`crate::config`].

pub mod config;

pub use config::{
    RendererConfig, ProjectionConfig, OutlineConfig, PickingConfig, PickMode,
    ShaderConfig, ShaderSetConfig,
};
