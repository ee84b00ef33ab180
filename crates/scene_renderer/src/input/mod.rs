//! Input handling
//!
//! Window and platform input plumbing live outside the crate; this module
//! only converts what the window reports into picking inputs.

pub mod picking;

pub use picking::CursorPosition;
