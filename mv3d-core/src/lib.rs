//! The core of the mineview3d viewer. This crate holds everything that does not touch the GPU:
//! geometry loading, the vertex layout, the camera, the animation clock and state, the viewer
//! configuration and the shared error type.

use std::fmt;

pub mod camera;
pub mod clock;
pub mod config;
pub mod error;
pub mod layout;
pub mod mesh;
pub mod state;
pub mod thread;

pub use error::{Error, Result};

/// A programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}
