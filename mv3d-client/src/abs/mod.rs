//! This module contains the GPU-facing building blocks of the viewer: the backend seam over
//! OpenGL, window and context setup, shader management and geometry upload.

pub mod app;
pub mod backend;
pub mod geometry;
pub mod shader;

pub use app::*;
pub use backend::*;
pub use geometry::*;
pub use shader::*;
