//! Module for anything related to rendering.
//!
//! This module contains the shader sources, the [`FrameController`] that draws one frame per
//! tick, and the window loop that drives it.

use std::sync::Arc;

use mv3d_core::{
    Result,
    config::{ColorSource, RenderConfig},
};
use sdl2::{event::Event, event::WindowEvent, keyboard::Keycode};

use crate::abs::{App, Backend, ShaderProgram, ShaderProgramBuilder};

pub mod frame;

pub use frame::FrameController;

/// Returns the `(vertex, fragment)` shader sources for a render configuration.
pub fn shader_sources(config: &RenderConfig) -> (&'static str, &'static str) {
    let vertex = if config.camera_uniforms {
        include_str!("shaders/vert/camera.glsl")
    } else {
        include_str!("shaders/vert/passthrough.glsl")
    };
    let fragment = match config.color_source {
        ColorSource::PerVertex => include_str!("shaders/frag/vertex_color.glsl"),
        ColorSource::Constant => include_str!("shaders/frag/constant.glsl"),
    };
    (vertex, fragment)
}

/// Builds the shader program matching `config`.
pub fn build_program<B: Backend>(gl: &Arc<B>, config: &RenderConfig) -> Result<ShaderProgram<B>> {
    let (vertex, fragment) = shader_sources(config);
    ShaderProgramBuilder::new(gl).build(vertex, fragment)
}

/// Runs the frame loop until the window is closed or Escape is pressed.
///
/// This must run on the thread that owns the GL context; it fails with
/// [`mv3d_core::Error::WrongThread`] otherwise. Any error inside a frame ends the loop, since a
/// broken draw state is not safe to keep rendering.
pub fn run<C: mv3d_core::clock::Clock>(
    app: &mut App,
    mut controller: FrameController<glow::Context, C>,
) -> Result<()> {
    app.context_thread.ensure_current()?;
    log::info!(
        "Drawing {} triangles, {:?}",
        controller.geometry().index_count() / 3,
        controller.camera()
    );

    let mut frames: u64 = 0;
    'running: loop {
        for event in app.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'running,
                Event::Window {
                    win_event: WindowEvent::SizeChanged(..),
                    ..
                } => {
                    let (width, height) = app.window.drawable_size();
                    controller.resize(width, height);
                }
                _ => {}
            }
        }

        controller.tick()?;
        app.window.gl_swap_window();
        frames += 1;
    }

    log::info!(
        "Closing after {} frames (rotation {:.2} rad)",
        frames,
        controller.state().rotation_angle
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abs::{
        fake::FakeGl,
        shader::{FLAT_COLOR, MODEL_MATRIX, PROJECTION_MATRIX, VIEW_MATRIX},
    };
    use mv3d_core::{
        config::Variant,
        layout::{POSITION, VERTEX_COLOR},
    };

    #[test]
    fn every_variant_builds() {
        for variant in [Variant::Perspective, Variant::Flat, Variant::Constant] {
            let gl = Arc::new(FakeGl::default());
            let config = RenderConfig::preset(variant);
            let program = build_program(&gl, &config).unwrap();
            assert!(program.attribute_location(POSITION).is_some());
            assert_eq!(
                program.has_uniform(MODEL_MATRIX),
                config.camera_uniforms,
                "{variant:?}"
            );
            assert_eq!(
                program.has_uniform(FLAT_COLOR),
                config.color_source == ColorSource::Constant,
                "{variant:?}"
            );
        }
    }

    #[test]
    fn perspective_program_exposes_the_full_interface() {
        let gl = Arc::new(FakeGl::default());
        let program = build_program(&gl, &RenderConfig::default()).unwrap();
        assert!(program.attribute_location(VERTEX_COLOR).is_some());
        assert!(program.has_uniform(PROJECTION_MATRIX));
        assert!(program.has_uniform(VIEW_MATRIX));
        assert!(program.has_uniform(MODEL_MATRIX));
    }
}
