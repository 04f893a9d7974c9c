//! SDL2 and OpenGL application management.
//!
//! This module defines the [`App`] struct which encapsulates the SDL2 window and the OpenGL
//! context the viewer renders into.

use std::sync::Arc;

use glow::HasContext;
use mv3d_core::{Error, Result, config::WindowConfig, thread::ContextThread};

/// The [`App`] struct encapsulates the SDL2 and OpenGL context.
///
/// Field order matters on drop: the GL handle goes before the context and the context before
/// the window.
pub struct App {
    pub gl: Arc<glow::Context>,
    pub gl_context: sdl2::video::GLContext,
    pub event_pump: sdl2::EventPump,
    pub window: sdl2::video::Window,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub sdl: sdl2::Sdl,
    /// The thread the context is current on.
    pub context_thread: ContextThread,
}

impl App {
    /// Opens a window with an OpenGL 4.1 core, forward-compatible context and makes it current
    /// on the calling thread.
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let sdl = sdl2::init().map_err(Error::Window)?;
        let video_subsystem = sdl.video().map_err(Error::Window)?;

        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(4, 1);
        gl_attr.set_context_flags().forward_compatible().set();
        gl_attr.set_depth_size(24);
        gl_attr.set_double_buffer(true);

        let window = video_subsystem
            .window(&config.title, config.width, config.height)
            .opengl()
            .resizable()
            .position_centered()
            .build()
            .map_err(|e| Error::Window(e.to_string()))?;

        let gl_context = window.gl_create_context().map_err(Error::Window)?;
        window.gl_make_current(&gl_context).map_err(Error::Window)?;
        if let Err(e) = video_subsystem.gl_set_swap_interval(1) {
            log::warn!("Could not enable vsync: {e}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        log::info!("OpenGL version {}", unsafe {
            gl.get_parameter_string(glow::VERSION)
        });

        let event_pump = sdl.event_pump().map_err(Error::Window)?;

        Ok(Self {
            gl: Arc::new(gl),
            gl_context,
            event_pump,
            window,
            video_subsystem,
            sdl,
            context_thread: ContextThread::current(),
        })
    }

    /// Size of the drawable area in pixels.
    pub fn drawable_size(&self) -> (u32, u32) {
        self.window.drawable_size()
    }
}
