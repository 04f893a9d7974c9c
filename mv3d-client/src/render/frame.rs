//! The per-frame update and draw.

use std::sync::Arc;

use mv3d_core::{
    Error, Result,
    camera::Camera,
    clock::Clock,
    config::{ColorSource, RenderConfig},
    state::RenderState,
    thread::ContextThread,
};

use crate::abs::{
    Backend, GpuGeometry, ShaderProgram,
    shader::{FLAT_COLOR, MODEL_MATRIX, PROJECTION_MATRIX, VIEW_MATRIX},
};

/// Owns everything needed to draw the model and advances its rotation once per tick.
///
/// Fields drop in declaration order, which releases the buffers and vertex array before the
/// program.
pub struct FrameController<B: Backend, C: Clock> {
    geometry: GpuGeometry<B>,
    program: ShaderProgram<B>,
    gl: Arc<B>,
    camera: Camera,
    config: RenderConfig,
    clock: C,
    state: RenderState,
    thread: ContextThread,
}

impl<B: Backend, C: Clock> FrameController<B, C> {
    /// Prepares the pipeline state and validates `program` against `geometry`.
    ///
    /// `thread` must be the thread that owns the context behind `gl`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gl: &Arc<B>,
        program: ShaderProgram<B>,
        geometry: GpuGeometry<B>,
        camera: Camera,
        config: RenderConfig,
        clock: C,
        thread: ContextThread,
    ) -> Result<Self> {
        thread.ensure_current()?;

        if config.camera_uniforms {
            for name in [PROJECTION_MATRIX, VIEW_MATRIX, MODEL_MATRIX] {
                if !program.has_uniform(name) {
                    log::warn!("Program has no `{name}` uniform; the model will not move");
                }
            }
        }

        gl.enable_depth_test();
        program.use_program();
        geometry.bind();
        let validated = program.validate();
        geometry.unbind();
        validated?;

        let state = RenderState::new(clock.now());

        Ok(Self {
            geometry,
            program,
            gl: Arc::clone(gl),
            camera,
            config,
            clock,
            state,
            thread,
        })
    }

    /// Advances the rotation by the elapsed time and draws the model once.
    ///
    /// The transforms are always computed from this tick's clock reading before anything is
    /// drawn.
    pub fn tick(&mut self) -> Result<()> {
        self.thread.ensure_current()?;

        let now = self.clock.now();
        let angle = self.state.advance(now, self.config.rotation_speed);
        let transforms = self.camera.transforms(angle as f32);

        self.gl.clear(self.config.clear_color());
        self.program.use_program();
        if self.config.camera_uniforms {
            self.program
                .set_uniform(PROJECTION_MATRIX, transforms.projection);
            self.program.set_uniform(VIEW_MATRIX, transforms.view);
            self.program.set_uniform(MODEL_MATRIX, transforms.model);
        }
        if self.config.color_source == ColorSource::Constant {
            self.program
                .set_uniform(FLAT_COLOR, self.config.flat_color());
        }
        self.geometry.draw(self.config.topology);

        match self.gl.take_error() {
            Some(code) => Err(Error::Backend { code }),
            None => Ok(()),
        }
    }

    /// Follows a new drawable size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
        let clamp = |extent: u32| i32::try_from(extent).unwrap_or(i32::MAX);
        self.gl.viewport(clamp(width), clamp(height));
        log::debug!("Viewport resized to {width}x{height}");
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn geometry(&self) -> &GpuGeometry<B> {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        abs::fake::{Call, FakeGl},
        render::build_program,
    };
    use glam::{Mat4, Vec4};
    use mv3d_core::{
        camera::model_matrix,
        clock::ManualClock,
        config::{CameraConfig, Topology, Variant},
        layout::VERTEX_LAYOUT,
        mesh::{LoadOptions, load_from_str},
    };

    const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";

    fn controller<'c>(
        gl: &Arc<FakeGl>,
        config: RenderConfig,
        clock: &'c ManualClock,
    ) -> FrameController<FakeGl, &'c ManualClock> {
        let (mesh, _) = load_from_str(TRIANGLE, &LoadOptions::default()).unwrap();
        let program = build_program(gl, &config).unwrap();
        let geometry = GpuGeometry::upload(gl, mesh, &program, &VERTEX_LAYOUT).unwrap();
        let camera = CameraConfig::default().camera(1280, 960);
        FrameController::new(
            gl,
            program,
            geometry,
            camera,
            config,
            clock,
            ContextThread::current(),
        )
        .unwrap()
    }

    fn uniform(calls: &[Call], name: &str) -> Option<Mat4> {
        calls.iter().rev().find_map(|c| match c {
            Call::UniformMat4(n, m) if n == name => Some(*m),
            _ => None,
        })
    }

    #[test]
    fn half_a_second_is_half_a_radian() {
        let gl = Arc::new(FakeGl::default());
        let clock = ManualClock::new(0.0);
        let mut controller = controller(&gl, RenderConfig::default(), &clock);

        controller.tick().unwrap();
        assert_eq!(controller.state().rotation_angle, 0.0);

        clock.set(0.5);
        gl.clear_calls();
        controller.tick().unwrap();
        assert_eq!(controller.state().rotation_angle, 0.5);
        assert_eq!(controller.state().last_tick_time, 0.5);

        let model = uniform(&gl.calls(), MODEL_MATRIX).unwrap();
        assert_eq!(model, model_matrix(0.5));
    }

    #[test]
    fn uniforms_are_pushed_before_the_single_draw() {
        let gl = Arc::new(FakeGl::default());
        let clock = ManualClock::new(2.0);
        let mut controller = controller(&gl, RenderConfig::default(), &clock);
        clock.advance(0.25);
        gl.clear_calls();
        controller.tick().unwrap();

        let calls = gl.calls();
        let draw = calls
            .iter()
            .position(|c| matches!(c, Call::Draw(..)))
            .unwrap();
        for name in [PROJECTION_MATRIX, VIEW_MATRIX, MODEL_MATRIX] {
            let set = calls
                .iter()
                .position(|c| matches!(c, Call::UniformMat4(n, _) if n == name))
                .unwrap();
            assert!(set < draw, "{name} set after draw");
        }
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::Draw(..))).count(),
            1
        );
        assert_eq!(calls[draw], Call::Draw(Topology::Triangles, 3));
        assert!(matches!(calls[0], Call::Clear(_)));
    }

    #[test]
    fn flat_variants_skip_camera_uniforms() {
        let gl = Arc::new(FakeGl::default());
        let clock = ManualClock::new(0.0);
        let mut config = RenderConfig::preset(Variant::Constant);
        config.flat_color = [1.0, 0.5, 0.0, 1.0];
        let mut controller = controller(&gl, config, &clock);
        gl.clear_calls();
        controller.tick().unwrap();

        let calls = gl.calls();
        assert!(uniform(&calls, MODEL_MATRIX).is_none());
        assert!(calls.contains(&Call::UniformVec4(
            FLAT_COLOR.to_string(),
            Vec4::new(1.0, 0.5, 0.0, 1.0)
        )));
        assert!(calls.contains(&Call::Draw(Topology::TriangleFan, 3)));
    }

    #[test]
    fn backend_errors_abort_the_frame() {
        let gl = Arc::new(FakeGl::default());
        let clock = ManualClock::new(0.0);
        let mut controller = controller(&gl, RenderConfig::default(), &clock);
        gl.state.borrow_mut().draw_error = Some(glow::INVALID_OPERATION);
        assert!(matches!(
            controller.tick(),
            Err(Error::Backend {
                code: glow::INVALID_OPERATION
            })
        ));
    }

    #[test]
    fn resize_updates_aspect_and_viewport() {
        let gl = Arc::new(FakeGl::default());
        let clock = ManualClock::new(0.0);
        let mut controller = controller(&gl, RenderConfig::default(), &clock);
        gl.clear_calls();
        controller.resize(1000, 500);
        assert_eq!(controller.camera().aspect, 2.0);
        assert_eq!(gl.calls(), vec![Call::Viewport(1000, 500)]);
    }

    #[test]
    fn huge_drawables_clamp_the_viewport() {
        let gl = Arc::new(FakeGl::default());
        let clock = ManualClock::new(0.0);
        let mut controller = controller(&gl, RenderConfig::default(), &clock);
        gl.clear_calls();
        controller.resize(u32::MAX, 600);
        assert_eq!(gl.calls(), vec![Call::Viewport(i32::MAX, 600)]);
    }

    #[test]
    fn release_order_is_buffers_then_vertex_array_then_program() {
        let gl = Arc::new(FakeGl::default());
        let clock = ManualClock::new(0.0);
        let controller = controller(&gl, RenderConfig::default(), &clock);
        gl.clear_calls();
        drop(controller);

        let deletes: Vec<&str> = gl
            .calls()
            .iter()
            .filter_map(|c| match c {
                Call::DeleteBuffer(_) => Some("buffer"),
                Call::DeleteVertexArray(_) => Some("vertex array"),
                Call::DeleteProgram(_) => Some("program"),
                _ => None,
            })
            .collect();
        assert_eq!(deletes, vec!["buffer", "buffer", "vertex array", "program"]);
        assert_eq!(gl.live_programs(), 0);
    }
}
