//! The slice of OpenGL the viewer uses.
//!
//! [`Backend`] is implemented for [`glow::Context`]. Everything above this module talks to the
//! trait, so shaders, geometry and the frame loop can be exercised against the recording
//! [`fake::FakeGl`] in tests.

use std::fmt::Debug;

use glam::{Mat4, Vec4};
use glow::HasContext;
use mv3d_core::{ShaderStage, config::Topology};

/// Buffer binding points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

pub trait Backend {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type Buffer: Copy + Debug;
    type VertexArray: Copy + Debug;
    type UniformLocation: Clone + Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    /// Uploads the source and compiles it, returning the compile status.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    /// Links the program, returning the link status.
    fn link_program(&self, program: Self::Program) -> bool;
    /// Validates the program against the current state, returning the validate status.
    fn validate_program(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;
    fn uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4);
    fn uniform_vec4(&self, location: &Self::UniformLocation, value: Vec4);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>);
    /// Fills the buffer bound to `target` with write-once data.
    fn buffer_static_data(&self, target: BufferTarget, data: &[u8]);
    /// Size in bytes of the buffer bound to `target`.
    fn bound_buffer_size(&self, target: BufferTarget) -> usize;
    fn delete_buffer(&self, buffer: Self::Buffer);

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vertex_array: Self::VertexArray);
    /// Enables `location` and points it at `components` floats at `offset` within each `stride`.
    fn vertex_attrib_f32(&self, location: u32, components: i32, stride: i32, offset: i32);

    fn enable_depth_test(&self);
    fn viewport(&self, width: i32, height: i32);
    fn clear(&self, color: Vec4);
    fn draw_elements(&self, topology: Topology, count: i32);
    /// Returns and clears the pending error flag.
    fn take_error(&self) -> Option<u32>;
}

fn gl_target(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Vertex => glow::ARRAY_BUFFER,
        BufferTarget::Index => glow::ELEMENT_ARRAY_BUFFER,
    }
}

impl Backend for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type VertexArray = glow::VertexArray;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { HasContext::create_shader(self, shader_type) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> bool {
        unsafe {
            self.shader_source(shader, source);
            HasContext::compile_shader(self, shader);
            self.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) -> bool {
        unsafe {
            HasContext::link_program(self, program);
            self.get_program_link_status(program)
        }
    }

    fn validate_program(&self, program: Self::Program) -> bool {
        unsafe {
            HasContext::validate_program(self, program);
            self.get_program_parameter_i32(program, glow::VALIDATE_STATUS) != 0
        }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.get_attrib_location(program, name) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn uniform_mat4(&self, location: &Self::UniformLocation, value: &Mat4) {
        unsafe { self.uniform_matrix_4_f32_slice(Some(location), false, value.as_ref()) }
    }

    fn uniform_vec4(&self, location: &Self::UniformLocation, value: Vec4) {
        unsafe { self.uniform_4_f32(Some(location), value.x, value.y, value.z, value.w) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, gl_target(target), buffer) }
    }

    fn buffer_static_data(&self, target: BufferTarget, data: &[u8]) {
        unsafe { self.buffer_data_u8_slice(gl_target(target), data, glow::STATIC_DRAW) }
    }

    fn bound_buffer_size(&self, target: BufferTarget) -> usize {
        let size = unsafe { self.get_buffer_parameter_i32(gl_target(target), glow::BUFFER_SIZE) };
        size.max(0) as usize
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn bind_vertex_array(&self, vertex_array: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vertex_array) }
    }

    fn delete_vertex_array(&self, vertex_array: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vertex_array) }
    }

    fn vertex_attrib_f32(&self, location: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.enable_vertex_attrib_array(location);
            self.vertex_attrib_pointer_f32(
                location,
                components,
                glow::FLOAT,
                false,
                stride,
                offset,
            );
        }
    }

    fn enable_depth_test(&self) {
        unsafe {
            self.enable(glow::DEPTH_TEST);
            self.depth_func(glow::LESS);
        }
    }

    fn viewport(&self, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, 0, 0, width, height) }
    }

    fn clear(&self, color: Vec4) {
        unsafe {
            self.clear_color(color.x, color.y, color.z, color.w);
            HasContext::clear(self, glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
    }

    fn draw_elements(&self, topology: Topology, count: i32) {
        let mode = match topology {
            Topology::Triangles => glow::TRIANGLES,
            Topology::TriangleFan => glow::TRIANGLE_FAN,
        };
        unsafe { HasContext::draw_elements(self, mode, count, glow::UNSIGNED_INT, 0) }
    }

    fn take_error(&self) -> Option<u32> {
        match unsafe { self.get_error() } {
            glow::NO_ERROR => None,
            code => Some(code),
        }
    }
}
