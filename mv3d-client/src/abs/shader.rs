//! OpenGL Shaders
//!
//! This module defines the [`Shader`] and [`ShaderProgram`] structs for managing shader objects
//! and the [`ShaderProgramBuilder`] that turns a vertex/fragment source pair into a linked
//! program. It also provides the [`Uniform`] trait for setting uniform variables.
//!
//! Failures never surface as a bare status flag: compile and link errors carry the backend's info
//! log so they can be diagnosed from the viewer's own output.

use std::{collections::HashMap, sync::Arc};

use glam::{Mat4, Vec4};
use mv3d_core::{
    Error, Result, ShaderStage,
    layout::{POSITION, VERTEX_COLOR},
};

use crate::abs::Backend;

pub const PROJECTION_MATRIX: &str = "projectionMatrix";
pub const VIEW_MATRIX: &str = "viewMatrix";
pub const MODEL_MATRIX: &str = "modelMatrix";
pub const FLAT_COLOR: &str = "flatColor";

/// Attribute names looked up after linking.
const ATTRIBUTES: [&str; 2] = [POSITION, VERTEX_COLOR];
/// Uniform names looked up after linking. Programs may leave any of them out.
const UNIFORMS: [&str; 4] = [PROJECTION_MATRIX, VIEW_MATRIX, MODEL_MATRIX, FLAT_COLOR];

/// Strips the NUL terminator and trailing whitespace drivers leave on info logs.
fn clean_log(log: String) -> String {
    let log = log.trim_end_matches(['\0', '\n', '\r', ' ', '\t']);
    if log.is_empty() {
        "(the driver returned an empty info log)".to_string()
    } else {
        log.to_string()
    }
}

/// Represents an individual compiled shader object.
pub struct Shader<B: Backend> {
    gl: Arc<B>,
    id: B::Shader,
    stage: ShaderStage,
}

impl<B: Backend> Shader<B> {
    /// Compiles a new shader from the given source code.
    pub fn new(gl: &Arc<B>, stage: ShaderStage, source: &str) -> Result<Self> {
        let shader = gl.create_shader(stage).map_err(|reason| Error::Resource {
            what: "shader object",
            reason,
        })?;

        if !gl.compile_shader(shader, source) {
            let log = clean_log(gl.shader_info_log(shader));
            gl.delete_shader(shader);
            return Err(Error::Compile { stage, log });
        }

        log::debug!("Compiled {stage} shader {shader:?}");

        Ok(Self {
            gl: Arc::clone(gl),
            id: shader,
            stage,
        })
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<B: Backend> Drop for Shader<B> {
    fn drop(&mut self) {
        self.gl.delete_shader(self.id);
    }
}

/// Represents a uniform variable in a shader program.
pub trait Uniform {
    /// Sets the value of the uniform variable at the given location.
    fn set_uniform<B: Backend>(&self, gl: &B, location: &B::UniformLocation);
}

impl Uniform for Mat4 {
    fn set_uniform<B: Backend>(&self, gl: &B, location: &B::UniformLocation) {
        gl.uniform_mat4(location, self);
    }
}

impl Uniform for Vec4 {
    fn set_uniform<B: Backend>(&self, gl: &B, location: &B::UniformLocation) {
        gl.uniform_vec4(location, *self);
    }
}

impl<T: Uniform> Uniform for &T {
    fn set_uniform<B: Backend>(&self, gl: &B, location: &B::UniformLocation) {
        (*self).set_uniform(gl, location);
    }
}

/// A linked shader program together with the locations of its known inputs.
pub struct ShaderProgram<B: Backend> {
    gl: Arc<B>,
    id: B::Program,
    attributes: HashMap<String, u32>,
    uniforms: HashMap<String, B::UniformLocation>,
}

impl<B: Backend> ShaderProgram<B> {
    /// Links a new shader program from a vertex and a fragment shader.
    ///
    /// Both shaders are consumed; once linking succeeds they are detached and released, leaving
    /// the program as the only GPU object.
    pub fn new(gl: &Arc<B>, vertex: Shader<B>, fragment: Shader<B>) -> Result<Self> {
        let program = gl.create_program().map_err(|reason| Error::Resource {
            what: "shader program",
            reason,
        })?;

        gl.attach_shader(program, vertex.id);
        gl.attach_shader(program, fragment.id);

        if !gl.link_program(program) {
            let log = clean_log(gl.program_info_log(program));
            gl.delete_program(program);
            return Err(Error::Link { log });
        }

        gl.detach_shader(program, vertex.id);
        gl.detach_shader(program, fragment.id);
        drop(vertex);
        drop(fragment);

        let attributes: HashMap<String, u32> = ATTRIBUTES
            .iter()
            .filter_map(|&name| Some((name.to_string(), gl.attrib_location(program, name)?)))
            .collect();
        let uniforms: HashMap<String, B::UniformLocation> = UNIFORMS
            .iter()
            .filter_map(|&name| Some((name.to_string(), gl.uniform_location(program, name)?)))
            .collect();

        let program = Self {
            gl: Arc::clone(gl),
            id: program,
            attributes,
            uniforms,
        };

        if program.attribute_location(POSITION).is_none() {
            // Dropping `program` releases it.
            return Err(Error::Link {
                log: format!("program has no active `{POSITION}` attribute"),
            });
        }

        log::info!(
            "Linked shader program {:?} (attributes: {:?}, uniforms: {:?})",
            program.id,
            program.attributes,
            program.uniforms.keys().collect::<Vec<_>>()
        );

        Ok(program)
    }

    /// Validates the program against the current pipeline state.
    ///
    /// Must be called with the geometry the program will draw bound, since core profiles reject
    /// validation without a vertex array object.
    pub fn validate(&self) -> Result<()> {
        if self.gl.validate_program(self.id) {
            Ok(())
        } else {
            Err(Error::Link {
                log: format!(
                    "validation failed: {}",
                    clean_log(self.gl.program_info_log(self.id))
                ),
            })
        }
    }

    /// Binds the shader program for use.
    pub fn use_program(&self) {
        self.gl.use_program(Some(self.id));
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes.get(name).copied()
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.contains_key(name)
    }

    /// Sets a uniform variable in the shader program. Returns `false` if the program has no
    /// such uniform.
    pub fn set_uniform<T: Uniform>(&self, name: &str, value: T) -> bool {
        match self.uniforms.get(name) {
            Some(location) => {
                value.set_uniform(&*self.gl, location);
                true
            }
            None => false,
        }
    }
}

impl<B: Backend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        self.gl.delete_program(self.id);
    }
}

/// Compiles and links vertex/fragment shader pairs.
pub struct ShaderProgramBuilder<B: Backend> {
    gl: Arc<B>,
}

impl<B: Backend> ShaderProgramBuilder<B> {
    pub fn new(gl: &Arc<B>) -> Self {
        Self { gl: Arc::clone(gl) }
    }

    pub fn compile(&self, source: &str, stage: ShaderStage) -> Result<Shader<B>> {
        Shader::new(&self.gl, stage, source)
    }

    pub fn link(&self, vertex: Shader<B>, fragment: Shader<B>) -> Result<ShaderProgram<B>> {
        if vertex.stage() != ShaderStage::Vertex || fragment.stage() != ShaderStage::Fragment {
            return Err(Error::Link {
                log: format!(
                    "expected a vertex and a fragment shader, got {} and {}",
                    vertex.stage(),
                    fragment.stage()
                ),
            });
        }
        ShaderProgram::new(&self.gl, vertex, fragment)
    }

    /// Compiles both stages and links them.
    pub fn build(&self, vertex_source: &str, fragment_source: &str) -> Result<ShaderProgram<B>> {
        let vertex = self.compile(vertex_source, ShaderStage::Vertex)?;
        let fragment = self.compile(fragment_source, ShaderStage::Fragment)?;
        self.link(vertex, fragment)
    }
}
