//! GPU-resident geometry.
//!
//! [`GpuGeometry`] takes ownership of a [`Mesh`], copies it into one vertex buffer and one index
//! buffer, records the attribute layout in a vertex array object and drops the CPU copy. The
//! buffers are write-once.

use std::sync::Arc;

use mv3d_core::{Error, Result, config::Topology, layout::VertexLayout, mesh::Mesh};

use crate::abs::{Backend, BufferTarget, ShaderProgram};

/// Represents a mesh stored on the GPU side.
pub struct GpuGeometry<B: Backend> {
    gl: Arc<B>,
    vao: B::VertexArray,
    vbo: B::Buffer,
    ebo: B::Buffer,
    vertex_count: usize,
    index_count: i32,
}

impl<B: Backend> GpuGeometry<B> {
    /// Uploads `mesh` and binds every attribute of `layout` that `program` uses.
    pub fn upload(
        gl: &Arc<B>,
        mesh: Mesh,
        program: &ShaderProgram<B>,
        layout: &VertexLayout,
    ) -> Result<Self> {
        let index_count = draw_count(mesh.indices().len())?;

        let vao = gl.create_vertex_array().map_err(|reason| Error::Resource {
            what: "vertex array",
            reason,
        })?;
        let vbo = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(reason) => {
                gl.delete_vertex_array(vao);
                return Err(Error::Resource {
                    what: "vertex buffer",
                    reason,
                });
            }
        };
        let ebo = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(reason) => {
                gl.delete_buffer(vbo);
                gl.delete_vertex_array(vao);
                return Err(Error::Resource {
                    what: "index buffer",
                    reason,
                });
            }
        };

        // From here on `Drop` releases everything if a later step fails.
        let geometry = Self {
            gl: Arc::clone(gl),
            vao,
            vbo,
            ebo,
            vertex_count: mesh.vertices().len(),
            index_count,
        };

        gl.bind_vertex_array(Some(vao));

        gl.bind_buffer(BufferTarget::Vertex, Some(vbo));
        gl.buffer_static_data(BufferTarget::Vertex, bytemuck::cast_slice(mesh.vertices()));

        gl.bind_buffer(BufferTarget::Index, Some(ebo));
        gl.buffer_static_data(BufferTarget::Index, bytemuck::cast_slice(mesh.indices()));

        for attribute in layout.attributes {
            match program.attribute_location(attribute.name) {
                Some(location) => gl.vertex_attrib_f32(
                    location,
                    attribute.components,
                    layout.stride,
                    attribute.offset,
                ),
                None => log::debug!("Attribute `{}` is not used by the program", attribute.name),
            }
        }

        gl.bind_vertex_array(None);
        gl.bind_buffer(BufferTarget::Vertex, None);
        gl.bind_buffer(BufferTarget::Index, None);

        if let Some(code) = gl.take_error() {
            return Err(Error::Resource {
                what: "geometry buffers",
                reason: format!("backend error 0x{code:04X} during upload"),
            });
        }

        log::info!(
            "Uploaded {} vertices ({} bytes) and {} indices ({} bytes)",
            geometry.vertex_count,
            geometry.vertex_count * layout.stride as usize,
            geometry.index_count,
            geometry.index_count() * size_of::<u32>()
        );

        Ok(geometry)
    }

    pub fn bind(&self) {
        self.gl.bind_vertex_array(Some(self.vao));
    }

    pub fn unbind(&self) {
        self.gl.bind_vertex_array(None);
    }

    /// Draws the whole index buffer once.
    pub fn draw(&self, topology: Topology) {
        self.bind();
        self.gl.draw_elements(topology, self.index_count);
        self.unbind();
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Returns the amount of indices used in the mesh.
    pub fn index_count(&self) -> usize {
        self.index_count as usize
    }

    /// Size of the vertex buffer in bytes, as reported by the backend.
    pub fn vertex_buffer_size(&self) -> usize {
        self.gl.bind_buffer(BufferTarget::Vertex, Some(self.vbo));
        let size = self.gl.bound_buffer_size(BufferTarget::Vertex);
        self.gl.bind_buffer(BufferTarget::Vertex, None);
        size
    }

    /// Size of the index buffer in bytes, as reported by the backend.
    pub fn index_buffer_size(&self) -> usize {
        // The index binding is vertex array state.
        self.bind();
        let size = self.gl.bound_buffer_size(BufferTarget::Index);
        self.unbind();
        size
    }
}

impl<B: Backend> Drop for GpuGeometry<B> {
    fn drop(&mut self) {
        self.gl.delete_buffer(self.vbo);
        self.gl.delete_buffer(self.ebo);
        self.gl.delete_vertex_array(self.vao);
    }
}

/// Element count for one draw over `len` indices.
fn draw_count(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::Resource {
        what: "index buffer",
        reason: format!("{len} indices exceed the largest draw count"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abs::{
        ShaderProgramBuilder,
        fake::{Call, FakeGl},
    };
    use mv3d_core::{
        layout::VERTEX_LAYOUT,
        mesh::{LoadOptions, Vertex, load_from_str},
    };

    const VERT: &str = "\
#version 410 core
in vec3 position;
in vec4 vertexColor;
out vec4 fragColor;
void main() {
    gl_Position = vec4(position, 1.0);
    fragColor = vertexColor;
}
";

    const FRAG_CONSTANT: &str = "\
#version 410 core
uniform vec4 flatColor;
out vec4 outColor;
void main() {
    outColor = flatColor;
}
";

    const FRAG: &str = "\
#version 410 core
in vec4 fragColor;
out vec4 outColor;
void main() {
    outColor = fragColor;
}
";

    fn setup() -> (Arc<FakeGl>, ShaderProgram<FakeGl>) {
        let gl = Arc::new(FakeGl::default());
        let program = ShaderProgramBuilder::new(&gl).build(VERT, FRAG).unwrap();
        (gl, program)
    }

    fn quad() -> Mesh {
        let src = "v -1 -1 0\nv 1 -1 0\nv 1 1 0\nv -1 1 0\nf 1 2 3\nf 1 3 4\n";
        load_from_str(src, &LoadOptions::default()).unwrap().0
    }

    #[test]
    fn buffer_sizes_match_the_mesh() {
        let (gl, program) = setup();
        let geometry = GpuGeometry::upload(&gl, quad(), &program, &VERTEX_LAYOUT).unwrap();
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.index_count(), 6);
        assert_eq!(geometry.vertex_buffer_size(), 4 * 28);
        assert_eq!(geometry.index_buffer_size(), 6 * 4);
    }

    #[test]
    fn attributes_use_declared_offsets_and_stride() {
        let (gl, program) = setup();
        gl.clear_calls();
        let _geometry = GpuGeometry::upload(&gl, quad(), &program, &VERTEX_LAYOUT).unwrap();
        let attribs: Vec<Call> = gl
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::VertexAttrib { .. }))
            .collect();
        assert_eq!(
            attribs,
            vec![
                Call::VertexAttrib {
                    location: 0,
                    components: 3,
                    stride: 28,
                    offset: 0
                },
                Call::VertexAttrib {
                    location: 1,
                    components: 4,
                    stride: 28,
                    offset: 12
                },
            ]
        );
    }

    #[test]
    fn unused_attributes_are_skipped() {
        let gl = Arc::new(FakeGl::default());
        let vert = VERT
            .replace("fragColor = vertexColor;", "")
            .replace("out vec4 fragColor;", "");
        let program = ShaderProgramBuilder::new(&gl)
            .build(&vert, FRAG_CONSTANT)
            .unwrap();
        assert!(program.attribute_location("vertexColor").is_none());

        gl.clear_calls();
        let _geometry = GpuGeometry::upload(&gl, quad(), &program, &VERTEX_LAYOUT).unwrap();
        let attribs = gl
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::VertexAttrib { .. }))
            .count();
        assert_eq!(attribs, 1);
    }

    #[test]
    fn drop_releases_buffers_before_the_vertex_array() {
        let (gl, program) = setup();
        let geometry = GpuGeometry::upload(&gl, quad(), &program, &VERTEX_LAYOUT).unwrap();
        assert_eq!(gl.live_buffers(), 2);
        gl.clear_calls();
        drop(geometry);

        let calls = gl.calls();
        assert!(matches!(calls[0], Call::DeleteBuffer(_)));
        assert!(matches!(calls[1], Call::DeleteBuffer(_)));
        assert!(matches!(calls[2], Call::DeleteVertexArray(_)));
        assert_eq!(gl.live_buffers(), 0);
        assert_eq!(gl.live_vertex_arrays(), 0);
    }

    #[test]
    fn rejected_buffers_are_a_resource_error() {
        let (gl, program) = setup();
        gl.state.borrow_mut().reject_buffers = true;
        let err = GpuGeometry::upload(&gl, quad(), &program, &VERTEX_LAYOUT)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Error::Resource {
                what: "vertex buffer",
                ..
            }
        ));
        assert_eq!(gl.live_vertex_arrays(), 0);
    }

    #[test]
    fn draw_covers_every_index() {
        let (gl, program) = setup();
        let mesh = Mesh::new(vec![Vertex::new([0.0; 3]); 3], vec![0, 1, 2]).unwrap();
        let geometry = GpuGeometry::upload(&gl, mesh, &program, &VERTEX_LAYOUT).unwrap();
        gl.clear_calls();
        geometry.draw(Topology::Triangles);
        assert!(gl.calls().contains(&Call::Draw(Topology::Triangles, 3)));
        assert_eq!(gl.take_error(), None);
    }

    #[test]
    fn oversized_index_lists_are_rejected() {
        assert_eq!(draw_count(6).unwrap(), 6);
        assert_eq!(draw_count(i32::MAX as usize).unwrap(), i32::MAX);
        assert!(matches!(
            draw_count(i32::MAX as usize + 1),
            Err(Error::Resource {
                what: "index buffer",
                ..
            })
        ));
    }
}
