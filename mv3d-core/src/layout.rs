//! Description of how [`Vertex`] bytes map onto shader attributes.

use std::mem::{offset_of, size_of};

use crate::mesh::Vertex;

/// One float attribute inside an interleaved vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Attribute name as declared in the vertex shader.
    pub name: &'static str,
    /// Number of `f32` components.
    pub components: i32,
    /// Byte offset from the start of the vertex.
    pub offset: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: i32,
    pub attributes: &'static [VertexAttribute],
}

pub const POSITION: &str = "position";
pub const VERTEX_COLOR: &str = "vertexColor";

/// The layout of [`Vertex`]: position at offset 0, color at offset 12, stride 28.
pub const VERTEX_LAYOUT: VertexLayout = VertexLayout {
    stride: size_of::<Vertex>() as i32,
    attributes: &[
        VertexAttribute {
            name: POSITION,
            components: 3,
            offset: offset_of!(Vertex, position) as i32,
        },
        VertexAttribute {
            name: VERTEX_COLOR,
            components: 4,
            offset: offset_of!(Vertex, color) as i32,
        },
    ],
};

impl VertexLayout {
    pub fn attribute(&self, name: &str) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}
