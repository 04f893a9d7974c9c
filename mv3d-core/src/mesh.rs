//! Loading of line-oriented ASCII geometry files.
//!
//! Only two records are interpreted:
//!
//! - `v x y z [r g b [a]]` declares one vertex. The color defaults to opaque white.
//! - `f a b c ...` declares one triangle. Only the first three fields are read, and a field
//!   such as `7/1/3` contributes its leading position index.
//!
//! Every other line is ignored. The result is a [`Mesh`] whose indices have been checked
//! against its vertex list, so a mesh that loads is always safe to draw.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single interleaved vertex as it is laid out in the GPU vertex buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

    /// Creates an opaque white vertex at the given position.
    pub fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            color: Self::WHITE,
        }
    }

    pub fn with_color(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// CPU-side geometry for one renderable object.
///
/// A [`Mesh`] can only be obtained through [`Mesh::new`] or the loader, both of which check that
/// the index list describes whole triangles and only references existing vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Builds a mesh from raw parts, rejecting empty or inconsistent data.
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Result<Self> {
        if vertices.is_empty() {
            return Err(Error::format(0, "mesh has no vertices"));
        }
        if indices.is_empty() {
            return Err(Error::format(0, "mesh has no indices"));
        }
        if !indices.len().is_multiple_of(3) {
            return Err(Error::format(
                0,
                format!("{} indices do not form whole triangles", indices.len()),
            ));
        }
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(Error::format(
                0,
                format!("index {index} out of range for {} vertices", vertices.len()),
            ));
        }

        Ok(Self { vertices, indices })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// How face indices in the source file are numbered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    /// Wavefront numbering: the first vertex is `1`. One is subtracted from every index.
    #[default]
    OneBased,
    /// Indices are stored exactly as read.
    Raw,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub index_base: IndexBase,
    /// Fail on the first malformed record instead of skipping it.
    pub strict: bool,
}

/// A `v` or `f` record that was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MalformedLine {
    pub line: usize,
    pub reason: String,
}

/// Summary of a load, returned next to the mesh.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub vertex_records: usize,
    pub face_records: usize,
    pub malformed: Vec<MalformedLine>,
}

/// Loads a mesh from a geometry file.
pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<(Mesh, LoadReport)> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (mesh, report) = parse(BufReader::new(file), path, options)?;
    log::info!(
        "Loaded {} vertices and {} triangles from {}",
        mesh.vertices.len(),
        mesh.triangle_count(),
        path.display()
    );

    Ok((mesh, report))
}

/// Loads a mesh from any buffered reader.
pub fn load_from_reader<R: BufRead>(
    reader: R,
    options: &LoadOptions,
) -> Result<(Mesh, LoadReport)> {
    parse(reader, Path::new("<reader>"), options)
}

pub fn load_from_str(source: &str, options: &LoadOptions) -> Result<(Mesh, LoadReport)> {
    parse(io::Cursor::new(source), Path::new("<string>"), options)
}

enum Record {
    Vertex(Vertex),
    Face([u32; 3]),
}

fn parse<R: BufRead>(
    mut reader: R,
    path: &Path,
    options: &LoadOptions,
) -> Result<(Mesh, LoadReport)> {
    let mut vertices = Vec::new();
    // Faces keep their source line so the range check can point at it.
    let mut faces: Vec<(usize, [u32; 3])> = Vec::new();
    let mut report = LoadReport::default();

    // Lines are read as bytes: ignored lines may be in any encoding.
    let mut line = Vec::new();
    let mut line_no = 0;
    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let Some(record) = parse_record(&line, options.index_base) else {
            continue;
        };

        match record {
            Ok(Record::Vertex(vertex)) => {
                report.vertex_records += 1;
                vertices.push(vertex);
            }
            Ok(Record::Face(face)) => {
                report.face_records += 1;
                faces.push((line_no, face));
            }
            Err(reason) if options.strict => return Err(Error::format(line_no, reason)),
            Err(reason) => {
                log::warn!(
                    "{}:{}: skipping malformed record: {}",
                    path.display(),
                    line_no,
                    reason
                );
                report.malformed.push(MalformedLine {
                    line: line_no,
                    reason,
                });
            }
        }
    }

    if !report.malformed.is_empty() {
        log::warn!(
            "{}: skipped {} malformed record(s)",
            path.display(),
            report.malformed.len()
        );
    }

    if vertices.is_empty() {
        return Err(Error::format(
            0,
            format!(
                "no valid vertex records in {} ({} malformed)",
                path.display(),
                report.malformed.len()
            ),
        ));
    }
    if faces.is_empty() {
        return Err(Error::format(
            0,
            format!(
                "no valid face records in {} ({} malformed)",
                path.display(),
                report.malformed.len()
            ),
        ));
    }

    let mut indices = Vec::with_capacity(faces.len() * 3);
    for (line_no, face) in faces {
        for index in face {
            if index as usize >= vertices.len() {
                let written = match options.index_base {
                    IndexBase::OneBased => index + 1,
                    IndexBase::Raw => index,
                };
                return Err(Error::format(
                    line_no,
                    format!(
                        "face index {written} out of range for {} vertices ({:?} numbering)",
                        vertices.len(),
                        options.index_base
                    ),
                ));
            }
            indices.push(index);
        }
    }

    Ok((Mesh { vertices, indices }, report))
}

/// Classifies a raw line. `None` means the line is not a record we interpret.
fn parse_record(line: &[u8], base: IndexBase) -> Option<Result<Record, String>> {
    let tag = line
        .split(u8::is_ascii_whitespace)
        .find(|token| !token.is_empty())?;
    if tag != b"v" && tag != b"f" {
        return None;
    }

    let Ok(line) = std::str::from_utf8(line) else {
        return Some(Err("record is not valid UTF-8".to_string()));
    };
    let fields = line.split_whitespace().skip(1);
    if tag == b"v" {
        Some(parse_vertex(fields).map(Record::Vertex))
    } else {
        Some(parse_face(fields, base).map(Record::Face))
    }
}

fn parse_vertex<'a>(fields: impl Iterator<Item = &'a str>) -> Result<Vertex, String> {
    let values = fields
        .map(|field| {
            field
                .parse::<f32>()
                .map_err(|_| format!("invalid number '{field}' in vertex record"))
        })
        .collect::<Result<Vec<f32>, String>>()?;

    let position = match values.get(..3) {
        Some(&[x, y, z]) => [x, y, z],
        _ => {
            return Err(format!(
                "vertex record needs 3 coordinates, found {}",
                values.len()
            ));
        }
    };

    // A fourth value is the optional Wavefront `w` weight and carries no color.
    let color = match &values[3..] {
        [] | [_] => Vertex::WHITE,
        &[r, g, b] => [r, g, b, 1.0],
        &[r, g, b, a] => [r, g, b, a],
        extra => {
            return Err(format!(
                "vertex record has {} trailing values, expected 0, 3 or 4",
                extra.len()
            ));
        }
    };

    Ok(Vertex::with_color(position, color))
}

fn parse_face<'a>(
    mut fields: impl Iterator<Item = &'a str>,
    base: IndexBase,
) -> Result<[u32; 3], String> {
    let mut face = [0; 3];
    for (n, slot) in face.iter_mut().enumerate() {
        let field = fields
            .next()
            .ok_or_else(|| format!("face record needs 3 indices, found {n}"))?;
        let position = field.split('/').next().unwrap_or(field);
        let raw = position
            .parse::<u32>()
            .map_err(|_| format!("invalid index '{field}' in face record"))?;
        *slot = match base {
            IndexBase::Raw => raw,
            IndexBase::OneBased => raw
                .checked_sub(1)
                .ok_or_else(|| "face index 0 is invalid with one-based numbering".to_string())?,
        };
    }
    Ok(face)
}
