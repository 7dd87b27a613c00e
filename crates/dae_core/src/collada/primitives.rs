//! Primitive assembly.
//!
//! A `<p>` element is a flat stream of index tuples. Each tuple holds one
//! index per distinct input offset; the `VERTEX` offset selects a record from
//! every `<vertices>` input, the other offsets select records from their own
//! accessors. Every emitted vertex appends one value to each active attribute
//! array of the mesh, so vertices are never shared between faces.
//!
//! A semantic present both in `<vertices>` and on the primitive element is
//! appended twice per vertex, which misaligns that attribute array. Such
//! documents are read as-is.

use dae_math::{Vec3, Vec4};

use super::accessor::{AccessorId, SourceLibrary};
use super::error::{ParseError, ParseResult};
use super::mesh::{InputChannel, InputType, Mesh, PrimitiveType, MAX_COLOR_SETS, MAX_TEXCOORD_SETS};
use super::parser::ColladaParser;
use super::text::parse_indices;

/// Parameters shared by every `<p>` of one primitive element.
pub(crate) struct IndexGroup<'a> {
    pub prim_type: PrimitiveType,
    /// Declared `count` attribute
    pub num_primitives: usize,
    /// Indices per vertex tuple
    pub num_offsets: usize,
    pub per_index: &'a [InputChannel],
    pub vcount: &'a [usize],
}

/// An input whose accessor has been resolved and accepted.
#[derive(Clone, Copy, Debug)]
struct BoundInput {
    semantic: InputType,
    set: usize,
    offset: usize,
    accessor: AccessorId,
}

impl ColladaParser {
    /// Expand one `<p>` stream into `mesh`. Returns the number of faces emitted.
    pub(crate) fn read_primitives(
        &mut self,
        mesh: &mut Mesh,
        group: &IndexGroup,
        text: &str,
    ) -> ParseResult<usize> {
        let num_offsets = group.num_offsets.max(1);
        let per_vertex_offset = group
            .per_index
            .iter()
            .find(|c| c.semantic == InputType::Vertex)
            .map(|c| c.offset);

        // Counts no index stream could satisfy
        let too_large = || ParseError::OutOfData("p".to_string());
        let expected_points = match group.prim_type {
            PrimitiveType::Polylist => group
                .vcount
                .iter()
                .try_fold(0usize, |sum, &n| sum.checked_add(n))
                .ok_or_else(too_large)?,
            PrimitiveType::Lines => group.num_primitives.checked_mul(2).ok_or_else(too_large)?,
            PrimitiveType::Triangles => group.num_primitives.checked_mul(3).ok_or_else(too_large)?,
            _ => 0,
        };
        let expected_indices = expected_points
            .checked_mul(num_offsets)
            .ok_or_else(too_large)?;

        // A zero count means no primitives, whatever the stream holds
        let indices = if group.num_primitives > 0 {
            parse_indices(text, "p")?
        } else {
            Vec::new()
        };

        let mut num_primitives = group.num_primitives;
        if expected_points > 0 && indices.len() != expected_indices {
            if group.prim_type == PrimitiveType::Lines {
                log::warn!(
                    "Collada: expected different index count in <p> element, {} instead of {}",
                    indices.len(),
                    expected_indices
                );
                num_primitives = indices.len() / num_offsets / 2;
            } else {
                return Err(ParseError::CountMismatch {
                    element: "p".to_string(),
                    expected: expected_indices,
                    actual: indices.len(),
                });
            }
        } else if expected_points == 0 && indices.len() % num_offsets != 0 {
            return Err(ParseError::CountMismatch {
                element: "p".to_string(),
                expected: indices.len().next_multiple_of(num_offsets),
                actual: indices.len(),
            });
        }

        let sources = &mut self.doc.sources;
        let vertex_inputs = bind_inputs(sources, &mesh.per_vertex_data, None)?;
        let index_inputs = bind_inputs(sources, group.per_index, Some(mesh.vertex_id.as_str()))?;

        let vertex_count = indices.len() / num_offsets;
        let face_count = match group.prim_type {
            PrimitiveType::TriFans | PrimitiveType::Polygon => usize::from(vertex_count > 0),
            PrimitiveType::TriStrips => vertex_count.saturating_sub(2),
            PrimitiveType::LineStrip => vertex_count.saturating_sub(1),
            _ => num_primitives,
        };

        let assembler = Assembler {
            sources: &self.doc.sources,
            indices: &indices,
            num_offsets,
            per_vertex_offset,
            vertex_inputs: &vertex_inputs,
            index_inputs: &index_inputs,
        };

        mesh.face_sizes.reserve(face_count.min(vertex_count));
        mesh.face_pos_indices.reserve(vertex_count);

        let mut polylist_start = 0;
        for prim in 0..face_count {
            let num_points = match group.prim_type {
                PrimitiveType::Lines => {
                    for v in 0..2 {
                        assembler.copy_vertex(mesh, v, 2, prim)?;
                    }
                    2
                }
                PrimitiveType::LineStrip => {
                    for v in 0..2 {
                        assembler.copy_vertex(mesh, v, 1, prim)?;
                    }
                    2
                }
                PrimitiveType::Triangles => {
                    for v in 0..3 {
                        assembler.copy_vertex(mesh, v, 3, prim)?;
                    }
                    3
                }
                PrimitiveType::TriStrips => {
                    // Odd triangles swap their first two vertices to keep the winding
                    let order = if prim % 2 == 1 { [1, 0, 2] } else { [0, 1, 2] };
                    for v in order {
                        assembler.copy_vertex(mesh, v, 1, prim)?;
                    }
                    3
                }
                PrimitiveType::Polylist => {
                    let points = *group
                        .vcount
                        .get(prim)
                        .ok_or_else(|| ParseError::OutOfData("vcount".to_string()))?;
                    for v in 0..points {
                        assembler.copy_vertex(mesh, polylist_start + v, 1, 0)?;
                    }
                    polylist_start += points;
                    points
                }
                PrimitiveType::TriFans | PrimitiveType::Polygon => {
                    for v in 0..vertex_count {
                        assembler.copy_vertex(mesh, v, vertex_count, prim)?;
                    }
                    vertex_count
                }
            };

            mesh.face_sizes.push(num_points);
        }

        Ok(face_count)
    }
}

/// Resolve the accessors of `channels` and drop the ones that cannot be used.
///
/// With `vertex_block` set, `VERTEX` markers are checked against it and
/// skipped instead of being resolved.
fn bind_inputs(
    sources: &mut SourceLibrary,
    channels: &[InputChannel],
    vertex_block: Option<&str>,
) -> ParseResult<Vec<BoundInput>> {
    let mut bound = Vec::with_capacity(channels.len());

    for channel in channels {
        if channel.semantic == InputType::Vertex {
            if let Some(vertex_id) = vertex_block {
                if channel.source != vertex_id {
                    return Err(ParseError::Message(
                        "Unsupported vertex referencing scheme.".to_string(),
                    ));
                }
            }
            continue;
        }

        let accessor = sources.resolve(&channel.source)?;
        let components = sources.accessor_at(accessor).component_count();
        if components < channel.semantic.min_components() {
            if channel.semantic == InputType::Position {
                return Err(ParseError::Message(format!(
                    "Position source \"{}\" has {} components per record, at least 3 are required",
                    channel.source, components
                )));
            }
            log::warn!(
                "Collada: {:?} source \"{}\" has only {} components per record, ignoring channel",
                channel.semantic,
                channel.source,
                components
            );
            continue;
        }

        let set_limit = match channel.semantic {
            InputType::Texcoord => MAX_TEXCOORD_SETS,
            InputType::Color => MAX_COLOR_SETS,
            _ => usize::MAX,
        };
        if channel.set >= set_limit {
            log::warn!(
                "Collada: too many {:?} sets, skipping set {}",
                channel.semantic,
                channel.set
            );
            continue;
        }

        bound.push(BoundInput {
            semantic: channel.semantic,
            set: channel.set,
            offset: channel.offset,
            accessor,
        });
    }

    Ok(bound)
}

struct Assembler<'a> {
    sources: &'a SourceLibrary,
    indices: &'a [usize],
    num_offsets: usize,
    per_vertex_offset: Option<usize>,
    vertex_inputs: &'a [BoundInput],
    index_inputs: &'a [BoundInput],
}

impl Assembler<'_> {
    /// Copy vertex `vertex` of primitive `prim` into the mesh.
    ///
    /// `num_points` is the tuple stride between primitives; strip and list
    /// layouts pass 1 and address vertices directly.
    fn copy_vertex(
        &self,
        mesh: &mut Mesh,
        vertex: usize,
        num_points: usize,
        prim: usize,
    ) -> ParseResult<()> {
        let base = prim * self.num_offsets * num_points + vertex * self.num_offsets;
        if base + self.num_offsets > self.indices.len() {
            return Err(ParseError::OutOfData("p".to_string()));
        }

        let per_vertex_offset = self.per_vertex_offset.ok_or_else(|| {
            ParseError::Message("Primitive element has no VERTEX input".to_string())
        })?;
        let position_index = self.indices[base + per_vertex_offset];

        for input in self.vertex_inputs {
            self.extract(input, position_index, mesh)?;
        }
        for input in self.index_inputs {
            self.extract(input, self.indices[base + input.offset], mesh)?;
        }

        mesh.face_pos_indices.push(position_index);
        Ok(())
    }

    fn extract(&self, input: &BoundInput, index: usize, mesh: &mut Mesh) -> ParseResult<()> {
        let (accessor, data) = self
            .sources
            .resolved(input.accessor)
            .ok_or_else(|| ParseError::unresolved("accessor", &input.accessor.0.to_string()))?;
        let obj = accessor.extract(data, index)?;
        let vec3 = Vec3::new(obj[0], obj[1], obj[2]);
        let pending = mesh.positions.len().saturating_sub(1);

        match input.semantic {
            InputType::Position => mesh.positions.push(vec3),
            InputType::Normal => {
                pad_to(&mut mesh.normals, pending, Vec3::Y);
                mesh.normals.push(vec3);
            }
            InputType::Tangent => {
                pad_to(&mut mesh.tangents, pending, Vec3::X);
                mesh.tangents.push(vec3);
            }
            InputType::Bitangent => {
                pad_to(&mut mesh.bitangents, pending, Vec3::Z);
                mesh.bitangents.push(vec3);
            }
            InputType::Texcoord => {
                let set = &mut mesh.tex_coords[input.set];
                pad_to(set, pending, Vec3::ZERO);
                set.push(vec3);
                if accessor.slot(2).is_some() || accessor.slot(3).is_some() {
                    mesh.uv_components[input.set] = 3;
                }
            }
            InputType::Color => {
                let set = &mut mesh.colors[input.set];
                pad_to(set, pending, Vec4::new(0.0, 0.0, 0.0, 1.0));
                let alpha = if accessor.slot(3).is_some() { obj[3] } else { 1.0 };
                set.push(Vec4::new(obj[0], obj[1], obj[2], alpha));
            }
            InputType::Vertex => {}
        }
        Ok(())
    }
}

/// Grow `values` to `len` with `fill` so the next push lands on the current vertex.
fn pad_to<T: Copy>(values: &mut Vec<T>, len: usize, fill: T) {
    if values.len() < len {
        values.resize(len, fill);
    }
}
