//! Geometry library: meshes, input channels and primitive groups.

use dae_math::{Vec3, Vec4};
use serde::Serialize;

use super::error::{ParseError, ParseResult};
use super::parser::ColladaParser;
use super::primitives::IndexGroup;
use super::text::{int_attr, local_url, parse_uints, required_attr, required_uint_attr, uint_attr};
use crate::xml::XmlNode;

/// Maximum number of texture coordinate sets kept per mesh.
pub const MAX_TEXCOORD_SETS: usize = 4;
/// Maximum number of vertex color sets kept per mesh.
pub const MAX_COLOR_SETS: usize = 4;

/// Meaning of an `<input>` channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum InputType {
    /// Marker that defers to the mesh's `<vertices>` inputs
    Vertex,
    Position,
    Normal,
    Texcoord,
    Color,
    Tangent,
    Bitangent,
}

impl InputType {
    /// Map a `semantic` attribute. Unknown semantics return `None`.
    pub fn from_semantic(semantic: &str) -> Option<Self> {
        match semantic {
            "POSITION" => Some(InputType::Position),
            "TEXCOORD" => Some(InputType::Texcoord),
            "NORMAL" => Some(InputType::Normal),
            "COLOR" => Some(InputType::Color),
            "VERTEX" => Some(InputType::Vertex),
            "BINORMAL" | "TEXBINORMAL" => Some(InputType::Bitangent),
            "TANGENT" | "TEXTANGENT" => Some(InputType::Tangent),
            _ => None,
        }
    }

    /// Fewest scalars per record this semantic can be built from.
    pub fn min_components(self) -> usize {
        match self {
            InputType::Vertex => 0,
            InputType::Texcoord => 2,
            InputType::Position
            | InputType::Normal
            | InputType::Color
            | InputType::Tangent
            | InputType::Bitangent => 3,
        }
    }
}

/// Binding of a semantic to a source accessor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputChannel {
    pub semantic: InputType,
    /// Set number for texture coordinates and colors
    pub set: usize,
    /// Position within each index tuple of a `<p>` stream
    pub offset: usize,
    /// Accessor (source) ID, without the leading `#`
    pub source: String,
}

/// Primitive element kinds found inside `<mesh>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PrimitiveType {
    Lines,
    LineStrip,
    Triangles,
    TriStrips,
    TriFans,
    Polylist,
    Polygon,
}

impl PrimitiveType {
    pub fn from_element(name: &str) -> Option<Self> {
        match name {
            "lines" => Some(PrimitiveType::Lines),
            "linestrips" => Some(PrimitiveType::LineStrip),
            "triangles" => Some(PrimitiveType::Triangles),
            "tristrips" => Some(PrimitiveType::TriStrips),
            "trifans" => Some(PrimitiveType::TriFans),
            "polylist" => Some(PrimitiveType::Polylist),
            "polygons" => Some(PrimitiveType::Polygon),
            _ => None,
        }
    }

    pub fn element_name(self) -> &'static str {
        match self {
            PrimitiveType::Lines => "lines",
            PrimitiveType::LineStrip => "linestrips",
            PrimitiveType::Triangles => "triangles",
            PrimitiveType::TriStrips => "tristrips",
            PrimitiveType::TriFans => "trifans",
            PrimitiveType::Polylist => "polylist",
            PrimitiveType::Polygon => "polygons",
        }
    }
}

/// A face group sharing one material symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SubMesh {
    /// Material symbol, bound to a material by the instancing node
    pub material: String,
    pub num_faces: usize,
}

/// Flattened mesh data from one `<geometry>` element.
///
/// All non-empty attribute arrays are index-aligned with `positions`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Mesh {
    pub id: String,
    pub name: String,
    /// ID of the `<vertices>` block
    pub vertex_id: String,
    /// Inputs declared in `<vertices>`
    pub per_vertex_data: Vec<InputChannel>,

    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub bitangents: Vec<Vec3>,
    pub tex_coords: [Vec<Vec3>; MAX_TEXCOORD_SETS],
    /// 2 or 3 per texture coordinate set
    pub uv_components: [u32; MAX_TEXCOORD_SETS],
    pub colors: [Vec<Vec4>; MAX_COLOR_SETS],

    /// Point count of every face, in order
    pub face_sizes: Vec<usize>,
    /// Position index of every emitted vertex, for bone weight mapping
    pub face_pos_indices: Vec<usize>,
    pub sub_meshes: Vec<SubMesh>,
}

impl Mesh {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uv_components: [2; MAX_TEXCOORD_SETS],
            ..Default::default()
        }
    }

    /// Number of emitted vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.face_sizes.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Number of texture coordinate sets with data.
    pub fn tex_coord_set_count(&self) -> usize {
        self.tex_coords.iter().filter(|set| !set.is_empty()).count()
    }

    /// Fan-triangulate the faces into indices over the emitted vertices.
    ///
    /// Faces with fewer than three points (lines) are skipped.
    pub fn triangulate(&self) -> Vec<u32> {
        let mut indices = Vec::new();
        let mut vertex_offset = 0usize;

        for &count in &self.face_sizes {
            if count >= 3 {
                for i in 1..(count - 1) {
                    indices.push(vertex_offset as u32);
                    indices.push((vertex_offset + i) as u32);
                    indices.push((vertex_offset + i + 1) as u32);
                }
            }
            vertex_offset += count;
        }

        indices
    }

    /// Pad every non-empty attribute array up to the position count.
    pub(crate) fn pad_attributes(&mut self) {
        let n = self.positions.len();
        pad_tail(&mut self.normals, n, Vec3::Y);
        pad_tail(&mut self.tangents, n, Vec3::X);
        pad_tail(&mut self.bitangents, n, Vec3::Z);
        for set in &mut self.tex_coords {
            pad_tail(set, n, Vec3::ZERO);
        }
        for set in &mut self.colors {
            pad_tail(set, n, Vec4::new(0.0, 0.0, 0.0, 1.0));
        }
    }
}

fn pad_tail<T: Copy>(values: &mut Vec<T>, len: usize, fill: T) {
    if !values.is_empty() && values.len() < len {
        values.resize(len, fill);
    }
}

impl ColladaParser {
    pub(crate) fn read_geometry_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        for child in node.children_named("geometry") {
            self.read_geometry(child)?;
        }
        Ok(())
    }

    fn read_geometry(&mut self, node: &XmlNode) -> ParseResult<()> {
        let id = required_attr(node, "id")?;
        if self.doc.meshes.contains_key(id) {
            log::error!("Collada: skipped duplicate geometry id \"{}\"", id);
            return Ok(());
        }

        let mut mesh = Mesh::new(id);
        mesh.name = node.attribute("name").unwrap_or_default().to_string();

        for child in node.children_named("mesh") {
            self.read_mesh(child, &mut mesh)?;
        }
        mesh.pad_attributes();

        log::debug!(
            "Collada: geometry \"{}\" - {} vertices, {} faces",
            id,
            mesh.vertex_count(),
            mesh.face_count()
        );
        self.doc.meshes.insert(id.to_string(), mesh);
        Ok(())
    }

    fn read_mesh(&mut self, node: &XmlNode, mesh: &mut Mesh) -> ParseResult<()> {
        for child in node.children() {
            match child.name() {
                "source" => self.read_source(child)?,
                "vertices" => self.read_vertex_data(child, mesh)?,
                name => {
                    if let Some(prim_type) = PrimitiveType::from_element(name) {
                        self.read_index_data(child, mesh, prim_type)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn read_vertex_data(&mut self, node: &XmlNode, mesh: &mut Mesh) -> ParseResult<()> {
        mesh.vertex_id = required_attr(node, "id")?.to_string();

        for child in node.children() {
            match child.name() {
                "input" => {
                    if let Some(channel) = read_input_channel(child)? {
                        mesh.per_vertex_data.push(channel);
                    }
                }
                "extra" => {}
                other => return Err(ParseError::unexpected("vertices", other)),
            }
        }
        Ok(())
    }

    /// One primitive element: inputs, optional `<vcount>` and one or more `<p>`.
    fn read_index_data(
        &mut self,
        node: &XmlNode,
        mesh: &mut Mesh,
        prim_type: PrimitiveType,
    ) -> ParseResult<()> {
        let element = prim_type.element_name();
        let num_primitives = required_uint_attr(node, "count")?;

        let mut sub_mesh = SubMesh {
            material: node.attribute("material").unwrap_or_default().to_string(),
            num_faces: 0,
        };

        let mut per_index = Vec::new();
        // Offsets of dropped inputs still occupy a slot in each index tuple
        let mut max_offset = 0usize;
        let mut vcount = Vec::new();

        for child in node.children() {
            match child.name() {
                "input" => {
                    if let Some(offset) = uint_attr(child, "offset")? {
                        max_offset = max_offset.max(offset);
                    }
                    if let Some(channel) = read_input_channel(child)? {
                        per_index.push(channel);
                    }
                }
                "vcount" => {
                    if num_primitives > 0 && !child.text().is_empty() {
                        vcount = parse_uints(child.text(), "vcount")?;
                        if vcount.len() < num_primitives {
                            return Err(ParseError::OutOfData("vcount".to_string()));
                        }
                        vcount.truncate(num_primitives);
                    }
                }
                "p" => {
                    if !child.text().is_empty() {
                        let num_offsets = max_offset
                            .checked_add(1)
                            .ok_or_else(|| ParseError::OutOfData(element.to_string()))?;
                        let group = IndexGroup {
                            prim_type,
                            num_primitives,
                            num_offsets,
                            per_index: &per_index,
                            vcount: &vcount,
                        };
                        sub_mesh.num_faces += self.read_primitives(mesh, &group, child.text())?;
                    }
                }
                "extra" | "ph" => {}
                other => return Err(ParseError::unexpected(element, other)),
            }
        }

        mesh.sub_meshes.push(sub_mesh);
        Ok(())
    }
}

/// Parse an `<input>` element. Unknown semantics are warned about and skipped.
pub(crate) fn read_input_channel(node: &XmlNode) -> ParseResult<Option<InputChannel>> {
    let semantic = required_attr(node, "semantic")?;
    let source = local_url(required_attr(node, "source")?, "input")?;

    let semantic = match InputType::from_semantic(semantic) {
        Some(semantic) => semantic,
        None => {
            if semantic.is_empty() {
                log::warn!("Collada: vertex input type is empty");
            } else {
                log::warn!("Collada: unknown vertex input type \"{}\", ignoring", semantic);
            }
            return Ok(None);
        }
    };

    let mut channel = InputChannel {
        semantic,
        set: 0,
        offset: uint_attr(node, "offset")?.unwrap_or(0),
        source: source.to_string(),
    };

    if matches!(semantic, InputType::Texcoord | InputType::Color) {
        if let Some(set) = int_attr(node, "set")? {
            if set < 0 {
                return Err(ParseError::Message(format!(
                    "Invalid index \"{}\" in set attribute of <input> element",
                    set
                )));
            }
            channel.set = set as usize;
        }
    }

    Ok(Some(channel))
}
