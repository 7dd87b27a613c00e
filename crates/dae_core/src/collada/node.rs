//! Scene nodes, transform stacks and instance bindings.
//!
//! Nodes live in an arena owned by the document. Children are listed by
//! [`NodeId`]; `parent` is a back-index used only for upward traversal.
//! Visual scene roots and `<library_nodes>` entries are also registered by
//! ID in the node library so `<instance_node>` and `<instance_visual_scene>`
//! can find them.

use std::collections::BTreeMap;

use dae_math::{Mat4, Mat4Ext, Vec3};
use serde::Serialize;

use super::error::{ParseError, ParseResult};
use super::mesh::InputType;
use super::parser::ColladaParser;
use super::text::{local_url, read_floats_exact, required_attr, uint_attr};
use crate::xml::XmlNode;

/// Index of a node in the document's node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// Transform primitive types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TransformKind {
    LookAt,
    Rotate,
    Translate,
    Scale,
    Skew,
    Matrix,
}

impl TransformKind {
    pub fn from_element(name: &str) -> Option<Self> {
        match name {
            "lookat" => Some(TransformKind::LookAt),
            "rotate" => Some(TransformKind::Rotate),
            "translate" => Some(TransformKind::Translate),
            "scale" => Some(TransformKind::Scale),
            "skew" => Some(TransformKind::Skew),
            "matrix" => Some(TransformKind::Matrix),
            _ => None,
        }
    }

    /// Number of scalars the element carries.
    pub fn value_count(self) -> usize {
        match self {
            TransformKind::LookAt => 9,
            TransformKind::Rotate => 4,
            TransformKind::Translate | TransformKind::Scale => 3,
            TransformKind::Skew => 7,
            TransformKind::Matrix => 16,
        }
    }
}

/// One entry of a node's transform stack.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transform {
    /// Animation target name, may be empty
    pub sid: String,
    pub kind: TransformKind,
    pub values: Vec<f32>,
}

impl Transform {
    /// Matrix for this operation. Skew has no matrix form here, and neither
    /// does an operation with too few values.
    pub fn to_matrix(&self) -> Option<Mat4> {
        let v = &self.values;
        if v.len() < self.kind.value_count() {
            return None;
        }
        let vec3 = |i: usize| Vec3::new(v[i], v[i + 1], v[i + 2]);

        let matrix = match self.kind {
            TransformKind::LookAt => Mat4::from_look_at(vec3(0), vec3(3), vec3(6)),
            TransformKind::Rotate => Mat4::from_axis_angle_degrees(vec3(0), v[3]),
            TransformKind::Translate => Mat4::from_translation(vec3(0)),
            TransformKind::Scale => Mat4::from_scale(vec3(0)),
            TransformKind::Matrix => {
                let mut m = [0.0; 16];
                m.copy_from_slice(&v[..16]);
                Mat4::from_row_major(&m)
            }
            TransformKind::Skew => return None,
        };
        Some(matrix)
    }
}

/// Compose a transform stack in document order.
pub fn compose_transforms(transforms: &[Transform]) -> Mat4 {
    let mut result = Mat4::IDENTITY;
    for transform in transforms {
        match transform.to_matrix() {
            Some(matrix) => result = result * matrix,
            None if transform.kind == TransformKind::Skew => {
                log::warn!("Collada: <skew> transform \"{}\" is not supported, skipping", transform.sid)
            }
            None => log::warn!("Collada: incomplete transform \"{}\", skipping", transform.sid),
        }
    }
    result
}

/// A `bind_vertex_input` remap: effect texcoord symbol to mesh input.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputSemanticMapEntry {
    pub input_type: InputType,
    pub set: usize,
}

/// Material assignment for one submesh symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MaterialBinding {
    /// Material ID
    pub target: String,
    /// Effect semantic to mesh input
    pub vertex_inputs: BTreeMap<String, InputSemanticMapEntry>,
}

/// An `<instance_geometry>` or `<instance_controller>`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MeshInstance {
    /// Mesh or controller ID
    pub url: String,
    pub is_controller: bool,
    /// Submesh material symbol to binding
    pub materials: BTreeMap<String, MaterialBinding>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub sid: String,
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub transforms: Vec<Transform>,
    pub meshes: Vec<MeshInstance>,
    /// Light IDs
    pub lights: Vec<String>,
    /// Camera IDs
    pub cameras: Vec<String>,
    /// IDs of library nodes instanced here
    pub node_instances: Vec<String>,
    /// Camera node named by `<render camera_node>` on a scene root
    pub primary_camera: Option<String>,
}

impl Node {
    /// Composed local transform.
    pub fn local_transform(&self) -> Mat4 {
        compose_transforms(&self.transforms)
    }

    /// Find a transform by SID, as animation targets do.
    pub fn transform_by_sid(&self, sid: &str) -> Option<&Transform> {
        self.transforms.iter().find(|t| t.sid == sid)
    }
}

impl ColladaParser {
    fn add_node(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.doc.nodes.len());
        node.parent = parent;
        self.doc.nodes.push(node);
        if let Some(parent) = parent {
            self.doc.nodes[parent.0].children.push(id);
        }
        id
    }

    pub(crate) fn read_visual_scene_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        for scene in node.children_named("visual_scene") {
            let id = required_attr(scene, "id")?;
            let root = Node {
                id: id.to_string(),
                name: scene.attribute("name").unwrap_or("Scene").to_string(),
                ..Default::default()
            };
            let root = self.add_node(root, None);
            self.doc.node_library.insert(id.to_string(), root);

            self.read_scene_node(scene, Some(root))?;
        }
        Ok(())
    }

    pub(crate) fn read_node_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        self.read_scene_node(node, None)
    }

    /// Read the contents of a node. With no `target`, only child `<node>`s
    /// are read and each is registered in the node library.
    fn read_scene_node(&mut self, node: &XmlNode, target: Option<NodeId>) -> ParseResult<()> {
        for child in node.children() {
            if child.name() == "node" {
                let new_node = Node {
                    id: child.attribute("id").unwrap_or_default().to_string(),
                    sid: child.attribute("sid").unwrap_or_default().to_string(),
                    name: child.attribute("name").unwrap_or_default().to_string(),
                    ..Default::default()
                };
                let library_id = new_node.id.clone();
                let new_id = self.add_node(new_node, target);

                if target.is_none() {
                    if library_id.is_empty() {
                        log::warn!("Collada: library node without id cannot be instanced");
                    } else {
                        self.doc.node_library.insert(library_id, new_id);
                    }
                }

                self.read_scene_node(child, Some(new_id))?;
                continue;
            }

            let Some(target) = target else {
                continue;
            };

            if let Some(kind) = TransformKind::from_element(child.name()) {
                let values = read_floats_exact(child.text(), kind.value_count(), child.name())?;
                self.doc.nodes[target.0].transforms.push(Transform {
                    sid: child.attribute("sid").unwrap_or_default().to_string(),
                    kind,
                    values: values[..kind.value_count()].to_vec(),
                });
                continue;
            }

            match child.name() {
                "evaluate_scene" => {
                    for render in child.children_named("render") {
                        self.read_render(render, target);
                    }
                }
                "render" => self.read_render(child, target),
                "instance_node" => {
                    if let Some(url) = child.attribute("url") {
                        match url.strip_prefix('#') {
                            Some(id) => self.doc.nodes[target.0].node_instances.push(id.to_string()),
                            None => log::error!("Collada: unresolved reference format of node \"{}\"", url),
                        }
                    }
                }
                "instance_geometry" | "instance_controller" => {
                    let instance = read_node_geometry(child)?;
                    self.doc.nodes[target.0].meshes.push(instance);
                }
                "instance_light" => {
                    if let Some(id) = read_instance_url(child)? {
                        self.doc.nodes[target.0].lights.push(id);
                    }
                }
                "instance_camera" => {
                    if let Some(id) = read_instance_url(child)? {
                        self.doc.nodes[target.0].cameras.push(id);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn read_render(&mut self, render: &XmlNode, target: NodeId) {
        let node = &mut self.doc.nodes[target.0];
        if node.parent.is_some() || node.primary_camera.is_some() {
            return;
        }
        if let Some(camera) = render.attribute("camera_node") {
            match camera.strip_prefix('#') {
                Some(id) => node.primary_camera = Some(id.to_string()),
                None => log::error!("Collada: unresolved reference format of camera \"{}\"", camera),
            }
        }
    }

    pub(crate) fn read_scene(&mut self, node: &XmlNode) -> ParseResult<()> {
        for instance in node.children_named("instance_visual_scene") {
            if self.doc.root.is_some() {
                return Err(ParseError::Duplicate("scene root in <instance_visual_scene>"));
            }

            let url = required_attr(instance, "url")?;
            let id = local_url(url, "instance_visual_scene")?;
            let root = self
                .doc
                .node_library
                .get(id)
                .copied()
                .ok_or_else(|| ParseError::unresolved("visual_scene", id))?;
            self.doc.root = Some(root);
        }
        Ok(())
    }
}

/// Light and camera instances: a missing URL is tolerated, a malformed one is not.
fn read_instance_url(node: &XmlNode) -> ParseResult<Option<String>> {
    match node.attribute("url") {
        Some(url) => Ok(Some(local_url(url, node.name())?.to_string())),
        None => {
            log::warn!("Collada: expected url attribute in <{}> element", node.name());
            Ok(None)
        }
    }
}

fn read_node_geometry(node: &XmlNode) -> ParseResult<MeshInstance> {
    let url = required_attr(node, "url")?;
    let mut instance = MeshInstance {
        url: local_url(url, node.name())?.to_string(),
        is_controller: node.name() == "instance_controller",
        materials: BTreeMap::new(),
    };

    let mut materials = Vec::new();
    node.for_each_descendant(&mut |n| {
        if n.name() == "instance_material" {
            materials.push(n);
        }
    });

    for material in materials {
        let symbol = required_attr(material, "symbol")?;
        let target = required_attr(material, "target")?;

        let mut binding = MaterialBinding {
            target: target.strip_prefix('#').unwrap_or(target).to_string(),
            vertex_inputs: BTreeMap::new(),
        };

        for child in material.children() {
            match child.name() {
                "bind_vertex_input" => {
                    let semantic = required_attr(child, "semantic")?;
                    let input_semantic = required_attr(child, "input_semantic")?;
                    let Some(input_type) = InputType::from_semantic(input_semantic) else {
                        log::warn!(
                            "Collada: unknown input semantic \"{}\" in <bind_vertex_input>",
                            input_semantic
                        );
                        continue;
                    };
                    let set = uint_attr(child, "input_set")?.unwrap_or(0);
                    binding
                        .vertex_inputs
                        .insert(semantic.to_string(), InputSemanticMapEntry { input_type, set });
                }
                "bind" => log::warn!("Collada: found unsupported <bind> element"),
                _ => {}
            }
        }

        instance.materials.insert(symbol.to_string(), binding);
    }

    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r##"
<library_visual_scenes>
    <visual_scene id="scene">
        <node id="Camera" name="Camera">
            <translate sid="location">0 0 10</translate>
            <instance_camera url="#cam"/>
        </node>
        <node id="Box" name="Box">
            <translate sid="location">1 2 3</translate>
            <rotate sid="rotateZ">0 0 1 90</rotate>
            <scale sid="scale">2 2 2</scale>
            <instance_geometry url="#box-mesh">
                <bind_material>
                    <technique_common>
                        <instance_material symbol="mat0" target="#red">
                            <bind_vertex_input semantic="UVSET0" input_semantic="TEXCOORD" input_set="1"/>
                            <bind semantic="foo" target="bar"/>
                        </instance_material>
                    </technique_common>
                </bind_material>
            </instance_geometry>
            <node id="Lamp" sid="lamp">
                <instance_light url="#sun"/>
                <instance_node url="#shared"/>
            </node>
        </node>
        <evaluate_scene><render camera_node="#Camera"/></evaluate_scene>
    </visual_scene>
</library_visual_scenes>"##;

    fn read_scene(parser: &mut ColladaParser) {
        let node = XmlNode::parse(SCENE).unwrap();
        parser.read_visual_scene_library(&node).unwrap();
    }

    #[test]
    fn test_read_visual_scene() {
        let mut parser = ColladaParser::new("test.dae");
        read_scene(&mut parser);

        let nodes = &parser.doc.nodes;
        assert_eq!(nodes.len(), 4);

        let root = &nodes[0];
        assert_eq!(root.name, "Scene");
        assert_eq!(root.children, vec![NodeId(1), NodeId(2)]);
        assert_eq!(root.primary_camera.as_deref(), Some("Camera"));
        assert_eq!(parser.doc.node_library["scene"], NodeId(0));

        let camera = &nodes[1];
        assert_eq!(camera.cameras, vec!["cam"]);
        assert_eq!(camera.parent, Some(NodeId(0)));

        let boxed = &nodes[2];
        assert_eq!(boxed.transforms.len(), 3);
        assert_eq!(boxed.transform_by_sid("rotateZ").unwrap().kind, TransformKind::Rotate);

        let instance = &boxed.meshes[0];
        assert_eq!(instance.url, "box-mesh");
        assert!(!instance.is_controller);
        let binding = &instance.materials["mat0"];
        assert_eq!(binding.target, "red");
        assert_eq!(binding.vertex_inputs["UVSET0"].input_type, InputType::Texcoord);
        assert_eq!(binding.vertex_inputs["UVSET0"].set, 1);

        let lamp = &nodes[3];
        assert_eq!(lamp.sid, "lamp");
        assert_eq!(lamp.parent, Some(NodeId(2)));
        assert_eq!(lamp.lights, vec!["sun"]);
        assert_eq!(lamp.node_instances, vec!["shared"]);
    }

    #[test]
    fn test_compose_transforms_in_order() {
        let mut parser = ColladaParser::new("test.dae");
        read_scene(&mut parser);

        let matrix = parser.doc.nodes[2].local_transform();
        // Scale, then rotate 90 degrees about Z, then translate
        let p = matrix.transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 4.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_skew_is_skipped_in_composition() {
        let transforms = vec![
            Transform {
                sid: String::new(),
                kind: TransformKind::Skew,
                values: vec![45.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0],
            },
            Transform {
                sid: String::new(),
                kind: TransformKind::Translate,
                values: vec![1.0, 0.0, 0.0],
            },
        ];
        assert_eq!(compose_transforms(&transforms), Mat4::from_translation(Vec3::X));
    }

    #[test]
    fn test_matrix_transform_is_row_major() {
        let transform = Transform {
            sid: "transform".to_string(),
            kind: TransformKind::Matrix,
            values: vec![
                1.0, 0.0, 0.0, 5.0, //
                0.0, 1.0, 0.0, 6.0, //
                0.0, 0.0, 1.0, 7.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
        };
        assert_eq!(
            transform.to_matrix().unwrap(),
            Mat4::from_translation(Vec3::new(5.0, 6.0, 7.0))
        );
    }

    #[test]
    fn test_short_transform_is_error() {
        let xml = r#"<library_visual_scenes><visual_scene id="s"><node><translate>1 2</translate></node></visual_scene></library_visual_scenes>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        assert!(matches!(
            parser.read_visual_scene_library(&node),
            Err(ParseError::OutOfData(_))
        ));
    }

    #[test]
    fn test_library_nodes_register_without_parent() {
        let xml = r#"
<library_nodes>
    <node id="shared"><node id="inner"/></node>
    <node id="other"/>
</library_nodes>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        parser.read_node_library(&node).unwrap();

        let shared = parser.doc.node_library["shared"];
        assert!(parser.doc.nodes[shared.0].parent.is_none());
        assert_eq!(parser.doc.nodes[shared.0].children.len(), 1);
        assert!(parser.doc.node_library.contains_key("other"));
        // Nested nodes belong to their parent, not the library
        assert!(!parser.doc.node_library.contains_key("inner"));
    }

    #[test]
    fn test_instance_light_url_must_be_local() {
        let xml = r#"<library_visual_scenes><visual_scene id="s"><node><instance_light url="sun"/></node></visual_scene></library_visual_scenes>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        assert!(parser.read_visual_scene_library(&node).is_err());
    }

    #[test]
    fn test_read_scene_selects_root() {
        let mut parser = ColladaParser::new("test.dae");
        read_scene(&mut parser);

        let scene = XmlNode::parse(r##"<scene><instance_visual_scene url="#scene"/></scene>"##).unwrap();
        parser.read_scene(&scene).unwrap();
        assert_eq!(parser.doc.root, Some(NodeId(0)));

        // A second root is rejected
        assert!(matches!(parser.read_scene(&scene), Err(ParseError::Duplicate(_))));
    }

    #[test]
    fn test_read_scene_errors() {
        let mut parser = ColladaParser::new("test.dae");
        read_scene(&mut parser);

        let bad_url = XmlNode::parse(r#"<scene><instance_visual_scene url="scene"/></scene>"#).unwrap();
        assert!(matches!(
            parser.read_scene(&bad_url),
            Err(ParseError::InvalidReference { .. })
        ));

        let unknown = XmlNode::parse(r##"<scene><instance_visual_scene url="#nope"/></scene>"##).unwrap();
        assert!(matches!(
            parser.read_scene(&unknown),
            Err(ParseError::UnresolvedReference { .. })
        ));
    }
}
