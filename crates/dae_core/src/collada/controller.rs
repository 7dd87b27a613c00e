//! Skin and morph controllers.

use dae_math::{Mat4, Mat4Ext};
use serde::Serialize;

use super::error::{ParseError, ParseResult};
use super::parser::ColladaParser;
use super::text::{local_url, parse_uints, read_floats_exact, required_attr, required_uint_attr, uint_attr};
use crate::xml::XmlNode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ControllerType {
    #[default]
    Skin,
    Morph,
}

/// Morph blending method.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum MorphMethod {
    #[default]
    Normalized,
    Relative,
}

/// A `<vertex_weights>` input: source ID plus its slot in each influence tuple.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WeightInput {
    pub source: String,
    pub offset: usize,
}

/// A deformer bound to a mesh, or to another controller.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Controller {
    pub id: String,
    pub name: String,
    pub controller_type: ControllerType,
    pub method: MorphMethod,

    /// Target mesh ID. After loading this always names a mesh, never
    /// another controller.
    pub mesh_id: String,

    pub bind_shape_matrix: Mat4,

    /// Source holding joint names
    pub joint_name_source: String,
    /// Source holding inverse bind matrices
    pub joint_offset_matrix_source: String,

    pub weight_input_joints: WeightInput,
    pub weight_input_weights: WeightInput,

    /// Number of influences per vertex
    pub weight_counts: Vec<usize>,
    /// `(joint index, weight index)` pairs, grouped by `weight_counts`
    pub weights: Vec<(usize, usize)>,

    pub morph_target: String,
    pub morph_weight: String,
}

impl Default for Controller {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            controller_type: ControllerType::Skin,
            method: MorphMethod::Normalized,
            mesh_id: String::new(),
            bind_shape_matrix: Mat4::IDENTITY,
            joint_name_source: String::new(),
            joint_offset_matrix_source: String::new(),
            weight_input_joints: WeightInput::default(),
            weight_input_weights: WeightInput {
                source: String::new(),
                offset: 1,
            },
            weight_counts: Vec::new(),
            weights: Vec::new(),
            morph_target: String::new(),
            morph_weight: String::new(),
        }
    }
}

impl Controller {
    /// Influences of one vertex.
    pub fn vertex_weights(&self, vertex: usize) -> &[(usize, usize)] {
        let Some(&count) = self.weight_counts.get(vertex) else {
            return &[];
        };
        let start = self.weight_counts[..vertex]
            .iter()
            .fold(0usize, |sum, &n| sum.saturating_add(n));
        self.weights
            .get(start..start.saturating_add(count))
            .unwrap_or(&[])
    }
}

impl ColladaParser {
    pub(crate) fn read_controller_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        for child in node.children_named("controller") {
            let id = required_attr(child, "id")?;
            let mut controller = Controller {
                id: id.to_string(),
                name: child.attribute("name").unwrap_or_default().to_string(),
                ..Default::default()
            };
            self.read_controller(child, &mut controller)?;
            self.doc.controllers.insert(id.to_string(), controller);
        }
        Ok(())
    }

    fn read_controller(&mut self, node: &XmlNode, controller: &mut Controller) -> ParseResult<()> {
        for child in node.children() {
            match child.name() {
                "skin" => {
                    controller.controller_type = ControllerType::Skin;
                    controller.mesh_id = strip_hash(required_attr(child, "source")?);
                    self.read_deformer(child, controller)?;
                }
                "morph" => {
                    controller.controller_type = ControllerType::Morph;
                    controller.mesh_id = strip_hash(required_attr(child, "source")?);
                    if child.attribute("method") == Some("RELATIVE") {
                        controller.method = MorphMethod::Relative;
                    }
                    self.read_deformer(child, controller)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Contents shared by `<skin>` and `<morph>`.
    fn read_deformer(&mut self, node: &XmlNode, controller: &mut Controller) -> ParseResult<()> {
        for child in node.children() {
            match child.name() {
                "bind_shape_matrix" => {
                    let values = read_floats_exact(child.text(), 16, "bind_shape_matrix")?;
                    let mut m = [0.0; 16];
                    m.copy_from_slice(&values[..16]);
                    controller.bind_shape_matrix = Mat4::from_row_major(&m);
                }
                "source" => self.read_source(child)?,
                "joints" => read_controller_joints(child, controller)?,
                "vertex_weights" => read_controller_weights(child, controller)?,
                "targets" => {
                    for input in child.children_named("input") {
                        let source = required_attr(input, "source")?;
                        match input.attribute("semantic") {
                            Some("MORPH_TARGET") => controller.morph_target = strip_hash(source),
                            Some("MORPH_WEIGHT") => controller.morph_weight = strip_hash(source),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn strip_hash(url: &str) -> String {
    url.strip_prefix('#').unwrap_or(url).to_string()
}

fn read_controller_joints(node: &XmlNode, controller: &mut Controller) -> ParseResult<()> {
    for input in node.children_named("input") {
        let semantic = required_attr(input, "semantic")?;
        let source = local_url(required_attr(input, "source")?, "joints")?;
        match semantic {
            "JOINT" => controller.joint_name_source = source.to_string(),
            "INV_BIND_MATRIX" => controller.joint_offset_matrix_source = source.to_string(),
            other => {
                return Err(ParseError::Message(format!(
                    "Unknown semantic \"{}\" in <joints> data <input> element",
                    other
                )))
            }
        }
    }
    Ok(())
}

fn read_controller_weights(node: &XmlNode, controller: &mut Controller) -> ParseResult<()> {
    let vertex_count = required_uint_attr(node, "count")?;
    controller.weight_counts.clear();

    for input in node.children_named("input") {
        let semantic = required_attr(input, "semantic")?;
        let source = local_url(required_attr(input, "source")?, "vertex_weights")?;
        let offset = uint_attr(input, "offset")?.unwrap_or(0);
        let channel = WeightInput {
            source: source.to_string(),
            offset,
        };
        match semantic {
            "JOINT" => controller.weight_input_joints = channel,
            "WEIGHT" => controller.weight_input_weights = channel,
            other => {
                return Err(ParseError::Message(format!(
                    "Unknown semantic \"{}\" in <vertex_weights> data <input> element",
                    other
                )))
            }
        }
    }

    if vertex_count == 0 {
        return Ok(());
    }

    // One count per vertex
    let out_of_data = || ParseError::OutOfData("vertex_weights".to_string());
    let vcount = node
        .child("vcount")
        .ok_or_else(|| ParseError::OutOfData("vcount".to_string()))?;
    let mut counts = parse_uints(vcount.text(), "vcount")?;
    if counts.len() < vertex_count {
        return Err(ParseError::OutOfData("vcount".to_string()));
    }
    counts.truncate(vertex_count);
    controller.weight_counts = counts;

    if let Some(v) = node.child("v") {
        let joint_offset = controller.weight_input_joints.offset;
        let weight_offset = controller.weight_input_weights.offset;
        let stride = joint_offset
            .max(weight_offset)
            .checked_add(1)
            .ok_or_else(out_of_data)?;

        let num_weights = controller
            .weight_counts
            .iter()
            .try_fold(0usize, |sum, &n| sum.checked_add(n))
            .ok_or_else(out_of_data)?;
        let num_values = num_weights.checked_mul(stride).ok_or_else(out_of_data)?;
        let values = parse_uints(v.text(), "v")?;
        if values.len() < num_values {
            return Err(out_of_data());
        }

        controller.weights = values
            .chunks_exact(stride)
            .take(num_weights)
            .map(|tuple| (tuple[joint_offset], tuple[weight_offset]))
            .collect();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIN: &str = r##"
<library_controllers>
    <controller id="skin" name="Skin">
        <skin source="#mesh">
            <bind_shape_matrix>1 0 0 5 0 1 0 0 0 0 1 0 0 0 0 1</bind_shape_matrix>
            <source id="joints"><Name_array id="joints-array" count="2">root arm</Name_array>
                <technique_common><accessor source="#joints-array" count="2"><param name="JOINT" type="name"/></accessor></technique_common>
            </source>
            <source id="weights"><float_array id="weights-array" count="3">1 0.5 0.5</float_array>
                <technique_common><accessor source="#weights-array" count="3"><param name="WEIGHT" type="float"/></accessor></technique_common>
            </source>
            <joints>
                <input semantic="JOINT" source="#joints"/>
                <input semantic="INV_BIND_MATRIX" source="#poses"/>
            </joints>
            <vertex_weights count="2">
                <input semantic="JOINT" source="#joints" offset="0"/>
                <input semantic="WEIGHT" source="#weights" offset="1"/>
                <vcount>1 2</vcount>
                <v>0 0 0 1 1 2</v>
            </vertex_weights>
        </skin>
    </controller>
</library_controllers>"##;

    #[test]
    fn test_read_skin_controller() {
        let node = XmlNode::parse(SKIN).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        parser.read_controller_library(&node).unwrap();

        let controller = &parser.doc.controllers["skin"];
        assert_eq!(controller.name, "Skin");
        assert_eq!(controller.controller_type, ControllerType::Skin);
        assert_eq!(controller.mesh_id, "mesh");
        assert_eq!(controller.bind_shape_matrix.w_axis.x, 5.0);
        assert_eq!(controller.joint_name_source, "joints");
        assert_eq!(controller.joint_offset_matrix_source, "poses");
        assert_eq!(controller.weight_counts, vec![1, 2]);
        assert_eq!(controller.weights, vec![(0, 0), (0, 1), (1, 2)]);
        assert_eq!(controller.vertex_weights(1), &[(0, 1), (1, 2)]);
        assert!(controller.vertex_weights(5).is_empty());

        // Sources inside the skin land in the shared library
        assert!(parser.doc.sources.accessor("weights").is_some());
    }

    #[test]
    fn test_weights_respect_offsets() {
        let xml = r##"
<vertex_weights count="1">
    <input semantic="WEIGHT" source="#w" offset="0"/>
    <input semantic="JOINT" source="#j" offset="2"/>
    <vcount>2</vcount>
    <v>7 9 3 8 9 4</v>
</vertex_weights>"##;
        let node = XmlNode::parse(xml).unwrap();
        let mut controller = Controller::default();
        read_controller_weights(&node, &mut controller).unwrap();
        assert_eq!(controller.weights, vec![(3, 7), (4, 8)]);
    }

    #[test]
    fn test_weights_out_of_data() {
        let xml = r##"
<vertex_weights count="2">
    <input semantic="JOINT" source="#j" offset="0"/>
    <input semantic="WEIGHT" source="#w" offset="1"/>
    <vcount>2 2</vcount>
    <v>0 0 1 1 2 2</v>
</vertex_weights>"##;
        let node = XmlNode::parse(xml).unwrap();
        let mut controller = Controller::default();
        assert!(matches!(
            read_controller_weights(&node, &mut controller),
            Err(ParseError::OutOfData(_))
        ));
    }

    #[test]
    fn test_unknown_weight_semantic_is_error() {
        let xml = r##"<vertex_weights count="0"><input semantic="BOGUS" source="#x" offset="0"/></vertex_weights>"##;
        let node = XmlNode::parse(xml).unwrap();
        let mut controller = Controller::default();
        assert!(read_controller_weights(&node, &mut controller).is_err());
    }

    #[test]
    fn test_huge_weight_counts_are_errors() {
        let huge = usize::MAX;
        let cases = [
            // count alone must not size anything
            format!(r#"<vertex_weights count="{}"><vcount>1</vcount><v>0 0</v></vertex_weights>"#, huge),
            // vcount sum overflows
            format!(
                r##"<vertex_weights count="2">
                    <input semantic="JOINT" source="#j" offset="0"/>
                    <input semantic="WEIGHT" source="#w" offset="1"/>
                    <vcount>{} 1</vcount><v>0 0</v>
                </vertex_weights>"##,
                huge
            ),
            // tuple stride overflows
            format!(
                r##"<vertex_weights count="1">
                    <input semantic="JOINT" source="#j" offset="{}"/>
                    <vcount>1</vcount><v>0 0</v>
                </vertex_weights>"##,
                huge
            ),
            // vcount missing
            r#"<vertex_weights count="3"><v>0 0</v></vertex_weights>"#.to_string(),
        ];

        for xml in &cases {
            let node = XmlNode::parse(xml).unwrap();
            let mut controller = Controller::default();
            assert!(matches!(
                read_controller_weights(&node, &mut controller),
                Err(ParseError::OutOfData(_))
            ));
        }
    }

    #[test]
    fn test_unknown_joint_semantic_is_error() {
        let xml = r##"<joints><input semantic="BOGUS" source="#x"/></joints>"##;
        let node = XmlNode::parse(xml).unwrap();
        let mut controller = Controller::default();
        assert!(read_controller_joints(&node, &mut controller).is_err());
    }

    #[test]
    fn test_read_morph_controller() {
        let xml = r##"
<library_controllers>
    <controller id="morph">
        <morph source="#base" method="RELATIVE">
            <targets>
                <input semantic="MORPH_TARGET" source="#targets"/>
                <input semantic="MORPH_WEIGHT" source="#morph-weights"/>
            </targets>
        </morph>
    </controller>
</library_controllers>"##;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        parser.read_controller_library(&node).unwrap();

        let controller = &parser.doc.controllers["morph"];
        assert_eq!(controller.controller_type, ControllerType::Morph);
        assert_eq!(controller.method, MorphMethod::Relative);
        assert_eq!(controller.mesh_id, "base");
        assert_eq!(controller.morph_target, "targets");
        assert_eq!(controller.morph_weight, "morph-weights");
        assert_eq!(controller.bind_shape_matrix, Mat4::IDENTITY);
    }
}
