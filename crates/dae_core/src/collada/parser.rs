//! COLLADA document walker.
//!
//! The parser owns every library while a document is being read. Each
//! top-level element of `<COLLADA>` is dispatched through a static table to
//! its library reader; unknown elements are skipped. Once the walk is done,
//! post-processing links the libraries together and the finished
//! [`ColladaDocument`] is handed out.
//!
//! # Example
//!
//! ```ignore
//! let root = XmlNode::parse(&content)?;
//! let doc = ColladaParser::new("duck.dae").parse(&root)?;
//! println!("{} meshes", doc.meshes.len());
//! ```

use std::collections::BTreeMap;

use super::animation::AnimationChannel;
use super::asset::{FormatVersion, META_FORMAT_VERSION};
use super::document::ColladaDocument;
use super::error::{ParseError, ParseResult};
use crate::xml::XmlNode;

/// Library reader invoked for a top-level element.
type Handler = fn(&mut ColladaParser, &XmlNode) -> ParseResult<()>;

fn handler_for(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        "asset" => ColladaParser::read_asset_info,
        "library_animations" => ColladaParser::read_animation_library,
        "library_animation_clips" => ColladaParser::read_animation_clip_library,
        "library_controllers" => ColladaParser::read_controller_library,
        "library_images" => ColladaParser::read_image_library,
        "library_materials" => ColladaParser::read_material_library,
        "library_effects" => ColladaParser::read_effect_library,
        "library_geometries" => ColladaParser::read_geometry_library,
        "library_visual_scenes" => ColladaParser::read_visual_scene_library,
        "library_lights" => ColladaParser::read_light_library,
        "library_cameras" => ColladaParser::read_camera_library,
        "library_nodes" => ColladaParser::read_node_library,
        "scene" => ColladaParser::read_scene,
        _ => return None,
    };
    Some(handler)
}

/// One parse session.
pub struct ColladaParser {
    pub(crate) file_name: String,
    /// Selects version-specific image and sampler layouts
    pub(crate) version: FormatVersion,
    pub(crate) doc: ColladaDocument,
    /// Channels of every animation with an ID, collected recursively
    pub(crate) animation_library: BTreeMap<String, Vec<AnimationChannel>>,
}

impl ColladaParser {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            version: FormatVersion::default(),
            doc: ColladaDocument::default(),
            animation_library: BTreeMap::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Read a whole document from its root element.
    pub fn parse(mut self, root: &XmlNode) -> ParseResult<ColladaDocument> {
        if root.name() != "COLLADA" {
            return Err(ParseError::NotCollada(root.name().to_string()));
        }

        if let Some(version) = root.attribute("version") {
            self.version = FormatVersion::detect(version).unwrap_or_else(|| {
                log::warn!("Collada: unknown version \"{}\", reading as 1.5", version);
                FormatVersion::V1_5
            });
            self.doc
                .asset
                .metadata
                .insert(META_FORMAT_VERSION.to_string(), version.to_string());
        }
        self.doc.asset.version = self.version;
        log::debug!("Collada: reading {} as {:?}", self.file_name, self.version);

        for child in root.children() {
            match handler_for(child.name()) {
                Some(handler) => handler(&mut self, child)?,
                None => log::debug!("Collada: skipping <{}>", child.name()),
            }
        }

        self.postprocess()?;

        log::info!(
            "Collada: {} - {} meshes, {} materials, {} nodes, {} controllers",
            self.file_name,
            self.doc.meshes.len(),
            self.doc.materials.len(),
            self.doc.nodes.len(),
            self.doc.controllers.len()
        );
        Ok(self.doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collada::asset::UpAxis;

    #[test]
    fn test_root_must_be_collada() {
        let root = XmlNode::parse("<scene/>").unwrap();
        let result = ColladaParser::new("test.dae").parse(&root);
        assert!(matches!(result, Err(ParseError::NotCollada(name)) if name == "scene"));
    }

    #[test]
    fn test_version_detection() {
        let root = XmlNode::parse(r#"<COLLADA version="1.4.1"/>"#).unwrap();
        let doc = ColladaParser::new("test.dae").parse(&root).unwrap();
        assert_eq!(doc.asset.version, FormatVersion::V1_4);
        assert_eq!(
            doc.asset.metadata.get(META_FORMAT_VERSION).map(String::as_str),
            Some("1.4.1")
        );

        let root = XmlNode::parse(r#"<COLLADA version="2.0"/>"#).unwrap();
        let doc = ColladaParser::new("test.dae").parse(&root).unwrap();
        assert_eq!(doc.asset.version, FormatVersion::V1_5);

        let root = XmlNode::parse("<COLLADA/>").unwrap();
        let doc = ColladaParser::new("test.dae").parse(&root).unwrap();
        assert_eq!(doc.asset.version, FormatVersion::V1_5);
        assert!(!doc.asset.metadata.contains_key(META_FORMAT_VERSION));
    }

    #[test]
    fn test_unknown_elements_do_not_drop_siblings() {
        let xml = r#"
<COLLADA version="1.4.1">
    <library_physics_models><physics_model id="p"/></library_physics_models>
    <asset><up_axis>Z_UP</up_axis></asset>
    <library_force_fields/>
    <library_lights><light id="l"><technique_common><point><color>1 1 1</color></point></technique_common></light></library_lights>
</COLLADA>"#;
        let root = XmlNode::parse(xml).unwrap();
        let doc = ColladaParser::new("test.dae").parse(&root).unwrap();
        assert_eq!(doc.asset.up_axis, UpAxis::Z);
        assert!(doc.lights.contains_key("l"));
    }

    #[test]
    fn test_dispatch_table() {
        assert!(handler_for("library_geometries").is_some());
        assert!(handler_for("scene").is_some());
        assert!(handler_for("library_physics_scenes").is_none());
    }
}
