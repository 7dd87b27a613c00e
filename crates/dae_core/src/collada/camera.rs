//! Camera library.

use serde::Serialize;

use super::error::ParseResult;
use super::parser::ColladaParser;
use super::text::{parse_float, required_attr};
use crate::xml::XmlNode;

/// A `<camera>` record. Unset optics stay `None`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Camera {
    pub id: String,
    pub name: String,
    pub orthographic: bool,
    /// `xfov` in degrees, or `xmag` for orthographic cameras
    pub horizontal_fov: Option<f32>,
    /// `yfov` in degrees, or `ymag` for orthographic cameras
    pub vertical_fov: Option<f32>,
    pub aspect_ratio: Option<f32>,
    pub z_near: f32,
    pub z_far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            orthographic: false,
            horizontal_fov: None,
            vertical_fov: None,
            aspect_ratio: None,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }
}

impl ColladaParser {
    pub(crate) fn read_camera_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        for child in node.children_named("camera") {
            let id = required_attr(child, "id")?;
            let mut camera = Camera {
                id: id.to_string(),
                name: child.attribute("name").unwrap_or(id).to_string(),
                ..Default::default()
            };

            let mut result = Ok(());
            child.for_each_descendant(&mut |item| {
                if result.is_ok() {
                    result = read_camera_property(item, &mut camera);
                }
            });
            result?;

            self.doc.cameras.insert(id.to_string(), camera);
        }
        Ok(())
    }
}

fn read_camera_property(node: &XmlNode, camera: &mut Camera) -> ParseResult<()> {
    let value = || parse_float(node.text(), node.name());

    match node.name() {
        "orthographic" => camera.orthographic = true,
        "xfov" | "xmag" => camera.horizontal_fov = Some(value()?),
        "yfov" | "ymag" => camera.vertical_fov = Some(value()?),
        "aspect_ratio" => camera.aspect_ratio = Some(value()?),
        "znear" => camera.z_near = value()?,
        "zfar" => camera.z_far = value()?,
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_perspective_camera() {
        let xml = r#"
<library_cameras>
    <camera id="cam" name="Main">
        <optics>
            <technique_common>
                <perspective>
                    <yfov>37.8</yfov>
                    <aspect_ratio>1.5</aspect_ratio>
                    <znear>1</znear>
                    <zfar>500</zfar>
                </perspective>
            </technique_common>
        </optics>
    </camera>
</library_cameras>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        parser.read_camera_library(&node).unwrap();

        let camera = &parser.doc.cameras["cam"];
        assert_eq!(camera.name, "Main");
        assert!(!camera.orthographic);
        assert_eq!(camera.horizontal_fov, None);
        assert_eq!(camera.vertical_fov, Some(37.8));
        assert_eq!(camera.aspect_ratio, Some(1.5));
        assert_eq!(camera.z_near, 1.0);
        assert_eq!(camera.z_far, 500.0);
    }

    #[test]
    fn test_read_orthographic_camera() {
        let xml = r#"
<library_cameras>
    <camera id="ortho">
        <optics><technique_common><orthographic><xmag>10</xmag></orthographic></technique_common></optics>
    </camera>
</library_cameras>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        parser.read_camera_library(&node).unwrap();

        let camera = &parser.doc.cameras["ortho"];
        assert!(camera.orthographic);
        assert_eq!(camera.horizontal_fov, Some(10.0));
        assert_eq!(camera.z_near, 0.1);
        assert_eq!(camera.z_far, 1000.0);
    }
}
