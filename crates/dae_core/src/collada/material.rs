//! Image, material and effect libraries.
//!
//! Materials are thin: they name an effect. Effects carry the shading model
//! and per-channel colors, any of which may be replaced by a texture sampler
//! that refers (through `newparam` indirections) to an image.

use std::collections::{BTreeMap, HashMap};

use dae_math::{Vec2, Vec4};
use serde::Serialize;

use super::asset::FormatVersion;
use super::error::{ParseError, ParseResult};
use super::parser::ColladaParser;
use super::text::{decode_hex, decode_uri, local_url, parse_bool, parse_float, parse_floats, required_attr};
use crate::xml::XmlNode;

/// A `<image>` record: either a file reference or embedded bytes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Image {
    pub id: String,
    pub file_name: String,
    /// File extension hint for embedded data, e.g. `png`
    pub embedded_format: String,
    #[serde(skip)]
    pub image_data: Vec<u8>,
}

impl Image {
    pub fn is_embedded(&self) -> bool {
        !self.image_data.is_empty()
    }
}

/// A `<material>`: a name plus the effect it instantiates.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Material {
    pub id: String,
    /// Display name, made unique within the library
    pub name: String,
    /// Effect ID
    pub effect: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ShadeType {
    Constant,
    Lambert,
    #[default]
    Phong,
    Blinn,
}

/// How a texture layer combines with the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum TextureOp {
    #[default]
    Multiply,
    Add,
    Subtract,
}

/// UV transform from vendor sampler extensions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct UvTransform {
    pub translation: Vec2,
    pub scaling: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
}

impl Default for UvTransform {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scaling: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

/// A texture reference on an effect channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sampler {
    /// Sampler `newparam` SID, or an image ID for sloppy exporters
    pub name: String,
    /// Texcoord symbol, bound via `bind_vertex_input`
    pub uv_channel: String,
    pub wrap_u: bool,
    pub wrap_v: bool,
    pub mirror_u: bool,
    pub mirror_v: bool,
    pub transform: UvTransform,
    pub op: TextureOp,
    pub weighting: f32,
    pub mix_with_previous: f32,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            name: String::new(),
            uv_channel: String::new(),
            wrap_u: true,
            wrap_v: true,
            mirror_u: false,
            mirror_v: false,
            transform: UvTransform::default(),
            op: TextureOp::Multiply,
            weighting: 1.0,
            mix_with_previous: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum EffectParamType {
    /// Points at an image
    Surface,
    /// Points at a surface param (1.3, 1.4) or an image (1.5)
    Sampler,
}

/// An effect `newparam`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EffectParam {
    pub param_type: EffectParamType,
    pub reference: String,
}

/// A `profile_COMMON` effect.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Effect {
    pub id: String,
    pub name: String,
    pub shade_type: ShadeType,

    pub emissive: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub reflective: Vec4,
    pub transparent: Vec4,

    pub tex_emissive: Option<Sampler>,
    pub tex_ambient: Option<Sampler>,
    pub tex_diffuse: Option<Sampler>,
    pub tex_specular: Option<Sampler>,
    pub tex_reflective: Option<Sampler>,
    pub tex_transparent: Option<Sampler>,
    pub tex_bump: Option<Sampler>,

    pub shininess: f32,
    pub refract_index: f32,
    pub reflectivity: f32,
    /// Scalar `<transparency>`, when given
    pub transparency: Option<f32>,

    pub has_transparency: bool,
    /// `opaque` is `RGB_ZERO` or `RGB_ONE`
    pub rgb_transparency: bool,
    /// `opaque` is `RGB_ZERO` or `A_ZERO`
    pub invert_transparency: bool,

    pub double_sided: bool,
    pub wireframe: bool,
    pub faceted: bool,

    /// `newparam` declarations keyed by SID
    pub params: BTreeMap<String, EffectParam>,
}

impl Default for Effect {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            shade_type: ShadeType::Phong,
            emissive: Vec4::new(0.0, 0.0, 0.0, 1.0),
            ambient: Vec4::new(0.1, 0.1, 0.1, 1.0),
            diffuse: Vec4::new(0.6, 0.6, 0.6, 1.0),
            specular: Vec4::new(0.4, 0.4, 0.4, 1.0),
            reflective: Vec4::ZERO,
            transparent: Vec4::new(0.0, 0.0, 0.0, 1.0),
            tex_emissive: None,
            tex_ambient: None,
            tex_diffuse: None,
            tex_specular: None,
            tex_reflective: None,
            tex_transparent: None,
            tex_bump: None,
            shininess: 10.0,
            refract_index: 1.0,
            reflectivity: 0.0,
            transparency: None,
            has_transparency: false,
            rgb_transparency: false,
            invert_transparency: false,
            double_sided: false,
            wireframe: false,
            faceted: false,
            params: BTreeMap::new(),
        }
    }
}

impl Effect {
    /// Every texture sampler on this effect, with its channel name.
    pub fn samplers(&self) -> impl Iterator<Item = (&'static str, &Sampler)> {
        [
            ("emission", &self.tex_emissive),
            ("ambient", &self.tex_ambient),
            ("diffuse", &self.tex_diffuse),
            ("specular", &self.tex_specular),
            ("reflective", &self.tex_reflective),
            ("transparent", &self.tex_transparent),
            ("bump", &self.tex_bump),
        ]
        .into_iter()
        .filter_map(|(channel, sampler)| sampler.as_ref().map(|s| (channel, s)))
    }

    /// Follow `sampler -> surface -> image` param indirections.
    ///
    /// Returns the final reference, which is an image ID for well-formed
    /// documents. Unknown names are returned unchanged.
    pub fn resolve_texture<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        // A sampler points at a surface, a surface at an image: two hops at most
        for _ in 0..2 {
            match self.params.get(current) {
                Some(param) => current = &param.reference,
                None => break,
            }
        }
        current
    }
}

impl ColladaParser {
    pub(crate) fn read_image_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        for child in node.children_named("image") {
            self.read_image(child)?;
        }
        Ok(())
    }

    fn read_image(&mut self, node: &XmlNode) -> ParseResult<()> {
        let id = required_attr(node, "id")?;
        let mut image = Image {
            id: id.to_string(),
            ..Default::default()
        };

        if self.version.is_legacy() {
            for init in node.children_named("init_from") {
                let file = match init.child("ref") {
                    Some(reference) => reference.text(),
                    None => init.text(),
                };
                if !file.is_empty() {
                    image.file_name = decode_uri(file);
                }
            }
            if image.file_name.is_empty() {
                image.file_name = "unknown_texture".to_string();
            }
        } else {
            let mut inits = Vec::new();
            node.for_each_descendant(&mut |n| {
                if n.name() == "init_from" {
                    inits.push(n);
                }
            });

            for init in inits {
                if let Some(reference) = init.child("ref") {
                    image.file_name = decode_uri(reference.text());
                } else if let Some(hex) = init.child("hex") {
                    if image.file_name.is_empty() {
                        image.embedded_format = hex.attribute("format").unwrap_or_default().to_string();
                        if image.embedded_format.is_empty() {
                            log::warn!("Collada: unknown embedded image format for \"{}\"", id);
                        }
                        image.image_data = decode_hex(hex.text(), "hex")?;
                    }
                } else if !init.text().is_empty() && image.file_name.is_empty() {
                    image.file_name = decode_uri(init.text());
                }
            }
        }

        self.doc.images.insert(id.to_string(), image);
        Ok(())
    }

    pub(crate) fn read_material_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        let mut names: HashMap<String, usize> = HashMap::new();

        for child in node.children_named("material") {
            let id = required_attr(child, "id")?;
            let mut name = child.attribute("name").unwrap_or_default().to_string();

            if !name.is_empty() {
                match names.get_mut(&name) {
                    Some(seen) => {
                        *seen += 1;
                        name = format!("{} {}", name, seen);
                    }
                    None => {
                        names.insert(name.clone(), 0);
                    }
                }
            }

            let mut material = Material {
                id: id.to_string(),
                name,
                effect: String::new(),
            };
            if let Some(instance) = child.child("instance_effect") {
                let url = required_attr(instance, "url")?;
                material.effect = local_url(url, "instance_effect")?.to_string();
            }

            self.doc.materials.insert(id.to_string(), material);
        }
        Ok(())
    }

    pub(crate) fn read_effect_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        for child in node.children_named("effect") {
            let id = required_attr(child, "id")?;
            let mut effect = Effect {
                id: id.to_string(),
                name: child.attribute("name").unwrap_or_default().to_string(),
                ..Default::default()
            };

            for profile in child.children_named("profile_COMMON") {
                self.read_profile_common(profile, &mut effect)?;
            }

            self.doc.effects.insert(id.to_string(), effect);
        }
        Ok(())
    }

    /// Walk a `profile_COMMON` subtree. Wrapper elements (`technique`,
    /// `extra`, the shading model itself) are descended into.
    fn read_profile_common(&mut self, node: &XmlNode, effect: &mut Effect) -> ParseResult<()> {
        for child in node.children() {
            match child.name() {
                "newparam" => {
                    let sid = child.attribute("sid").unwrap_or_default();
                    if let Some(param) = self.read_effect_param(child)? {
                        effect.params.insert(sid.to_string(), param);
                    }
                }
                "image" if self.version == FormatVersion::V1_4 => self.read_image(child)?,
                "image" => {}

                "phong" => {
                    effect.shade_type = ShadeType::Phong;
                    self.read_profile_common(child, effect)?;
                }
                "constant" => {
                    effect.shade_type = ShadeType::Constant;
                    self.read_profile_common(child, effect)?;
                }
                "lambert" => {
                    effect.shade_type = ShadeType::Lambert;
                    self.read_profile_common(child, effect)?;
                }
                "blinn" => {
                    effect.shade_type = ShadeType::Blinn;
                    self.read_profile_common(child, effect)?;
                }

                "emission" => read_effect_color(child, &mut effect.emissive, &mut effect.tex_emissive)?,
                "ambient" => read_effect_color(child, &mut effect.ambient, &mut effect.tex_ambient)?,
                "diffuse" => read_effect_color(child, &mut effect.diffuse, &mut effect.tex_diffuse)?,
                "specular" => read_effect_color(child, &mut effect.specular, &mut effect.tex_specular)?,
                "reflective" => {
                    read_effect_color(child, &mut effect.reflective, &mut effect.tex_reflective)?
                }
                "transparent" => {
                    effect.has_transparency = true;
                    let opaque = child.attribute("opaque").unwrap_or_default();
                    if opaque == "RGB_ZERO" || opaque == "RGB_ONE" {
                        effect.rgb_transparency = true;
                    }
                    // RGB_ZERO and A_ZERO store transparency rather than opacity
                    if opaque == "RGB_ZERO" || opaque == "A_ZERO" {
                        effect.invert_transparency = true;
                    }
                    read_effect_color(child, &mut effect.transparent, &mut effect.tex_transparent)?;
                }
                "bump" => {
                    let mut unused = Vec4::ZERO;
                    read_effect_color(child, &mut unused, &mut effect.tex_bump)?;
                }

                "shininess" => {
                    read_effect_float(child, &mut effect.shininess)?;
                }
                "reflectivity" => {
                    read_effect_float(child, &mut effect.reflectivity)?;
                }
                "index_of_refraction" => {
                    read_effect_float(child, &mut effect.refract_index)?;
                }
                "transparency" => {
                    let mut value = effect.transparency.unwrap_or(1.0);
                    if read_effect_float(child, &mut value)? {
                        effect.transparency = Some(value);
                    }
                }

                // GOOGLEEARTH / OKINO
                "double_sided" => effect.double_sided = parse_bool(child.text()),
                // MAX3D
                "wireframe" => effect.wireframe = parse_bool(child.text()),
                "faceted" => effect.faceted = parse_bool(child.text()),

                _ => self.read_profile_common(child, effect)?,
            }
        }
        Ok(())
    }

    fn read_effect_param(&self, node: &XmlNode) -> ParseResult<Option<EffectParam>> {
        for child in node.children() {
            match child.name() {
                "surface" => {
                    let init = child
                        .child("init_from")
                        .ok_or_else(|| missing_child("surface", "init_from"))?;
                    return Ok(Some(EffectParam {
                        param_type: EffectParamType::Surface,
                        reference: init.text().to_string(),
                    }));
                }
                "sampler2D" if self.version.is_legacy() => {
                    let source = child
                        .child("source")
                        .ok_or_else(|| missing_child("sampler2D", "source"))?;
                    return Ok(Some(EffectParam {
                        param_type: EffectParamType::Sampler,
                        reference: source.text().to_string(),
                    }));
                }
                "sampler2D" => {
                    let image = child
                        .child("instance_image")
                        .ok_or_else(|| missing_child("sampler2D", "instance_image"))?;
                    let url = required_attr(image, "url")?;
                    return Ok(Some(EffectParam {
                        param_type: EffectParamType::Sampler,
                        reference: local_url(url, "instance_image")?.to_string(),
                    }));
                }
                _ => {}
            }
        }
        Ok(None)
    }
}

fn missing_child(parent: &str, child: &str) -> ParseError {
    ParseError::Message(format!("Expected <{}> in <{}>", child, parent))
}

/// Read a color channel: either a literal `<color>` or a `<texture>` reference.
///
/// A texture forces the color to white so it does not tint the texture.
fn read_effect_color(node: &XmlNode, color: &mut Vec4, sampler: &mut Option<Sampler>) -> ParseResult<()> {
    let mut texture: Option<Sampler> = None;
    let mut properties: Vec<&XmlNode> = Vec::new();

    node.for_each_descendant(&mut |child| match child.name() {
        "technique"
            if matches!(child.attribute("profile"), Some("MAYA" | "MAX3D" | "OKINO")) =>
        {
            properties.push(child)
        }
        "texture" | "color" => properties.push(child),
        _ => {}
    });

    for child in properties {
        match child.name() {
            "color" => {
                let values = parse_floats(child.text(), "color")?;
                if values.len() < 3 {
                    return Err(ParseError::OutOfData("color".to_string()));
                }
                *color = Vec4::new(values[0], values[1], values[2], values.get(3).copied().unwrap_or(1.0));
            }
            "texture" => {
                let name = required_attr(child, "texture")?;
                let t = texture.get_or_insert_with(Sampler::default);
                t.name = name.to_string();
                t.uv_channel = child.attribute("texcoord").unwrap_or_default().to_string();
                *color = Vec4::ONE;
            }
            _ => {
                let t = texture.get_or_insert_with(Sampler::default);
                read_sampler_properties(child, t)?;
            }
        }
    }

    if let Some(t) = texture {
        if !t.name.is_empty() {
            *sampler = Some(t);
        }
    }
    Ok(())
}

/// Read `<float>` under a scalar property. Returns whether a value was found.
fn read_effect_float(node: &XmlNode, value: &mut f32) -> ParseResult<bool> {
    match node.child("float") {
        Some(float) => {
            *value = parse_float(float.text(), "float")?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// MAYA, OKINO and MAX3D sampler extensions.
fn read_sampler_properties(node: &XmlNode, out: &mut Sampler) -> ParseResult<()> {
    for child in node.children() {
        let value = || parse_float(child.text(), child.name());
        match child.name() {
            "wrapU" => out.wrap_u = parse_bool(child.text()),
            "wrapV" => out.wrap_v = parse_bool(child.text()),
            "mirrorU" => out.mirror_u = parse_bool(child.text()),
            "mirrorV" => out.mirror_v = parse_bool(child.text()),
            "repeatU" => out.transform.scaling.x = value()?,
            "repeatV" => out.transform.scaling.y = value()?,
            "offsetU" => out.transform.translation.x = value()?,
            "offsetV" => out.transform.translation.y = value()?,
            "rotateUV" => out.transform.rotation = value()?,
            "blend_mode" => {
                let mode = child.text().to_ascii_uppercase();
                if mode.starts_with("ADD") {
                    out.op = TextureOp::Add;
                } else if mode.starts_with("SUBTRACT") {
                    out.op = TextureOp::Subtract;
                } else if mode.starts_with("MULTIPLY") {
                    out.op = TextureOp::Multiply;
                } else {
                    log::warn!("Collada: unsupported texture blend mode \"{}\"", child.text());
                }
            }
            // OKINO
            "weighting" => out.weighting = value()?,
            "mix_with_previous_layer" => out.mix_with_previous = value()?,
            // MAX3D
            "amount" => out.weighting = value()?,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser_with_version(version: FormatVersion) -> ColladaParser {
        let mut parser = ColladaParser::new("test.dae");
        parser.version = version;
        parser
    }

    #[test]
    fn test_material_names_are_deduplicated() {
        let xml = r##"
<library_materials>
    <material id="m1" name="Steel"><instance_effect url="#fx1"/></material>
    <material id="m2" name="Steel"><instance_effect url="#fx2"/></material>
    <material id="m3" name="Steel"><instance_effect url="#fx3"/></material>
    <material id="m4"><instance_effect url="#fx1"/></material>
</library_materials>"##;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        parser.read_material_library(&node).unwrap();

        let materials = &parser.doc.materials;
        assert_eq!(materials["m1"].name, "Steel");
        assert_eq!(materials["m2"].name, "Steel 1");
        assert_eq!(materials["m3"].name, "Steel 2");
        assert_eq!(materials["m4"].name, "");
        assert_eq!(materials["m2"].effect, "fx2");
    }

    #[test]
    fn test_material_effect_url_must_be_local() {
        let xml = r#"<library_materials><material id="m"><instance_effect url="fx"/></material></library_materials>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        assert!(matches!(
            parser.read_material_library(&node),
            Err(ParseError::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_read_phong_effect_with_texture() {
        let xml = r#"
<library_effects>
    <effect id="fx">
        <profile_COMMON>
            <newparam sid="surf"><surface type="2D"><init_from>img</init_from></surface></newparam>
            <newparam sid="samp"><sampler2D><source>surf</source></sampler2D></newparam>
            <technique sid="common">
                <blinn>
                    <emission><color>0 0 0 1</color></emission>
                    <diffuse>
                        <texture texture="samp" texcoord="UVSET0">
                            <extra>
                                <technique profile="MAYA">
                                    <wrapU>0</wrapU>
                                    <repeatU>2</repeatU>
                                    <blend_mode>ADD</blend_mode>
                                </technique>
                            </extra>
                        </texture>
                    </diffuse>
                    <specular><color>0.5 0.5 0.5 1</color></specular>
                    <shininess><float>20</float></shininess>
                    <transparent opaque="RGB_ZERO"><color>0.2 0.2 0.2 1</color></transparent>
                    <transparency><float>0.5</float></transparency>
                </blinn>
                <extra>
                    <technique profile="GOOGLEEARTH"><double_sided>1</double_sided></technique>
                </extra>
            </technique>
        </profile_COMMON>
    </effect>
</library_effects>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = parser_with_version(FormatVersion::V1_4);
        parser.read_effect_library(&node).unwrap();

        let effect = &parser.doc.effects["fx"];
        assert_eq!(effect.shade_type, ShadeType::Blinn);
        assert_eq!(effect.diffuse, Vec4::ONE);
        assert_eq!(effect.specular, Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(effect.shininess, 20.0);
        assert_eq!(effect.transparency, Some(0.5));
        assert!(effect.has_transparency);
        assert!(effect.rgb_transparency);
        assert!(effect.invert_transparency);
        assert!(effect.double_sided);

        let sampler = effect.tex_diffuse.as_ref().unwrap();
        assert_eq!(sampler.name, "samp");
        assert_eq!(sampler.uv_channel, "UVSET0");
        assert!(!sampler.wrap_u);
        assert_eq!(sampler.transform.scaling.x, 2.0);
        assert_eq!(sampler.op, TextureOp::Add);

        assert_eq!(effect.params["surf"].param_type, EffectParamType::Surface);
        assert_eq!(effect.resolve_texture("samp"), "img");
        assert_eq!(effect.samplers().count(), 1);
    }

    #[test]
    fn test_effect_defaults() {
        let xml = r#"<library_effects><effect id="fx"><profile_COMMON><technique sid="t"><lambert/></technique></profile_COMMON></effect></library_effects>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        parser.read_effect_library(&node).unwrap();

        let effect = &parser.doc.effects["fx"];
        assert_eq!(effect.shade_type, ShadeType::Lambert);
        assert_eq!(effect.diffuse, Vec4::new(0.6, 0.6, 0.6, 1.0));
        assert_eq!(effect.shininess, 10.0);
        assert_eq!(effect.refract_index, 1.0);
        assert_eq!(effect.transparency, None);
        assert!(effect.tex_diffuse.is_none());
    }

    #[test]
    fn test_read_effect_scalars() {
        let xml = r#"
<library_effects>
    <effect id="fx">
        <profile_COMMON>
            <technique sid="t">
                <phong>
                    <shininess><float>64</float></shininess>
                    <reflectivity><float>0.25</float></reflectivity>
                    <index_of_refraction><float>1.5</float></index_of_refraction>
                </phong>
            </technique>
        </profile_COMMON>
    </effect>
</library_effects>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        parser.read_effect_library(&node).unwrap();

        let effect = &parser.doc.effects["fx"];
        assert_eq!(effect.shininess, 64.0);
        assert_eq!(effect.reflectivity, 0.25);
        assert_eq!(effect.refract_index, 1.5);
        assert_eq!(effect.transparency, None);
    }

    #[test]
    fn test_sampler_15_uses_instance_image() {
        let xml = r##"
<library_effects>
    <effect id="fx">
        <profile_COMMON>
            <newparam sid="samp"><sampler2D><instance_image url="#img"/></sampler2D></newparam>
        </profile_COMMON>
    </effect>
</library_effects>"##;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = parser_with_version(FormatVersion::V1_5);
        parser.read_effect_library(&node).unwrap();

        let param = &parser.doc.effects["fx"].params["samp"];
        assert_eq!(param.param_type, EffectParamType::Sampler);
        assert_eq!(param.reference, "img");
    }

    #[test]
    fn test_read_image_legacy() {
        let xml = r#"
<library_images>
    <image id="tex"><init_from>file:///C:/maps/brick%20wall.png</init_from></image>
    <image id="empty"><init_from/></image>
</library_images>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = parser_with_version(FormatVersion::V1_4);
        parser.read_image_library(&node).unwrap();

        assert_eq!(parser.doc.images["tex"].file_name, "C:/maps/brick wall.png");
        assert_eq!(parser.doc.images["empty"].file_name, "unknown_texture");
    }

    #[test]
    fn test_read_image_15() {
        let xml = r#"
<library_images>
    <image id="file"><init_from><ref>textures/wood.jpg</ref></init_from></image>
    <image id="inline"><init_from><hex format="png">89504E47</hex></init_from></image>
</library_images>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = parser_with_version(FormatVersion::V1_5);
        parser.read_image_library(&node).unwrap();

        assert_eq!(parser.doc.images["file"].file_name, "textures/wood.jpg");

        let inline = &parser.doc.images["inline"];
        assert!(inline.is_embedded());
        assert_eq!(inline.embedded_format, "png");
        assert_eq!(inline.image_data, vec![0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn test_unknown_blend_mode_is_tolerated() {
        let node = XmlNode::parse("<technique profile=\"MAYA\"><blend_mode>LIGHTEN</blend_mode></technique>").unwrap();
        let mut sampler = Sampler::default();
        read_sampler_properties(&node, &mut sampler).unwrap();
        assert_eq!(sampler.op, TextureOp::Multiply);
    }
}
