//! Light library.

use serde::Serialize;

use super::error::ParseResult;
use super::parser::ColladaParser;
use super::text::{parse_float, read_float_array, required_attr};
use crate::xml::XmlNode;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum LightType {
    #[default]
    Undefined,
    Ambient,
    Directional,
    Point,
    Spot,
}

/// A `<light>` record. Angles are in degrees.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Light {
    pub id: String,
    pub name: String,
    pub light_type: LightType,
    pub color: [f32; 3],
    pub attenuation_constant: f32,
    pub attenuation_linear: f32,
    pub attenuation_quadratic: f32,
    /// Spot cone angle
    pub falloff_angle: f32,
    pub falloff_exponent: f32,
    /// Outer cone angle from vendor extensions, when given
    pub outer_angle: Option<f32>,
    /// Deprecated FCOLLADA penumbra angle, when given
    pub penumbra_angle: Option<f32>,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            light_type: LightType::Undefined,
            color: [0.0; 3],
            attenuation_constant: 1.0,
            attenuation_linear: 0.0,
            attenuation_quadratic: 0.0,
            falloff_angle: 180.0,
            falloff_exponent: 0.0,
            outer_angle: None,
            penumbra_angle: None,
            intensity: 1.0,
        }
    }
}

impl ColladaParser {
    pub(crate) fn read_light_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        for child in node.children_named("light") {
            let id = required_attr(child, "id")?;
            let mut light = Light {
                id: id.to_string(),
                name: child.attribute("name").unwrap_or(id).to_string(),
                ..Default::default()
            };
            read_light(child, &mut light)?;
            self.doc.lights.insert(id.to_string(), light);
        }
        Ok(())
    }
}

/// Properties live under `technique_common` and vendor `technique`s at
/// varying depths, so every descendant is inspected.
fn read_light(node: &XmlNode, light: &mut Light) -> ParseResult<()> {
    let mut result = Ok(());
    node.for_each_descendant(&mut |child| {
        if result.is_ok() {
            result = read_light_property(child, light);
        }
    });
    result
}

fn read_light_property(node: &XmlNode, light: &mut Light) -> ParseResult<()> {
    let value = || parse_float(node.text(), node.name());

    match node.name() {
        "spot" => light.light_type = LightType::Spot,
        "ambient" => light.light_type = LightType::Ambient,
        "directional" => light.light_type = LightType::Directional,
        "point" => light.light_type = LightType::Point,
        "color" => light.color = read_float_array::<3>(node)?,
        "constant_attenuation" => light.attenuation_constant = value()?,
        "linear_attenuation" => light.attenuation_linear = value()?,
        "quadratic_attenuation" => light.attenuation_quadratic = value()?,
        "falloff_angle" => light.falloff_angle = value()?,
        "falloff_exponent" => light.falloff_exponent = value()?,
        // FCOLLADA extensions
        "outer_cone" | "falloff" => light.outer_angle = Some(value()?),
        "penumbra_angle" => light.penumbra_angle = Some(value()?),
        "intensity" => light.intensity = value()?,
        "hotspot_beam" => light.falloff_angle = value()?,
        // OpenCOLLADA extension
        "decay_falloff" => light.outer_angle = Some(value()?),
        _ => {}
    }
    Ok(())
}
