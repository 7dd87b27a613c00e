//! Document-level asset information: schema version, units, up axis and
//! free-form metadata.

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::ParseResult;
use super::parser::ColladaParser;
use super::text::{camel_case, parse_float};
use crate::xml::XmlNode;

/// Metadata key holding the raw `version` attribute of the root element.
pub const META_FORMAT_VERSION: &str = "SourceAsset_FormatVersion";
/// Metadata key for `<authoring_tool>`.
pub const META_GENERATOR: &str = "SourceAsset_Generator";
/// Metadata key for `<copyright>`.
pub const META_COPYRIGHT: &str = "SourceAsset_Copyright";

/// Asset children recognised by the schema. Anything else is kept but warned about.
const KNOWN_ASSET_KEYS: &[&str] = &[
    "author",
    "author_email",
    "author_website",
    "authoring_tool",
    "comments",
    "copyright",
    "source_data",
    "created",
    "modified",
    "keywords",
    "revision",
    "subject",
    "title",
    "coverage",
    "geographic_location",
];

/// Schema revision. Selects version-specific reading of images and samplers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum FormatVersion {
    V1_3,
    V1_4,
    #[default]
    V1_5,
}

impl FormatVersion {
    /// Match the leading `major.minor` of a version string.
    pub fn detect(version: &str) -> Option<Self> {
        if version.starts_with("1.5") {
            Some(FormatVersion::V1_5)
        } else if version.starts_with("1.4") {
            Some(FormatVersion::V1_4)
        } else if version.starts_with("1.3") {
            Some(FormatVersion::V1_3)
        } else {
            None
        }
    }

    /// 1.3 and 1.4 share the older image and sampler layout.
    pub fn is_legacy(self) -> bool {
        matches!(self, FormatVersion::V1_3 | FormatVersion::V1_4)
    }
}

/// Up direction declared by `<up_axis>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum UpAxis {
    X,
    #[default]
    Y,
    Z,
}

/// Contents of `<asset>` plus the root version attribute.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetInfo {
    pub version: FormatVersion,
    /// Size of one document unit in meters
    pub unit_size: f32,
    pub up_axis: UpAxis,
    pub metadata: BTreeMap<String, String>,
}

impl Default for AssetInfo {
    fn default() -> Self {
        Self {
            version: FormatVersion::default(),
            unit_size: 1.0,
            up_axis: UpAxis::default(),
            metadata: BTreeMap::new(),
        }
    }
}

impl AssetInfo {
    pub fn generator(&self) -> Option<&str> {
        self.metadata.get(META_GENERATOR).map(String::as_str)
    }

    pub fn copyright(&self) -> Option<&str> {
        self.metadata.get(META_COPYRIGHT).map(String::as_str)
    }
}

impl ColladaParser {
    pub(crate) fn read_asset_info(&mut self, node: &XmlNode) -> ParseResult<()> {
        for child in node.children() {
            match child.name() {
                "unit" => {
                    self.doc.asset.unit_size = match child.attribute("meter") {
                        Some(meter) => parse_float(meter, "unit")?,
                        None => 1.0,
                    };
                }
                "up_axis" => {
                    let text = child.text();
                    self.doc.asset.up_axis = if text.starts_with("X_UP") {
                        UpAxis::X
                    } else if text.starts_with("Z_UP") {
                        UpAxis::Z
                    } else {
                        UpAxis::Y
                    };
                }
                "contributor" => {
                    for item in child.children() {
                        self.read_metadata_item(item);
                    }
                }
                _ => self.read_metadata_item(child),
            }
        }
        Ok(())
    }

    fn read_metadata_item(&mut self, node: &XmlNode) {
        if node.text().is_empty() {
            return;
        }

        let name = node.name();
        if !KNOWN_ASSET_KEYS.contains(&name) {
            log::warn!("Collada: unknown asset metadata key <{}>, storing as-is", name);
        }

        let key = match name {
            "authoring_tool" => META_GENERATOR.to_string(),
            "copyright" => META_COPYRIGHT.to_string(),
            _ => camel_case(name),
        };
        self.doc.asset.metadata.insert(key, node.text().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_version() {
        assert_eq!(FormatVersion::detect("1.4.1"), Some(FormatVersion::V1_4));
        assert_eq!(FormatVersion::detect("1.5.0"), Some(FormatVersion::V1_5));
        assert_eq!(FormatVersion::detect("1.3"), Some(FormatVersion::V1_3));
        assert_eq!(FormatVersion::detect("2.0"), None);
        assert!(FormatVersion::V1_4.is_legacy());
        assert!(!FormatVersion::V1_5.is_legacy());
    }

    #[test]
    fn test_read_asset_info() {
        let xml = r#"
<asset>
    <contributor>
        <author>Jane</author>
        <authoring_tool>Maya 8.0 | ColladaMaya v3.02</authoring_tool>
        <copyright>Copyright 2006</copyright>
    </contributor>
    <created>2006-06-21T21:24:36Z</created>
    <unit meter="0.01" name="centimeter"/>
    <up_axis>Z_UP</up_axis>
    <vendor_note>hello</vendor_note>
</asset>"#;
        let node = XmlNode::parse(xml).unwrap();
        let mut parser = ColladaParser::new("test.dae");
        parser.read_asset_info(&node).unwrap();

        let asset = &parser.doc.asset;
        assert_eq!(asset.unit_size, 0.01);
        assert_eq!(asset.up_axis, UpAxis::Z);
        assert_eq!(asset.generator(), Some("Maya 8.0 | ColladaMaya v3.02"));
        assert_eq!(asset.copyright(), Some("Copyright 2006"));
        assert_eq!(asset.metadata.get("Author").map(String::as_str), Some("Jane"));
        assert!(asset.metadata.contains_key("Created"));
        // Unknown keys are tolerated
        assert_eq!(asset.metadata.get("VendorNote").map(String::as_str), Some("hello"));
    }

    #[test]
    fn test_defaults() {
        let asset = AssetInfo::default();
        assert_eq!(asset.unit_size, 1.0);
        assert_eq!(asset.up_axis, UpAxis::Y);
        assert_eq!(asset.version, FormatVersion::V1_5);
    }
}
