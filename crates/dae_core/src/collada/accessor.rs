//! Data arrays, accessors and the shared source library.
//!
//! Every `<source>` element in the document contributes a [`Data`] array and
//! an [`Accessor`] describing how to slice it into records. Both live in one
//! [`SourceLibrary`] arena owned by the parse session. Accessors refer to
//! their data by ID; the ID is looked up once on first use and the result is
//! kept in a side cache, so later lookups are plain index reads.

use std::collections::HashMap;

use serde::Serialize;

use super::error::{ParseError, ParseResult};
use super::parser::ColladaParser;
use super::text::{
    local_url, read_floats_exact, read_strings_exact, required_attr, required_uint_attr, uint_attr,
};
use crate::xml::XmlNode;

/// Index of a [`Data`] array in the source library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DataId(pub usize);

/// Index of an [`Accessor`] in the source library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct AccessorId(pub usize);

/// Payload of a data array.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum DataArray {
    /// `float_array` and `int_array`
    Float(Vec<f32>),
    /// `IDREF_array` and `Name_array`
    String(Vec<String>),
}

/// A flat typed array declared by a `<source>` element.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Data {
    pub id: String,
    pub values: DataArray,
}

impl Data {
    pub fn is_string_array(&self) -> bool {
        matches!(self.values, DataArray::String(_))
    }

    /// Numeric values; empty for string arrays.
    pub fn floats(&self) -> &[f32] {
        match &self.values {
            DataArray::Float(v) => v,
            DataArray::String(_) => &[],
        }
    }

    /// String values; empty for numeric arrays.
    pub fn strings(&self) -> &[String] {
        match &self.values {
            DataArray::String(v) => v,
            DataArray::Float(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        match &self.values {
            DataArray::Float(v) => v.len(),
            DataArray::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A strided view over a [`Data`] array.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Accessor {
    /// ID of the owning `<source>`
    pub id: String,
    /// Number of records
    pub count: usize,
    /// Index of the first value of the first record
    pub offset: usize,
    /// Values between the starts of consecutive records
    pub stride: usize,
    /// Param names in declaration order
    pub params: Vec<String>,
    /// Position of the X/R/S/U, Y/G/T/V, Z/B/P and A components within a
    /// record. Once any param names a component, unnamed slots are `None`.
    pub sub_offsets: [Option<usize>; 4],
    /// Number of typed scalars per record (`float4x4` counts 16)
    pub size: usize,
    /// ID of the backing data array
    pub source: String,
}

impl Default for Accessor {
    fn default() -> Self {
        Self {
            id: String::new(),
            count: 0,
            offset: 0,
            stride: 1,
            params: Vec::new(),
            sub_offsets: [Some(0), Some(1), Some(2), Some(3)],
            size: 0,
            source: String::new(),
        }
    }
}

impl Accessor {
    /// Scalars per record. Untyped params leave `size` at zero, in which case
    /// the stride is the best guess.
    pub fn component_count(&self) -> usize {
        if self.size == 0 {
            self.stride
        } else {
            self.size
        }
    }

    /// Position of component `component` (0 = X/R/S/U ... 3 = A) within a
    /// record, if that component exists.
    pub fn slot(&self, component: usize) -> Option<usize> {
        self.sub_offsets
            .get(component)
            .copied()
            .flatten()
            .filter(|&sub| sub < self.component_count())
    }

    fn record_start(&self, index: usize) -> Option<usize> {
        index.checked_mul(self.stride)?.checked_add(self.offset)
    }

    /// Gather record `index` into XYZW order using the sub-offset table.
    ///
    /// Components the record does not carry, or that fall past the end of
    /// the array, read as zero. A record index beyond `count` or a record
    /// start beyond the array is an error.
    pub fn extract(&self, data: &Data, index: usize) -> ParseResult<[f32; 4]> {
        if index >= self.count {
            return Err(ParseError::IndexOutOfRange {
                index,
                count: self.count,
            });
        }

        let values = data.floats();
        let start = self
            .record_start(index)
            .filter(|&start| start < values.len())
            .ok_or(ParseError::IndexOutOfRange {
                index,
                count: values.len(),
            })?;

        let mut out = [0.0; 4];
        for (component, value) in out.iter_mut().enumerate() {
            if let Some(sub) = self.slot(component) {
                *value = values.get(start + sub).copied().unwrap_or(0.0);
            }
        }
        Ok(out)
    }

    /// All scalars of record `index`, `component_count` wide.
    pub fn record<'a>(&self, data: &'a Data, index: usize) -> Option<&'a [f32]> {
        if index >= self.count {
            return None;
        }
        let start = self.record_start(index)?;
        let end = start.checked_add(self.component_count())?;
        data.floats().get(start..end)
    }

    /// String value of record `index` (joint names, interpolation modes).
    pub fn string<'a>(&self, data: &'a Data, index: usize) -> Option<&'a str> {
        if index >= self.count {
            return None;
        }
        data.strings()
            .get(self.record_start(index)?)
            .map(String::as_str)
    }
}

/// Arena of every data array and accessor in a document.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SourceLibrary {
    data: Vec<Data>,
    data_by_id: HashMap<String, DataId>,
    accessors: Vec<Accessor>,
    accessors_by_id: HashMap<String, AccessorId>,
    #[serde(skip)]
    resolved: Vec<Option<DataId>>,
}

impl SourceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a data array. A later array with the same ID shadows the earlier one.
    pub fn insert_data(&mut self, data: Data) -> DataId {
        let id = DataId(self.data.len());
        if self.data_by_id.insert(data.id.clone(), id).is_some() {
            log::warn!("Collada: data array \"{}\" declared twice, using the last one", data.id);
        }
        self.data.push(data);
        id
    }

    /// Store an accessor under its source ID.
    pub fn insert_accessor(&mut self, accessor: Accessor) -> AccessorId {
        let id = AccessorId(self.accessors.len());
        self.accessors_by_id.insert(accessor.id.clone(), id);
        self.accessors.push(accessor);
        self.resolved.push(None);
        id
    }

    pub fn data(&self, id: &str) -> Option<&Data> {
        self.data_by_id.get(id).map(|&DataId(i)| &self.data[i])
    }

    pub fn accessor(&self, id: &str) -> Option<&Accessor> {
        self.accessors_by_id.get(id).map(|&AccessorId(i)| &self.accessors[i])
    }

    pub fn accessor_id(&self, id: &str) -> Option<AccessorId> {
        self.accessors_by_id.get(id).copied()
    }

    pub fn accessor_at(&self, id: AccessorId) -> &Accessor {
        &self.accessors[id.0]
    }

    pub fn data_at(&self, id: DataId) -> &Data {
        &self.data[id.0]
    }

    /// Look up the accessor of `source_id` and bind it to its data array.
    ///
    /// The binding is computed once; subsequent calls return the cached
    /// handle without touching the ID maps for the data array.
    pub fn resolve(&mut self, source_id: &str) -> ParseResult<AccessorId> {
        let id = self
            .accessor_id(source_id)
            .ok_or_else(|| ParseError::unresolved("accessor", source_id))?;

        if self.resolved[id.0].is_none() {
            let data_ref = &self.accessors[id.0].source;
            let data = self
                .data_by_id
                .get(data_ref)
                .copied()
                .ok_or_else(|| ParseError::unresolved("data array", data_ref))?;
            self.resolved[id.0] = Some(data);
        }

        Ok(id)
    }

    /// The accessor and data array of a previously resolved accessor.
    pub fn resolved(&self, id: AccessorId) -> Option<(&Accessor, &Data)> {
        let data = self.resolved.get(id.0).copied().flatten()?;
        Some((&self.accessors[id.0], &self.data[data.0]))
    }

    /// Resolve and borrow in one step.
    pub fn resolve_view(&mut self, source_id: &str) -> ParseResult<(&Accessor, &Data)> {
        let id = self.resolve(source_id)?;
        self.resolved(id)
            .ok_or_else(|| ParseError::unresolved("accessor", source_id))
    }

    pub fn data_count(&self) -> usize {
        self.data.len()
    }

    pub fn accessor_count(&self) -> usize {
        self.accessors.len()
    }

    pub fn accessors(&self) -> impl Iterator<Item = &Accessor> {
        self.accessors.iter()
    }
}

/// Param names that carry no component position but are legitimate.
const NON_COMPONENT_PARAMS: &[&str] = &[
    "",
    "TIME",
    "TRANSFORM",
    "JOINT",
    "WEIGHT",
    "INTERPOLATION",
    "ANGLE",
    "MORPH_TARGET",
    "MORPH_WEIGHT",
    "VALUE",
    "Q",
    "W",
];

fn component_slot(name: &str) -> Option<usize> {
    match name {
        "X" | "R" | "S" | "U" => Some(0),
        "Y" | "G" | "T" | "V" => Some(1),
        "Z" | "B" | "P" => Some(2),
        "A" => Some(3),
        _ => None,
    }
}

impl ColladaParser {
    /// `<source id>`: data arrays plus an accessor registered under the source ID.
    pub(crate) fn read_source(&mut self, node: &XmlNode) -> ParseResult<()> {
        let source_id = required_attr(node, "id")?;

        for child in node.children() {
            match child.name() {
                "float_array" | "int_array" | "IDREF_array" | "Name_array" => {
                    self.read_data_array(child)?;
                }
                "technique_common" => {
                    for accessor in child.children_named("accessor") {
                        self.read_accessor(accessor, source_id)?;
                    }
                }
                "accessor" => self.read_accessor(child, source_id)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn read_data_array(&mut self, node: &XmlNode) -> ParseResult<()> {
        let element = node.name();
        let id = required_attr(node, "id")?;
        let count = required_uint_attr(node, "count")?;

        let values = match element {
            "IDREF_array" | "Name_array" => {
                DataArray::String(read_strings_exact(node.text(), count, element)?)
            }
            _ => DataArray::Float(read_floats_exact(node.text(), count, element)?),
        };

        self.doc.sources.insert_data(Data {
            id: id.to_string(),
            values,
        });
        Ok(())
    }

    fn read_accessor(&mut self, node: &XmlNode, source_id: &str) -> ParseResult<()> {
        let source = local_url(required_attr(node, "source")?, "accessor")?;

        let mut accessor = Accessor {
            id: source_id.to_string(),
            count: required_uint_attr(node, "count")?,
            offset: uint_attr(node, "offset")?.unwrap_or(0),
            stride: uint_attr(node, "stride")?.unwrap_or(1),
            source: source.to_string(),
            ..Default::default()
        };

        let mut named_components = false;
        for param in node.children() {
            if param.name() != "param" {
                return Err(ParseError::unexpected("accessor", param.name()));
            }

            let name = param.attribute("name").unwrap_or("");
            match component_slot(name) {
                Some(slot) => {
                    if !named_components {
                        accessor.sub_offsets = [None; 4];
                        named_components = true;
                    }
                    accessor.sub_offsets[slot] = Some(accessor.params.len());
                }
                None if NON_COMPONENT_PARAMS.contains(&name) => {}
                None => log::warn!(
                    "Collada: unknown accessor parameter \"{}\" in source \"{}\", ignoring",
                    name,
                    source_id
                ),
            }

            match param.attribute("type") {
                Some("float4x4") => accessor.size += 16,
                Some(_) => accessor.size += 1,
                None => {}
            }

            accessor.params.push(name.to_string());
        }

        self.doc.sources.insert_accessor(accessor);
        Ok(())
    }
}
