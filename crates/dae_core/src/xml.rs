//! Minimal owned XML document tree.
//!
//! The COLLADA reader never looks at raw XML events. This module folds the
//! `quick-xml` event stream into a tree of [`XmlNode`]s once, and the library
//! readers walk that tree depth-first.
//!
//! Element and attribute names are stored without their namespace prefix, and
//! `xmlns` declarations are dropped. Text and CDATA pieces inside an element
//! are joined with a single space.
//!
//! # Example
//!
//! ```ignore
//! use dae_core::xml::XmlNode;
//!
//! let root = XmlNode::parse("<a x=\"1\"><b>text</b></a>")?;
//! assert_eq!(root.attribute("x"), Some("1"));
//! assert_eq!(root.child("b").map(|b| b.text()), Some("text"));
//! ```

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while building the document tree.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("Unexpected closing tag </{0}>")]
    UnexpectedClose(String),

    #[error("Unclosed element <{0}> at end of document")]
    Unclosed(String),

    #[error("Document has no root element")]
    NoRoot,

    #[error("Document has more than one root element")]
    MultipleRoots,
}

/// One element of the document tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct XmlNode {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parse a complete document and return its root element.
    pub fn parse(content: &str) -> Result<XmlNode, XmlError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root: Option<XmlNode> = None;

        loop {
            let event = reader.read_event().map_err(|e| XmlError::Syntax {
                position: reader.buffer_position() as u64,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(e) => {
                    let node = Self::from_start(&e).map_err(|message| XmlError::Syntax {
                        position: reader.buffer_position() as u64,
                        message,
                    })?;
                    stack.push(node);
                }
                Event::Empty(e) => {
                    let node = Self::from_start(&e).map_err(|message| XmlError::Syntax {
                        position: reader.buffer_position() as u64,
                        message,
                    })?;
                    Self::attach(&mut stack, &mut root, node)?;
                }
                Event::End(e) => {
                    let node = stack.pop().ok_or_else(|| {
                        XmlError::UnexpectedClose(
                            String::from_utf8_lossy(e.local_name().as_ref()).into_owned(),
                        )
                    })?;
                    Self::attach(&mut stack, &mut root, node)?;
                }
                Event::Text(t) => {
                    if let Some(top) = stack.last_mut() {
                        let text = t.unescape().map_err(|e| XmlError::Syntax {
                            position: reader.buffer_position() as u64,
                            message: e.to_string(),
                        })?;
                        top.push_text(&text);
                    }
                }
                Event::CData(c) => {
                    if let Some(top) = stack.last_mut() {
                        let raw = c.into_inner();
                        top.push_text(String::from_utf8_lossy(&raw).trim());
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.name));
        }

        root.ok_or(XmlError::NoRoot)
    }

    /// Build a detached element. Mostly useful for tests and synthetic trees.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder-style text setter.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Local element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an attribute by local name.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Concatenated character data of this element (not its descendants).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Depth-first search for the first descendant with the given name.
    pub fn find_descendant(&self, name: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(name) {
                return Some(found);
            }
        }
        None
    }

    /// Visit every descendant (not including `self`) in document order.
    pub fn for_each_descendant<'a>(&'a self, f: &mut dyn FnMut(&'a XmlNode)) {
        for child in &self.children {
            f(child);
            child.for_each_descendant(f);
        }
    }

    /// True when the element has neither children nor text.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.is_empty()
    }

    fn from_start(e: &BytesStart) -> Result<Self, String> {
        let name = std::str::from_utf8(e.local_name().as_ref())
            .map_err(|e| e.to_string())?
            .to_string();

        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            if attr.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let key = std::str::from_utf8(attr.key.local_name().as_ref())
                .map_err(|e| e.to_string())?
                .to_string();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            attributes.push((key, value.into_owned()));
        }

        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    fn push_text(&mut self, piece: &str) {
        if piece.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(piece);
    }

    fn attach(
        stack: &mut [XmlNode],
        root: &mut Option<XmlNode>,
        node: XmlNode,
    ) -> Result<(), XmlError> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None if root.is_some() => return Err(XmlError::MultipleRoots),
            None => *root = Some(node),
        }
        Ok(())
    }
}
