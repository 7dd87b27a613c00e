//! Entry points: read bytes, build the document tree, run the parser.
//!
//! Every failure is reported as a [`ColladaError`] naming the file.

use std::borrow::Cow;
use std::path::Path;

use super::document::ColladaDocument;
use super::error::{ColladaError, ColladaResult, ParseError, ParseResult};
use super::parser::ColladaParser;
use crate::source::{ByteSource, FileSource};
use crate::xml::XmlNode;

/// Load a `.dae` file from disk.
///
/// # Example
///
/// ```ignore
/// use dae_core::collada::load_dae;
///
/// let doc = load_dae("duck.dae")?;
/// println!("{} meshes, {} nodes", doc.meshes.len(), doc.nodes.len());
/// ```
pub fn load_dae<P: AsRef<Path>>(path: P) -> ColladaResult<ColladaDocument> {
    let name = path.as_ref().to_string_lossy();
    load_dae_from_source(&FileSource::new(), &name)
}

/// Load the document `name` from any byte source, e.g. an archive member.
///
/// The bytes are read fully before parsing and the source is not retained.
pub fn load_dae_from_source(source: &dyn ByteSource, name: &str) -> ColladaResult<ColladaDocument> {
    let bytes = source.read(name).map_err(|source| ColladaError::Io {
        file: name.to_string(),
        source,
    })?;
    let content = decode_text(&bytes, name).map_err(|source| ColladaError::Parse {
        file: name.to_string(),
        source,
    })?;
    load_dae_from_string(&content, name)
}

/// UTF-16 documents are recognised by their byte order mark. Invalid UTF-8
/// is replaced with U+FFFD after a warning.
fn decode_text<'a>(bytes: &'a [u8], name: &str) -> ParseResult<Cow<'a, str>> {
    let utf16: Option<(&[u8], fn([u8; 2]) -> u16)> = match bytes {
        [0xFF, 0xFE, rest @ ..] => Some((rest, u16::from_le_bytes as fn([u8; 2]) -> u16)),
        [0xFE, 0xFF, rest @ ..] => Some((rest, u16::from_be_bytes as fn([u8; 2]) -> u16)),
        _ => None,
    };

    if let Some((rest, to_unit)) = utf16 {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| to_unit([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units)
            .map(Cow::Owned)
            .map_err(|_| ParseError::Message("Invalid UTF-16 text".to_string()));
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(err) => {
            log::warn!(
                "Collada: {} is not valid UTF-8 after byte {}, replacing invalid sequences",
                name,
                err.valid_up_to()
            );
            Ok(String::from_utf8_lossy(bytes))
        }
    }
}

/// Parse a document already held in memory. `name` is used in error messages.
pub fn load_dae_from_string(content: &str, name: &str) -> ColladaResult<ColladaDocument> {
    let wrap = |source: ParseError| ColladaError::Parse {
        file: name.to_string(),
        source,
    };

    let root = XmlNode::parse(content).map_err(|e| wrap(e.into()))?;
    ColladaParser::new(name).parse(&root).map_err(wrap)
}
