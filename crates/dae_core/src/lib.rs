//! DAE Core - COLLADA scene import.
//!
//! This crate provides:
//!
//! - **Document tree**: `xml::XmlNode`, a small owned tree built from `quick-xml`
//! - **Byte sources**: `source::ByteSource` for files and in-memory archives
//! - **COLLADA parser**: `collada::load_dae` and the `ColladaDocument` model
//!
//! # Example
//!
//! ```ignore
//! use dae_core::load_dae;
//!
//! let doc = load_dae("scene.dae")?;
//! println!("Loaded {} meshes, {} materials", doc.meshes.len(), doc.materials.len());
//! ```

pub mod collada;
pub mod source;
pub mod xml;

// Re-export commonly used types
pub use collada::{
    load_dae, load_dae_from_source, load_dae_from_string, ColladaDocument, ColladaError, ColladaResult,
};
pub use source::{ByteSource, FileSource, MemorySource};
pub use xml::XmlNode;
