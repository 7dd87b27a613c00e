//! COLLADA (`.dae`) support.
//!
//! Reads a COLLADA 1.3, 1.4 or 1.5 document into a [`ColladaDocument`]:
//! libraries of meshes, controllers, materials, effects, images, lights,
//! cameras and animations, plus the node hierarchy of the instanced visual
//! scene. Libraries refer to each other by string ID and every reference is
//! checked before the document is returned.
//!
//! ## Supported
//!
//! - Geometry: `lines`, `linestrips`, `triangles`, `tristrips`, `trifans`,
//!   `polylist` and `polygons`, with up to 4 texcoord and 4 color sets
//! - Skin and morph controllers, including controller chains
//! - `profile_COMMON` effects with vendor sampler extensions
//! - Animation trees and clips
//!
//! ## Not Supported
//!
//! - ZAE archives (supply a [`ByteSource`](crate::source::ByteSource) instead)
//! - `<skew>` transforms (kept on the node, skipped when composing)
//! - Physics, kinematics and FX profiles other than `profile_COMMON`
//!
//! # Example
//!
//! ```ignore
//! use dae_core::collada::load_dae;
//!
//! let doc = load_dae("duck.dae")?;
//! if let Some(root) = doc.root_node() {
//!     println!("scene {} with {} children", root.name, root.children.len());
//! }
//! ```

mod accessor;
mod animation;
mod asset;
mod camera;
mod controller;
mod document;
mod error;
mod light;
mod loader;
mod material;
mod mesh;
mod node;
mod parser;
mod postprocess;
mod primitives;
mod text;

pub use accessor::*;
pub use animation::*;
pub use asset::*;
pub use camera::*;
pub use controller::*;
pub use document::*;
pub use error::*;
pub use light::*;
pub use loader::*;
pub use material::*;
pub use mesh::*;
pub use node::*;
pub use parser::ColladaParser;
