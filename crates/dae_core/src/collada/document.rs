//! The parsed COLLADA document.

use std::collections::BTreeMap;

use dae_math::Mat4;
use serde::Serialize;

use super::accessor::SourceLibrary;
use super::animation::{Animation, AnimationClip};
use super::asset::AssetInfo;
use super::camera::Camera;
use super::controller::Controller;
use super::light::Light;
use super::material::{Effect, Image, Material};
use super::mesh::Mesh;
use super::node::{MeshInstance, Node, NodeId};

/// Every library of a COLLADA file, cross-referenced by string ID.
///
/// Produced by [`load_dae`](super::load_dae) and read-only afterwards. All
/// references between libraries have been checked to resolve.
#[derive(Clone, Debug, Serialize)]
pub struct ColladaDocument {
    pub asset: AssetInfo,
    pub sources: SourceLibrary,
    pub meshes: BTreeMap<String, Mesh>,
    pub controllers: BTreeMap<String, Controller>,
    pub images: BTreeMap<String, Image>,
    pub effects: BTreeMap<String, Effect>,
    pub materials: BTreeMap<String, Material>,
    pub lights: BTreeMap<String, Light>,
    pub cameras: BTreeMap<String, Camera>,

    /// Node arena
    pub nodes: Vec<Node>,
    /// Visual scene roots and `<library_nodes>` entries by ID
    pub node_library: BTreeMap<String, NodeId>,
    /// Visual scene chosen by `<scene>`
    pub root: Option<NodeId>,

    /// Root of the animation tree; carries no channels of its own
    /// unless single-channel animations were folded into it.
    pub animations: Animation,
    pub animation_clips: Vec<AnimationClip>,
}

impl Default for ColladaDocument {
    fn default() -> Self {
        Self {
            asset: AssetInfo::default(),
            sources: SourceLibrary::new(),
            meshes: BTreeMap::new(),
            controllers: BTreeMap::new(),
            images: BTreeMap::new(),
            effects: BTreeMap::new(),
            materials: BTreeMap::new(),
            lights: BTreeMap::new(),
            cameras: BTreeMap::new(),
            nodes: Vec::new(),
            node_library: BTreeMap::new(),
            root: None,
            animations: Animation::new(""),
            animation_clips: Vec::new(),
        }
    }
}

impl ColladaDocument {
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.root.and_then(|id| self.node(id))
    }

    /// Find a node by ID, falling back to its name.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.id == name)
            .or_else(|| self.nodes.iter().position(|n| n.name == name))
            .map(NodeId)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> {
        self.node(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(move |child| self.node(*child))
    }

    /// Local transform of a node.
    pub fn node_transform(&self, id: NodeId) -> Mat4 {
        self.node(id).map(Node::local_transform).unwrap_or(Mat4::IDENTITY)
    }

    /// Transform from node space to the space of its topmost ancestor.
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let mut result = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.node(node_id) else {
                break;
            };
            result = node.local_transform() * result;
            current = node.parent;
        }
        result
    }

    /// Mesh an instance draws, following a controller to its base mesh.
    pub fn instance_mesh(&self, instance: &MeshInstance) -> Option<&Mesh> {
        if instance.is_controller {
            let controller = self.controllers.get(&instance.url)?;
            self.meshes.get(&controller.mesh_id)
        } else {
            self.meshes.get(&instance.url)
        }
    }

    /// Effect behind a material ID.
    pub fn material_effect(&self, material: &str) -> Option<&Effect> {
        let material = self.materials.get(material)?;
        self.effects.get(&material.effect)
    }
}
