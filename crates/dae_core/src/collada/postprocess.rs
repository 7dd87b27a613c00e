//! Passes run once the whole document has been walked.

use std::collections::HashSet;

use super::animation::Animation;
use super::error::{ParseError, ParseResult};
use super::parser::ColladaParser;

impl ColladaParser {
    pub(crate) fn postprocess(&mut self) -> ParseResult<()> {
        self.postprocess_root_animations()?;
        self.postprocess_controllers()?;
        self.validate_references()
    }

    /// With clips, rebuild the animation tree as one animation per clip.
    /// Without, fold one-channel-per-animation exports together.
    fn postprocess_root_animations(&mut self) -> ParseResult<()> {
        if self.doc.animation_clips.is_empty() {
            self.doc.animations.combine_single_channel_animations();
            return Ok(());
        }

        let mut root = Animation::new("");
        for clip in &self.doc.animation_clips {
            let mut animation = Animation::new(clip.name.clone());
            for id in &clip.animations {
                let channels = self
                    .animation_library
                    .get(id)
                    .ok_or_else(|| ParseError::unresolved("animation", id))?;
                animation.channels.extend(channels.iter().cloned());
            }
            root.sub_anims.push(animation);
        }

        log::debug!("Collada: built {} animations from clips", root.sub_anims.len());
        self.doc.animations = root;
        Ok(())
    }

    /// Point every controller straight at its base mesh.
    fn postprocess_controllers(&mut self) -> ParseResult<()> {
        let ids: Vec<String> = self.doc.controllers.keys().cloned().collect();

        for id in ids {
            let Some(controller) = self.doc.controllers.get(&id) else {
                continue;
            };
            let mut mesh_id = controller.mesh_id.clone();
            let mut visited = HashSet::from([id.clone()]);

            while let Some(next) = self.doc.controllers.get(&mesh_id) {
                if !visited.insert(mesh_id.clone()) {
                    return Err(ParseError::ControllerCycle(mesh_id));
                }
                mesh_id = next.mesh_id.clone();
            }

            if let Some(controller) = self.doc.controllers.get_mut(&id) {
                controller.mesh_id = mesh_id;
            }
        }
        Ok(())
    }

    fn validate_references(&self) -> ParseResult<()> {
        let doc = &self.doc;
        let has_source = |id: &str| id.is_empty() || doc.sources.accessor(id).is_some();

        for material in doc.materials.values() {
            if material.effect.is_empty() {
                log::warn!("Collada: material \"{}\" has no effect", material.id);
            } else if !doc.effects.contains_key(&material.effect) {
                return Err(ParseError::unresolved("effect", &material.effect));
            }
        }

        for controller in doc.controllers.values() {
            if !doc.meshes.contains_key(&controller.mesh_id) {
                return Err(ParseError::unresolved("mesh", &controller.mesh_id));
            }
            for source in [
                &controller.joint_name_source,
                &controller.joint_offset_matrix_source,
                &controller.weight_input_joints.source,
                &controller.weight_input_weights.source,
                &controller.morph_target,
                &controller.morph_weight,
            ] {
                if !has_source(source.as_str()) {
                    return Err(ParseError::unresolved("source", source));
                }
            }
        }

        for node in &doc.nodes {
            for instance in &node.meshes {
                let found = if instance.is_controller {
                    doc.controllers.contains_key(&instance.url)
                } else {
                    doc.meshes.contains_key(&instance.url)
                };
                if !found {
                    let kind = if instance.is_controller { "controller" } else { "mesh" };
                    return Err(ParseError::unresolved(kind, &instance.url));
                }

                for binding in instance.materials.values() {
                    if !doc.materials.contains_key(&binding.target) {
                        return Err(ParseError::unresolved("material", &binding.target));
                    }
                }
            }
            if let Some(light) = node.lights.iter().find(|l| !doc.lights.contains_key(*l)) {
                return Err(ParseError::unresolved("light", light));
            }
            if let Some(camera) = node.cameras.iter().find(|c| !doc.cameras.contains_key(*c)) {
                return Err(ParseError::unresolved("camera", camera));
            }
            for instance in &node.node_instances {
                let found = doc.node_library.contains_key(instance)
                    || doc.nodes.iter().any(|n| &n.id == instance);
                if !found {
                    return Err(ParseError::unresolved("node", instance));
                }
            }
        }

        let mut channels = Vec::new();
        doc.animations.collect_channels_recursively(&mut channels);
        for channel in &channels {
            for source in [
                &channel.source_times,
                &channel.source_values,
                &channel.in_tangents,
                &channel.out_tangents,
                &channel.interpolation,
            ] {
                if !has_source(source.as_str()) {
                    return Err(ParseError::unresolved("source", source));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collada::animation::{AnimationChannel, AnimationClip};
    use crate::collada::controller::Controller;
    use crate::collada::material::{Effect, Material};
    use crate::collada::mesh::Mesh;
    use crate::collada::node::{MeshInstance, Node};

    fn controller(id: &str, source: &str) -> Controller {
        Controller {
            id: id.to_string(),
            mesh_id: source.to_string(),
            ..Default::default()
        }
    }

    fn channel(target: &str) -> AnimationChannel {
        AnimationChannel {
            target: target.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_controller_chain_resolves_to_mesh() {
        let mut parser = ColladaParser::new("test.dae");
        parser.doc.meshes.insert("mesh".to_string(), Mesh::new("mesh"));
        parser.doc.controllers.insert("a".to_string(), controller("a", "b"));
        parser.doc.controllers.insert("b".to_string(), controller("b", "c"));
        parser.doc.controllers.insert("c".to_string(), controller("c", "mesh"));

        parser.postprocess().unwrap();
        for id in ["a", "b", "c"] {
            assert_eq!(parser.doc.controllers[id].mesh_id, "mesh");
        }
    }

    #[test]
    fn test_controller_cycle_is_error() {
        let mut parser = ColladaParser::new("test.dae");
        parser.doc.controllers.insert("a".to_string(), controller("a", "b"));
        parser.doc.controllers.insert("b".to_string(), controller("b", "a"));
        assert!(matches!(parser.postprocess(), Err(ParseError::ControllerCycle(_))));

        let mut parser = ColladaParser::new("test.dae");
        parser.doc.controllers.insert("self".to_string(), controller("self", "self"));
        assert!(matches!(parser.postprocess(), Err(ParseError::ControllerCycle(_))));
    }

    #[test]
    fn test_clips_rebuild_animation_tree() {
        let mut parser = ColladaParser::new("test.dae");
        parser
            .animation_library
            .insert("a".to_string(), vec![channel("A/translate")]);
        parser
            .animation_library
            .insert("b".to_string(), vec![channel("B/translate"), channel("B/rotateX.ANGLE")]);
        parser.doc.animation_clips.push(AnimationClip {
            name: "walk".to_string(),
            animations: vec!["a".to_string(), "b".to_string()],
        });

        parser.postprocess().unwrap();
        let root = &parser.doc.animations;
        assert_eq!(root.sub_anims.len(), 1);
        assert_eq!(root.sub_anims[0].name, "walk");
        assert_eq!(root.sub_anims[0].channels.len(), 3);
    }

    #[test]
    fn test_clip_with_unknown_animation_is_error() {
        let mut parser = ColladaParser::new("test.dae");
        parser.doc.animation_clips.push(AnimationClip {
            name: "walk".to_string(),
            animations: vec!["missing".to_string()],
        });
        assert!(matches!(
            parser.postprocess(),
            Err(ParseError::UnresolvedReference { kind: "animation", .. })
        ));
    }

    #[test]
    fn test_without_clips_single_channels_are_combined() {
        let mut parser = ColladaParser::new("test.dae");
        for target in ["A/translate", "B/translate"] {
            let mut sub = Animation::default();
            sub.channels.push(channel(target));
            parser.doc.animations.sub_anims.push(sub);
        }

        parser.postprocess().unwrap();
        assert!(parser.doc.animations.sub_anims.is_empty());
        assert_eq!(parser.doc.animations.channels.len(), 2);
    }

    #[test]
    fn test_material_effect_must_exist() {
        let mut parser = ColladaParser::new("test.dae");
        parser.doc.materials.insert(
            "m".to_string(),
            Material {
                id: "m".to_string(),
                name: String::new(),
                effect: "fx".to_string(),
            },
        );
        assert!(matches!(
            parser.postprocess(),
            Err(ParseError::UnresolvedReference { kind: "effect", .. })
        ));

        parser.doc.effects.insert("fx".to_string(), Effect::default());
        parser.postprocess().unwrap();
    }

    #[test]
    fn test_node_instances_must_resolve() {
        let mut parser = ColladaParser::new("test.dae");
        parser.doc.nodes.push(Node {
            meshes: vec![MeshInstance {
                url: "geo".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        });
        assert!(matches!(
            parser.postprocess(),
            Err(ParseError::UnresolvedReference { kind: "mesh", .. })
        ));

        parser.doc.meshes.insert("geo".to_string(), Mesh::new("geo"));
        parser.postprocess().unwrap();

        parser.doc.nodes[0].lights.push("sun".to_string());
        assert!(matches!(
            parser.postprocess(),
            Err(ParseError::UnresolvedReference { kind: "light", .. })
        ));
    }

    #[test]
    fn test_channel_sources_must_exist() {
        let mut parser = ColladaParser::new("test.dae");
        let mut sub = Animation::default();
        sub.channels.push(AnimationChannel {
            target: "A/translate".to_string(),
            source_times: "times".to_string(),
            ..Default::default()
        });
        parser.doc.animations.sub_anims.push(sub);

        assert!(matches!(
            parser.postprocess(),
            Err(ParseError::UnresolvedReference { kind: "source", .. })
        ));
    }
}
