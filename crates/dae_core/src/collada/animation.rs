//! Animation trees, channels and clips.
//!
//! `<animation>` elements nest arbitrarily. A leaf holds samplers (which
//! name the key time, value, tangent and interpolation sources) and channels
//! (which bind a sampler to a target path such as `Box/rotateX.ANGLE`).

use std::collections::BTreeMap;

use serde::Serialize;

use super::error::{ParseError, ParseResult};
use super::parser::ColladaParser;
use super::text::local_url;
use crate::xml::XmlNode;

/// One animated property. Fields other than `target` are source IDs.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnimationChannel {
    pub target: String,
    pub source_times: String,
    pub source_values: String,
    pub in_tangents: String,
    pub out_tangents: String,
    pub interpolation: String,
}

/// A parsed channel target: `node/sid`, `node/sid.member` or `node/sid(i)(j)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TargetPath {
    pub node: String,
    pub sid: String,
    pub member: Option<String>,
    pub indices: Vec<usize>,
}

impl AnimationChannel {
    /// Split the target into node ID, transform SID and component selector.
    ///
    /// Returns `None` for targets without a `/`.
    pub fn target_path(&self) -> Option<TargetPath> {
        parse_target_path(&self.target)
    }
}

pub fn parse_target_path(target: &str) -> Option<TargetPath> {
    let (node, rest) = target.split_once('/')?;

    let mut path = TargetPath {
        node: node.to_string(),
        ..Default::default()
    };

    if let Some(bracket) = rest.find('(') {
        path.sid = rest[..bracket].to_string();
        for index in rest[bracket..].split(|c| c == '(' || c == ')') {
            if index.is_empty() {
                continue;
            }
            match index.trim().parse::<usize>() {
                Ok(i) => path.indices.push(i),
                Err(_) => {
                    log::warn!("Collada: invalid index \"{}\" in animation target \"{}\"", index, target);
                    return None;
                }
            }
        }
    } else if let Some((sid, member)) = rest.split_once('.') {
        path.sid = sid.to_string();
        path.member = Some(member.to_string());
    } else {
        path.sid = rest.to_string();
    }

    Some(path)
}

/// A node in the animation tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Animation {
    pub name: String,
    pub channels: Vec<AnimationChannel>,
    pub sub_anims: Vec<Animation>,
}

impl Default for Animation {
    fn default() -> Self {
        Self::new("animation")
    }
}

impl Animation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
            sub_anims: Vec::new(),
        }
    }

    /// Channels of this animation and all descendants, depth first.
    pub fn collect_channels_recursively(&self, out: &mut Vec<AnimationChannel>) {
        out.extend(self.channels.iter().cloned());
        for sub in &self.sub_anims {
            sub.collect_channels_recursively(out);
        }
    }

    /// Fold single-channel children into their parent.
    ///
    /// Many exporters write one `<animation>` per channel. When every child
    /// is such a leaf and no two share a target, the children are replaced
    /// by their channels. An unnamed parent takes the first child's name.
    pub fn combine_single_channel_animations(&mut self) {
        let mut targets = std::collections::HashSet::new();
        let mut foldable = true;

        for sub in &mut self.sub_anims {
            sub.combine_single_channel_animations();
            if foldable
                && sub.channels.len() == 1
                && sub.sub_anims.is_empty()
                && targets.insert(sub.channels[0].target.clone())
            {
                continue;
            }
            foldable = false;
        }

        if foldable && !self.sub_anims.is_empty() {
            if self.name.is_empty() {
                self.name = self.sub_anims[0].name.clone();
            }
            for sub in std::mem::take(&mut self.sub_anims) {
                self.channels.extend(sub.channels);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.sub_anims.is_empty()
    }
}

/// An `<animation_clip>`: a named list of animation IDs.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AnimationClip {
    pub name: String,
    pub animations: Vec<String>,
}

impl ColladaParser {
    pub(crate) fn read_animation_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        let mut root = std::mem::take(&mut self.doc.animations);
        let result = node
            .children_named("animation")
            .try_for_each(|child| self.read_animation(child, &mut root));
        self.doc.animations = root;
        result
    }

    /// Read one `<animation>` into `parent`. Elements holding neither
    /// channels nor sub-animations add nothing.
    fn read_animation(&mut self, node: &XmlNode, parent: &mut Animation) -> ParseResult<()> {
        let name = node.attribute("name").unwrap_or("animation");
        let id = node.attribute("id");

        let mut anim = Animation::new(name);
        let mut samplers: BTreeMap<String, AnimationChannel> = BTreeMap::new();
        let mut bindings: Vec<(&str, &str)> = Vec::new();

        for child in node.children() {
            match child.name() {
                "animation" => self.read_animation(child, &mut anim)?,
                "source" => self.read_source(child)?,
                "sampler" => match child.attribute("id") {
                    Some(sampler_id) => {
                        let channel = read_animation_sampler(child)?;
                        samplers.insert(sampler_id.to_string(), channel);
                    }
                    None => log::warn!("Collada: <sampler> without id in animation \"{}\"", name),
                },
                "channel" => {
                    let source = child.attribute("source").unwrap_or_default();
                    let target = child.attribute("target").unwrap_or_default();
                    bindings.push((source.strip_prefix('#').unwrap_or(source), target));
                }
                _ => {}
            }
        }

        for (source, target) in bindings {
            match samplers.get_mut(source) {
                Some(channel) => channel.target = target.to_string(),
                None => log::warn!("Collada: channel refers to unknown sampler \"{}\"", source),
            }
        }

        // BTreeMap iteration keeps channels ordered by sampler ID
        anim.channels.extend(samplers.into_values());

        if anim.is_empty() {
            return Ok(());
        }

        if let Some(id) = id {
            let mut channels = Vec::new();
            anim.collect_channels_recursively(&mut channels);
            self.animation_library.insert(id.to_string(), channels);
        }

        parent.sub_anims.push(anim);
        Ok(())
    }

    pub(crate) fn read_animation_clip_library(&mut self, node: &XmlNode) -> ParseResult<()> {
        for clip_node in node.children_named("animation_clip") {
            let name = match clip_node.attribute("name").or_else(|| clip_node.attribute("id")) {
                Some(name) => name.to_string(),
                None => format!("animation_{}", self.doc.animation_clips.len()),
            };

            let mut clip = AnimationClip {
                name,
                animations: Vec::new(),
            };
            for instance in clip_node.children_named("instance_animation") {
                if let Some(url) = instance.attribute("url") {
                    clip.animations.push(local_url(url, "instance_animation")?.to_string());
                }
            }

            if !clip.animations.is_empty() {
                self.doc.animation_clips.push(clip);
            }
        }
        Ok(())
    }
}

fn read_animation_sampler(node: &XmlNode) -> ParseResult<AnimationChannel> {
    let mut channel = AnimationChannel::default();

    for input in node.children_named("input") {
        let (Some(semantic), Some(source)) = (input.attribute("semantic"), input.attribute("source")) else {
            continue;
        };
        let source = source
            .strip_prefix('#')
            .ok_or_else(|| ParseError::bad_url("input", source))?
            .to_string();

        match semantic {
            "INPUT" => channel.source_times = source,
            "OUTPUT" => channel.source_values = source,
            "IN_TANGENT" => channel.in_tangents = source,
            "OUT_TANGENT" => channel.out_tangents = source,
            "INTERPOLATION" => channel.interpolation = source,
            _ => {}
        }
    }

    Ok(channel)
}
