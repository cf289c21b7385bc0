//! Mixer surface shared by the dispatcher and the backends

use serde::{Deserialize, Serialize};

/// Index of a group in a backend's mixer graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MixerGroupId(pub usize);

/// A named mixer group as reported by [`Mixer::find_groups_under`].
#[derive(Debug, Clone, PartialEq)]
pub struct MixerGroup {
    pub name: String,
    pub id: MixerGroupId,
}

/// The narrow mixer API the dispatcher relies on.
pub trait Mixer {
    /// Write an exposed float parameter. Returns `false` if no parameter has
    /// that name.
    fn set_float(&mut self, name: &str, value: f32) -> bool;

    /// The group named `root` followed by all of its descendants, in graph
    /// order. Empty if no group has that name.
    fn find_groups_under(&self, root: &str) -> Vec<MixerGroup>;
}

/// Authored shape of the mixer: one root group with child groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerLayout {
    pub root: String,
    pub groups: Vec<String>,
}

impl Default for MixerLayout {
    fn default() -> Self {
        Self {
            root: "Master".to_string(),
            groups: vec!["Music".to_string(), "UI".to_string(), "Game".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
struct GraphNode {
    name: String,
    parent: Option<usize>,
}

/// Group hierarchy built from a [`MixerLayout`]. Every group exposes a
/// volume parameter under its own name.
#[derive(Debug, Clone, Default)]
pub struct MixerGraph {
    nodes: Vec<GraphNode>,
}

impl MixerGraph {
    pub fn from_layout(layout: &MixerLayout) -> Self {
        let mut nodes = vec![GraphNode {
            name: layout.root.clone(),
            parent: None,
        }];
        nodes.extend(layout.groups.iter().map(|name| GraphNode {
            name: name.clone(),
            parent: Some(0),
        }));
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every group in graph order. Parents always precede their children.
    pub fn groups(&self) -> impl Iterator<Item = MixerGroup> + '_ {
        self.nodes.iter().enumerate().map(|(index, node)| MixerGroup {
            name: node.name.clone(),
            id: MixerGroupId(index),
        })
    }

    /// Parent of a group, if it is not a root.
    pub fn parent(&self, id: MixerGroupId) -> Option<MixerGroupId> {
        self.nodes.get(id.0)?.parent.map(MixerGroupId)
    }

    /// Group id exposing the parameter `name`.
    pub fn parameter(&self, name: &str) -> Option<MixerGroupId> {
        self.nodes.iter().position(|n| n.name == name).map(MixerGroupId)
    }

    pub fn find_groups_under(&self, root: &str) -> Vec<MixerGroup> {
        let Some(MixerGroupId(root_id)) = self.parameter(root) else {
            return Vec::new();
        };
        self.nodes
            .iter()
            .enumerate()
            .filter(|(index, _)| *index == root_id || self.is_descendant(*index, root_id))
            .map(|(index, node)| MixerGroup {
                name: node.name.clone(),
                id: MixerGroupId(index),
            })
            .collect()
    }

    fn is_descendant(&self, index: usize, ancestor: usize) -> bool {
        let mut current = self.nodes[index].parent;
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.nodes[p].parent;
        }
        false
    }
}
