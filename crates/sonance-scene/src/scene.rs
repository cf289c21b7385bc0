use std::collections::HashMap;
use std::time::Duration;

use sonance_core::{Transform, Vec3};
use tracing::debug;

use crate::node::{NodeData, NodeId, Slot};

/// Owns every scene node, their hierarchy, and pending destruction timers.
#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    len: usize,
    /// Remaining delay before each scheduled node is destroyed.
    timers: HashMap<NodeId, Duration>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Node management ----

    /// Spawn a root node with the given world transform.
    pub fn spawn(&mut self, name: impl Into<String>, transform: Transform) -> NodeId {
        let data = NodeData {
            name: name.into(),
            local: transform,
            parent: None,
            children: Vec::new(),
        };
        self.len += 1;

        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(data);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(data),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Check whether a node is alive.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of alive nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Name of a node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).map(|n| n.name.as_str())
    }

    /// Rename a node. Returns `false` if the node is dead.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.name = name.into();
                true
            }
            None => false,
        }
    }

    // ---- Transforms ----

    /// Transform relative to the node's parent.
    pub fn local_transform(&self, id: NodeId) -> Option<Transform> {
        self.node(id).map(|n| n.local)
    }

    /// Replace the transform relative to the node's parent.
    pub fn set_local_transform(&mut self, id: NodeId, transform: Transform) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.local = transform;
                true
            }
            None => false,
        }
    }

    /// World-space transform, composed through every ancestor.
    pub fn world_transform(&self, id: NodeId) -> Option<Transform> {
        let node = self.node(id)?;
        match node.parent {
            Some(parent) => {
                let parent_world = self.world_transform(parent)?;
                Some(parent_world.mul_transform(&node.local))
            }
            None => Some(node.local),
        }
    }

    /// World-space position.
    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_transform(id).map(|t| t.position)
    }

    // ---- Hierarchy ----

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Attach `child` under `parent` (or detach it with `None`), keeping its
    /// world transform.
    ///
    /// Returns `false` if either node is dead or the move would create a cycle.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> bool {
        let Some(world) = self.world_transform(child) else {
            return false;
        };

        let parent_world = match parent {
            Some(p) => {
                if p == child || self.is_ancestor(child, p) {
                    return false;
                }
                match self.world_transform(p) {
                    Some(t) => Some(t),
                    None => return false,
                }
            }
            None => None,
        };

        if let Some(old) = self.parent(child) {
            if let Some(old_node) = self.node_mut(old) {
                old_node.children.retain(|&c| c != child);
            }
        }
        if let Some(p) = parent {
            if let Some(parent_node) = self.node_mut(p) {
                parent_node.children.push(child);
            }
        }

        let local = match parent_world {
            Some(pw) => pw.relative(&world),
            None => world,
        };
        if let Some(node) = self.node_mut(child) {
            node.parent = parent;
            node.local = local;
        }
        true
    }

    /// Whether `ancestor` appears on the parent chain of `id`.
    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    // ---- Destruction ----

    /// Destroy a node and its whole subtree. Pending timers on any destroyed
    /// node are dropped. Returns every destroyed id, parents before children.
    pub fn destroy(&mut self, id: NodeId) -> Vec<NodeId> {
        if !self.is_alive(id) {
            return Vec::new();
        }

        if let Some(parent) = self.parent(id) {
            if let Some(parent_node) = self.node_mut(parent) {
                parent_node.children.retain(|&c| c != id);
            }
        }

        let mut destroyed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation += 1;
            self.free_list.push(current.index);
            self.len -= 1;
            self.timers.remove(&current);
            destroyed.push(current);
            stack.extend(node.children.into_iter().rev());
        }
        destroyed
    }

    /// Schedule `id` for destruction once `delay` has elapsed on the scene
    /// clock. Replaces any timer already pending on the node.
    pub fn destroy_after(&mut self, id: NodeId, delay: Duration) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        self.timers.insert(id, delay);
        true
    }

    /// Cancel a pending destruction. Returns `true` if a timer was removed.
    pub fn cancel_destroy(&mut self, id: NodeId) -> bool {
        self.timers.remove(&id).is_some()
    }

    /// Time left before a scheduled node is destroyed.
    pub fn pending_destroy(&self, id: NodeId) -> Option<Duration> {
        self.timers.get(&id).copied()
    }

    /// Advance destruction timers by `delta` and destroy every node whose
    /// delay has fully elapsed. Returns all destroyed ids, including
    /// descendants of expired nodes.
    pub fn tick(&mut self, delta: Duration) -> Vec<NodeId> {
        let mut expired = Vec::new();
        for (&id, remaining) in self.timers.iter_mut() {
            if *remaining <= delta {
                expired.push(id);
            } else {
                *remaining -= delta;
            }
        }
        expired.sort();

        let mut destroyed = Vec::new();
        for id in expired {
            destroyed.extend(self.destroy(id));
        }
        if !destroyed.is_empty() {
            debug!("Scene tick destroyed {} node(s)", destroyed.len());
        }
        destroyed
    }
}
