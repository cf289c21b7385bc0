use std::fmt;

use sonance_core::Transform;

/// A generational scene node handle. A stale handle never aliases a node
/// spawned later into the same slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// The slot index of this node.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of this node (incremented each time the slot is freed).
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Data stored for a live node.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub name: String,
    /// Transform relative to the parent (or world space for root nodes).
    pub local: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// One storage slot. `node` is `None` while the slot sits on the free list.
#[derive(Debug, Default)]
pub(crate) struct Slot {
    pub generation: u32,
    pub node: Option<NodeData>,
}
