//! Sonance Scene - Minimal scene graph hosting audio emitters
//!
//! Nodes are addressed by generational [`NodeId`]s, can be parented to each
//! other, and can be scheduled for destruction after a delay. The delay
//! timers advance only when [`Scene::tick`] is called, so disposal stays on
//! the caller's frame loop.

mod node;
mod scene;

pub use node::NodeId;
pub use scene::Scene;
