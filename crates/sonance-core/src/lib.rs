//! Sonance Core - Shared types for the Sonance audio layer
//!
//! This crate provides the foundational types used by every other crate:
//! - Mathematical primitives (re-exported from glam)
//! - Transform for positioning scene nodes and emitters
//! - Frame clock driving the per-frame update loop

pub mod time;
pub mod types;

pub use glam::{Mat4, Quat, Vec3};
pub use time::{ClockConfig, FrameClock};
pub use types::Transform;
