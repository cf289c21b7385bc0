//! Core types shared by the scene graph and the audio dispatcher

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position, rotation, and scale of a scene node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform at the given position with identity rotation
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a transform from an affine matrix
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Compute the model matrix for this transform
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Combine a parent transform with a child's local transform.
    pub fn mul_transform(&self, local: &Transform) -> Transform {
        Transform::from_matrix(self.matrix() * local.matrix())
    }

    /// Express a world-space transform relative to this one.
    ///
    /// `self.mul_transform(&self.relative(world))` reproduces `world`.
    pub fn relative(&self, world: &Transform) -> Transform {
        Transform::from_matrix(self.matrix().inverse() * world.matrix())
    }

    /// Get the forward direction (negative Z in local space)
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// Get the up direction (positive Y in local space)
    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }
}
