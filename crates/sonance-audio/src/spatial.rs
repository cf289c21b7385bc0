use glam::Vec3;

use crate::params::SourceParams;

/// Listener pose for spatial audio calculations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Listener {
    pub position: Vec3,
    pub forward: Vec3,
    pub up: Vec3,
}

impl Default for Listener {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: -Vec3::Z,
            up: Vec3::Y,
        }
    }
}

/// Gain and pan applied to a voice for its position relative to the listener.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialParams {
    /// Distance attenuation factor (0.0–1.0).
    pub volume: f64,
    /// Stereo panning (-1.0 = full left, 0.0 = center, 1.0 = full right).
    pub panning: f64,
}

impl SpatialParams {
    pub const FLAT: SpatialParams = SpatialParams {
        volume: 1.0,
        panning: 0.0,
    };
}

/// Compute gain and pan for an emitter at `emitter_pos`.
///
/// Attenuation is linear from full volume at `rolloff.min_distance` to
/// silence at `rolloff.max_distance`. Both attenuation and panning are
/// scaled by the source's spatial blend, so a blend of 0.0 is unaffected by
/// position.
pub fn compute_spatial(listener: &Listener, emitter_pos: Vec3, params: &SourceParams) -> SpatialParams {
    let blend = params.spatial_blend.clamp(0.0, 1.0) as f64;
    if blend == 0.0 {
        return SpatialParams::FLAT;
    }

    let to_emitter = emitter_pos - listener.position;
    let distance = to_emitter.length();

    let min = params.rolloff.min_distance;
    let max = params.rolloff.max_distance;
    let attenuation = if max > min {
        1.0 - ((distance - min) / (max - min)).clamp(0.0, 1.0)
    } else if distance <= min {
        1.0
    } else {
        0.0
    };

    let panning = if distance < f32::EPSILON {
        0.0
    } else {
        let right = listener.forward.cross(listener.up).normalize();
        to_emitter.normalize().dot(right).clamp(-1.0, 1.0)
    };

    SpatialParams {
        volume: 1.0 + (attenuation as f64 - 1.0) * blend,
        panning: panning as f64 * blend,
    }
}
