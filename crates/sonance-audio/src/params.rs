//! Parameter mapping: bus levels, per-play source parameters, clip selection

use glam::Vec3;
use rand::seq::SliceRandom;
use rand::Rng;
use sonance_assets::{ClipHandle, SoundDefinition};

use crate::bus::OutputBus;

const LEVEL_INPUT: (f32, f32) = (0.0, 100.0);
const LEVEL_DECIBELS: (f32, f32) = (-20.0, 20.0);

/// Squared distance under which a position counts as the origin.
const ORIGIN_EPSILON_SQ: f32 = 1e-10;

/// Remap a 0–100 level slider onto -20..20 dB. Inputs outside 0–100 are not
/// clamped and produce decibel values outside that range.
pub fn level_to_decibels(value: f32) -> f32 {
    let (from_min, from_max) = LEVEL_INPUT;
    let (to_min, to_max) = LEVEL_DECIBELS;
    (value - from_min) / (from_max - from_min) * (to_max - to_min) + to_min
}

/// Linear distance attenuation between two distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rolloff {
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for Rolloff {
    fn default() -> Self {
        Self {
            min_distance: 1.0,
            max_distance: 500.0,
        }
    }
}

impl Rolloff {
    /// Rolloff for a definition's `range`. The near distance is
    /// `min(0, range)`, which is never positive for a valid range.
    pub fn from_range(range: f32) -> Self {
        Self {
            min_distance: range.min(0.0),
            max_distance: range,
        }
    }
}

/// Source parameters resolved for a single play request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParams {
    pub volume: f32,
    pub pitch: f32,
    pub looping: bool,
    pub rolloff: Rolloff,
    /// 0.0 plays non-positional, 1.0 fully positional.
    pub spatial_blend: f32,
}

impl Default for SourceParams {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            rolloff: Rolloff::default(),
            spatial_blend: 0.0,
        }
    }
}

impl SourceParams {
    /// Resolve the parameters for playing `definition` on `bus` at
    /// `world_position`. The definition itself is left untouched.
    pub fn resolve<R: Rng>(
        definition: &SoundDefinition,
        bus: OutputBus,
        world_position: Vec3,
        rng: &mut R,
    ) -> Self {
        Self {
            volume: definition.volume,
            pitch: resolve_pitch(definition, rng),
            looping: definition.looping,
            rolloff: Rolloff::from_range(definition.range),
            spatial_blend: spatial_blend(bus, world_position),
        }
    }
}

/// Fixed pitch, or a uniform draw from `[min_pitch, max_pitch]` when the
/// definition asks for a random pitch.
pub(crate) fn resolve_pitch<R: Rng>(definition: &SoundDefinition, rng: &mut R) -> f32 {
    if !definition.random_pitch {
        return definition.pitch;
    }
    let (min, max) = (definition.min_pitch, definition.max_pitch);
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    // Code-built definitions skip the loader; an unrepresentable span
    // would panic inside the sampler.
    if !(hi - lo).is_finite() {
        return definition.pitch;
    }
    if lo == hi {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

/// UI sounds are always non-positional; other buses are positional unless
/// played at the origin.
pub(crate) fn spatial_blend(bus: OutputBus, world_position: Vec3) -> f32 {
    match bus {
        OutputBus::UI => 0.0,
        _ if world_position.length_squared() < ORIGIN_EPSILON_SQ => 0.0,
        _ => 1.0,
    }
}

/// The clip to play: a uniform pick from the pool for random definitions,
/// the fixed clip otherwise. `None` when the active source is empty.
pub(crate) fn select_clip<R: Rng>(
    definition: &SoundDefinition,
    rng: &mut R,
) -> Option<ClipHandle> {
    if definition.random_clip {
        definition.random_clips.choose(rng).copied()
    } else {
        definition.clip
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sonance_assets::{AssetServer, AudioClip};

    use super::*;

    fn clips(n: usize) -> Vec<ClipHandle> {
        let mut server = AssetServer::new("assets");
        (0..n)
            .map(|i| server.insert_clip(AudioClip::new(format!("clip{i}"), Duration::from_secs(1))))
            .collect()
    }

    #[test]
    fn level_endpoints_are_exact() {
        assert_eq!(level_to_decibels(0.0), -20.0);
        assert_eq!(level_to_decibels(100.0), 20.0);
        assert_eq!(level_to_decibels(50.0), 0.0);
        assert_eq!(level_to_decibels(25.0), -10.0);
    }

    #[test]
    fn level_is_not_clamped() {
        assert_eq!(level_to_decibels(200.0), 60.0);
        assert_eq!(level_to_decibels(-50.0), -40.0);
    }

    #[test]
    fn min_distance_never_positive() {
        for range in [0.0, 0.5, 1.0, 25.0, 1000.0] {
            let rolloff = Rolloff::from_range(range);
            assert!(rolloff.min_distance <= 0.0);
            assert_eq!(rolloff.max_distance, range);
        }
    }

    #[test]
    fn ui_is_always_flat() {
        assert_eq!(spatial_blend(OutputBus::UI, Vec3::ZERO), 0.0);
        assert_eq!(spatial_blend(OutputBus::UI, Vec3::new(5.0, 1.0, 2.0)), 0.0);
    }

    #[test]
    fn positional_only_away_from_origin() {
        for bus in [OutputBus::Music, OutputBus::Game] {
            assert_eq!(spatial_blend(bus, Vec3::ZERO), 0.0);
            assert_eq!(spatial_blend(bus, Vec3::new(0.0, 0.0, 3.0)), 1.0);
        }
    }

    #[test]
    fn random_pitch_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let definition = SoundDefinition {
            random_pitch: true,
            min_pitch: 0.5,
            max_pitch: 1.5,
            ..Default::default()
        };
        for _ in 0..1000 {
            let pitch = resolve_pitch(&definition, &mut rng);
            assert!((0.5..=1.5).contains(&pitch), "pitch out of range: {pitch}");
        }
        assert_eq!(definition.pitch, 1.0);
    }

    #[test]
    fn unsampleable_bounds_fall_back_to_pitch() {
        let mut rng = StdRng::seed_from_u64(5);
        for (min_pitch, max_pitch) in [
            (-3.0e38, 3.0e38),
            (f32::MIN, f32::MAX),
            (f32::NAN, 1.0),
            (0.5, f32::INFINITY),
        ] {
            let definition = SoundDefinition {
                pitch: 1.5,
                random_pitch: true,
                min_pitch,
                max_pitch,
                ..Default::default()
            };
            assert_eq!(resolve_pitch(&definition, &mut rng), 1.5);
        }
    }

    #[test]
    fn fixed_pitch_ignores_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let definition = SoundDefinition {
            pitch: 2.0,
            min_pitch: 0.5,
            max_pitch: 0.6,
            ..Default::default()
        };
        assert_eq!(resolve_pitch(&definition, &mut rng), 2.0);
    }

    #[test]
    fn random_clip_always_from_pool() {
        let pool = clips(3);
        let definition = SoundDefinition {
            random_clip: true,
            random_clips: pool.clone(),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..300 {
            let clip = select_clip(&definition, &mut rng).unwrap();
            assert!(pool.contains(&clip));
            seen.insert(clip);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let definition = SoundDefinition {
            random_clip: true,
            clip: clips(1).first().copied(),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(select_clip(&definition, &mut rng), None);
    }

    #[test]
    fn resolve_copies_definition_fields() {
        let definition = SoundDefinition {
            volume: 0.25,
            pitch: 1.25,
            looping: true,
            range: 40.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let params =
            SourceParams::resolve(&definition, OutputBus::Game, Vec3::new(1.0, 0.0, 0.0), &mut rng);
        assert_eq!(params.volume, 0.25);
        assert_eq!(params.pitch, 1.25);
        assert!(params.looping);
        assert_eq!(params.rolloff, Rolloff::from_range(40.0));
        assert_eq!(params.spatial_blend, 1.0);
    }
}
