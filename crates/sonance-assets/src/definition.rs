//! Sound definitions: authored catalog entries describing one playable sound

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::clip::ClipHandle;
use crate::error::AssetError;

/// Authored description of a playable sound and its parameters.
///
/// Definitions are read-only once loaded; per-play values such as a random
/// pitch are resolved by the dispatcher into a separate value.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundDefinition {
    /// Identifier used for logging and for naming emitter nodes.
    pub name: String,
    /// Pick from `random_clips` instead of playing `clip`.
    pub random_clip: bool,
    /// The single clip played when `random_clip` is false.
    pub clip: Option<ClipHandle>,
    /// Pool picked from uniformly when `random_clip` is true.
    pub random_clips: Vec<ClipHandle>,
    /// Linear gain (0.0–1.0).
    pub volume: f32,
    /// Playback rate factor (0.1–3.0), used when `random_pitch` is false.
    pub pitch: f32,
    pub looping: bool,
    /// Resolve the pitch per play from `[min_pitch, max_pitch]`.
    pub random_pitch: bool,
    pub min_pitch: f32,
    pub max_pitch: f32,
    /// Maximum attenuation distance.
    pub range: f32,
}

impl Default for SoundDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            random_clip: false,
            clip: None,
            random_clips: Vec::new(),
            volume: 1.0,
            pitch: 1.0,
            looping: false,
            random_pitch: false,
            min_pitch: 1.0,
            max_pitch: 1.0,
            range: 0.0,
        }
    }
}

const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);
const PITCH_RANGE: (f32, f32) = (0.1, 3.0);

/// On-disk form of a definition. Clips are referenced by path.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DefinitionFile {
    pub name: Option<String>,
    pub random_clip: bool,
    pub clip: Option<PathBuf>,
    pub random_clips: Vec<PathBuf>,
    pub volume: f32,
    pub pitch: f32,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub random_pitch: bool,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub range: f32,
}

impl Default for DefinitionFile {
    fn default() -> Self {
        let defaults = SoundDefinition::default();
        Self {
            name: None,
            random_clip: defaults.random_clip,
            clip: None,
            random_clips: Vec::new(),
            volume: defaults.volume,
            pitch: defaults.pitch,
            looping: defaults.looping,
            random_pitch: defaults.random_pitch,
            min_pitch: defaults.min_pitch,
            max_pitch: defaults.max_pitch,
            range: defaults.range,
        }
    }
}

impl DefinitionFile {
    /// Check the authoring constraints. Play-time code never re-validates.
    pub fn validate(&self, path: &Path) -> Result<(), AssetError> {
        let invalid = |reason: String| AssetError::InvalidDefinition {
            path: path.to_path_buf(),
            reason,
        };

        if !in_range(self.volume, VOLUME_RANGE) {
            return Err(invalid(format!(
                "volume {} outside [{}, {}]",
                self.volume, VOLUME_RANGE.0, VOLUME_RANGE.1
            )));
        }
        if !in_range(self.pitch, PITCH_RANGE) {
            return Err(invalid(format!(
                "pitch {} outside [{}, {}]",
                self.pitch, PITCH_RANGE.0, PITCH_RANGE.1
            )));
        }
        if !self.range.is_finite() || self.range < 0.0 {
            return Err(invalid(format!("range {} must be >= 0", self.range)));
        }
        if self.random_pitch {
            for (key, value) in [("min_pitch", self.min_pitch), ("max_pitch", self.max_pitch)] {
                if !in_range(value, PITCH_RANGE) {
                    return Err(invalid(format!(
                        "{key} {value} outside [{}, {}]",
                        PITCH_RANGE.0, PITCH_RANGE.1
                    )));
                }
            }
            if self.min_pitch > self.max_pitch {
                return Err(invalid(format!(
                    "min_pitch {} is greater than max_pitch {}",
                    self.min_pitch, self.max_pitch
                )));
            }
        }

        if self.clip.is_some() && !self.random_clips.is_empty() {
            warn!(
                "{}: both `clip` and `random_clips` are set; only the {} is used",
                path.display(),
                if self.random_clip { "random pool" } else { "fixed clip" }
            );
        }
        Ok(())
    }
}

fn in_range(value: f32, (min, max): (f32, f32)) -> bool {
    value.is_finite() && value >= min && value <= max
}
