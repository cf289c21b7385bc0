use std::fmt;
use std::path::Path;
use std::time::Duration;

use kira::sound::static_sound::StaticSoundData;

use crate::error::AssetError;
use crate::handle::AssetHandle;

/// Handle to an [`AudioClip`] registered with the asset server.
pub type ClipHandle = AssetHandle<AudioClip>;

/// A playable clip: its length plus, when decoded from disk, the sample data.
#[derive(Clone)]
pub struct AudioClip {
    name: String,
    duration: Duration,
    sound: Option<StaticSoundData>,
}

impl AudioClip {
    /// A clip with a known length but no sample data. Only backends that do
    /// not output audio (headless) can play it.
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
            sound: None,
        }
    }

    /// Wrap decoded kira sound data.
    pub fn from_sound(name: impl Into<String>, sound: StaticSoundData) -> Self {
        Self {
            name: name.into(),
            duration: sound.duration(),
            sound: Some(sound),
        }
    }

    /// Decode a clip from an audio file. The clip is named after the file stem.
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }
        let sound = StaticSoundData::from_file(path)
            .map_err(|e| AssetError::ClipLoadFailed(path.to_path_buf(), e.to_string()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_sound(name, sound))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length of the clip at normal playback rate.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Decoded sample data, if any.
    pub fn sound(&self) -> Option<&StaticSoundData> {
        self.sound.as_ref()
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("name", &self.name)
            .field("duration", &self.duration)
            .field("decoded", &self.sound.is_some())
            .finish()
    }
}
