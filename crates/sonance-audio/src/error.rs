use sonance_assets::AssetError;

use crate::bus::OutputBus;

/// Errors raised while setting up or driving the audio backend.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("failed to initialize audio backend: {0}")]
    InitFailed(String),

    #[error("audio playback failed: {0}")]
    PlaybackFailed(String),

    #[error("mixer has no group named '{bus}' under '{root}'")]
    MissingMixerGroup { bus: OutputBus, root: String },

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Why a play request was skipped. Never returned to callers: the dispatcher
/// logs it and hands back `None`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SkipReason {
    #[error("the sound definition passed in is missing")]
    MissingEntry,

    #[error("the clip from '{0}' is missing")]
    MissingClip(String),

    #[error("backend refused playback: {0}")]
    Backend(String),
}
