//! Playback backends: the kira engine and a headless recorder

mod engine;
mod headless;

use glam::Vec3;
use sonance_assets::AudioClip;

pub use self::engine::KiraBackend;
pub use self::headless::{HeadlessBackend, HeadlessVoice};

use crate::error::AudioError;
use crate::mixer::{Mixer, MixerGroupId};
use crate::params::SourceParams;
use crate::spatial::Listener;

/// Identifier of a voice started on a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

/// Everything a backend needs to start one voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceRequest {
    pub params: SourceParams,
    /// World position of the emitter.
    pub position: Vec3,
    /// Mixer group to play through, or `None` for the default output.
    pub output: Option<MixerGroupId>,
}

/// Voice management side of a backend.
pub trait VoiceOutput {
    /// Start playing `clip` immediately.
    fn play(&mut self, clip: &AudioClip, request: &VoiceRequest) -> Result<VoiceId, AudioError>;

    /// Stop a voice. Unknown or finished voices are ignored.
    fn stop(&mut self, voice: VoiceId);

    /// Move a voice's emitter.
    fn set_position(&mut self, voice: VoiceId, position: Vec3);

    fn set_listener(&mut self, listener: Listener);

    /// Per-frame housekeeping, such as dropping finished voices.
    fn update(&mut self) {}
}

/// A complete backend: mixer parameters plus voices.
pub trait AudioBackend: Mixer + VoiceOutput {}

impl<T: Mixer + VoiceOutput> AudioBackend for T {}
