use std::collections::{BTreeMap, HashMap};

use glam::Vec3;
use sonance_assets::AudioClip;
use tracing::debug;

use super::{VoiceId, VoiceOutput, VoiceRequest};
use crate::error::AudioError;
use crate::mixer::{Mixer, MixerGraph, MixerGroup, MixerLayout};
use crate::spatial::Listener;

/// Stopped voices kept for inspection; older ones are pruned on update.
const STOPPED_HISTORY: usize = 64;

/// A voice recorded by the [`HeadlessBackend`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessVoice {
    pub clip: String,
    pub request: VoiceRequest,
    /// Latest emitter position.
    pub position: Vec3,
    pub stopped: bool,
}

/// Backend without an audio device. Records every call so tools, servers,
/// and tests can drive the dispatcher without sound output.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    graph: MixerGraph,
    parameters: HashMap<String, f32>,
    voices: BTreeMap<VoiceId, HeadlessVoice>,
    next_voice: u64,
    listener: Listener,
    refuse_playback: bool,
}

impl HeadlessBackend {
    /// A headless backend with the given mixer layout, or no mixer at all.
    pub fn new(layout: Option<&MixerLayout>) -> Self {
        Self {
            graph: layout.map(MixerGraph::from_layout).unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Make subsequent `play` calls fail.
    pub fn refuse_playback(&mut self, refuse: bool) {
        self.refuse_playback = refuse;
    }

    /// Last value written to an exposed parameter.
    pub fn parameter(&self, name: &str) -> Option<f32> {
        self.parameters.get(name).copied()
    }

    pub fn voice(&self, voice: VoiceId) -> Option<&HeadlessVoice> {
        self.voices.get(&voice)
    }

    /// Voices started and not yet stopped.
    pub fn playing(&self) -> usize {
        self.voices.values().filter(|v| !v.stopped).count()
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }
}

impl Mixer for HeadlessBackend {
    fn set_float(&mut self, name: &str, value: f32) -> bool {
        if self.graph.parameter(name).is_none() {
            return false;
        }
        self.parameters.insert(name.to_string(), value);
        true
    }

    fn find_groups_under(&self, root: &str) -> Vec<MixerGroup> {
        self.graph.find_groups_under(root)
    }
}

impl VoiceOutput for HeadlessBackend {
    fn play(&mut self, clip: &AudioClip, request: &VoiceRequest) -> Result<VoiceId, AudioError> {
        if self.refuse_playback {
            return Err(AudioError::PlaybackFailed(format!(
                "headless backend refused '{}'",
                clip.name()
            )));
        }
        let id = VoiceId(self.next_voice);
        self.next_voice += 1;
        debug!("Headless voice {:?} started for '{}'", id, clip.name());
        self.voices.insert(
            id,
            HeadlessVoice {
                clip: clip.name().to_string(),
                request: *request,
                position: request.position,
                stopped: false,
            },
        );
        Ok(id)
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.stopped = true;
        }
    }

    fn set_position(&mut self, voice: VoiceId, position: Vec3) {
        if let Some(v) = self.voices.get_mut(&voice) {
            v.position = position;
        }
    }

    fn set_listener(&mut self, listener: Listener) {
        self.listener = listener;
    }

    fn update(&mut self) {
        let stopped = self.voices.values().filter(|v| v.stopped).count();
        let mut excess = stopped.saturating_sub(STOPPED_HISTORY);
        if excess == 0 {
            return;
        }
        // Ids grow with start order, so this drops the oldest first.
        self.voices.retain(|_, v| {
            if excess > 0 && v.stopped {
                excess -= 1;
                return false;
            }
            true
        });
        debug!("Pruned stopped headless voices, {} kept", self.voices.len());
    }
}
