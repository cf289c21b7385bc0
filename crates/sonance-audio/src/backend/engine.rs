use std::collections::HashMap;

use glam::Vec3;
use kira::manager::backend::DefaultBackend;
use kira::manager::{AudioManager, AudioManagerSettings};
use kira::sound::static_sound::{StaticSoundHandle, StaticSoundSettings};
use kira::sound::PlaybackState;
use kira::track::{TrackBuilder, TrackHandle, TrackRoutes};
use kira::tween::Tween;
use kira::Volume;
use sonance_assets::AudioClip;
use tracing::{debug, info};

use super::{VoiceId, VoiceOutput, VoiceRequest};
use crate::error::AudioError;
use crate::mixer::{Mixer, MixerGraph, MixerGroup, MixerLayout};
use crate::params::SourceParams;
use crate::spatial::{self, Listener, SpatialParams};

struct KiraVoice {
    handle: StaticSoundHandle,
    params: SourceParams,
}

/// Backend playing through kira's `AudioManager`. Each mixer group is a
/// sub-track; child groups are routed into their parent's track.
pub struct KiraBackend {
    manager: AudioManager<DefaultBackend>,
    graph: MixerGraph,
    /// Index-aligned with the graph's groups.
    tracks: Vec<TrackHandle>,
    voices: HashMap<VoiceId, KiraVoice>,
    next_voice: u64,
    listener: Listener,
}

impl KiraBackend {
    /// Open the default audio device and build one track per mixer group.
    pub fn new(layout: Option<&MixerLayout>) -> Result<Self, AudioError> {
        let mut manager = AudioManager::<DefaultBackend>::new(AudioManagerSettings::default())
            .map_err(|e| AudioError::InitFailed(e.to_string()))?;

        let graph = layout.map(MixerGraph::from_layout).unwrap_or_default();
        let mut tracks: Vec<TrackHandle> = Vec::with_capacity(graph.len());
        for group in graph.groups() {
            let builder = match graph.parent(group.id).and_then(|p| tracks.get(p.0)) {
                Some(parent) => TrackBuilder::new().routes(TrackRoutes::parent(parent.id())),
                None => TrackBuilder::new(),
            };
            let track = manager
                .add_sub_track(builder)
                .map_err(|e| AudioError::InitFailed(format!("mixer group '{}': {e}", group.name)))?;
            tracks.push(track);
        }

        info!("Kira audio backend initialized with {} mixer group(s)", tracks.len());

        Ok(Self {
            manager,
            graph,
            tracks,
            voices: HashMap::new(),
            next_voice: 0,
            listener: Listener::default(),
        })
    }

    fn spatial_for(&self, position: Vec3, params: &SourceParams) -> SpatialParams {
        spatial::compute_spatial(&self.listener, position, params)
    }
}

/// kira 0.9 pans from 0.0 (left) to 1.0 (right).
fn kira_panning(panning: f64) -> f64 {
    (panning + 1.0) * 0.5
}

impl Mixer for KiraBackend {
    /// Each group exposes its track volume, in decibels, under its own name.
    fn set_float(&mut self, name: &str, value: f32) -> bool {
        let Some(track) = self
            .graph
            .parameter(name)
            .and_then(|id| self.tracks.get_mut(id.0))
        else {
            return false;
        };
        track.set_volume(Volume::Decibels(value as f64), Tween::default());
        true
    }

    fn find_groups_under(&self, root: &str) -> Vec<MixerGroup> {
        self.graph.find_groups_under(root)
    }
}

impl VoiceOutput for KiraBackend {
    fn play(&mut self, clip: &AudioClip, request: &VoiceRequest) -> Result<VoiceId, AudioError> {
        let data = clip.sound().ok_or_else(|| {
            AudioError::PlaybackFailed(format!("clip '{}' has no sample data", clip.name()))
        })?;

        let params = request.params;
        let SpatialParams { volume, panning } = self.spatial_for(request.position, &params);

        let mut settings = StaticSoundSettings::new()
            .volume(params.volume as f64 * volume)
            .playback_rate(params.pitch as f64)
            .panning(kira_panning(panning));
        if params.looping {
            settings = settings.loop_region(..);
        }
        if let Some(track) = request.output.and_then(|g| self.tracks.get(g.0)) {
            settings = settings.output_destination(track);
        }

        let handle = self
            .manager
            .play(data.clone().with_settings(settings))
            .map_err(|e| AudioError::PlaybackFailed(e.to_string()))?;

        let id = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.voices.insert(id, KiraVoice { handle, params });
        Ok(id)
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(mut v) = self.voices.remove(&voice) {
            v.handle.stop(Tween::default());
        }
    }

    fn set_position(&mut self, voice: VoiceId, position: Vec3) {
        let listener = self.listener;
        if let Some(v) = self.voices.get_mut(&voice) {
            if v.params.spatial_blend <= 0.0 {
                return;
            }
            let SpatialParams { volume, panning } =
                spatial::compute_spatial(&listener, position, &v.params);
            v.handle
                .set_volume(v.params.volume as f64 * volume, Tween::default());
            v.handle
                .set_panning(kira_panning(panning), Tween::default());
        }
    }

    fn set_listener(&mut self, listener: Listener) {
        self.listener = listener;
    }

    fn update(&mut self) {
        let before = self.voices.len();
        self.voices
            .retain(|_, v| v.handle.state() != PlaybackState::Stopped);
        let finished = before - self.voices.len();
        if finished > 0 {
            debug!("Dropped {} finished voice(s)", finished);
        }
    }
}
