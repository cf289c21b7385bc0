use std::collections::HashMap;
use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sonance_assets::{AssetServer, ClipHandle, SoundDefinition};
use sonance_core::Transform;
use sonance_scene::{NodeId, Scene};
use tracing::{debug, info, warn};

use crate::backend::{AudioBackend, VoiceId, VoiceRequest};
use crate::bus::{BusRouting, MixerBus, OutputBus};
use crate::config::DispatcherConfig;
use crate::error::{AudioError, SkipReason};
use crate::mixer::MixerGroupId;
use crate::params::{self, level_to_decibels, SourceParams};
use crate::spatial::Listener;

/// Record of one started playback.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackHandle {
    /// Emitter node carrying the voice.
    pub node: NodeId,
    pub voice: VoiceId,
    pub clip: ClipHandle,
    pub bus: OutputBus,
    pub params: SourceParams,
    /// Delay after which the emitter is destroyed, if scheduled.
    pub destroy_after: Option<Duration>,
}

/// A freshly spawned emitter, before a voice is attached.
struct Emitter {
    node: NodeId,
    output: Option<MixerGroupId>,
}

/// Spawns emitter nodes for sounds, starts their voices, and releases them
/// once finished.
///
/// The dispatcher is built explicitly by the application and passed to
/// whatever needs to play sounds; there is no global instance.
pub struct SoundDispatcher<B: AudioBackend> {
    backend: B,
    assets: AssetServer,
    routing: BusRouting,
    rng: StdRng,
    /// Live emitter nodes and the voice each one carries.
    emitters: HashMap<NodeId, VoiceId>,
    last_skip: Option<SkipReason>,
}

impl<B: AudioBackend> SoundDispatcher<B> {
    /// Create a dispatcher. The bus routing table is resolved here, so a
    /// configured mixer missing a bus group fails immediately.
    pub fn new(backend: B, assets: AssetServer, config: &DispatcherConfig) -> Result<Self, AudioError> {
        let routing = match &config.mixer {
            Some(layout) => BusRouting::resolve(&backend, &layout.root)?,
            None => {
                info!("No mixer configured, sounds play on the default output");
                BusRouting::unrouted()
            }
        };
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!("Sound dispatcher initialized");

        Ok(Self {
            backend,
            assets,
            routing,
            rng,
            emitters: HashMap::new(),
            last_skip: None,
        })
    }

    // ---- Levels ----

    /// Set a bus level from a 0–100 slider value. Writes the remapped
    /// decibel value to the mixer parameter named after the bus and returns it.
    pub fn set_level(&mut self, bus: MixerBus, value: f32) -> f32 {
        let decibels = level_to_decibels(value);
        if self.backend.set_float(bus.as_str(), decibels) {
            debug!("{} level {} -> {:.2} dB", bus, value, decibels);
        } else {
            warn!("Mixer has no exposed parameter named '{}'", bus);
        }
        decibels
    }

    // ---- Playback ----

    /// Play a raw clip with default source settings.
    ///
    /// Returns `None` without side effects if `clip` is absent or unknown.
    /// With `destroy_on_finish`, the emitter is destroyed after exactly the
    /// clip's duration.
    pub fn play_clip(
        &mut self,
        scene: &mut Scene,
        clip: Option<ClipHandle>,
        bus: OutputBus,
        world_position: Vec3,
        destroy_on_finish: bool,
    ) -> Option<PlaybackHandle> {
        let clip_handle = clip?;
        let clip = self.assets.clip(clip_handle)?;

        let params = SourceParams::default();
        let emitter = self.create_playback_handle(scene, bus, world_position);
        scene.set_name(emitter.node, format!("{} Audio Source", clip.name()));

        let request = VoiceRequest {
            params,
            position: world_position,
            output: emitter.output,
        };
        let voice = match self.backend.play(clip, &request) {
            Ok(voice) => voice,
            Err(e) => {
                scene.destroy(emitter.node);
                return self.skip(SkipReason::Backend(e.to_string()));
            }
        };
        self.emitters.insert(emitter.node, voice);

        let destroy_after = destroy_on_finish.then(|| clip.duration());
        if let Some(delay) = destroy_after {
            scene.destroy_after(emitter.node, delay);
        }

        Some(PlaybackHandle {
            node: emitter.node,
            voice,
            clip: clip_handle,
            bus,
            params,
            destroy_after,
        })
    }

    /// Play a sound definition at a world position, without a parent node.
    pub fn play_sound_at(
        &mut self,
        scene: &mut Scene,
        entry: Option<&SoundDefinition>,
        bus: OutputBus,
        world_position: Vec3,
    ) -> Option<PlaybackHandle> {
        self.play_sound(scene, entry, bus, None, world_position)
    }

    /// Play a sound definition.
    ///
    /// The emitter is spawned at `world_position` and, if given, attached
    /// under `parent` keeping that world position. Non-looping emitters are
    /// destroyed after exactly the selected clip's duration; looping ones
    /// live until [`stop`](Self::stop) or until their node is destroyed.
    ///
    /// A missing entry or clip is logged and yields `None`.
    pub fn play_sound(
        &mut self,
        scene: &mut Scene,
        entry: Option<&SoundDefinition>,
        bus: OutputBus,
        parent: Option<NodeId>,
        world_position: Vec3,
    ) -> Option<PlaybackHandle> {
        let Some(entry) = entry else {
            return self.skip(SkipReason::MissingEntry);
        };
        if entry.clip.is_none() && !entry.random_clip {
            return self.skip(SkipReason::MissingClip(entry.name.clone()));
        }

        let params = SourceParams::resolve(entry, bus, world_position, &mut self.rng);
        let Some(clip_handle) = params::select_clip(entry, &mut self.rng) else {
            return self.skip(SkipReason::MissingClip(entry.name.clone()));
        };
        let Some(clip) = self.assets.clip(clip_handle) else {
            return self.skip(SkipReason::MissingClip(entry.name.clone()));
        };

        let emitter = self.create_playback_handle(scene, bus, world_position);
        if let Some(parent) = parent {
            if !scene.set_parent(emitter.node, Some(parent)) {
                debug!("Parent {} is gone, '{}' plays unparented", parent, entry.name);
            }
        }
        scene.set_name(emitter.node, format!("{} Audio Source", entry.name));

        let request = VoiceRequest {
            params,
            position: world_position,
            output: emitter.output,
        };
        let voice = match self.backend.play(clip, &request) {
            Ok(voice) => voice,
            Err(e) => {
                scene.destroy(emitter.node);
                return self.skip(SkipReason::Backend(e.to_string()));
            }
        };
        self.emitters.insert(emitter.node, voice);

        let destroy_after = (!params.looping).then(|| clip.duration());
        if let Some(delay) = destroy_after {
            scene.destroy_after(emitter.node, delay);
        }

        debug!(
            "Playing '{}' on {} (pitch {:.2}, blend {})",
            entry.name, bus, params.pitch, params.spatial_blend
        );

        Some(PlaybackHandle {
            node: emitter.node,
            voice,
            clip: clip_handle,
            bus,
            params,
            destroy_after,
        })
    }

    /// Spawn an emitter node at `world_position` with identity rotation,
    /// routed to the bus's mixer group if one is mapped.
    fn create_playback_handle(&self, scene: &mut Scene, bus: OutputBus, world_position: Vec3) -> Emitter {
        let node = scene.spawn("Audio Source", Transform::from_position(world_position));
        Emitter {
            node,
            output: self.routing.route(bus),
        }
    }

    fn skip(&mut self, reason: SkipReason) -> Option<PlaybackHandle> {
        warn!("{}", reason);
        self.last_skip = Some(reason);
        None
    }

    /// Destroy an emitter node (and its subtree) and stop their voices.
    /// Returns `false` if the node was already gone.
    pub fn stop(&mut self, scene: &mut Scene, node: NodeId) -> bool {
        let destroyed = scene.destroy(node);
        for id in &destroyed {
            if let Some(voice) = self.emitters.remove(id) {
                self.backend.stop(voice);
            }
        }
        !destroyed.is_empty()
    }

    // ---- Per-frame ----

    /// Advance emitter disposal timers, stop voices whose emitter node no
    /// longer exists, and move the remaining voices with their nodes.
    /// Returns how many emitters were released.
    pub fn update(&mut self, scene: &mut Scene, delta: Duration) -> usize {
        scene.tick(delta);

        let backend = &mut self.backend;
        let before = self.emitters.len();
        self.emitters.retain(|&node, &mut voice| {
            let alive = scene.is_alive(node);
            if !alive {
                backend.stop(voice);
            }
            alive
        });
        let released = before - self.emitters.len();

        for (&node, &voice) in &self.emitters {
            if let Some(position) = scene.world_position(node) {
                self.backend.set_position(voice, position);
            }
        }
        self.backend.update();

        if released > 0 {
            debug!("Released {} emitter(s)", released);
        }
        released
    }

    /// Update the listener pose used for positional sounds.
    pub fn set_listener(&mut self, position: Vec3, forward: Vec3, up: Vec3) {
        self.backend.set_listener(Listener {
            position,
            forward,
            up,
        });
    }

    // ---- Accessors ----

    /// Whether an emitter node still carries a voice.
    pub fn is_playing(&self, node: NodeId) -> bool {
        self.emitters.contains_key(&node)
    }

    /// Number of live emitters.
    pub fn active_emitters(&self) -> usize {
        self.emitters.len()
    }

    /// The reason the most recent skipped request was dropped.
    pub fn last_skip(&self) -> Option<&SkipReason> {
        self.last_skip.as_ref()
    }

    pub fn routing(&self) -> &BusRouting {
        &self.routing
    }

    pub fn assets(&self) -> &AssetServer {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetServer {
        &mut self.assets
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use sonance_assets::AudioClip;

    const STEP_LEN: Duration = Duration::from_millis(400);

    struct Fixture {
        dispatcher: SoundDispatcher<HeadlessBackend>,
        scene: Scene,
        a: ClipHandle,
        b: ClipHandle,
        c: ClipHandle,
    }

    fn fixture() -> Fixture {
        let config = DispatcherConfig {
            seed: Some(1234),
            ..DispatcherConfig::with_default_mixer()
        };
        let mut assets = AssetServer::new("assets");
        let a = assets.insert_clip(AudioClip::new("a", STEP_LEN));
        let b = assets.insert_clip(AudioClip::new("b", Duration::from_millis(800)));
        let c = assets.insert_clip(AudioClip::new("c", Duration::from_secs(2)));
        let backend = HeadlessBackend::new(config.mixer.as_ref());
        Fixture {
            dispatcher: SoundDispatcher::new(backend, assets, &config).unwrap(),
            scene: Scene::new(),
            a,
            b,
            c,
        }
    }

    fn definition(name: &str, clip: ClipHandle) -> SoundDefinition {
        SoundDefinition {
            name: name.to_string(),
            clip: Some(clip),
            ..Default::default()
        }
    }

    #[test]
    fn set_level_maps_slider_to_decibels() {
        let mut f = fixture();
        for bus in MixerBus::ALL {
            assert_eq!(f.dispatcher.set_level(bus, 0.0), -20.0);
            assert_eq!(f.dispatcher.set_level(bus, 100.0), 20.0);
            assert_eq!(f.dispatcher.set_level(bus, 50.0), 0.0);
            assert_eq!(f.dispatcher.backend().parameter(bus.as_str()), Some(0.0));
        }
    }

    #[test]
    fn missing_entry_has_no_side_effects() {
        let mut f = fixture();
        let handle = f
            .dispatcher
            .play_sound(&mut f.scene, None, OutputBus::Game, None, Vec3::ZERO);
        assert!(handle.is_none());
        assert!(f.scene.is_empty());
        assert_eq!(f.dispatcher.backend().playing(), 0);
        assert_eq!(f.dispatcher.last_skip(), Some(&SkipReason::MissingEntry));
    }

    #[test]
    fn missing_clip_yields_nothing() {
        let mut f = fixture();
        let entry = SoundDefinition {
            name: "Silent".to_string(),
            volume: 0.7,
            looping: true,
            range: 12.0,
            ..Default::default()
        };
        let handle = f
            .dispatcher
            .play_sound_at(&mut f.scene, Some(&entry), OutputBus::Music, Vec3::ONE);
        assert!(handle.is_none());
        assert!(f.scene.is_empty());
        assert_eq!(
            f.dispatcher.last_skip(),
            Some(&SkipReason::MissingClip("Silent".to_string()))
        );
    }

    #[test]
    fn empty_random_pool_yields_nothing() {
        let mut f = fixture();
        let entry = SoundDefinition {
            name: "Empty".to_string(),
            random_clip: true,
            ..Default::default()
        };
        assert!(f
            .dispatcher
            .play_sound_at(&mut f.scene, Some(&entry), OutputBus::Game, Vec3::ZERO)
            .is_none());
        assert!(f.scene.is_empty());
    }

    #[test]
    fn plays_and_names_emitter() {
        let mut f = fixture();
        let entry = SoundDefinition {
            volume: 0.5,
            range: 30.0,
            ..definition("Door", f.a)
        };
        let handle = f
            .dispatcher
            .play_sound_at(&mut f.scene, Some(&entry), OutputBus::Game, Vec3::new(4.0, 0.0, 0.0))
            .unwrap();

        assert_eq!(f.scene.name(handle.node), Some("Door Audio Source"));
        assert_eq!(handle.clip, f.a);
        assert_eq!(handle.params.volume, 0.5);
        assert_eq!(handle.params.rolloff.max_distance, 30.0);
        assert!(handle.params.rolloff.min_distance <= 0.0);
        assert_eq!(handle.params.spatial_blend, 1.0);

        let voice = f.dispatcher.backend().voice(handle.voice).unwrap();
        assert_eq!(voice.clip, "a");
        assert_eq!(voice.request.output, f.dispatcher.routing().route(OutputBus::Game));
        assert!(voice.request.output.is_some());
    }

    #[test]
    fn random_clips_stay_in_pool() {
        let mut f = fixture();
        let entry = SoundDefinition {
            name: "Step".to_string(),
            random_clip: true,
            random_clips: vec![f.a, f.b, f.c],
            looping: true,
            ..Default::default()
        };
        for _ in 0..100 {
            let handle = f
                .dispatcher
                .play_sound_at(&mut f.scene, Some(&entry), OutputBus::Game, Vec3::ZERO)
                .unwrap();
            assert!([f.a, f.b, f.c].contains(&handle.clip));
        }
    }

    #[test]
    fn random_pool_disposal_follows_selected_clip() {
        let mut f = fixture();
        let entry = SoundDefinition {
            name: "Footstep".to_string(),
            random_clip: true,
            random_clips: vec![f.a, f.b, f.c],
            ..Default::default()
        };
        let mut seen = std::collections::HashSet::new();
        for _ in 0..60 {
            let handle = f
                .dispatcher
                .play_sound_at(&mut f.scene, Some(&entry), OutputBus::Game, Vec3::ZERO)
                .unwrap();
            let duration = f.dispatcher.assets().clip(handle.clip).unwrap().duration();
            assert_eq!(handle.destroy_after, Some(duration));
            assert_eq!(f.scene.pending_destroy(handle.node), Some(duration));
            seen.insert(handle.clip);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn unsampleable_pitch_bounds_do_not_panic() {
        let mut f = fixture();
        let entry = SoundDefinition {
            pitch: 1.25,
            random_pitch: true,
            min_pitch: -3.0e38,
            max_pitch: 3.0e38,
            ..definition("Wide", f.a)
        };
        let handle = f
            .dispatcher
            .play_sound_at(&mut f.scene, Some(&entry), OutputBus::Game, Vec3::ZERO)
            .unwrap();
        assert_eq!(handle.params.pitch, 1.25);
    }

    #[test]
    fn random_pitch_resolves_without_mutating_entry() {
        let mut f = fixture();
        let entry = SoundDefinition {
            random_pitch: true,
            min_pitch: 0.5,
            max_pitch: 1.5,
            ..definition("Chirp", f.a)
        };
        for _ in 0..100 {
            let handle = f
                .dispatcher
                .play_sound_at(&mut f.scene, Some(&entry), OutputBus::UI, Vec3::ZERO)
                .unwrap();
            assert!((0.5..=1.5).contains(&handle.params.pitch));
        }
        assert_eq!(entry.pitch, 1.0);
    }

    #[test]
    fn non_looping_emitter_released_after_clip_duration() {
        let mut f = fixture();
        let entry = definition("Hit", f.a);
        let handle = f
            .dispatcher
            .play_sound_at(&mut f.scene, Some(&entry), OutputBus::Game, Vec3::ZERO)
            .unwrap();
        assert_eq!(handle.destroy_after, Some(STEP_LEN));
        assert_eq!(f.scene.pending_destroy(handle.node), Some(STEP_LEN));

        assert_eq!(f.dispatcher.update(&mut f.scene, Duration::from_millis(399)), 0);
        assert!(f.dispatcher.is_playing(handle.node));
        assert_eq!(f.dispatcher.update(&mut f.scene, Duration::from_millis(1)), 1);
        assert!(!f.scene.is_alive(handle.node));
        assert!(f.dispatcher.backend().voice(handle.voice).unwrap().stopped);
    }

    #[test]
    fn looping_emitter_is_never_scheduled() {
        let mut f = fixture();
        let entry = SoundDefinition {
            looping: true,
            ..definition("Ambience", f.c)
        };
        let handle = f
            .dispatcher
            .play_sound_at(&mut f.scene, Some(&entry), OutputBus::Music, Vec3::ZERO)
            .unwrap();
        assert_eq!(handle.destroy_after, None);
        assert_eq!(f.scene.pending_destroy(handle.node), None);

        f.dispatcher.update(&mut f.scene, Duration::from_secs(60));
        assert!(f.dispatcher.is_playing(handle.node));

        assert!(f.dispatcher.stop(&mut f.scene, handle.node));
        assert!(!f.dispatcher.is_playing(handle.node));
        assert!(f.dispatcher.backend().voice(handle.voice).unwrap().stopped);
        assert!(!f.dispatcher.stop(&mut f.scene, handle.node));
    }

    #[test]
    fn ui_bus_is_always_flat() {
        let mut f = fixture();
        let entry = definition("Click", f.a);
        for position in [Vec3::ZERO, Vec3::new(10.0, 2.0, -3.0)] {
            let handle = f
                .dispatcher
                .play_sound_at(&mut f.scene, Some(&entry), OutputBus::UI, position)
                .unwrap();
            assert_eq!(handle.params.spatial_blend, 0.0);
        }
    }

    #[test]
    fn origin_is_flat_elsewhere_positional() {
        let mut f = fixture();
        let entry = definition("Shot", f.a);
        for bus in [OutputBus::Music, OutputBus::Game] {
            let flat = f
                .dispatcher
                .play_sound_at(&mut f.scene, Some(&entry), bus, Vec3::ZERO)
                .unwrap();
            assert_eq!(flat.params.spatial_blend, 0.0);
            let positional = f
                .dispatcher
                .play_sound_at(&mut f.scene, Some(&entry), bus, Vec3::new(0.0, 1.0, 0.0))
                .unwrap();
            assert_eq!(positional.params.spatial_blend, 1.0);
        }
    }

    #[test]
    fn parented_emitter_follows_parent() {
        let mut f = fixture();
        let parent = f
            .scene
            .spawn("Torch", Transform::from_position(Vec3::new(5.0, 0.0, 0.0)));
        let entry = SoundDefinition {
            looping: true,
            ..definition("Crackle", f.b)
        };
        let handle = f
            .dispatcher
            .play_sound(&mut f.scene, Some(&entry), OutputBus::Game, Some(parent), Vec3::new(5.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(f.scene.parent(handle.node), Some(parent));

        f.scene
            .set_local_transform(parent, Transform::from_position(Vec3::new(8.0, 0.0, 0.0)));
        f.dispatcher.update(&mut f.scene, Duration::from_millis(16));
        let voice = f.dispatcher.backend().voice(handle.voice).unwrap();
        assert!((voice.position - Vec3::new(8.0, 0.0, 0.0)).length() < 1e-4);

        // Destroying the parent releases the child emitter on the next update.
        f.scene.destroy(parent);
        assert_eq!(f.dispatcher.update(&mut f.scene, Duration::ZERO), 1);
        assert!(f.dispatcher.backend().voice(handle.voice).unwrap().stopped);
    }

    #[test]
    fn play_clip_requires_a_clip() {
        let mut f = fixture();
        assert!(f
            .dispatcher
            .play_clip(&mut f.scene, None, OutputBus::Game, Vec3::ZERO, true)
            .is_none());
        assert!(f.scene.is_empty());
    }

    #[test]
    fn play_clip_schedules_destruction_on_request() {
        let mut f = fixture();
        let kept = f
            .dispatcher
            .play_clip(&mut f.scene, Some(f.b), OutputBus::Music, Vec3::ZERO, false)
            .unwrap();
        assert_eq!(kept.destroy_after, None);

        let disposable = f
            .dispatcher
            .play_clip(&mut f.scene, Some(f.b), OutputBus::UI, Vec3::ZERO, true)
            .unwrap();
        assert_eq!(disposable.destroy_after, Some(Duration::from_millis(800)));
        assert_eq!(disposable.params, SourceParams::default());

        assert_eq!(f.dispatcher.update(&mut f.scene, Duration::from_millis(800)), 1);
        assert!(f.scene.is_alive(kept.node));
        assert!(!f.scene.is_alive(disposable.node));
    }

    #[test]
    fn backend_failure_is_soft() {
        let mut f = fixture();
        f.dispatcher.backend_mut().refuse_playback(true);
        let entry = definition("Boom", f.a);
        assert!(f
            .dispatcher
            .play_sound_at(&mut f.scene, Some(&entry), OutputBus::Game, Vec3::ZERO)
            .is_none());
        assert!(f.scene.is_empty());
        assert!(matches!(f.dispatcher.last_skip(), Some(SkipReason::Backend(_))));
    }

    #[test]
    fn unrouted_without_mixer() {
        let mut assets = AssetServer::new("assets");
        let clip = assets.insert_clip(AudioClip::new("a", STEP_LEN));
        let config = DispatcherConfig::default();
        let mut dispatcher =
            SoundDispatcher::new(HeadlessBackend::new(None), assets, &config).unwrap();
        let mut scene = Scene::new();

        let handle = dispatcher
            .play_sound_at(&mut scene, Some(&definition("Hum", clip)), OutputBus::Music, Vec3::ZERO)
            .unwrap();
        assert_eq!(dispatcher.backend().voice(handle.voice).unwrap().request.output, None);

        // No exposed parameters without a mixer; the level is still computed.
        assert_eq!(dispatcher.set_level(MixerBus::Music, 100.0), 20.0);
        assert_eq!(dispatcher.backend().parameter("Music"), None);
    }

    #[test]
    fn listener_pose_reaches_backend() {
        let mut f = fixture();
        f.dispatcher
            .set_listener(Vec3::new(1.0, 2.0, 3.0), Vec3::NEG_Z, Vec3::Y);
        let listener = f.dispatcher.backend().listener();
        assert_eq!(listener.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(listener.forward, Vec3::NEG_Z);
        assert_eq!(listener.up, Vec3::Y);
    }

    #[test]
    fn incomplete_mixer_fails_construction() {
        let layout = crate::mixer::MixerLayout {
            root: "Master".to_string(),
            groups: vec!["Music".to_string(), "Game".to_string()],
        };
        let config = DispatcherConfig {
            mixer: Some(layout),
            seed: None,
        };
        let backend = HeadlessBackend::new(config.mixer.as_ref());
        let result = SoundDispatcher::new(backend, AssetServer::new("assets"), &config);
        assert!(matches!(
            result,
            Err(AudioError::MissingMixerGroup { bus: OutputBus::UI, .. })
        ));
    }
}
