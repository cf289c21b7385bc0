//! Sonance Audio - Data-driven sound playback over named mixer buses
//!
//! A [`SoundDispatcher`] turns [`SoundDefinition`](sonance_assets::SoundDefinition)
//! catalog entries (or raw clips) into short-lived emitter nodes in a
//! [`Scene`](sonance_scene::Scene), routes them to a mixer bus, starts a voice
//! on the backend, and releases the emitter once its clip has finished.

mod backend;
mod bus;
mod config;
mod dispatcher;
mod error;
mod mixer;
mod params;
mod spatial;
mod trigger;

pub use backend::{
    AudioBackend, HeadlessBackend, HeadlessVoice, KiraBackend, VoiceId, VoiceOutput, VoiceRequest,
};
pub use bus::{BusRouting, MixerBus, OutputBus};
pub use config::{DispatcherConfig, DISPATCHER_ASSET_NAME};
pub use dispatcher::{PlaybackHandle, SoundDispatcher};
pub use error::{AudioError, SkipReason};
pub use mixer::{Mixer, MixerGraph, MixerGroup, MixerGroupId, MixerLayout};
pub use params::{level_to_decibels, Rolloff, SourceParams};
pub use spatial::{compute_spatial, Listener, SpatialParams};
pub use trigger::SoundTrigger;
