use serde::{Deserialize, Serialize};
use sonance_assets::AssetServer;

use crate::error::AudioError;
use crate::mixer::MixerLayout;

/// Well-known asset name of the dispatcher configuration.
pub const DISPATCHER_ASSET_NAME: &str = "Audio Manager";

/// Dispatcher configuration, authored as `Audio Manager.toml`.
///
/// ```toml
/// seed = 42
///
/// [mixer]
/// root = "Master"
/// groups = ["Music", "UI", "Game"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Mixer to route buses through. Without one, every sound plays on the
    /// default output and bus levels have nowhere to go.
    pub mixer: Option<MixerLayout>,
    /// Fixed RNG seed for clip and pitch selection.
    pub seed: Option<u64>,
}

impl DispatcherConfig {
    /// Config with the standard Master/Music/UI/Game mixer.
    pub fn with_default_mixer() -> Self {
        Self {
            mixer: Some(MixerLayout::default()),
            seed: None,
        }
    }

    /// Load the "Audio Manager" asset from the asset server.
    pub fn load(assets: &AssetServer) -> Result<Self, AudioError> {
        Ok(assets.load_named(DISPATCHER_ASSET_NAME)?)
    }
}
