//! User settings with persistence
//!
//! Settings are saved to `~/.config/sonance/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sonance_audio::{AudioBackend, MixerBus, SoundDispatcher};
use sonance_core::ClockConfig;
use tracing::{info, warn};

/// All user settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub clock: ClockConfig,
}

impl Settings {
    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("sonance").join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(mut settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings.clock = settings.clock.sanitized();
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save settings to disk, creating the parent directory if needed
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// Bus levels on the 0–100 slider scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub master: f32,
    pub music: f32,
    pub ui: f32,
    pub game: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master: 50.0,
            music: 40.0,
            ui: 50.0,
            game: 50.0,
        }
    }
}

impl AudioSettings {
    /// Slider value for a bus
    pub fn level(&self, bus: MixerBus) -> f32 {
        match bus {
            MixerBus::Master => self.master,
            MixerBus::Music => self.music,
            MixerBus::UI => self.ui,
            MixerBus::Game => self.game,
        }
    }

    /// Push every bus level to the dispatcher's mixer
    pub fn apply<B: AudioBackend>(&self, dispatcher: &mut SoundDispatcher<B>) {
        for bus in MixerBus::ALL {
            dispatcher.set_level(bus, self.level(bus));
        }
    }
}
