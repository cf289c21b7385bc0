//! Sonance - plays sound definitions from an asset directory
//!
//! Usage: `sonance [ASSET_DIR] [SOUND_NAME...]`
//!
//! Loads `ASSET_DIR/Audio Manager.toml` and every definition under
//! `ASSET_DIR/sounds`, applies the saved bus levels, plays the named sounds
//! (or all of them) and runs frames until every one-shot has finished.
//! Set `SONANCE_HEADLESS=1` to run without an audio device.

mod settings;

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use sonance_assets::AssetServer;
use sonance_audio::{
    AudioBackend, DispatcherConfig, HeadlessBackend, KiraBackend, OutputBus, SoundDispatcher,
    SoundTrigger,
};
use sonance_core::{FrameClock, Transform};
use sonance_scene::Scene;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::settings::Settings;

/// Catalog directory, relative to the asset directory.
const SOUNDS_DIR: &str = "sounds";

const FRAME_TIME: Duration = Duration::from_millis(16);

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    let mut args = std::env::args().skip(1);
    let asset_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("assets"));
    let requested: Vec<String> = args.collect();

    let settings = match Settings::settings_path() {
        Some(path) => {
            let settings = Settings::load_from(&path);
            if !path.exists() {
                if let Err(e) = settings.save_to(&path) {
                    warn!("Could not write default settings: {}", e);
                }
            }
            settings
        }
        None => {
            warn!("Could not determine config directory");
            Settings::default()
        }
    };

    let assets = AssetServer::new(&asset_dir);
    let config = DispatcherConfig::load(&assets).context("Failed to load the Audio Manager config")?;

    let headless = std::env::var("SONANCE_HEADLESS").is_ok_and(|v| v == "1");
    if headless {
        info!("Running headless");
        let backend = HeadlessBackend::new(config.mixer.as_ref());
        run(SoundDispatcher::new(backend, assets, &config)?, &settings, &requested)
    } else {
        let backend = KiraBackend::new(config.mixer.as_ref())?;
        run(SoundDispatcher::new(backend, assets, &config)?, &settings, &requested)
    }
}

fn run<B: AudioBackend>(
    mut dispatcher: SoundDispatcher<B>,
    settings: &Settings,
    requested: &[String],
) -> Result<()> {
    settings.audio.apply(&mut dispatcher);

    let catalog = dispatcher
        .assets_mut()
        .load_catalog(Path::new(SOUNDS_DIR))
        .context("Failed to load the sound catalog")?;
    for name in requested {
        if !catalog.contains_key(name) {
            warn!("No sound definition named '{}'", name);
        }
    }

    let mut scene = Scene::new();
    let root = scene.spawn("Sonance", Transform::default());
    let listener = scene.spawn("Listener", Transform::default());
    if let Some(pose) = scene.world_transform(listener) {
        dispatcher.set_listener(pose.position, pose.forward(), pose.up());
    }

    let handles: Vec<_> = catalog
        .iter()
        .filter(|(name, _)| requested.is_empty() || requested.contains(*name))
        .filter_map(|(_, definition)| {
            SoundTrigger::new(root, Some(definition.clone()), OutputBus::Game)
                .with_play_on_start(true)
                .start(&mut dispatcher, &mut scene)
        })
        .collect();
    info!("Started {} sound(s)", handles.len());

    let mut clock = FrameClock::new(settings.clock.clone());
    let mut last = Instant::now();
    while handles
        .iter()
        .any(|h| h.destroy_after.is_some() && dispatcher.is_playing(h.node))
    {
        thread::sleep(FRAME_TIME);
        let now = Instant::now();
        let delta = clock.tick(now.duration_since(last).as_secs_f32());
        last = now;
        dispatcher.update(&mut scene, delta);
    }

    // Looping sounds never finish on their own.
    for handle in handles.iter().filter(|h| h.destroy_after.is_none()) {
        dispatcher.stop(&mut scene, handle.node);
    }
    info!("Finished after {} frame(s)", clock.frame_count);
    Ok(())
}
