use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::clip::{AudioClip, ClipHandle};
use crate::definition::{DefinitionFile, SoundDefinition};
use crate::error::AssetError;
use crate::handle::AssetId;

/// Central asset registry. Loads, caches, and hands out clips and sound
/// definitions rooted at a base directory.
pub struct AssetServer {
    base_path: PathBuf,
    next_id: AssetId,
    clips: HashMap<AssetId, AudioClip>,
    path_to_clip: HashMap<PathBuf, ClipHandle>,
    definitions: HashMap<PathBuf, Arc<SoundDefinition>>,
}

impl AssetServer {
    /// Create a new AssetServer rooted at the given base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        let base_path = base_path.into();
        info!("AssetServer created with base path: {}", base_path.display());
        Self {
            base_path,
            next_id: 1,
            clips: HashMap::new(),
            path_to_clip: HashMap::new(),
            definitions: HashMap::new(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a relative asset path against the base path.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }

    // ---- Clips ----

    /// Register an in-memory clip and return its handle.
    pub fn insert_clip(&mut self, clip: AudioClip) -> ClipHandle {
        let handle = ClipHandle::new(self.next_id);
        self.next_id += 1;
        self.clips.insert(handle.id(), clip);
        handle
    }

    /// Register an in-memory clip under an asset path, so that definitions
    /// referencing that path resolve to it without decoding a file.
    pub fn insert_clip_at(&mut self, path: impl AsRef<Path>, clip: AudioClip) -> ClipHandle {
        let full_path = self.resolve(path.as_ref());
        let handle = self.insert_clip(clip);
        self.path_to_clip.insert(full_path, handle);
        handle
    }

    /// Decode an audio file. Subsequent loads of the same path return the
    /// cached handle.
    pub fn load_clip(&mut self, path: &Path) -> Result<ClipHandle, AssetError> {
        let full_path = self.resolve(path);

        if let Some(&handle) = self.path_to_clip.get(&full_path) {
            return Ok(handle);
        }

        let clip = AudioClip::load(&full_path)?;
        debug!(
            "Loaded clip '{}' ({:.3}s) from {}",
            clip.name(),
            clip.duration().as_secs_f64(),
            full_path.display()
        );
        let handle = self.insert_clip(clip);
        self.path_to_clip.insert(full_path, handle);
        Ok(handle)
    }

    /// Look up a clip by handle.
    pub fn clip(&self, handle: ClipHandle) -> Option<&AudioClip> {
        self.clips.get(&handle.id())
    }

    /// Number of registered clips.
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    // ---- Sound definitions ----

    /// Load a sound definition from a TOML file, loading every clip it
    /// references. Subsequent loads of the same path return the cached entry.
    pub fn load_definition(&mut self, path: &Path) -> Result<Arc<SoundDefinition>, AssetError> {
        let full_path = self.resolve(path);

        if let Some(definition) = self.definitions.get(&full_path) {
            return Ok(Arc::clone(definition));
        }

        let text = read_to_string(&full_path)?;
        let definition = Arc::new(self.parse_definition(&text, &full_path)?);
        self.definitions
            .insert(full_path, Arc::clone(&definition));
        Ok(definition)
    }

    /// Build a definition from TOML text. `origin` names the source in
    /// errors and supplies the default name (its file stem).
    pub fn parse_definition(
        &mut self,
        text: &str,
        origin: &Path,
    ) -> Result<SoundDefinition, AssetError> {
        let file: DefinitionFile =
            toml::from_str(text).map_err(|e| AssetError::Parse(origin.to_path_buf(), e))?;
        file.validate(origin)?;

        let clip = file
            .clip
            .as_deref()
            .map(|p| self.load_clip(p))
            .transpose()?;
        let random_clips = file
            .random_clips
            .iter()
            .map(|p| self.load_clip(p))
            .collect::<Result<Vec<_>, _>>()?;

        let name = file.name.unwrap_or_else(|| {
            origin
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

        Ok(SoundDefinition {
            name,
            random_clip: file.random_clip,
            clip,
            random_clips,
            volume: file.volume,
            pitch: file.pitch,
            looping: file.looping,
            random_pitch: file.random_pitch,
            min_pitch: file.min_pitch,
            max_pitch: file.max_pitch,
            range: file.range,
        })
    }

    /// Load every `*.toml` definition in a directory, keyed by definition
    /// name. Files are read in path order; a later duplicate name replaces
    /// the earlier entry. A file that fails to load is logged and left out.
    /// Only an unreadable directory is an error.
    pub fn load_catalog(
        &mut self,
        dir: &Path,
    ) -> Result<BTreeMap<String, Arc<SoundDefinition>>, AssetError> {
        let full_dir = self.resolve(dir);
        if !full_dir.is_dir() {
            return Err(AssetError::NotFound(full_dir));
        }

        let entries =
            fs::read_dir(&full_dir).map_err(|e| AssetError::Io(full_dir.clone(), e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| AssetError::Io(full_dir.clone(), e))?.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut catalog = BTreeMap::new();
        for path in paths {
            let definition = match self.load_definition(&path) {
                Ok(definition) => definition,
                Err(e) => {
                    warn!("Skipping sound definition {}: {}", path.display(), e);
                    continue;
                }
            };
            if catalog
                .insert(definition.name.clone(), definition)
                .is_some()
            {
                warn!(
                    "Duplicate sound definition name in {}, keeping the later one",
                    path.display()
                );
            }
        }
        info!(
            "Loaded {} sound definition(s) from {}",
            catalog.len(),
            full_dir.display()
        );
        Ok(catalog)
    }

    // ---- Named config assets ----

    /// Load a named TOML asset from `<base>/<name>.toml`.
    pub fn load_named<T: DeserializeOwned>(&self, name: &str) -> Result<T, AssetError> {
        let path = self.base_path.join(format!("{name}.toml"));
        let text = read_to_string(&path)?;
        toml::from_str(&text).map_err(|e| AssetError::Parse(path, e))
    }
}

fn read_to_string(path: &Path) -> Result<String, AssetError> {
    if !path.exists() {
        return Err(AssetError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| AssetError::Io(path.to_path_buf(), e))
}
