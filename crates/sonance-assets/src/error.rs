use std::path::PathBuf;

/// Errors that can occur while loading assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(PathBuf),

    #[error("I/O error loading '{0}': {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse '{0}': {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("failed to decode audio clip '{0}': {1}")]
    ClipLoadFailed(PathBuf, String),

    #[error("invalid sound definition '{path}': {reason}")]
    InvalidDefinition { path: PathBuf, reason: String },
}
