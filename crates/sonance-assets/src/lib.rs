//! Sonance Assets - Audio clips and sound definitions
//!
//! Provides clip decoding through kira, TOML-authored sound definitions
//! (the catalog entries the dispatcher plays), and named configuration
//! assets such as the dispatcher's "Audio Manager" config.

mod clip;
mod definition;
mod error;
mod handle;
mod server;

pub use clip::{AudioClip, ClipHandle};
pub use definition::SoundDefinition;
pub use error::AssetError;
pub use handle::{AssetHandle, AssetId};
pub use server::AssetServer;
