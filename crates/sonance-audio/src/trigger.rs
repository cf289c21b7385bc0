use std::sync::Arc;

use sonance_assets::SoundDefinition;
use sonance_scene::{NodeId, Scene};
use tracing::debug;

use crate::backend::AudioBackend;
use crate::bus::OutputBus;
use crate::dispatcher::{PlaybackHandle, SoundDispatcher};

/// Plays a sound definition from a scene node, optionally when the scene
/// starts.
#[derive(Debug, Clone)]
pub struct SoundTrigger {
    node: NodeId,
    pub definition: Option<Arc<SoundDefinition>>,
    pub bus: OutputBus,
    pub play_on_start: bool,
}

impl SoundTrigger {
    pub fn new(node: NodeId, definition: Option<Arc<SoundDefinition>>, bus: OutputBus) -> Self {
        Self {
            node,
            definition,
            bus,
            play_on_start: false,
        }
    }

    pub fn with_play_on_start(mut self, play_on_start: bool) -> Self {
        self.play_on_start = play_on_start;
        self
    }

    /// Node the trigger is attached to.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Scene-start hook: plays if `play_on_start` is set.
    pub fn start<B: AudioBackend>(
        &self,
        dispatcher: &mut SoundDispatcher<B>,
        scene: &mut Scene,
    ) -> Option<PlaybackHandle> {
        if !self.play_on_start {
            return None;
        }
        self.play(dispatcher, scene)
    }

    /// Play the definition parented to the trigger's node, at the node's
    /// world position.
    pub fn play<B: AudioBackend>(
        &self,
        dispatcher: &mut SoundDispatcher<B>,
        scene: &mut Scene,
    ) -> Option<PlaybackHandle> {
        let Some(position) = scene.world_position(self.node) else {
            debug!("Sound trigger on dead node {} ignored", self.node);
            return None;
        };
        dispatcher.play_sound(
            scene,
            self.definition.as_deref(),
            self.bus,
            Some(self.node),
            position,
        )
    }
}
