use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AudioError;
use crate::mixer::{Mixer, MixerGroupId};

/// A named mixer bus whose level can be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MixerBus {
    Master,
    Music,
    UI,
    Game,
}

impl MixerBus {
    pub const ALL: [MixerBus; 4] = [MixerBus::Master, MixerBus::Music, MixerBus::UI, MixerBus::Game];

    /// Text form, which is also the mixer's exposed parameter and group name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MixerBus::Master => "Master",
            MixerBus::Music => "Music",
            MixerBus::UI => "UI",
            MixerBus::Game => "Game",
        }
    }
}

impl fmt::Display for MixerBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bus that sounds can be played into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputBus {
    Music,
    UI,
    Game,
}

impl OutputBus {
    pub const ALL: [OutputBus; 3] = [OutputBus::Music, OutputBus::UI, OutputBus::Game];

    pub fn as_str(&self) -> &'static str {
        MixerBus::from(*self).as_str()
    }

    fn index(&self) -> usize {
        match self {
            OutputBus::Music => 0,
            OutputBus::UI => 1,
            OutputBus::Game => 2,
        }
    }
}

impl From<OutputBus> for MixerBus {
    fn from(bus: OutputBus) -> Self {
        match bus {
            OutputBus::Music => MixerBus::Music,
            OutputBus::UI => MixerBus::UI,
            OutputBus::Game => MixerBus::Game,
        }
    }
}

impl fmt::Display for OutputBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output bus to mixer group table, resolved once when the dispatcher is
/// built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusRouting {
    groups: [Option<MixerGroupId>; 3],
}

impl BusRouting {
    /// A table with no routes. Every emitter plays through the default output.
    pub fn unrouted() -> Self {
        Self::default()
    }

    /// Scan the groups under `root` and take the first group named after
    /// each output bus. Fails if any bus has no group.
    pub fn resolve<M: Mixer + ?Sized>(mixer: &M, root: &str) -> Result<Self, AudioError> {
        let groups = mixer.find_groups_under(root);
        let mut routing = Self::default();

        for bus in OutputBus::ALL {
            let group = groups
                .iter()
                .find(|g| g.name == bus.as_str())
                .ok_or_else(|| AudioError::MissingMixerGroup {
                    bus,
                    root: root.to_string(),
                })?;
            debug!("Routing {} bus to mixer group {:?}", bus, group.id);
            routing.groups[bus.index()] = Some(group.id);
        }
        Ok(routing)
    }

    /// Mixer group for a bus, or `None` for the default output.
    pub fn route(&self, bus: OutputBus) -> Option<MixerGroupId> {
        self.groups[bus.index()]
    }
}
