//! TOML settings consumed by the headless runner.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use gridforge_core::{BuildingKind, Direction, GridPosition, OreKind, PlayMode};
use serde::Deserialize;

/// Every tunable section of a simulation run.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) world: gridforge_world::Config,
    pub(crate) chunks: gridforge_system_chunks::Config,
    pub(crate) merging: gridforge_system_merging::Config,
    pub(crate) waves: gridforge_system_waves::Config,
    pub(crate) production: gridforge_system_production::Config,
    pub(crate) defense: gridforge_system_defense::Config,
    pub(crate) layout: Layout,
}

impl Settings {
    /// Reads and parses a settings file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Replaces the seeds of every randomised system.
    pub(crate) fn reseed(&mut self, seed: u64) {
        self.chunks.seed = seed;
        self.merging.seed = seed;
    }
}

/// Player-authored state applied before the first tick.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Layout {
    pub(crate) play_mode: PlayMode,
    pub(crate) ore: Vec<OreMark>,
    pub(crate) buildings: Vec<Placement>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct OreMark {
    pub(crate) position: GridPosition,
    pub(crate) ore: OreKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct Placement {
    pub(crate) kind: BuildingKind,
    pub(crate) origin: GridPosition,
    #[serde(default)]
    pub(crate) facing: Direction,
}
