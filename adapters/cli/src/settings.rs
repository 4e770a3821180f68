use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use theme_park_core::{GenerationConfig, Grid, SimulationConfig};

/// Parameters loaded from an optional TOML file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    /// Park generator parameters.
    pub(crate) generation: GenerationConfig,
    /// Visitor simulation parameters.
    pub(crate) simulation: SimulationConfig,
}

impl Settings {
    /// Reads settings from `path`, falling back to defaults when absent.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid settings in {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(contents).context("failed to parse settings toml contents")?;
        settings
            .generation
            .validate()
            .context("invalid [generation] table")?;
        settings
            .simulation
            .validate()
            .context("invalid [simulation] table")?;
        Ok(settings)
    }
}

/// Reads an ASCII park map.
pub(crate) fn load_map(path: &Path) -> Result<Grid> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read park map from {}", path.display()))?;
    Grid::parse_ascii(&contents)
        .with_context(|| format!("failed to parse park map {}", path.display()))
}
