use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Settings from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegstateConfig {
    /// Registry snapshot file; `~` and `$VARS` are expanded
    #[serde(default)]
    pub state: Option<String>,

    /// Default parallelism for plan and apply
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_jobs() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for RegstateConfig {
    fn default() -> Self {
        Self {
            state: None,
            jobs: default_jobs(),
            color: true,
        }
    }
}

impl RegstateConfig {
    /// Load the config from the config directory; defaults if there is none.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Snapshot file to use: the override, the configured one, or the default.
    pub fn state_file(&self, state_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = state_override {
            return Ok(path.to_path_buf());
        }
        match &self.state {
            Some(state) => Ok(paths::expand(state)),
            None => paths::default_state_file(),
        }
    }

    /// Job count to use, preferring the command line.
    pub fn jobs(&self, jobs_override: Option<usize>) -> usize {
        jobs_override.unwrap_or(self.jobs).max(1)
    }
}
