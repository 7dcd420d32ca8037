//! Runtime configuration
//!
//! ```yaml
//! tick_interval_ms: 100
//! resume_policy: preserve_elapsed
//! stop_when_settled: true
//! ```

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::timing::ResumePolicy;

const TICK_RANGE_MS: std::ops::RangeInclusive<u64> = 10..=5000;

/// Tunables for the race desk and its event sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiringlineConfig {
    /// Period of the synchronizer tick
    pub tick_interval_ms: u64,
    /// What restarting a stopped master clock does
    pub resume_policy: ResumePolicy,
    /// End the tick once every race of the event is done
    pub stop_when_settled: bool,
}

impl Default for FiringlineConfig {
    fn default() -> Self {
        Self { tick_interval_ms: 100, resume_policy: ResumePolicy::default(), stop_when_settled: true }
    }
}

impl FiringlineConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            TICK_RANGE_MS.contains(&self.tick_interval_ms),
            "tick_interval_ms must be within {}..={} ms, got {}",
            TICK_RANGE_MS.start(),
            TICK_RANGE_MS.end(),
            self.tick_interval_ms
        );
        Ok(())
    }

    /// Parse and validate a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml).context("Failed to parse firingline config")?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_yaml_str(&yaml)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!(path = %path.display(), ?config, "Config loaded");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(self).context("Failed to serialize firingline config")
    }
}
