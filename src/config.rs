use std::{io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::stats::{pie::ArcOptions, range::WeekStart, taxonomy::UnscopedPolicy};

pub const CONFIG_FILE: &str = "config.toml";

/// Settings read from `config.toml` in the application directory. Every field is optional in the
/// file, missing ones use the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StatsConfig {
    pub week_start: WeekStart,
    /// What the scope breakdown does with logs that have no scope.
    pub unscoped: UnscopedPolicy,
    pub ring: ArcOptions,
    /// Pixels per hour in schedule output.
    pub hour_height: f64,
    /// Amount of reports kept in memory. 0 disables the cache.
    pub cache_capacity: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            unscoped: UnscopedPolicy::default(),
            ring: ArcOptions::default(),
            hour_height: 50.,
            cache_capacity: 32,
        }
    }
}

impl StatsConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse config")
    }

    /// Reads the config of `app_dir`. A missing file isn't an error.
    pub async fn load(app_dir: &Path) -> Result<Self> {
        let path = app_dir.join(CONFIG_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                info!("Using config {path:?}");
                Self::parse(&text).with_context(|| format!("Invalid config {path:?}"))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {path:?}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {path:?}")),
        }
    }
}
