//! Game and loop configuration
//!
//! Read from a JSON file; every field is optional and falls back to its
//! default. Command-line flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::consts::*;
use crate::error::SimResult;
use crate::sim::{Bounds, WorldOptions};

/// Visible play area, in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Fixed-timestep loop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub update_period_ms: u64,
    pub draw_period_ms: u64,
    /// Reserved; catch-up is currently unbounded
    pub max_updates_per_frame: u32,
    /// Sleep between ticks instead of spinning
    pub allow_idle_sleep: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            update_period_ms: DEFAULT_UPDATE_PERIOD_MS,
            draw_period_ms: DEFAULT_DRAW_PERIOD_MS,
            max_updates_per_frame: DEFAULT_MAX_UPDATES_PER_FRAME,
            allow_idle_sleep: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// `None` picks a seed from the clock at startup
    pub seed: Option<u64>,
    pub autopilot: bool,

    // === Audio ===
    pub audio_enabled: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,

    pub screen: ScreenConfig,
    pub scheduler: SchedulerConfig,
    pub input_queue_capacity: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            autopilot: true,
            audio_enabled: true,
            master_volume: 0.8,
            screen: ScreenConfig::default(),
            scheduler: SchedulerConfig::default(),
            input_queue_capacity: INPUT_QUEUE_CAPACITY,
        }
    }
}

impl GameConfig {
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// The configured seed, or one derived from the current time
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        })
    }

    pub fn world_options(&self, seed: u64) -> WorldOptions {
        WorldOptions {
            seed,
            autopilot: self.autopilot,
            audio_enabled: self.audio_enabled,
            master_volume: self.master_volume,
            update_period_ms: self.scheduler.update_period_ms,
        }
    }

    /// Screen rectangle with its top-left corner at the origin
    pub fn screen_bounds(&self) -> Bounds {
        Bounds::new(0.0, 0.0, self.screen.width, self.screen.height)
    }
}
