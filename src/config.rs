use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use strata_runtime::SchedulerConfig;
use strata_world::WorldGenConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown block `{0}`")]
    UnknownBlock(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WorldSection {
    #[serde(default)]
    pub seed: i32,
    #[serde(default = "default_render_distance")]
    pub render_distance: i32,
    /// Chunk rows above `cy = 0`; defaults to the render distance.
    #[serde(default)]
    pub vertical_chunks: Option<i32>,
}

fn default_render_distance() -> i32 {
    5
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            seed: 0,
            render_distance: default_render_distance(),
            vertical_chunks: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TickSection {
    #[serde(default = "default_tick_rate")]
    pub rate: f32,
    #[serde(default = "default_tick_speed")]
    pub speed: f32,
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u32,
}

fn default_tick_rate() -> f32 {
    20.0
}
fn default_tick_speed() -> f32 {
    1.0
}
fn default_max_ticks() -> u32 {
    60
}

impl Default for TickSection {
    fn default() -> Self {
        Self {
            rate: default_tick_rate(),
            speed: default_tick_speed(),
            max_ticks: default_max_ticks(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SyncSection {
    /// Day angle advance in degrees per second.
    #[serde(default = "default_time_speed")]
    pub time_speed: f32,
    #[serde(default = "default_time_send_threshold")]
    pub time_send_threshold: f32,
    #[serde(default = "default_pending_limit")]
    pub pending_limit: usize,
    #[serde(default = "default_min_ambient")]
    pub min_ambient: f32,
}

fn default_time_speed() -> f32 {
    1.0
}
fn default_time_send_threshold() -> f32 {
    5.0
}
fn default_pending_limit() -> usize {
    256
}
fn default_min_ambient() -> f32 {
    0.15
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            time_speed: default_time_speed(),
            time_send_threshold: default_time_send_threshold(),
            pending_limit: default_pending_limit(),
            min_ambient: default_min_ambient(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SchedulerSection {
    #[serde(default = "default_gen_queue_limit")]
    pub gen_queue_limit: usize,
    #[serde(default = "default_light_area")]
    pub light_area: i32,
    /// Zero picks a count from the available cores.
    #[serde(default)]
    pub gen_workers: usize,
    #[serde(default)]
    pub mesh_workers: usize,
}

fn default_gen_queue_limit() -> usize {
    8
}
fn default_light_area() -> i32 {
    1
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            gen_queue_limit: default_gen_queue_limit(),
            light_area: default_light_area(),
            gen_workers: 0,
            mesh_workers: 0,
        }
    }
}

/// Contents of `strata.toml`. Every section and field may be omitted.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct StrataConfig {
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub tick: TickSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub scheduler: SchedulerSection,
    #[serde(default)]
    pub terrain: WorldGenConfig,
}

impl StrataConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn vertical_chunks(&self) -> i32 {
        self.world
            .vertical_chunks
            .unwrap_or(self.world.render_distance)
            .max(1)
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            render_distance: self.world.render_distance,
            vertical_chunks: self.vertical_chunks(),
            light_area: self.scheduler.light_area,
            gen_queue_limit: self.scheduler.gen_queue_limit,
            tick_rate: self.tick.rate,
            tick_speed: self.tick.speed,
            max_ticks: self.tick.max_ticks,
            gen_workers: self.scheduler.gen_workers,
            mesh_workers: self.scheduler.mesh_workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let cfg = StrataConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, StrataConfig::default());
        assert_eq!(cfg.vertical_chunks(), 5);
        assert_eq!(cfg.sync.pending_limit, 256);
        assert_eq!(cfg.terrain.floor_block, "bedrock");
    }

    #[test]
    fn sections_override_independently() {
        let cfg = StrataConfig::from_toml_str(
            r#"
            [world]
            seed = 99
            render_distance = 2

            [tick]
            rate = 10.0

            [terrain]
            floor_height = 6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.world.seed, 99);
        assert_eq!(cfg.vertical_chunks(), 2);
        assert_eq!(cfg.tick.max_ticks, 60);
        let sched = cfg.scheduler_config();
        assert_eq!(sched.render_distance, 2);
        assert_eq!(sched.tick_rate, 10.0);
        assert_eq!(sched.gen_queue_limit, 8);
        assert_eq!(cfg.terrain.floor_height, 6);
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            StrataConfig::from_toml_str("[world]\nseed = \"x\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            StrataConfig::load("/nonexistent/strata.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
