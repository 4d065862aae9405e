//! Headless voxel world host: configuration, the terrain game mode and the
//! glue that ties a sync session to a local world.
#![forbid(unsafe_code)]

pub mod assets;
pub mod config;
pub mod headless;
pub mod mode;
pub mod peer;

pub use config::{ConfigError, StrataConfig};
pub use headless::{LocalRoom, export_world, loaded_bounds};
pub use mode::TerrainMode;
pub use peer::Peer;
