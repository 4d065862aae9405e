use std::collections::HashMap;

use serde::Deserialize;

/// Top-level shape of a block catalog TOML file.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BlocksConfig {
    #[serde(default)]
    pub materials: HashMap<String, MaterialDef>,
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
    #[serde(default)]
    pub biomes: Vec<BiomeDef>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MaterialDef {
    #[serde(default)]
    pub render_tag: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockDef {
    pub id: u8,
    pub name: String,
    /// Palette color, `rrggbb`.
    pub color: String,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub layer: u8,
    /// `[r, g, b, a]`, `a` is the light range.
    #[serde(default)]
    pub emission: Option<[u8; 4]>,
    #[serde(default)]
    pub granular: bool,
    #[serde(default = "default_fall_delay")]
    pub fall_delay: f32,
    #[serde(default)]
    pub liquid: bool,
}

fn default_fall_delay() -> f32 {
    0.25
}

#[derive(Clone, Debug, Deserialize)]
pub struct BiomeDef {
    pub name: String,
    /// Point on the biome noise axis in `[-1, 1]`.
    pub position: f32,
    /// Block name used for the column fill.
    pub surface: String,
}
