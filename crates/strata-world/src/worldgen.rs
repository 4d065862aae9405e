use serde::Deserialize;

/// Noise and fill parameters for seeded terrain.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WorldGenConfig {
    #[serde(default = "default_height_frequency")]
    pub height_frequency: f32,
    #[serde(default = "default_cellular_frequency")]
    pub cellular_frequency: f32,
    #[serde(default = "default_biome_frequency")]
    pub biome_frequency: f32,
    /// Height span in chunks; the column height ranges over `[0, 3 * S * span / 2]`.
    #[serde(default = "default_height_span")]
    pub height_span: i32,
    /// Rows below this world y use `floor_block` instead of the biome surface.
    #[serde(default = "default_floor_height")]
    pub floor_height: i32,
    #[serde(default = "default_floor_block")]
    pub floor_block: String,
}

fn default_height_frequency() -> f32 {
    0.005
}
fn default_cellular_frequency() -> f32 {
    0.005
}
fn default_biome_frequency() -> f32 {
    0.002
}
fn default_height_span() -> i32 {
    5
}
fn default_floor_height() -> i32 {
    3
}
fn default_floor_block() -> String {
    "bedrock".to_string()
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            height_frequency: default_height_frequency(),
            cellular_frequency: default_cellular_frequency(),
            biome_frequency: default_biome_frequency(),
            height_span: default_height_span(),
            floor_height: default_floor_height(),
            floor_block: default_floor_block(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: WorldGenConfig = toml::from_str("floor_height = 5\n").unwrap();
        assert_eq!(cfg.floor_height, 5);
        assert_eq!(cfg.height_span, 5);
        assert_eq!(cfg.floor_block, "bedrock");
    }
}
