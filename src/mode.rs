use std::sync::Arc;

use strata_blocks::{BiomeId, BlockRegistry};
use strata_chunk::{Chunk, ChunkOccupancy, TerrainFill, VoxelStore, fill_chunk};
use strata_runtime::WorldHooks;
use strata_structures::{StructureDef, decorate_chunk};
use strata_world::{ChunkCoord, NoiseTerrain, TerrainSource, WorldGenConfig};

use crate::config::ConfigError;

/// Seeded noise terrain with biome surfaces, a floor layer, decorations and
/// falling granular blocks.
pub struct TerrainMode {
    terrain: NoiseTerrain,
    fill: TerrainFill,
    structures: Arc<[StructureDef]>,
}

impl TerrainMode {
    pub fn new(
        seed: i32,
        cfg: &WorldGenConfig,
        reg: &BlockRegistry,
        structures: Arc<[StructureDef]>,
    ) -> Result<Self, ConfigError> {
        let floor_block = reg
            .id_by_name(&cfg.floor_block)
            .ok_or_else(|| ConfigError::UnknownBlock(cfg.floor_block.clone()))?;
        let positions = reg.biomes().iter().map(|b| b.position).collect();
        let fill = TerrainFill {
            floor_height: cfg.floor_height,
            floor_block,
            biome_surface: reg.biomes().iter().map(|b| b.surface).collect(),
        };
        Ok(Self {
            terrain: NoiseTerrain::new(seed, cfg, positions),
            fill,
            structures,
        })
    }

    pub fn seed(&self) -> i32 {
        self.terrain.seed()
    }
}

impl WorldHooks for TerrainMode {
    fn generate_voxels(&self, chunk: &mut Chunk, reg: &BlockRegistry) -> ChunkOccupancy {
        fill_chunk(chunk, &self.terrain, &self.fill, reg)
    }

    fn height(&self, x: i32, z: i32) -> f32 {
        self.terrain.height(x, z)
    }

    fn biome(&self, x: i32, z: i32) -> BiomeId {
        self.terrain.biome(x, z)
    }

    fn place_decorations(&self, store: &mut VoxelStore, coord: ChunkCoord) -> Vec<ChunkCoord> {
        decorate_chunk(store, coord, &self.terrain, &self.structures)
            .touched
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_floor_block_is_rejected() {
        let reg = BlockRegistry::builtin().unwrap();
        let cfg = WorldGenConfig {
            floor_block: "unobtainium".to_string(),
            ..WorldGenConfig::default()
        };
        assert!(matches!(
            TerrainMode::new(1, &cfg, &reg, Arc::from(Vec::new())),
            Err(ConfigError::UnknownBlock(_))
        ));
    }

    #[test]
    fn floor_and_surface_follow_height() {
        let reg = BlockRegistry::builtin().unwrap();
        let cfg = WorldGenConfig::default();
        let mode = TerrainMode::new(7, &cfg, &reg, Arc::from(Vec::new())).unwrap();
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0, 0));
        mode.generate_voxels(&mut chunk, &reg);
        let bedrock = reg.id_by_name("bedrock").unwrap();
        let h = mode.height(0, 0);
        assert_eq!(chunk.get_local(0, 0, 0).map(|v| v.id), Some(bedrock));
        let top = mode.surface_level(0, 0);
        if (0..16).contains(&top) {
            assert_eq!(chunk.get_local(0, top, 0).map(|v| v.id), Some(0));
        }
        assert!(h >= 0.0);
    }
}
