use strata_blocks::{AIR, BlockId, BlockRegistry};
use strata_world::{CHUNK_SIZE, TerrainSource, local_index};

use crate::chunk::{Chunk, ChunkOccupancy};
use crate::store::decorate_voxel;
use crate::voxel::Voxel;

/// Column fill rules for height-map terrain.
#[derive(Clone, Debug)]
pub struct TerrainFill {
    /// Rows with world y below this (and below the height) use `floor_block`.
    pub floor_height: i32,
    pub floor_block: BlockId,
    /// Surface block per biome id; missing entries fill with `floor_block`.
    pub biome_surface: Vec<BlockId>,
}

/// Fills one chunk from a height/biome source. Touches only this chunk.
pub fn fill_chunk(
    chunk: &mut Chunk,
    terrain: &dyn TerrainSource,
    rules: &TerrainFill,
    reg: &BlockRegistry,
) -> ChunkOccupancy {
    let origin = chunk.coord.origin();
    let s = CHUNK_SIZE as usize;
    let mut populated = false;
    for z in 0..s {
        for x in 0..s {
            let wx = origin.x + x as i32;
            let wz = origin.z + z as i32;
            let height = terrain.height(wx, wz);
            let biome = terrain.biome(wx, wz);
            let surface = rules
                .biome_surface
                .get(biome as usize)
                .copied()
                .unwrap_or(rules.floor_block);
            for y in 0..s {
                let wy = origin.y + y as i32;
                let fy = wy as f32;
                let id = if wy < rules.floor_height && fy < height {
                    rules.floor_block
                } else if fy < height {
                    surface
                } else {
                    AIR
                };
                populated |= id != AIR;
                let slot = &mut chunk.voxels_mut()[local_index(x, y, z)];
                *slot = decorate_voxel(reg, None, Voxel::of(id));
            }
        }
    }
    if populated {
        ChunkOccupancy::Populated
    } else {
        ChunkOccupancy::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_blocks::BiomeId;
    use strata_world::ChunkCoord;

    struct Flat(f32);

    impl TerrainSource for Flat {
        fn height(&self, _x: i32, _z: i32) -> f32 {
            self.0
        }
        fn biome(&self, x: i32, _z: i32) -> BiomeId {
            if x < 0 { 1 } else { 0 }
        }
    }

    fn reg() -> BlockRegistry {
        BlockRegistry::from_toml_str(
            r#"
            [[blocks]]
            id = 1
            name = "bedrock"
            color = "111111"
            [[blocks]]
            id = 2
            name = "grass"
            color = "00ff00"
            [[blocks]]
            id = 3
            name = "sand"
            color = "ffee00"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn fills_floor_then_surface_then_air() {
        let reg = reg();
        let rules = TerrainFill {
            floor_height: 3,
            floor_block: 1,
            biome_surface: vec![2, 3],
        };
        let mut c = Chunk::new(ChunkCoord::new(0, 0, 0));
        let occ = fill_chunk(&mut c, &Flat(6.5), &rules, &reg);
        assert!(occ.has_blocks());
        assert_eq!(c.get_local(0, 2, 0).unwrap().id, 1);
        assert_eq!(c.get_local(0, 3, 0).unwrap().id, 2);
        assert_eq!(c.get_local(0, 6, 0).unwrap().id, 2);
        assert_eq!(c.get_local(0, 7, 0).unwrap().id, 0);

        let mut west = Chunk::new(ChunkCoord::new(-1, 0, 0));
        fill_chunk(&mut west, &Flat(6.5), &rules, &reg);
        assert_eq!(west.get_local(4, 5, 4).unwrap().id, 3);

        let mut sky = Chunk::new(ChunkCoord::new(0, 1, 0));
        assert!(fill_chunk(&mut sky, &Flat(6.5), &rules, &reg).is_empty());
    }
}
