use std::collections::BTreeSet;

use strata_chunk::VoxelStore;
use strata_geom::IVec3;
use strata_world::{CHUNK_SIZE, ChunkCoord, TerrainSource};

use crate::format::StructureDef;

/// Column chosen for the grid cell `(gx, gz)` at spacing `density`.
///
/// The jitter can push the anchor into a neighboring cell, in which case no
/// column of this cell matches and the cell stays bare.
pub fn decoration_anchor(gx: i32, gz: i32, density: i32) -> (i32, i32) {
    let d = density as f32;
    let jx = ((gx ^ gz) as f32).sin() * d;
    let jz = (gx.wrapping_mul(gz) as f32).cos() * d;
    (gx * density + jx.floor() as i32, gz * density + jz.floor() as i32)
}

/// Outcome of decorating one chunk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Decorations {
    /// Surface anchors of the structures placed.
    pub anchors: Vec<IVec3>,
    /// Every chunk that received at least one cell, neighbors included.
    pub touched: BTreeSet<ChunkCoord>,
}

impl Decorations {
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Places structures on a ground-level chunk.
///
/// Each column is checked against every structure whose biome matches; a
/// structure is placed at the surface when the column is its grid anchor.
/// Cells falling into unloaded chunks are dropped.
pub fn decorate_chunk(
    store: &mut VoxelStore,
    coord: ChunkCoord,
    terrain: &dyn TerrainSource,
    structures: &[StructureDef],
) -> Decorations {
    let mut placed = Decorations::default();
    if coord.cy != 0 || structures.is_empty() {
        return placed;
    }
    let origin = coord.origin();
    let reg = store.registry().clone();
    for lx in 0..CHUNK_SIZE {
        for lz in 0..CHUNK_SIZE {
            let (x, z) = (origin.x + lx, origin.z + lz);
            let biome = reg.biome(terrain.biome(x, z)).map(|b| b.name.as_str());
            for def in structures {
                if def.biome.as_deref().is_some_and(|want| Some(want) != biome) {
                    continue;
                }
                let d = def.density.max(1);
                let (ax, az) = decoration_anchor(x.div_euclid(d), z.div_euclid(d), d);
                if (x, z) != (ax, az) {
                    continue;
                }
                let anchor = IVec3::new(x, terrain.surface_level(x, z), z);
                let written = def.place(store, anchor, &mut placed.touched);
                log::trace!(
                    "placed `{}` at ({},{},{}) cells={}",
                    def.name,
                    anchor.x,
                    anchor.y,
                    anchor.z,
                    written
                );
                placed.anchors.push(anchor);
            }
        }
    }
    placed
}
