use std::sync::Arc;

use hashbrown::HashMap;
use strata_blocks::{AIR, BlockId, BlockRegistry, Rgba};
use strata_geom::IVec3;
use strata_world::{CHUNK_VOLUME, ChunkCoord, floor_chunk_coord, local_of};

use crate::chunk::Chunk;
use crate::voxel::{BehaviorState, Voxel};

/// Derives emission, layer and behavior for `voxel` from the catalog.
///
/// Unknown ids collapse to air. When an emitter is replaced by something that
/// doesn't emit, the result keeps `(0,0,0,old_range)` so the next relight can
/// find and clear the light it used to cast.
pub fn decorate_voxel(reg: &BlockRegistry, previous: Option<Voxel>, voxel: Voxel) -> Voxel {
    let fading = previous
        .filter(|p| p.emission.a != 0)
        .map(|p| Rgba::new(0, 0, 0, p.emission.a))
        .unwrap_or(Rgba::ZERO);
    let Some(ty) = reg.get(voxel.id).filter(|t| t.id != AIR) else {
        if voxel.id != AIR {
            log::debug!("unknown block id {} treated as air", voxel.id);
        }
        return Voxel {
            emission: fading,
            ..Voxel::AIR
        };
    };
    Voxel {
        id: ty.id,
        emission: if ty.is_emissive() { ty.emission } else { fading },
        layer: ty.layer,
        behavior: if ty.granular {
            BehaviorState::Falling {
                timer: ty.fall_delay,
            }
        } else {
            BehaviorState::None
        },
    }
}

/// Owns every chunk of one world.
pub struct VoxelStore {
    chunks: HashMap<ChunkCoord, Chunk>,
    reg: Arc<BlockRegistry>,
}

impl VoxelStore {
    pub fn new(reg: Arc<BlockRegistry>) -> Self {
        Self {
            chunks: HashMap::new(),
            reg,
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.reg
    }

    #[inline]
    pub fn chunk(&self, c: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&c)
    }

    #[inline]
    pub fn chunk_mut(&mut self, c: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&c)
    }

    #[inline]
    pub fn contains_chunk(&self, c: ChunkCoord) -> bool {
        self.chunks.contains_key(&c)
    }

    /// Returns the chunk at `c`, creating an empty one if needed.
    pub fn ensure_chunk(&mut self, c: ChunkCoord) -> &mut Chunk {
        self.chunks.entry(c).or_insert_with(|| Chunk::new(c))
    }

    /// Installs a chunk built elsewhere. Keeps the existing dirty/mesh state
    /// of a chunk already at that coordinate.
    pub fn insert_chunk(&mut self, mut chunk: Chunk) {
        if let Some(old) = self.chunks.get(&chunk.coord) {
            for _ in 0..old.dirty_count() {
                chunk.mark_dirty();
            }
            if old.is_meshing() {
                chunk.begin_mesh();
            }
        }
        self.chunks.insert(chunk.coord, chunk);
    }

    pub fn chunk_coords(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        self.chunks.keys().copied()
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// `None` when the chunk isn't loaded.
    pub fn get_voxel(&self, pos: IVec3) -> Option<Voxel> {
        let chunk = self.chunks.get(&floor_chunk_coord(pos))?;
        let (x, y, z) = local_of(pos);
        chunk.get_local(x as i32, y as i32, z as i32)
    }

    /// Plain write. Returns false when the chunk isn't loaded.
    pub fn set_voxel_raw(&mut self, pos: IVec3, voxel: Voxel) -> bool {
        let Some(chunk) = self.chunks.get_mut(&floor_chunk_coord(pos)) else {
            return false;
        };
        let (x, y, z) = local_of(pos);
        chunk.set_local(x as i32, y as i32, z as i32, voxel)
    }

    /// Decorated write; the path ordinary edits take.
    pub fn set_voxel_with_data(&mut self, pos: IVec3, voxel: Voxel) -> bool {
        let previous = self.get_voxel(pos);
        if previous.is_none() {
            return false;
        }
        let decorated = decorate_voxel(&self.reg, previous, voxel);
        self.set_voxel_raw(pos, decorated)
    }

    pub fn set_block(&mut self, pos: IVec3, id: BlockId) -> bool {
        self.set_voxel_with_data(pos, Voxel::of(id))
    }

    /// True when a face looking into `pos` should be drawn for a voxel on `layer`.
    pub fn is_face_visible(&self, pos: IVec3, layer: u8) -> bool {
        match self.get_voxel(pos) {
            Some(v) => !v.is_active() || v.layer != layer,
            None => true,
        }
    }

    /// Published light at `pos`, zero when unloaded.
    pub fn visible_light(&self, pos: IVec3) -> Rgba {
        self.chunks
            .get(&floor_chunk_coord(pos))
            .and_then(|c| {
                let (x, y, z) = local_of(pos);
                c.visible_light(x as i32, y as i32, z as i32)
            })
            .unwrap_or(Rgba::ZERO)
    }

    pub fn working_light(&self, pos: IVec3) -> Option<Rgba> {
        let chunk = self.chunks.get(&floor_chunk_coord(pos))?;
        let (x, y, z) = local_of(pos);
        chunk.working_light(x as i32, y as i32, z as i32)
    }

    pub fn set_working_light(&mut self, pos: IVec3, light: Rgba) -> bool {
        let Some(chunk) = self.chunks.get_mut(&floor_chunk_coord(pos)) else {
            return false;
        };
        let (x, y, z) = local_of(pos);
        chunk.set_working_light(x as i32, y as i32, z as i32, light)
    }

    pub fn mark_dirty(&mut self, c: ChunkCoord) -> bool {
        match self.chunks.get_mut(&c) {
            Some(chunk) => {
                chunk.mark_dirty();
                true
            }
            None => false,
        }
    }

    pub fn block_ids(&self, c: ChunkCoord) -> Option<Vec<BlockId>> {
        self.chunks.get(&c).map(Chunk::block_ids)
    }

    /// Writes a full id array into chunk `c`, creating it if absent. Each cell
    /// is decorated like an ordinary edit. Returns false when `ids` has the
    /// wrong length.
    pub fn apply_block_ids(&mut self, c: ChunkCoord, ids: &[BlockId]) -> bool {
        if ids.len() != CHUNK_VOLUME {
            return false;
        }
        let reg = Arc::clone(&self.reg);
        let chunk = self.ensure_chunk(c);
        for (slot, id) in chunk.voxels_mut().iter_mut().zip(ids) {
            *slot = decorate_voxel(&reg, Some(*slot), Voxel::of(*id));
        }
        true
    }
}
