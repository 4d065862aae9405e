use strata_blocks::{BlockId, Rgba};
use strata_world::{CHUNK_SIZE, CHUNK_VOLUME, ChunkCoord, local_index};

use crate::voxel::Voxel;

/// Ceiling for queued mesh rebuild requests per chunk.
pub const DIRTY_MAX: u8 = 3;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkOccupancy {
    Empty,
    Populated,
}

impl ChunkOccupancy {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, ChunkOccupancy::Empty)
    }

    #[inline]
    pub fn has_blocks(self) -> bool {
        matches!(self, ChunkOccupancy::Populated)
    }
}

/// Dense `S^3` voxel cube with two light buffers.
///
/// `working` receives propagation writes; `visible` is what meshing reads.
/// The two are exchanged only by [`Chunk::publish_light`].
#[derive(Clone, Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    voxels: Box<[Voxel]>,
    working: Box<[Rgba]>,
    visible: Box<[Rgba]>,
    dirty: u8,
    meshing: bool,
}

#[inline]
fn in_bounds(x: i32, y: i32, z: i32) -> bool {
    (0..CHUNK_SIZE).contains(&x) && (0..CHUNK_SIZE).contains(&y) && (0..CHUNK_SIZE).contains(&z)
}

impl Chunk {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            voxels: vec![Voxel::AIR; CHUNK_VOLUME].into_boxed_slice(),
            working: vec![Rgba::ZERO; CHUNK_VOLUME].into_boxed_slice(),
            visible: vec![Rgba::ZERO; CHUNK_VOLUME].into_boxed_slice(),
            dirty: 0,
            meshing: false,
        }
    }

    #[inline]
    pub fn get_local(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        if !in_bounds(x, y, z) {
            return None;
        }
        Some(self.voxels[local_index(x as usize, y as usize, z as usize)])
    }

    #[inline]
    pub fn set_local(&mut self, x: i32, y: i32, z: i32, v: Voxel) -> bool {
        if !in_bounds(x, y, z) {
            return false;
        }
        self.voxels[local_index(x as usize, y as usize, z as usize)] = v;
        true
    }

    #[inline]
    pub fn voxels(&self) -> &[Voxel] {
        &self.voxels
    }

    #[inline]
    pub fn voxels_mut(&mut self) -> &mut [Voxel] {
        &mut self.voxels
    }

    #[inline]
    pub fn working_light(&self, x: i32, y: i32, z: i32) -> Option<Rgba> {
        in_bounds(x, y, z).then(|| self.working[local_index(x as usize, y as usize, z as usize)])
    }

    #[inline]
    pub fn set_working_light(&mut self, x: i32, y: i32, z: i32, light: Rgba) -> bool {
        if !in_bounds(x, y, z) {
            return false;
        }
        self.working[local_index(x as usize, y as usize, z as usize)] = light;
        true
    }

    #[inline]
    pub fn visible_light(&self, x: i32, y: i32, z: i32) -> Option<Rgba> {
        in_bounds(x, y, z).then(|| self.visible[local_index(x as usize, y as usize, z as usize)])
    }

    pub fn visible_lights(&self) -> &[Rgba] {
        &self.visible
    }

    pub fn clear_working_light(&mut self) {
        self.working.fill(Rgba::ZERO);
    }

    /// Makes the working buffer visible. Returns whether the visible field changed.
    pub fn publish_light(&mut self) -> bool {
        let changed = self.working != self.visible;
        std::mem::swap(&mut self.working, &mut self.visible);
        changed
    }

    /// Requests a mesh rebuild; saturates at [`DIRTY_MAX`].
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = (self.dirty + 1).min(DIRTY_MAX);
    }

    #[inline]
    pub fn dirty_count(&self) -> u8 {
        self.dirty
    }

    #[inline]
    pub fn is_meshing(&self) -> bool {
        self.meshing
    }

    /// True when a rebuild is wanted and none is in flight.
    #[inline]
    pub fn wants_mesh(&self) -> bool {
        self.dirty > 0 && !self.meshing
    }

    /// Claims the mesh slot. Fails when a rebuild is already in flight.
    pub fn begin_mesh(&mut self) -> bool {
        if self.meshing {
            return false;
        }
        self.meshing = true;
        true
    }

    /// Releases the mesh slot and retires one rebuild request.
    pub fn finish_mesh(&mut self) {
        self.meshing = false;
        self.dirty = self.dirty.saturating_sub(1);
    }

    pub fn block_ids(&self) -> Vec<BlockId> {
        self.voxels.iter().map(|v| v.id).collect()
    }
}
