//! Pending world work: relight, per-tick voxels and queued edits.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use strata_blocks::BlockId;
use strata_geom::IVec3;
use strata_world::{CHUNK_SIZE, ChunkCoord, floor_chunk_coord, local_of};

/// A single-cell edit: set `pos` to `block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoxelDelta {
    pub pos: IVec3,
    pub block: BlockId,
}

impl VoxelDelta {
    pub const fn new(pos: IVec3, block: BlockId) -> Self {
        Self { pos, block }
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyWorkStats {
    pub relight: usize,
    pub ticking: usize,
    pub mutations: usize,
    pub stale_chunks: usize,
}

/// Chunks whose mesh an edit at `pos` can change.
///
/// The owning chunk alone when the cell is interior, otherwise the full
/// 3x3x3 block of chunks around it. Owner first.
pub fn affected_chunks(pos: IVec3) -> Vec<ChunkCoord> {
    let c = floor_chunk_coord(pos);
    let (lx, ly, lz) = local_of(pos);
    let edge = |l: usize| l == 0 || l == CHUNK_SIZE as usize - 1;
    if !(edge(lx) || edge(ly) || edge(lz)) {
        return vec![c];
    }
    let mut out = Vec::with_capacity(27);
    out.push(c);
    out.extend(c.cube(1).filter(|n| *n != c));
    out
}

/// FIFO work queues plus per-chunk revision stamps.
///
/// Relight and tick queues drop duplicates on enqueue. The
/// mutation queue keeps every entry so edits replay in the order made.
#[derive(Default)]
pub struct DirtyWork {
    relight: VecDeque<ChunkCoord>,
    relight_set: HashSet<ChunkCoord>,
    ticking: Vec<IVec3>,
    ticking_set: HashSet<IVec3>,
    mutations: VecDeque<VoxelDelta>,
    // latest edit stamp touching a chunk / stamp the current mesh was built from
    rev: HashMap<ChunkCoord, u64>,
    built: HashMap<ChunkCoord, u64>,
    counter: u64,
}

impl DirtyWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DirtyWorkStats {
        DirtyWorkStats {
            relight: self.relight.len(),
            ticking: self.ticking.len(),
            mutations: self.mutations.len(),
            stale_chunks: self.rev.keys().filter(|c| self.needs_rebuild(**c)).count(),
        }
    }

    pub fn queue_relight(&mut self, c: ChunkCoord) -> bool {
        if !self.relight_set.insert(c) {
            return false;
        }
        self.relight.push_back(c);
        true
    }

    pub fn pop_relight(&mut self) -> Option<ChunkCoord> {
        let c = self.relight.pop_front()?;
        self.relight_set.remove(&c);
        Some(c)
    }

    pub fn has_relight(&self) -> bool {
        !self.relight.is_empty()
    }

    pub fn is_relight_pending(&self, c: ChunkCoord) -> bool {
        self.relight_set.contains(&c)
    }

    /// Schedules `pos` for the next simulation step.
    pub fn queue_tick(&mut self, pos: IVec3) -> bool {
        if !self.ticking_set.insert(pos) {
            return false;
        }
        self.ticking.push(pos);
        true
    }

    /// Takes every voxel due this step. Anything queued while processing
    /// them waits for the following step.
    pub fn take_ticks(&mut self) -> Vec<IVec3> {
        self.ticking_set.clear();
        std::mem::take(&mut self.ticking)
    }

    pub fn queue_mutation(&mut self, pos: IVec3, id: BlockId) {
        self.mutations.push_back(VoxelDelta::new(pos, id));
    }

    pub fn take_mutations(&mut self) -> Vec<VoxelDelta> {
        self.mutations.drain(..).collect()
    }

    pub fn has_mutations(&self) -> bool {
        !self.mutations.is_empty()
    }

    /// Stamps every chunk in [`affected_chunks`] with a new revision and
    /// returns them with the stamp.
    pub fn bump_region_around(&mut self, pos: IVec3) -> (u64, Vec<ChunkCoord>) {
        self.counter = self.counter.wrapping_add(1).max(1);
        let stamp = self.counter;
        let chunks = affected_chunks(pos);
        for c in &chunks {
            self.rev.insert(*c, stamp);
        }
        (stamp, chunks)
    }

    /// Stamps one chunk, e.g. after a snapshot replaced it wholesale.
    pub fn bump_chunk(&mut self, c: ChunkCoord) -> u64 {
        self.counter = self.counter.wrapping_add(1).max(1);
        self.rev.insert(c, self.counter);
        self.counter
    }

    pub fn rev_of(&self, c: ChunkCoord) -> u64 {
        self.rev.get(&c).copied().unwrap_or(0)
    }

    pub fn built_rev_of(&self, c: ChunkCoord) -> u64 {
        self.built.get(&c).copied().unwrap_or(0)
    }

    pub fn mark_built(&mut self, c: ChunkCoord, rev: u64) {
        let e = self.built.entry(c).or_insert(0);
        if rev > *e {
            *e = rev;
        }
    }

    pub fn needs_rebuild(&self, c: ChunkCoord) -> bool {
        self.rev_of(c) > self.built_rev_of(c)
    }
}
