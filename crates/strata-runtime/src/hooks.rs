use strata_blocks::{AIR, BiomeId, BlockId, BlockRegistry};
use strata_chunk::{BehaviorState, Chunk, ChunkOccupancy, Voxel, VoxelStore};
use strata_edit::DirtyWork;
use strata_geom::IVec3;
use strata_world::ChunkCoord;

/// Game-mode callbacks the scheduler drives.
///
/// `height` and `biome` must be pure in `(x, z)` for a given seed;
/// `generate_voxels` runs on a worker thread and may only touch `chunk`.
pub trait WorldHooks: Send + Sync {
    fn generate_voxels(&self, chunk: &mut Chunk, reg: &BlockRegistry) -> ChunkOccupancy;

    fn height(&self, x: i32, z: i32) -> f32;

    fn biome(&self, x: i32, z: i32) -> BiomeId;

    fn surface_level(&self, x: i32, z: i32) -> i32 {
        self.height(x, z).floor() as i32 + 1
    }

    /// Runs on the scheduling thread for ground-level chunks once a sweep
    /// has filled every chunk. Returns every chunk a structure wrote into,
    /// which may include loaded neighbors of `coord`.
    fn place_decorations(&self, _store: &mut VoxelStore, _coord: ChunkCoord) -> Vec<ChunkCoord> {
        Vec::new()
    }

    /// One simulation step for a queued voxel.
    fn on_tick_voxel(&self, ctx: &mut TickContext<'_>, pos: IVec3, voxel: Voxel) {
        falling_step(ctx, pos, voxel);
    }
}

/// What a tick callback may do to the world.
pub struct TickContext<'a> {
    store: &'a mut VoxelStore,
    work: &'a mut DirtyWork,
    /// Simulated seconds covered by this step.
    pub delta: f32,
}

impl<'a> TickContext<'a> {
    pub(crate) fn new(store: &'a mut VoxelStore, work: &'a mut DirtyWork, delta: f32) -> Self {
        Self { store, work, delta }
    }

    pub fn voxel(&self, pos: IVec3) -> Option<Voxel> {
        self.store.get_voxel(pos)
    }

    pub fn registry(&self) -> &BlockRegistry {
        self.store.registry()
    }

    /// Stores per-voxel state without side effects and ticks it again next step.
    pub fn persist(&mut self, pos: IVec3, voxel: Voxel) {
        if self.store.set_voxel_raw(pos, voxel) {
            self.work.queue_tick(pos);
        }
    }

    pub fn requeue(&mut self, pos: IVec3) {
        self.work.queue_tick(pos);
    }

    /// Ordinary edit, applied when the mutation queue drains.
    pub fn queue_mutation(&mut self, pos: IVec3, id: BlockId) {
        self.work.queue_mutation(pos, id);
    }
}

/// Granular blocks: count down while the cell below is open, then swap down.
pub fn falling_step(ctx: &mut TickContext<'_>, pos: IVec3, voxel: Voxel) {
    let BehaviorState::Falling { timer } = voxel.behavior else {
        return;
    };
    let below = pos - IVec3::new(0, 1, 0);
    match ctx.voxel(below) {
        Some(v) if !v.is_active() => {}
        _ => return,
    }
    let timer = timer - ctx.delta;
    if timer <= 0.0 {
        ctx.queue_mutation(below, voxel.id);
        ctx.queue_mutation(pos, AIR);
    } else {
        ctx.persist(
            pos,
            Voxel {
                behavior: BehaviorState::Falling { timer },
                ..voxel
            },
        );
    }
}
