use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use hashbrown::HashSet;
use strata_blocks::{AIR, BlockId, BlockRegistry};
use strata_chunk::{BehaviorState, Voxel, VoxelStore};
use strata_edit::{DirtyWork, VoxelDelta};
use strata_geom::IVec3;
use strata_lighting::LightPropagator;
use strata_mesh_cpu::{ChunkMeshCPU, MeshNeighborhood};
use strata_world::{ChunkCoord, floor_chunk_coord};

use crate::clock::TickClock;
use crate::gate::{GenRequest, GenerationGate};
use crate::hooks::{TickContext, WorldHooks};
use crate::{GenJob, MeshJob, Runtime};

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Horizontal sweep radius in chunks.
    pub render_distance: i32,
    /// Chunk rows generated upward from `cy = 0`.
    pub vertical_chunks: i32,
    /// Chunk radius of one relight pass.
    pub light_area: i32,
    pub gen_queue_limit: usize,
    pub tick_rate: f32,
    pub tick_speed: f32,
    pub max_ticks: u32,
    /// Zero picks a count from the available cores.
    pub gen_workers: usize,
    pub mesh_workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            render_distance: 5,
            vertical_chunks: 5,
            light_area: 1,
            gen_queue_limit: 8,
            tick_rate: 20.0,
            tick_speed: 1.0,
            max_ticks: 60,
            gen_workers: 0,
            mesh_workers: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub chunks_loaded: usize,
    pub gen_queued: usize,
    pub gen_inflight: usize,
    pub mesh_queued: usize,
    pub mesh_inflight: usize,
    /// Mesh jobs submitted and not yet collected.
    pub meshes_pending: usize,
    pub meshes_built: u64,
    pub generations_started: u64,
    pub generations_finished: u64,
    pub generations_waiting: usize,
    pub ticks: u64,
    pub capped_frames: u64,
    pub ticking: usize,
    pub relight_pending: usize,
    pub mutations_pending: usize,
    pub stale_chunks: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchedulerEvent {
    GenerationFinished { center: ChunkCoord, chunks: usize },
}

struct Sweep {
    center: ChunkCoord,
    pending: HashSet<ChunkCoord>,
    filled: Vec<ChunkCoord>,
    started: Instant,
}

fn has_emitters(store: &VoxelStore, c: ChunkCoord) -> bool {
    store
        .chunk(c)
        .is_some_and(|ch| ch.voxels().iter().any(|v| v.emission.a > 0))
}

/// Drives generation, simulation ticks, edits, relighting and mesh
/// dispatch for one world. Owns the chunk map; workers only ever see
/// owned copies.
pub struct UpdateScheduler {
    store: VoxelStore,
    hooks: Arc<dyn WorldHooks>,
    runtime: Runtime,
    work: DirtyWork,
    gate: GenerationGate,
    clock: TickClock,
    light: LightPropagator,
    cfg: SchedulerConfig,
    epoch: u64,
    sweep: Option<Sweep>,
    meshes_pending: usize,
    mesh_updates: Vec<(ChunkCoord, Arc<ChunkMeshCPU>)>,
    events: Vec<SchedulerEvent>,
    generations_started: u64,
    generations_finished: u64,
    meshes_built: u64,
}

impl UpdateScheduler {
    pub fn new(reg: Arc<BlockRegistry>, hooks: Arc<dyn WorldHooks>, cfg: SchedulerConfig) -> Self {
        let runtime = if cfg.gen_workers == 0 || cfg.mesh_workers == 0 {
            Runtime::new()
        } else {
            Runtime::with_workers(cfg.gen_workers, cfg.mesh_workers)
        };
        Self {
            store: VoxelStore::new(reg),
            hooks,
            runtime,
            work: DirtyWork::new(),
            gate: GenerationGate::new(cfg.gen_queue_limit),
            clock: TickClock::new(cfg.tick_rate, cfg.tick_speed, cfg.max_ticks),
            light: LightPropagator::new(),
            cfg,
            epoch: 1,
            sweep: None,
            meshes_pending: 0,
            mesh_updates: Vec::new(),
            events: Vec::new(),
            generations_started: 0,
            generations_finished: 0,
            meshes_built: 0,
        }
    }

    pub fn store(&self) -> &VoxelStore {
        &self.store
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        self.store.registry()
    }

    pub fn hooks(&self) -> &Arc<dyn WorldHooks> {
        &self.hooks
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.cfg
    }

    pub fn is_generating(&self) -> bool {
        self.gate.is_generating()
    }

    /// Throws away every chunk and pending unit of work and switches to new
    /// hooks. Worker results from before the reset are discarded.
    pub fn reset_world(&mut self, hooks: Arc<dyn WorldHooks>) {
        let reg = self.store.registry().clone();
        self.store = VoxelStore::new(reg);
        self.work = DirtyWork::new();
        self.gate.reset();
        self.sweep = None;
        self.hooks = hooks;
        self.epoch += 1;
        log::info!(target: "sched", "world reset (epoch {})", self.epoch);
    }

    /// Asks for the chunks around `center` to be generated.
    pub fn request_generation(&mut self, center: ChunkCoord) -> GenRequest {
        let decision = self.gate.request(center);
        if decision == GenRequest::Start {
            self.start_sweep(center);
        }
        decision
    }

    fn start_sweep(&mut self, center: ChunkCoord) {
        let rd = self.cfg.render_distance.max(0);
        let mut pending = HashSet::new();
        for cy in 0..self.cfg.vertical_chunks.max(1) {
            for dz in -rd..=rd {
                for dx in -rd..=rd {
                    let c = ChunkCoord::new(center.cx + dx, cy, center.cz + dz);
                    if !self.store.contains_chunk(c) {
                        pending.insert(c);
                    }
                }
            }
        }
        self.generations_started += 1;
        log::info!(
            target: "sched",
            "generation started at ({},{}) chunks={}",
            center.cx,
            center.cz,
            pending.len()
        );
        let mut jobs: Vec<ChunkCoord> = pending.iter().copied().collect();
        jobs.sort_by_key(|c| (c.distance_sq(center), *c));
        for coord in jobs {
            self.runtime.submit_gen_job(GenJob {
                coord,
                epoch: self.epoch,
                hooks: self.hooks.clone(),
                reg: self.store.registry().clone(),
            });
        }
        self.sweep = Some(Sweep {
            center,
            pending,
            filled: Vec::new(),
            started: Instant::now(),
        });
        if self.sweep.as_ref().is_some_and(|s| s.pending.is_empty()) {
            self.finish_sweep();
        }
    }

    fn pump_generation(&mut self) {
        for out in self.runtime.drain_gen_results() {
            if out.epoch != self.epoch {
                continue;
            }
            let Some(sweep) = self.sweep.as_mut() else {
                continue;
            };
            if !sweep.pending.remove(&out.coord) {
                continue;
            }
            log::trace!(
                target: "sched",
                "filled ({},{},{}) {:?} in {}ms",
                out.coord.cx,
                out.coord.cy,
                out.coord.cz,
                out.occupancy,
                out.t_gen_ms
            );
            if !self.store.contains_chunk(out.coord) {
                self.store.insert_chunk(out.chunk);
            }
            sweep.filled.push(out.coord);
        }
        if self.sweep.as_ref().is_some_and(|s| s.pending.is_empty()) {
            self.finish_sweep();
        }
    }

    fn finish_sweep(&mut self) {
        let Some(mut sweep) = self.sweep.take() else {
            return;
        };
        sweep.filled.sort();
        let filled: HashSet<ChunkCoord> = sweep.filled.iter().copied().collect();

        let mut touched: BTreeSet<ChunkCoord> = BTreeSet::new();
        for c in sweep.filled.iter().filter(|c| c.cy == 0) {
            touched.extend(self.hooks.place_decorations(&mut self.store, *c));
        }
        let decorated = touched.len();

        for c in &sweep.filled {
            self.store.mark_dirty(*c);
            self.work.bump_chunk(*c);
            for step in IVec3::AXIS_STEPS {
                let n = c.offset(step.x, step.y, step.z);
                if !filled.contains(&n) {
                    self.store.mark_dirty(n);
                }
            }
        }
        for c in touched.iter().filter(|c| !filled.contains(*c)) {
            self.store.mark_dirty(*c);
            self.work.bump_chunk(*c);
        }

        // Light can enter from any loaded chunk within emitter reach.
        let reach = LightPropagator::source_reach(&self.store);
        let candidates: Vec<ChunkCoord> =
            sweep.filled.iter().chain(touched.iter()).copied().collect();
        let emitting: HashSet<ChunkCoord> = candidates
            .iter()
            .flat_map(|c| c.cube(reach))
            .collect::<HashSet<_>>()
            .into_iter()
            .filter(|n| has_emitters(&self.store, *n))
            .collect();
        for c in candidates {
            if c.cube(reach).any(|n| emitting.contains(&n)) {
                self.work.queue_relight(c);
            }
        }

        self.generations_finished += 1;
        log::info!(
            target: "sched",
            "generation finished at ({},{}) chunks={} decorated={} in {}ms",
            sweep.center.cx,
            sweep.center.cz,
            sweep.filled.len(),
            decorated,
            sweep.started.elapsed().as_millis()
        );
        self.events.push(SchedulerEvent::GenerationFinished {
            center: sweep.center,
            chunks: sweep.filled.len(),
        });
        if let Some(next) = self.gate.finish() {
            self.start_sweep(next);
        }
    }

    /// One frame: collect worker output, then, unless a sweep is running,
    /// run due ticks, apply edits, relight one chunk and dispatch meshes.
    /// Simulation is paused while generating.
    pub fn update(&mut self, dt: f32) {
        self.pump_generation();
        self.pump_meshes();
        if self.gate.is_generating() {
            return;
        }
        let ticks = self.clock.advance(dt);
        for _ in 0..ticks {
            self.run_tick();
            self.apply_mutations();
        }
        self.apply_mutations();
        self.relight_pass();
        self.dispatch_meshes();
    }

    fn run_tick(&mut self) {
        let due = self.work.take_ticks();
        if due.is_empty() {
            return;
        }
        let delta = self.clock.period();
        let hooks = self.hooks.clone();
        for pos in due {
            let Some(voxel) = self.store.get_voxel(pos) else {
                continue;
            };
            let mut ctx = TickContext::new(&mut self.store, &mut self.work, delta);
            hooks.on_tick_voxel(&mut ctx, pos, voxel);
        }
    }

    fn apply_mutations(&mut self) {
        for delta in self.work.take_mutations() {
            self.apply_mutation(delta);
        }
    }

    fn apply_mutation(&mut self, delta: VoxelDelta) -> bool {
        if !self.store.set_voxel_with_data(delta.pos, Voxel::of(delta.block)) {
            log::trace!(target: "sched", "edit at {:?} dropped: chunk not loaded", delta.pos);
            return false;
        }
        for p in delta.pos.with_axis_neighbors() {
            if let Some(v) = self.store.get_voxel(p) {
                if matches!(v.behavior, BehaviorState::Falling { .. }) {
                    self.work.queue_tick(p);
                }
                self.work.queue_relight(floor_chunk_coord(p));
            }
        }
        let (_, chunks) = self.work.bump_region_around(delta.pos);
        for c in chunks {
            self.store.mark_dirty(c);
        }
        true
    }

    fn relight_pass(&mut self) {
        let Some(c) = self.work.pop_relight() else {
            return;
        };
        if !self.store.contains_chunk(c) {
            return;
        }
        let report = self.light.relight(&mut self.store, c, self.cfg.light_area);
        for changed in &report.changed {
            self.store.mark_dirty(*changed);
        }
        log::trace!(
            target: "sched",
            "relight ({},{},{}) touched={} changed={} sources={}",
            c.cx,
            c.cy,
            c.cz,
            report.touched.len(),
            report.changed.len(),
            report.sources
        );
    }

    fn dispatch_meshes(&mut self) {
        let mut ready: Vec<ChunkCoord> = self
            .store
            .chunks()
            .filter(|ch| ch.wants_mesh())
            .map(|ch| ch.coord)
            .filter(|c| !self.work.is_relight_pending(*c))
            .collect();
        ready.sort();
        for coord in ready {
            let Some(neighborhood) = MeshNeighborhood::capture(&self.store, coord) else {
                continue;
            };
            if !self.store.chunk_mut(coord).is_some_and(|ch| ch.begin_mesh()) {
                continue;
            }
            self.runtime.submit_mesh_job(MeshJob {
                coord,
                epoch: self.epoch,
                rev: self.work.rev_of(coord),
                neighborhood,
                reg: self.store.registry().clone(),
            });
            self.meshes_pending += 1;
        }
    }

    fn pump_meshes(&mut self) {
        for out in self.runtime.drain_mesh_results() {
            self.meshes_pending = self.meshes_pending.saturating_sub(1);
            if out.epoch != self.epoch {
                continue;
            }
            let Some(chunk) = self.store.chunk_mut(out.coord) else {
                continue;
            };
            chunk.finish_mesh();
            self.work.mark_built(out.coord, out.rev);
            self.meshes_built += 1;
            log::trace!(
                target: "sched",
                "meshed ({},{},{}) quads={} in {}ms",
                out.coord.cx,
                out.coord.cy,
                out.coord.cz,
                out.mesh.face_count(),
                out.t_mesh_ms
            );
            self.mesh_updates.push((out.coord, Arc::new(out.mesh)));
        }
    }

    /// Completed meshes since the last call, empty ones included.
    pub fn drain_mesh_updates(&mut self) -> Vec<(ChunkCoord, Arc<ChunkMeshCPU>)> {
        std::mem::take(&mut self.mesh_updates)
    }

    pub fn drain_events(&mut self) -> Vec<SchedulerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queues removal of the voxel at `pos`. The bottom row can't be removed.
    pub fn destroy_voxel(&mut self, pos: IVec3) -> Option<VoxelDelta> {
        if pos.y == 0 {
            log::debug!(target: "sched", "refusing to destroy bedrock row at {:?}", pos);
            return None;
        }
        if !self.store.get_voxel(pos)?.is_active() {
            return None;
        }
        self.work.queue_mutation(pos, AIR);
        Some(VoxelDelta::new(pos, AIR))
    }

    pub fn place_voxel(&mut self, pos: IVec3, id: BlockId) -> Option<VoxelDelta> {
        if id == AIR || !self.store.registry().contains(id) {
            return None;
        }
        self.store.get_voxel(pos)?;
        self.work.queue_mutation(pos, id);
        Some(VoxelDelta::new(pos, id))
    }

    /// Queues an edit received from a peer. Unknown block ids are dropped.
    pub fn apply_remote_delta(&mut self, delta: VoxelDelta) -> bool {
        if delta.block != AIR && !self.store.registry().contains(delta.block) {
            log::warn!(
                target: "sched",
                "ignoring edit at {:?} with unknown block {}",
                delta.pos,
                delta.block
            );
            return false;
        }
        self.work.queue_mutation(delta.pos, delta.block);
        true
    }

    pub fn chunk_snapshot(&self, c: ChunkCoord) -> Option<Vec<BlockId>> {
        self.store.block_ids(c)
    }

    /// Replaces chunk `c` with `ids` and schedules its light and meshes.
    pub fn apply_chunk_snapshot(&mut self, c: ChunkCoord, ids: &[BlockId]) -> bool {
        if !self.store.apply_block_ids(c, ids) {
            log::warn!(
                target: "sched",
                "ignoring snapshot for ({},{},{}): {} ids",
                c.cx,
                c.cy,
                c.cz,
                ids.len()
            );
            return false;
        }
        self.work.bump_chunk(c);
        self.work.queue_relight(c);
        self.store.mark_dirty(c);
        for step in IVec3::AXIS_STEPS {
            self.store.mark_dirty(c.offset(step.x, step.y, step.z));
        }
        let origin = c.origin();
        let falling: Vec<IVec3> = self
            .store
            .chunk(c)
            .map(|ch| {
                ch.voxels()
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| matches!(v.behavior, BehaviorState::Falling { .. }))
                    .map(|(i, _)| {
                        let (x, y, z) = strata_world::local_pos_of_index(i);
                        origin + IVec3::new(x as i32, y as i32, z as i32)
                    })
                    .collect()
            })
            .unwrap_or_default();
        for p in falling {
            self.work.queue_tick(p);
        }
        true
    }

    pub fn loaded_chunks(&self) -> Vec<ChunkCoord> {
        let mut out: Vec<ChunkCoord> = self.store.chunk_coords().collect();
        out.sort();
        out
    }

    /// Nothing generating, meshing, queued or falling.
    pub fn is_settled(&self) -> bool {
        let work = self.work.stats();
        !self.gate.is_generating()
            && self.sweep.is_none()
            && self.meshes_pending == 0
            && work.relight == 0
            && work.mutations == 0
            && work.ticking == 0
            && !self.store.chunks().any(|ch| ch.wants_mesh())
    }

    /// Steps with a fixed `dt` until settled or `timeout` passes.
    pub fn run_until_settled(&mut self, dt: f32, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            self.update(dt);
            if self.is_settled() {
                return true;
            }
            if start.elapsed() > timeout {
                log::warn!(target: "sched", "not settled after {:?}: {:?}", timeout, self.stats());
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        let (gen_queued, gen_inflight, mesh_queued, mesh_inflight) = self.runtime.queue_debug_counts();
        let work = self.work.stats();
        SchedulerStats {
            chunks_loaded: self.store.len(),
            gen_queued,
            gen_inflight,
            mesh_queued,
            mesh_inflight,
            meshes_pending: self.meshes_pending,
            meshes_built: self.meshes_built,
            generations_started: self.generations_started,
            generations_finished: self.generations_finished,
            generations_waiting: self.gate.waiting(),
            ticks: self.clock.ticks(),
            capped_frames: self.clock.capped_frames(),
            ticking: work.ticking,
            relight_pending: work.relight,
            mutations_pending: work.mutations,
            stale_chunks: work.stale_chunks,
        }
    }
}
