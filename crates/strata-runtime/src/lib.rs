//! Worker lanes, generation gate, tick pacing and the update scheduler.
#![forbid(unsafe_code)]

mod clock;
mod gate;
mod hooks;
mod scheduler;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use strata_blocks::BlockRegistry;
use strata_chunk::{Chunk, ChunkOccupancy};
use strata_mesh_cpu::{ChunkMeshCPU, MeshNeighborhood, build_chunk_mesh};
use strata_world::ChunkCoord;

pub use clock::{DayCycle, TickClock};
pub use gate::{GenRequest, GenState, GenerationGate};
pub use hooks::{TickContext, WorldHooks, falling_step};
pub use scheduler::{SchedulerConfig, SchedulerEvent, SchedulerStats, UpdateScheduler};

#[derive(Clone)]
pub struct GenJob {
    pub coord: ChunkCoord,
    /// World epoch the job belongs to; results from an older epoch are dropped.
    pub epoch: u64,
    pub hooks: Arc<dyn WorldHooks>,
    pub reg: Arc<BlockRegistry>,
}

pub struct GenOut {
    pub coord: ChunkCoord,
    pub epoch: u64,
    pub chunk: Chunk,
    pub occupancy: ChunkOccupancy,
    pub t_gen_ms: u32,
}

#[derive(Clone)]
pub struct MeshJob {
    pub coord: ChunkCoord,
    pub epoch: u64,
    /// Edit revision the snapshot was taken at.
    pub rev: u64,
    pub neighborhood: MeshNeighborhood,
    pub reg: Arc<BlockRegistry>,
}

pub struct MeshOut {
    pub coord: ChunkCoord,
    pub epoch: u64,
    pub rev: u64,
    pub mesh: ChunkMeshCPU,
    pub t_mesh_ms: u32,
}

fn elapsed_ms(start: Instant) -> u32 {
    start.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

fn process_gen_job(job: GenJob) -> GenOut {
    let GenJob {
        coord,
        epoch,
        hooks,
        reg,
    } = job;
    let t0 = Instant::now();
    let mut chunk = Chunk::new(coord);
    let occupancy = hooks.generate_voxels(&mut chunk, &reg);
    GenOut {
        coord,
        epoch,
        chunk,
        occupancy,
        t_gen_ms: elapsed_ms(t0),
    }
}

fn process_mesh_job(job: MeshJob) -> MeshOut {
    let t0 = Instant::now();
    let mesh = build_chunk_mesh(&job.neighborhood, job.coord, &job.reg);
    MeshOut {
        coord: job.coord,
        epoch: job.epoch,
        rev: job.rev,
        mesh,
        t_mesh_ms: elapsed_ms(t0),
    }
}

struct Lane<J, O> {
    tx: Sender<J>,
    rx: Receiver<O>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    _pool: Arc<ThreadPool>,
}

impl<J: Send + 'static, O: Send + 'static> Lane<J, O> {
    fn spawn(name: &'static str, workers: usize, work: fn(J) -> O) -> Self {
        let (tx, job_rx) = unbounded::<J>();
        let (res_tx, rx) = unbounded::<O>();
        let queued = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(move |i| format!("strata-{name}-{i}"))
                .build()
                .expect("worker pool"),
        );
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let res_tx = res_tx.clone();
            let queued = queued.clone();
            let inflight = inflight.clone();
            pool.spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    queued.fetch_sub(1, Ordering::Relaxed);
                    inflight.fetch_add(1, Ordering::Relaxed);
                    let out = work(job);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                    if res_tx.send(out).is_err() {
                        break;
                    }
                }
            });
        }
        Self {
            tx,
            rx,
            queued,
            inflight,
            _pool: pool,
        }
    }

    fn submit(&self, job: J) {
        self.queued.fetch_add(1, Ordering::Relaxed);
        if self.tx.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
        }
    }

    fn drain(&self) -> Vec<O> {
        self.rx.try_iter().collect()
    }

    fn counts(&self) -> (usize, usize) {
        (
            self.queued.load(Ordering::Relaxed),
            self.inflight.load(Ordering::Relaxed),
        )
    }
}

/// Two worker lanes: terrain fill and mesh build.
pub struct Runtime {
    gen_lane: Lane<GenJob, GenOut>,
    mesh_lane: Lane<MeshJob, MeshOut>,
    pub w_gen: usize,
    pub w_mesh: usize,
}

impl Runtime {
    pub fn new() -> Self {
        let worker_count: usize = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        let w_mesh = (worker_count / 2).max(1);
        let w_gen = worker_count.saturating_sub(w_mesh).max(1);
        Self::with_workers(w_gen, w_mesh)
    }

    pub fn with_workers(w_gen: usize, w_mesh: usize) -> Self {
        let (w_gen, w_mesh) = (w_gen.max(1), w_mesh.max(1));
        log::debug!("runtime workers gen={} mesh={}", w_gen, w_mesh);
        Self {
            gen_lane: Lane::spawn("gen", w_gen, process_gen_job),
            mesh_lane: Lane::spawn("mesh", w_mesh, process_mesh_job),
            w_gen,
            w_mesh,
        }
    }

    pub fn submit_gen_job(&self, job: GenJob) {
        self.gen_lane.submit(job);
    }

    pub fn submit_mesh_job(&self, job: MeshJob) {
        self.mesh_lane.submit(job);
    }

    pub fn drain_gen_results(&self) -> Vec<GenOut> {
        self.gen_lane.drain()
    }

    pub fn drain_mesh_results(&self) -> Vec<MeshOut> {
        self.mesh_lane.drain()
    }

    /// `(gen queued, gen in flight, mesh queued, mesh in flight)`.
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        let (qg, ig) = self.gen_lane.counts();
        let (qm, im) = self.mesh_lane.counts();
        (qg, ig, qm, im)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
