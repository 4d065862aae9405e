use std::sync::Arc;

use strata_blocks::{BlockId, BlockRegistry};
use strata_geom::IVec3;
use strata_net::{
    ChunkSnapshot, Message, PeerId, SeedMsg, SessionAction, SyncSession, TimeMsg, Transport,
};
use strata_runtime::{DayCycle, GenRequest, SchedulerEvent, UpdateScheduler, WorldHooks};
use strata_structures::StructureDef;
use strata_world::ChunkCoord;

use crate::config::{ConfigError, StrataConfig};
use crate::mode::TerrainMode;

/// One participant: a transport, its sync session and a local world.
pub struct Peer<T: Transport> {
    transport: T,
    session: SyncSession,
    scheduler: UpdateScheduler,
    day: DayCycle,
    cfg: StrataConfig,
    structures: Arc<[StructureDef]>,
    seed: i32,
    center: ChunkCoord,
    // Broadcast every chunk and the seed once the current map is ready.
    publish_on_ready: bool,
}

impl<T: Transport> Peer<T> {
    /// Joins with `local_seed`, used only if this peer ends up generating
    /// the world itself.
    pub fn new(
        mut transport: T,
        reg: Arc<BlockRegistry>,
        structures: Arc<[StructureDef]>,
        cfg: StrataConfig,
        local_seed: i32,
    ) -> Result<Self, ConfigError> {
        let hooks = TerrainMode::new(local_seed, &cfg.terrain, &reg, structures.clone())?;
        let scheduler = UpdateScheduler::new(reg, Arc::new(hooks), cfg.scheduler_config());
        let session = SyncSession::new(
            transport.local_id(),
            cfg.world.render_distance,
            cfg.sync.pending_limit,
            cfg.sync.time_send_threshold,
        );
        transport.request_ownership();
        Ok(Self {
            transport,
            session,
            scheduler,
            day: DayCycle::new(cfg.sync.time_speed, cfg.sync.min_ambient),
            cfg,
            structures,
            seed: local_seed,
            center: ChunkCoord::default(),
            publish_on_ready: false,
        })
    }

    pub fn id(&self) -> PeerId {
        self.transport.local_id()
    }

    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut UpdateScheduler {
        &mut self.scheduler
    }

    pub fn day(&self) -> &DayCycle {
        &self.day
    }

    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// One frame: network input, world update, then outgoing time sync.
    pub fn frame(&mut self, dt: f32) {
        for event in self.transport.poll() {
            for action in self.session.handle(event) {
                self.perform(action);
            }
        }
        self.scheduler.update(dt);
        for event in self.scheduler.drain_events() {
            match event {
                SchedulerEvent::GenerationFinished { .. } => self.on_map_ready(),
            }
        }
        // Meshes are consumed by a renderer; headless peers drop them.
        self.scheduler.drain_mesh_updates();

        self.day.advance(dt);
        let angle = self.day.angle();
        if self.session.time_to_send(angle) {
            self.send(&Message::Time(TimeMsg { angle }), None);
        }
    }

    pub fn is_settled(&self) -> bool {
        self.session.has_map() && self.scheduler.is_settled()
    }

    /// Removes the voxel at `pos` locally and tells the other peers.
    pub fn destroy(&mut self, pos: IVec3) -> bool {
        match self.scheduler.destroy_voxel(pos) {
            Some(delta) => {
                self.send(&Message::Voxel(delta), None);
                true
            }
            None => false,
        }
    }

    pub fn place(&mut self, pos: IVec3, id: BlockId) -> bool {
        match self.scheduler.place_voxel(pos, id) {
            Some(delta) => {
                self.send(&Message::Voxel(delta), None);
                true
            }
            None => false,
        }
    }

    /// Recenters on `chunk`: extends the local world and reports the move.
    pub fn move_to(&mut self, chunk: ChunkCoord) {
        if chunk == self.center {
            return;
        }
        self.center = chunk;
        self.transport.report_position(chunk);
        if self.session.has_map() {
            let decision = self.scheduler.request_generation(chunk.with_y(0));
            log::debug!("recentered on ({},{}): {:?}", chunk.cx, chunk.cz, decision);
        }
    }

    fn send(&mut self, msg: &Message, targets: Option<&[PeerId]>) {
        if let Err(e) = self.transport.send(msg, targets) {
            log::warn!(target: "net", "send {} failed: {}", msg.id(), e);
        }
    }

    fn perform(&mut self, action: SessionAction) {
        match action {
            SessionAction::Regenerate { seed } => self.rebuild(seed),
            SessionAction::GenerateAndPublish => {
                self.session.begin_local_map(self.seed);
                self.publish_on_ready = true;
                self.rebuild(self.seed);
            }
            SessionAction::ApplyDelta(delta) => {
                self.scheduler.apply_remote_delta(delta);
            }
            SessionAction::ApplySnapshot(snap) => {
                let c = ChunkCoord::new(snap.pos.x, snap.pos.y, snap.pos.z);
                self.scheduler.apply_chunk_snapshot(c, &snap.block_ids);
            }
            SessionAction::SetTime(angle) => self.day.set_angle(angle),
            SessionAction::Welcome(peer) => {
                self.send_catch_up(peer);
                let seed = self.seed;
                let angle = self.day.angle();
                self.send(&Message::Seed(SeedMsg { seed }), Some(&[peer]));
                self.send(&Message::Time(TimeMsg { angle }), Some(&[peer]));
            }
            SessionAction::CatchUp(peer) => self.send_catch_up(peer),
        }
    }

    fn rebuild(&mut self, seed: i32) {
        let hooks: Arc<dyn WorldHooks> = match TerrainMode::new(
            seed,
            &self.cfg.terrain,
            self.scheduler.registry(),
            self.structures.clone(),
        ) {
            Ok(mode) => Arc::new(mode),
            Err(e) => {
                log::warn!("cannot build world for seed {}: {}", seed, e);
                return;
            }
        };
        self.seed = seed;
        self.scheduler.reset_world(hooks);
        if self.scheduler.request_generation(self.center.with_y(0)) != GenRequest::Start {
            log::warn!("generation for seed {} did not start", seed);
        }
    }

    fn on_map_ready(&mut self) {
        for action in self.session.map_ready() {
            self.perform(action);
        }
        if !std::mem::take(&mut self.publish_on_ready) {
            return;
        }
        let loaded = self.scheduler.loaded_chunks();
        log::info!(target: "net", "publishing {} chunks, seed {}", loaded.len(), self.seed);
        for c in loaded {
            self.send_snapshot(c, None);
        }
        let seed = self.seed;
        self.send(&Message::Seed(SeedMsg { seed }), None);
    }

    fn send_catch_up(&mut self, peer: PeerId) {
        let loaded = self.scheduler.loaded_chunks();
        let chunks = self.session.chunks_to_send(peer, &loaded);
        log::debug!(target: "net", "catch-up for {}: {} chunks", peer, chunks.len());
        for c in chunks {
            self.send_snapshot(c, Some(&[peer]));
        }
    }

    fn send_snapshot(&mut self, c: ChunkCoord, targets: Option<&[PeerId]>) {
        let Some(block_ids) = self.scheduler.chunk_snapshot(c) else {
            return;
        };
        let msg = Message::Chunk(ChunkSnapshot {
            pos: IVec3::new(c.cx, c.cy, c.cz),
            block_ids,
        });
        self.send(&msg, targets);
    }
}
