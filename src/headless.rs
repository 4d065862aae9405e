use std::sync::Arc;
use std::time::Instant;

use strata_blocks::BlockRegistry;
use strata_geom::IVec3;
use strata_net::{LoopbackHub, LoopbackTransport};
use strata_structures::{StructureDef, export_region};
use strata_world::{CHUNK_SIZE, ChunkCoord};

use crate::config::{ConfigError, StrataConfig};
use crate::peer::Peer;

/// Peers sharing one in-process room, stepped in lockstep.
pub struct LocalRoom {
    hub: LoopbackHub,
    peers: Vec<Peer<LoopbackTransport>>,
}

impl LocalRoom {
    /// Connects `count` peers. Peer `i` carries `seed + i` as its local
    /// seed; every peer still ends up on the first owner's seed.
    pub fn new(
        count: usize,
        cfg: &StrataConfig,
        reg: Arc<BlockRegistry>,
        structures: Arc<[StructureDef]>,
    ) -> Result<Self, ConfigError> {
        let hub = LoopbackHub::new();
        let mut peers = Vec::with_capacity(count);
        for i in 0..count.max(1) {
            let seed = cfg.world.seed.wrapping_add(i as i32);
            peers.push(Peer::new(
                hub.connect(),
                reg.clone(),
                structures.clone(),
                cfg.clone(),
                seed,
            )?);
        }
        Ok(Self { hub, peers })
    }

    pub fn hub(&self) -> &LoopbackHub {
        &self.hub
    }

    pub fn peers(&self) -> &[Peer<LoopbackTransport>] {
        &self.peers
    }

    pub fn peers_mut(&mut self) -> &mut [Peer<LoopbackTransport>] {
        &mut self.peers
    }

    /// Removes peer `index`, disconnecting it from the room.
    pub fn disconnect(&mut self, index: usize) -> Option<Peer<LoopbackTransport>> {
        (index < self.peers.len()).then(|| self.peers.remove(index))
    }

    pub fn step(&mut self, dt: f32) {
        for peer in &mut self.peers {
            peer.frame(dt);
        }
    }

    pub fn run_frames(&mut self, frames: u32, dt: f32) {
        let start = Instant::now();
        for _ in 0..frames {
            self.step(dt);
        }
        log::info!(
            "ran {} frames for {} peers in {}ms",
            frames,
            self.peers.len(),
            start.elapsed().as_millis()
        );
    }

    /// Steps until every peer has a map and nothing is pending, or
    /// `max_frames` have run. Returns whether it settled.
    pub fn run_until_settled(&mut self, dt: f32, max_frames: u32) -> bool {
        for _ in 0..max_frames {
            self.step(dt);
            if self.peers.iter().all(Peer::is_settled) {
                return true;
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        false
    }
}

/// World-space bounds `[min, max)` of every loaded chunk.
pub fn loaded_bounds<T: strata_net::Transport>(peer: &Peer<T>) -> Option<(IVec3, IVec3)> {
    let loaded = peer.scheduler().loaded_chunks();
    let first = *loaded.first()?;
    let (mut lo, mut hi) = (first, first);
    for c in &loaded {
        lo = ChunkCoord::new(lo.cx.min(c.cx), lo.cy.min(c.cy), lo.cz.min(c.cz));
        hi = ChunkCoord::new(hi.cx.max(c.cx), hi.cy.max(c.cy), hi.cz.max(c.cz));
    }
    let max = hi.origin() + IVec3::new(CHUNK_SIZE, CHUNK_SIZE, CHUNK_SIZE);
    Some((lo.origin(), max))
}

/// The peer's whole world in the structure text format.
pub fn export_world<T: strata_net::Transport>(peer: &Peer<T>) -> String {
    match loaded_bounds(peer) {
        Some((min, max)) => export_region(peer.scheduler().store(), min, max),
        None => String::new(),
    }
}
