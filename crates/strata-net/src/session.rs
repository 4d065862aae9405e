use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};
use strata_edit::VoxelDelta;
use strata_world::ChunkCoord;

use crate::NetEvent;
use crate::authority::PeerId;
use crate::message::{ChunkSnapshot, Message};
use crate::time_sync::TimeSync;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeedState {
    AwaitingSeed,
    /// Seed known, map being generated.
    Building(i32),
    Ready(i32),
}

/// Work the session asks its host to carry out.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    /// Rebuild the world from `seed`, then call [`SyncSession::map_ready`].
    Regenerate { seed: i32 },
    ApplyDelta(VoxelDelta),
    ApplySnapshot(ChunkSnapshot),
    SetTime(f32),
    /// Became owner with no map: generate from the local seed, call
    /// [`SyncSession::map_ready`], then publish every chunk and the seed.
    GenerateAndPublish,
    /// Send join catch-up (snapshots, seed, time) to `peer`.
    Welcome(PeerId),
    /// `peer` moved; send it the chunks [`SyncSession::chunks_to_send`] picks.
    CatchUp(PeerId),
}

#[derive(Clone, Debug)]
enum Pending {
    Delta(VoxelDelta),
    Chunk { from: PeerId, snap: ChunkSnapshot },
}

/// Protocol state for one peer.
///
/// Deltas and snapshots that arrive before the map for the current seed is
/// ready are buffered in arrival order and replayed by `map_ready`.
/// Snapshots that arrive while no owner is known are buffered with their
/// sender and replayed once that sender is confirmed as owner.
pub struct SyncSession {
    local: PeerId,
    owner: Option<PeerId>,
    seed_state: SeedState,
    pending: VecDeque<Pending>,
    pending_limit: usize,
    render_distance: i32,
    sent: HashMap<PeerId, HashSet<ChunkCoord>>,
    peer_chunks: HashMap<PeerId, ChunkCoord>,
    time: TimeSync,
}

impl SyncSession {
    pub fn new(local: PeerId, render_distance: i32, pending_limit: usize, time_threshold: f32) -> Self {
        Self {
            local,
            owner: None,
            seed_state: SeedState::AwaitingSeed,
            pending: VecDeque::new(),
            pending_limit: pending_limit.max(1),
            render_distance,
            sent: HashMap::new(),
            peer_chunks: HashMap::new(),
            time: TimeSync::new(time_threshold),
        }
    }

    pub fn local_id(&self) -> PeerId {
        self.local
    }

    pub fn owner(&self) -> Option<PeerId> {
        self.owner
    }

    pub fn is_owner(&self) -> bool {
        self.owner == Some(self.local)
    }

    pub fn seed_state(&self) -> SeedState {
        self.seed_state
    }

    pub fn has_map(&self) -> bool {
        matches!(self.seed_state, SeedState::Ready(_))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Marks a locally started generation from `seed`.
    pub fn begin_local_map(&mut self, seed: i32) {
        self.seed_state = SeedState::Building(seed);
    }

    /// The map for the current seed is generated. Returns the buffered
    /// remote edits to apply, in arrival order.
    pub fn map_ready(&mut self) -> Vec<SessionAction> {
        match self.seed_state {
            SeedState::Building(seed) => self.seed_state = SeedState::Ready(seed),
            SeedState::Ready(_) => {}
            SeedState::AwaitingSeed => return Vec::new(),
        }
        self.replay()
    }

    /// Drains the buffer. Snapshots from a sender that is not the owner are
    /// dropped, or kept while the owner is still unknown.
    fn replay(&mut self) -> Vec<SessionAction> {
        if !self.pending.is_empty() {
            log::debug!(target: "net", "replaying {} buffered messages", self.pending.len());
        }
        let mut out = Vec::with_capacity(self.pending.len());
        let mut kept = VecDeque::new();
        for p in std::mem::take(&mut self.pending) {
            match p {
                Pending::Delta(d) => out.push(SessionAction::ApplyDelta(d)),
                Pending::Chunk { from, snap } if Some(from) == self.owner => {
                    out.push(SessionAction::ApplySnapshot(snap));
                }
                Pending::Chunk { from, snap } if self.owner.is_none() => {
                    kept.push_back(Pending::Chunk { from, snap });
                }
                Pending::Chunk { from, .. } => {
                    log::warn!(target: "net", "dropping buffered snapshot from non-owner {}", from);
                }
            }
        }
        self.pending = kept;
        out
    }

    fn buffer(&mut self, p: Pending) {
        if self.pending.len() >= self.pending_limit {
            self.pending.pop_front();
            log::warn!(
                target: "net",
                "pending buffer full ({}), dropping oldest",
                self.pending_limit
            );
        }
        self.pending.push_back(p);
    }

    pub fn handle(&mut self, event: NetEvent) -> Vec<SessionAction> {
        match event {
            NetEvent::OwnerChanged(owner) => self.on_owner_changed(owner),
            NetEvent::Joined(peer) => {
                log::info!(target: "net", "peer {} joined", peer);
                if self.is_owner() && self.has_map() {
                    vec![SessionAction::Welcome(peer)]
                } else {
                    Vec::new()
                }
            }
            NetEvent::Left(peer) => {
                log::info!(target: "net", "peer {} left", peer);
                self.sent.remove(&peer);
                self.peer_chunks.remove(&peer);
                Vec::new()
            }
            NetEvent::Moved { peer, chunk } => {
                let moved = self.peer_chunks.insert(peer, chunk) != Some(chunk);
                if moved && self.is_owner() && self.has_map() {
                    vec![SessionAction::CatchUp(peer)]
                } else {
                    Vec::new()
                }
            }
            NetEvent::Message { from, msg } => self.on_message(from, msg),
        }
    }

    fn on_owner_changed(&mut self, owner: Option<PeerId>) -> Vec<SessionAction> {
        let was_owner = self.is_owner();
        self.owner = owner;
        if self.is_owner() && !was_owner {
            log::info!(target: "net", "peer {} is now owner", self.local);
            self.time.reset();
            if self.seed_state == SeedState::AwaitingSeed {
                return vec![SessionAction::GenerateAndPublish];
            }
        }
        if owner.is_some() && self.has_map() && !self.pending.is_empty() {
            return self.replay();
        }
        Vec::new()
    }

    fn on_message(&mut self, from: PeerId, msg: Message) -> Vec<SessionAction> {
        match msg {
            Message::Seed(m) => {
                if self.is_owner() {
                    log::debug!(target: "net", "owner ignoring seed from {}", from);
                    return Vec::new();
                }
                match self.seed_state {
                    SeedState::Building(s) | SeedState::Ready(s) if s == m.seed => {
                        log::debug!(target: "net", "seed {} already applied", m.seed);
                        Vec::new()
                    }
                    _ => {
                        log::info!(target: "net", "seed {} from {}", m.seed, from);
                        self.seed_state = SeedState::Building(m.seed);
                        vec![SessionAction::Regenerate { seed: m.seed }]
                    }
                }
            }
            Message::Voxel(delta) => {
                if self.has_map() {
                    vec![SessionAction::ApplyDelta(delta)]
                } else {
                    self.buffer(Pending::Delta(delta));
                    Vec::new()
                }
            }
            Message::Chunk(snap) => {
                let Some(owner) = self.owner else {
                    log::debug!(target: "net", "owner unknown, holding snapshot from {}", from);
                    self.buffer(Pending::Chunk { from, snap });
                    return Vec::new();
                };
                if from != owner {
                    log::warn!(target: "net", "ignoring snapshot from non-owner {}", from);
                    return Vec::new();
                }
                log::debug!(
                    target: "net",
                    "snapshot ({},{},{}) from {}",
                    snap.pos.x,
                    snap.pos.y,
                    snap.pos.z,
                    from
                );
                if self.has_map() {
                    vec![SessionAction::ApplySnapshot(snap)]
                } else {
                    self.buffer(Pending::Chunk { from, snap });
                    Vec::new()
                }
            }
            Message::Time(t) => {
                if Some(from) != self.owner {
                    log::debug!(target: "net", "ignoring time from non-owner {}", from);
                    return Vec::new();
                }
                vec![SessionAction::SetTime(t.angle)]
            }
        }
    }

    /// Chunks `peer` should receive given what is loaded, by horizontal
    /// distance from its last reported chunk. Records them as sent and
    /// forgets chunks that fell out of range.
    pub fn chunks_to_send(&mut self, peer: PeerId, loaded: &[ChunkCoord]) -> Vec<ChunkCoord> {
        let center = self.peer_chunks.get(&peer).copied().unwrap_or_default();
        let rd = i64::from(self.render_distance);
        let sent = self.sent.entry(peer).or_default();
        let mut out = Vec::new();
        for &c in loaded {
            let dx = i64::from(c.cx - center.cx);
            let dz = i64::from(c.cz - center.cz);
            if dx * dx + dz * dz <= rd * rd {
                if sent.insert(c) {
                    out.push(c);
                }
            } else {
                sent.remove(&c);
            }
        }
        out
    }

    /// Owner-side: whether `angle` should be broadcast now.
    pub fn time_to_send(&mut self, angle: f32) -> bool {
        self.is_owner() && self.time.should_send(angle)
    }
}
