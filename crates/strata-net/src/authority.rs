pub type PeerId = u16;

/// Ownership of one shared object among connected peers.
///
/// The owner is kept until it leaves or hands off; an election picks the
/// longest-connected peer.
#[derive(Debug, Default, Clone)]
pub struct Authority {
    // Connection order, oldest first.
    members: Vec<PeerId>,
    owner: Option<PeerId>,
}

impl Authority {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(&self) -> Option<PeerId> {
        self.owner
    }

    pub fn members(&self) -> &[PeerId] {
        &self.members
    }

    pub fn join(&mut self, peer: PeerId) {
        if !self.members.contains(&peer) {
            self.members.push(peer);
        }
    }

    /// Removes `peer`; re-elects when it was the owner. Returns the new owner
    /// when ownership changed.
    pub fn leave(&mut self, peer: PeerId) -> Option<Option<PeerId>> {
        self.members.retain(|m| *m != peer);
        if self.owner != Some(peer) {
            return None;
        }
        self.owner = None;
        self.elect();
        log::info!(target: "net", "owner {} left, new owner {:?}", peer, self.owner);
        Some(self.owner)
    }

    /// Current owner as seen by `peer`, electing one if there is none.
    /// Returns whether the owner changed.
    pub fn request(&mut self, peer: PeerId) -> bool {
        if !self.members.contains(&peer) {
            return false;
        }
        if self.owner.is_some() {
            return false;
        }
        self.elect();
        log::info!(target: "net", "owner elected: {:?}", self.owner);
        true
    }

    /// Explicit hand-off; only the owner can give ownership away.
    pub fn transfer(&mut self, from: PeerId, to: PeerId) -> bool {
        if self.owner != Some(from) || !self.members.contains(&to) {
            return false;
        }
        self.owner = Some(to);
        log::info!(target: "net", "ownership transferred {} -> {}", from, to);
        true
    }

    fn elect(&mut self) {
        self.owner = self.members.first().copied();
    }
}
