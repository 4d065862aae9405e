use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use hashbrown::HashMap;
use strata_world::ChunkCoord;

use crate::authority::{Authority, PeerId};
use crate::codec::{ProtocolError, decode, encode};
use crate::message::Message;
use crate::{NetEvent, Transport};

enum Inbound {
    Event(NetEvent),
    Frame { from: PeerId, bytes: Vec<u8> },
}

#[derive(Default)]
struct HubState {
    authority: Authority,
    inboxes: HashMap<PeerId, VecDeque<Inbound>>,
    next_id: PeerId,
}

impl HubState {
    fn push(&mut self, to: PeerId, item: Inbound) {
        if let Some(inbox) = self.inboxes.get_mut(&to) {
            inbox.push_back(item);
        }
    }

    fn broadcast_event(&mut self, except: Option<PeerId>, event: NetEvent) {
        for (&id, inbox) in self.inboxes.iter_mut() {
            if Some(id) != except {
                inbox.push_back(Inbound::Event(event.clone()));
            }
        }
    }

    fn owner_changed(&mut self) {
        let owner = self.authority.owner();
        self.broadcast_event(None, NetEvent::OwnerChanged(owner));
    }
}

/// In-process room. Every message goes through the wire codec so peers
/// see exactly what a socket would carry.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

fn lock(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins a new peer. Existing peers see `Joined`.
    pub fn connect(&self) -> LoopbackTransport {
        let mut st = lock(&self.state);
        st.next_id += 1;
        let id = st.next_id;
        st.authority.join(id);
        st.broadcast_event(None, NetEvent::Joined(id));
        st.inboxes.insert(id, VecDeque::new());
        log::info!(target: "net", "peer {} connected", id);
        LoopbackTransport {
            id,
            state: Arc::clone(&self.state),
        }
    }

    pub fn owner(&self) -> Option<PeerId> {
        lock(&self.state).authority.owner()
    }

    pub fn peers(&self) -> Vec<PeerId> {
        lock(&self.state).authority.members().to_vec()
    }
}

/// One peer's end of a [`LoopbackHub`]. Dropping it leaves the room.
pub struct LoopbackTransport {
    id: PeerId,
    state: Arc<Mutex<HubState>>,
}

impl Transport for LoopbackTransport {
    fn local_id(&self) -> PeerId {
        self.id
    }

    fn send(&mut self, msg: &Message, targets: Option<&[PeerId]>) -> Result<(), ProtocolError> {
        let bytes = encode(msg)?;
        let mut st = lock(&self.state);
        let to: Vec<PeerId> = match targets {
            Some(t) => t.iter().copied().filter(|&p| p != self.id).collect(),
            None => st.inboxes.keys().copied().filter(|&p| p != self.id).collect(),
        };
        for peer in to {
            st.push(
                peer,
                Inbound::Frame {
                    from: self.id,
                    bytes: bytes.clone(),
                },
            );
        }
        Ok(())
    }

    fn poll(&mut self) -> Vec<NetEvent> {
        let items: Vec<Inbound> = {
            let mut st = lock(&self.state);
            match st.inboxes.get_mut(&self.id) {
                Some(inbox) => inbox.drain(..).collect(),
                None => return Vec::new(),
            }
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Inbound::Event(e) => out.push(e),
                Inbound::Frame { from, bytes } => match decode(&bytes) {
                    Ok(msg) => out.push(NetEvent::Message { from, msg }),
                    Err(e) => log::warn!(target: "net", "dropping frame from {}: {}", from, e),
                },
            }
        }
        out
    }

    fn request_ownership(&mut self) {
        let mut st = lock(&self.state);
        if st.authority.request(self.id) {
            st.owner_changed();
        } else {
            let owner = st.authority.owner();
            st.push(self.id, Inbound::Event(NetEvent::OwnerChanged(owner)));
        }
    }

    fn transfer_ownership(&mut self, to: PeerId) -> bool {
        let mut st = lock(&self.state);
        if !st.authority.transfer(self.id, to) {
            return false;
        }
        st.owner_changed();
        true
    }

    fn report_position(&mut self, chunk: ChunkCoord) {
        let mut st = lock(&self.state);
        st.broadcast_event(Some(self.id), NetEvent::Moved { peer: self.id, chunk });
    }
}

impl Drop for LoopbackTransport {
    fn drop(&mut self) {
        let mut st = lock(&self.state);
        st.inboxes.remove(&self.id);
        let changed = st.authority.leave(self.id);
        st.broadcast_event(None, NetEvent::Left(self.id));
        if changed.is_some() {
            st.owner_changed();
        }
        log::info!(target: "net", "peer {} disconnected", self.id);
    }
}
