//! World sync between peers: wire messages, framing, ownership and the
//! per-peer session state machine.
#![forbid(unsafe_code)]

mod authority;
mod codec;
mod loopback;
mod message;
mod session;
mod time_sync;

pub use authority::{Authority, PeerId};
pub use codec::{FrameBuffer, MAX_FRAME_LEN, ProtocolError, decode, encode, write_frame};
pub use loopback::{LoopbackHub, LoopbackTransport};
pub use message::{
    CHUNK_MESSAGE_ID, ChunkSnapshot, Message, OWNERSHIP_KEY, SEED_MESSAGE_ID, SeedMsg,
    TIME_MESSAGE_ID, TimeMsg, VOXEL_MESSAGE_ID,
};
pub use session::{SeedState, SessionAction, SyncSession};
pub use strata_edit::VoxelDelta;
pub use time_sync::TimeSync;

/// What a transport reports to its owner.
#[derive(Clone, Debug, PartialEq)]
pub enum NetEvent {
    /// Another peer connected.
    Joined(PeerId),
    Left(PeerId),
    /// Current owner of the shared world object.
    OwnerChanged(Option<PeerId>),
    /// A peer's view moved to a new chunk.
    Moved { peer: PeerId, chunk: strata_world::ChunkCoord },
    Message { from: PeerId, msg: Message },
}

/// Reliable, ordered message delivery between peers.
pub trait Transport {
    fn local_id(&self) -> PeerId;

    /// Sends to `targets`, or to every other peer when `None`.
    fn send(&mut self, msg: &Message, targets: Option<&[PeerId]>) -> Result<(), ProtocolError>;

    fn poll(&mut self) -> Vec<NetEvent>;

    /// Asks for the current owner; one is elected when there is none.
    fn request_ownership(&mut self);

    /// Hands ownership to `to`. Only the current owner may do this.
    fn transfer_ownership(&mut self, to: PeerId) -> bool;

    /// Publishes the chunk this peer is centered on.
    fn report_position(&mut self, chunk: strata_world::ChunkCoord);
}
