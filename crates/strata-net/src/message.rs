use serde::{Deserialize, Serialize};
use strata_edit::VoxelDelta;
use strata_geom::IVec3;

pub const SEED_MESSAGE_ID: u16 = 5134;
pub const VOXEL_MESSAGE_ID: u16 = 5135;
pub const CHUNK_MESSAGE_ID: u16 = 5136;
pub const TIME_MESSAGE_ID: u16 = 5137;

/// Key of the shared world object peers contend ownership for.
pub const OWNERSHIP_KEY: &str = "voxel-world";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedMsg {
    pub seed: i32,
}

/// Day/night angle in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeMsg {
    pub angle: f32,
}

/// Every block id of one chunk, in local index order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSnapshot {
    /// Chunk coordinate, not a world position.
    pub pos: IVec3,
    pub block_ids: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Seed(SeedMsg),
    Voxel(VoxelDelta),
    Chunk(ChunkSnapshot),
    Time(TimeMsg),
}

impl Message {
    pub fn id(&self) -> u16 {
        match self {
            Message::Seed(_) => SEED_MESSAGE_ID,
            Message::Voxel(_) => VOXEL_MESSAGE_ID,
            Message::Chunk(_) => CHUNK_MESSAGE_ID,
            Message::Time(_) => TIME_MESSAGE_ID,
        }
    }
}
