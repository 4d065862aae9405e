//! Voxel records, chunk storage and the chunk map.
#![forbid(unsafe_code)]

mod chunk;
mod fill;
mod store;
mod voxel;

pub use chunk::{Chunk, ChunkOccupancy, DIRTY_MAX};
pub use fill::{TerrainFill, fill_chunk};
pub use store::{VoxelStore, decorate_voxel};
pub use voxel::{BehaviorState, Voxel};
