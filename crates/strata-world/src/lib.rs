//! Chunk coordinate math, terrain sampling, and worldgen parameters.
#![forbid(unsafe_code)]

pub mod coord;
pub mod terrain;
pub mod worldgen;

pub use coord::{
    CHUNK_SIZE, CHUNK_VOLUME, ChunkCoord, floor_chunk_coord, local_index,
    local_of, local_pos_of_index,
};
pub use terrain::{NoiseTerrain, TerrainSource};
pub use worldgen::WorldGenConfig;
