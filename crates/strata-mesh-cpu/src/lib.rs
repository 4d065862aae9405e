//! CPU surface extraction for voxel chunks.
#![forbid(unsafe_code)]

mod build;
mod chunk;
mod face;
mod mesh_build;
mod neighbors;

pub use build::build_chunk_mesh;
pub use chunk::{ChunkMeshCPU, CollisionMesh, SubMesh};
pub use face::Face;
pub use mesh_build::{ChunkVertex, MeshBuild};
pub use neighbors::{MeshNeighborhood, VoxelAccess};
