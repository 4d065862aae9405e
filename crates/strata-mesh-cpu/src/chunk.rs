use hashbrown::HashMap;
use strata_blocks::{BlockId, MaterialId};
use strata_geom::Aabb;
use strata_world::ChunkCoord;

use crate::mesh_build::ChunkVertex;

/// Contiguous index range drawn with one block type's material.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SubMesh {
    pub block: BlockId,
    pub material: MaterialId,
    pub start: u32,
    pub count: u32,
}

/// Welded triangle soup for the physics backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollisionMesh {
    pub positions: Vec<[f32; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl CollisionMesh {
    /// Welds identical positions and keeps every render triangle.
    pub fn bake(vertices: &[ChunkVertex], indices: &[u32]) -> Self {
        let mut remap: HashMap<[u32; 3], u32> = HashMap::with_capacity(vertices.len() / 2);
        let mut positions = Vec::new();
        let welded: Vec<u32> = vertices
            .iter()
            .map(|v| {
                let key = v.position.map(f32::to_bits);
                *remap.entry(key).or_insert_with(|| {
                    positions.push(v.position);
                    (positions.len() - 1) as u32
                })
            })
            .collect();
        let triangles = indices
            .chunks_exact(3)
            .map(|t| [welded[t[0] as usize], welded[t[1] as usize], welded[t[2] as usize]])
            .collect();
        Self {
            positions,
            triangles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// CPU-side mesh for one chunk. An empty mesh means no geometry and no collision.
#[derive(Clone, Debug)]
pub struct ChunkMeshCPU {
    pub coord: ChunkCoord,
    /// Chunk-local bounds of the emitted vertices.
    pub bbox: Aabb,
    pub vertices: Vec<ChunkVertex>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
    pub collision: CollisionMesh,
}

impl ChunkMeshCPU {
    pub fn empty(coord: ChunkCoord) -> Self {
        Self {
            coord,
            bbox: Aabb::default(),
            vertices: Vec::new(),
            indices: Vec::new(),
            submeshes: Vec::new(),
            collision: CollisionMesh::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }
}
