use std::collections::BTreeMap;

use strata_blocks::{BlockId, Rgba};

use crate::face::Face;

/// One interleaved vertex, in chunk-local space.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ChunkVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub color: [u8; 4],
    pub uv: [f32; 2],
}

/// Accumulates quads with one index run per block type.
#[derive(Default, Clone)]
pub struct MeshBuild {
    pub vertices: Vec<ChunkVertex>,
    // BTreeMap so submesh order is stable across rebuilds.
    pub runs: BTreeMap<BlockId, Vec<u32>>,
}

impl MeshBuild {
    /// Clears all arrays but retains capacity for reuse.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.vertices.clear();
        for run in self.runs.values_mut() {
            run.clear();
        }
    }

    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.vertices.reserve(n_quads * 4);
    }

    /// Appends one face of the voxel whose min corner is `(x, y, z)`.
    pub fn add_face(&mut self, face: Face, x: i32, y: i32, z: i32, block: BlockId, light: Rgba) {
        let base = self.vertices.len() as u32;
        let n = face.normal();
        let (ox, oy, oz) = (x as f32, y as f32, z as f32);
        for (corner, uv) in face.corners().iter().zip(face.uvs()) {
            self.vertices.push(ChunkVertex {
                position: [ox + corner[0], oy + corner[1], oz + corner[2]],
                normal: [n.x, n.y, n.z],
                tangent: face.tangent(),
                color: light.to_array(),
                uv: *uv,
            });
        }
        self.runs.entry(block).or_default().extend_from_slice(&[
            base,
            base + 1,
            base + 2,
            base,
            base + 2,
            base + 3,
        ]);
    }

    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }
}
