use std::cell::Cell;
use std::time::Instant;

use strata_blocks::BlockRegistry;
use strata_geom::{Aabb, IVec3, Vec3};
use strata_world::{CHUNK_SIZE, ChunkCoord};

use crate::chunk::{ChunkMeshCPU, CollisionMesh, SubMesh};
use crate::face::Face;
use crate::mesh_build::MeshBuild;
use crate::neighbors::VoxelAccess;

thread_local! {
    static LAST_MESH_RESERVE: Cell<usize> = const { Cell::new(64) };
}

fn elapsed_ms(start: Instant) -> u32 {
    start.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

/// Emits one quad per visible face of every active voxel in `coord`.
///
/// A face is visible when the neighbor cell is unloaded, inactive, or on a
/// different render layer. Vertex color is the published light of that
/// neighbor cell. Positions are chunk-local; the caller places the mesh at
/// `coord.origin()`.
pub fn build_chunk_mesh<A: VoxelAccess + ?Sized>(
    access: &A,
    coord: ChunkCoord,
    reg: &BlockRegistry,
) -> ChunkMeshCPU {
    let t0 = Instant::now();
    let origin = coord.origin();
    let mut mb = MeshBuild::default();
    mb.reserve_quads(LAST_MESH_RESERVE.with(Cell::get));

    for z in 0..CHUNK_SIZE {
        for y in 0..CHUNK_SIZE {
            for x in 0..CHUNK_SIZE {
                let p = origin + IVec3::new(x, y, z);
                let Some(v) = access.voxel(p) else { continue };
                if !v.is_active() {
                    continue;
                }
                for face in Face::ALL {
                    let n = p + face.delta();
                    if !access.is_face_visible(n, v.layer) {
                        continue;
                    }
                    mb.add_face(face, x, y, z, v.id, access.visible_light(n));
                }
            }
        }
    }

    LAST_MESH_RESERVE.with(|c| c.set(mb.quad_count().max(64)));
    if mb.vertices.is_empty() {
        return ChunkMeshCPU::empty(coord);
    }

    let mut indices = Vec::with_capacity(mb.quad_count() * 6);
    let mut submeshes = Vec::with_capacity(mb.runs.len());
    for (&block, run) in &mb.runs {
        if run.is_empty() {
            continue;
        }
        submeshes.push(SubMesh {
            block,
            material: reg.material_of(block),
            start: indices.len() as u32,
            count: run.len() as u32,
        });
        indices.extend_from_slice(run);
    }

    let bbox = Aabb::from_points(
        mb.vertices
            .iter()
            .map(|v| Vec3::new(v.position[0], v.position[1], v.position[2])),
    )
    .unwrap_or_default();
    let collision = CollisionMesh::bake(&mb.vertices, &indices);

    log::debug!(
        target: "perf",
        "mesh c=({},{},{}) quads={} submeshes={} ms={}",
        coord.cx,
        coord.cy,
        coord.cz,
        mb.quad_count(),
        submeshes.len(),
        elapsed_ms(t0)
    );

    ChunkMeshCPU {
        coord,
        bbox,
        vertices: mb.vertices,
        indices,
        submeshes,
        collision,
    }
}
