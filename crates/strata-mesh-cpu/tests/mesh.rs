use std::sync::Arc;

use strata_blocks::BlockRegistry;
use strata_chunk::VoxelStore;
use strata_geom::IVec3;
use strata_lighting::LightPropagator;
use strata_mesh_cpu::{Face, MeshNeighborhood, build_chunk_mesh};
use strata_world::ChunkCoord;

const ORIGIN: ChunkCoord = ChunkCoord { cx: 0, cy: 0, cz: 0 };

fn store(chunks: &[ChunkCoord]) -> VoxelStore {
    let mut s = VoxelStore::new(Arc::new(BlockRegistry::builtin().unwrap()));
    for c in chunks {
        s.ensure_chunk(*c);
    }
    s
}

fn id(s: &VoxelStore, name: &str) -> u8 {
    s.registry().id_by_name(name).unwrap()
}

#[test]
fn solid_cube_emits_only_its_shell() {
    let mut s = store(&[ORIGIN]);
    let stone = id(&s, "stone");
    for z in 5..8 {
        for y in 5..8 {
            for x in 5..8 {
                assert!(s.set_block(IVec3::new(x, y, z), stone));
            }
        }
    }
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    assert_eq!(mesh.face_count(), 54);
    assert_eq!(mesh.vertices.len(), 216);
    assert_eq!(mesh.indices.len(), 324);
    assert_eq!(mesh.bbox.min.x, 5.0);
    assert_eq!(mesh.bbox.max.y, 8.0);
}

#[test]
fn cube_centered_on_chunk_middle_emits_only_its_shell() {
    let mut s = store(&[ORIGIN]);
    let stone = id(&s, "stone");
    for z in 7..=9 {
        for y in 7..=9 {
            for x in 7..=9 {
                assert!(s.set_block(IVec3::new(x, y, z), stone));
            }
        }
    }
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    assert_eq!(mesh.face_count(), 54);
    assert_eq!(mesh.vertices.len(), 216);
    assert_eq!(mesh.indices.len(), 324);
    assert_eq!(mesh.bbox.min.x, 7.0);
    assert_eq!(mesh.bbox.max.z, 10.0);
    // Only shell corners: nothing lies strictly inside the cube.
    assert!(
        !mesh
            .vertices
            .iter()
            .any(|v| v.position.iter().all(|c| *c == 8.0 || *c == 9.0))
    );
}

#[test]
fn empty_chunk_has_no_geometry() {
    let s = store(&[ORIGIN]);
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    assert!(mesh.is_empty());
    assert!(mesh.indices.is_empty());
    assert!(mesh.submeshes.is_empty());
    assert!(mesh.collision.is_empty());
}

#[test]
fn unloaded_neighbor_counts_as_open() {
    let mut s = store(&[ORIGIN]);
    let stone = id(&s, "stone");
    s.set_block(IVec3::new(15, 0, 0), stone);
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    assert_eq!(mesh.face_count(), 6);
}

#[test]
fn solid_seam_between_loaded_chunks_is_culled() {
    let east = ChunkCoord::new(1, 0, 0);
    let mut s = store(&[ORIGIN, east]);
    let stone = id(&s, "stone");
    s.set_block(IVec3::new(15, 3, 3), stone);
    s.set_block(IVec3::new(16, 3, 3), stone);
    let west_mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    let east_mesh = build_chunk_mesh(&s, east, s.registry());
    assert_eq!(west_mesh.face_count(), 5);
    assert_eq!(east_mesh.face_count(), 5);
    let has_pos_x = west_mesh
        .vertices
        .iter()
        .any(|v| v.normal == [1.0, 0.0, 0.0]);
    assert!(!has_pos_x);
}

#[test]
fn faces_between_layers_are_drawn_both_ways() {
    let mut s = store(&[ORIGIN]);
    let stone = id(&s, "stone");
    let water = id(&s, "water");
    let glass = id(&s, "glass");
    s.set_block(IVec3::new(4, 4, 4), stone);
    s.set_block(IVec3::new(5, 4, 4), water);
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    assert_eq!(mesh.face_count(), 12);

    // Same layer culls.
    s.set_block(IVec3::new(4, 4, 4), glass);
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    assert_eq!(mesh.face_count(), 10);
}

#[test]
fn one_submesh_per_block_type_covering_all_indices() {
    let mut s = store(&[ORIGIN]);
    let stone = id(&s, "stone");
    let dirt = id(&s, "dirt");
    let glass = id(&s, "glass");
    s.set_block(IVec3::new(1, 1, 1), stone);
    s.set_block(IVec3::new(3, 1, 1), dirt);
    s.set_block(IVec3::new(5, 1, 1), glass);
    s.set_block(IVec3::new(7, 1, 1), stone);
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    assert_eq!(mesh.submeshes.len(), 3);
    let mut next = 0;
    for sm in &mesh.submeshes {
        assert_eq!(sm.start, next);
        assert_eq!(sm.material, s.registry().material_of(sm.block));
        next += sm.count;
    }
    assert_eq!(next as usize, mesh.indices.len());
    let stone_run = mesh.submeshes.iter().find(|sm| sm.block == stone).unwrap();
    assert_eq!(stone_run.count, 2 * 6 * 6);
}

#[test]
fn vertex_color_samples_neighbor_light() {
    let mut s = store(&[ORIGIN]);
    let stone = id(&s, "stone");
    let lamp = id(&s, "lamp");
    s.set_block(IVec3::new(4, 4, 4), lamp);
    s.set_block(IVec3::new(6, 4, 4), stone);
    LightPropagator::new().relight(&mut s, ORIGIN, 1);

    let lit = s.visible_light(IVec3::new(5, 4, 4));
    assert!(lit.a > 0);
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    let facing_lamp: Vec<_> = mesh
        .vertices
        .iter()
        .filter(|v| v.normal == [-1.0, 0.0, 0.0] && v.position[0] == 6.0)
        .collect();
    assert_eq!(facing_lamp.len(), 4);
    assert!(facing_lamp.iter().all(|v| v.color == lit.to_array()));
}

#[test]
fn rebuild_is_deterministic() {
    let mut s = store(&[ORIGIN]);
    let stone = id(&s, "stone");
    let grass = id(&s, "grass");
    for x in 0..16 {
        s.set_block(IVec3::new(x, 0, x), stone);
        s.set_block(IVec3::new(x, 1, x), grass);
    }
    let a = build_chunk_mesh(&s, ORIGIN, s.registry());
    let b = build_chunk_mesh(&s, ORIGIN, s.registry());
    assert_eq!(a.vertices, b.vertices);
    assert_eq!(a.indices, b.indices);
    assert_eq!(a.submeshes, b.submeshes);
}

#[test]
fn neighborhood_snapshot_matches_live_store() {
    let east = ChunkCoord::new(1, 0, 0);
    let up = ChunkCoord::new(0, 1, 0);
    let mut s = store(&[ORIGIN, east, up]);
    let stone = id(&s, "stone");
    let lamp = id(&s, "lamp");
    for y in 0..16 {
        s.set_block(IVec3::new(15, y, 8), stone);
        s.set_block(IVec3::new(16, y, 9), stone);
    }
    s.set_block(IVec3::new(8, 15, 8), stone);
    s.set_block(IVec3::new(8, 16, 8), stone);
    s.set_block(IVec3::new(3, 3, 3), lamp);
    LightPropagator::new().relight(&mut s, ORIGIN, 1);

    let snap = MeshNeighborhood::capture(&s, ORIGIN).unwrap();
    let live = build_chunk_mesh(&s, ORIGIN, s.registry());
    let detached = build_chunk_mesh(&snap, ORIGIN, s.registry());
    assert_eq!(live.vertices, detached.vertices);
    assert_eq!(live.indices, detached.indices);
    assert!(MeshNeighborhood::capture(&s, ChunkCoord::new(5, 0, 0)).is_none());
}

#[test]
fn collision_welds_shared_corners() {
    let mut s = store(&[ORIGIN]);
    let stone = id(&s, "stone");
    s.set_block(IVec3::new(2, 2, 2), stone);
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    assert_eq!(mesh.collision.positions.len(), 8);
    assert_eq!(mesh.collision.triangles.len(), 12);
}

#[test]
fn each_face_normal_appears_once_for_a_lone_voxel() {
    let mut s = store(&[ORIGIN]);
    let stone = id(&s, "stone");
    s.set_block(IVec3::new(8, 8, 8), stone);
    let mesh = build_chunk_mesh(&s, ORIGIN, s.registry());
    for face in Face::ALL {
        let n = face.normal();
        let count = mesh
            .vertices
            .iter()
            .filter(|v| v.normal == [n.x, n.y, n.z])
            .count();
        assert_eq!(count, 4, "{face:?}");
    }
}
