use std::sync::Arc;

use proptest::prelude::*;
use strata_blocks::BlockRegistry;
use strata_chunk::{Voxel, VoxelStore};
use strata_geom::IVec3;
use strata_world::{CHUNK_SIZE, ChunkCoord, floor_chunk_coord};

fn stone_registry() -> Arc<BlockRegistry> {
    Arc::new(
        BlockRegistry::from_toml_str(
            "[[blocks]]\nid = 1\nname = \"stone\"\ncolor = \"808080\"\n",
        )
        .unwrap(),
    )
}

fn pos() -> impl Strategy<Value = IVec3> {
    (-40i32..40, -40i32..40, -40i32..40).prop_map(|(x, y, z)| IVec3::new(x, y, z))
}

proptest! {
    // A write is visible through get_voxel exactly when its chunk is loaded.
    #[test]
    fn write_then_read(p in pos(), load in any::<bool>()) {
        let mut store = VoxelStore::new(stone_registry());
        if load {
            store.ensure_chunk(floor_chunk_coord(p));
        }
        let wrote = store.set_voxel_with_data(p, Voxel::of(1));
        prop_assert_eq!(wrote, load);
        prop_assert_eq!(store.get_voxel(p).map(|v| v.id), load.then_some(1));
    }

    // Clearing leaves an inactive voxel that no longer hides same-layer faces.
    #[test]
    fn cleared_voxel_hides_nothing(p in pos()) {
        let mut store = VoxelStore::new(stone_registry());
        store.ensure_chunk(floor_chunk_coord(p));
        store.set_voxel_with_data(p, Voxel::of(1));
        prop_assert!(!store.is_face_visible(p, 0));
        store.set_voxel_with_data(p, Voxel::of(0));
        let v = store.get_voxel(p).unwrap();
        prop_assert!(!v.is_active());
        prop_assert!(store.is_face_visible(p, 0));
    }

    #[test]
    fn chunk_origin_maps_back(cx in -50i32..50, cy in -50i32..50, cz in -50i32..50) {
        let c = ChunkCoord::new(cx, cy, cz);
        let o = c.origin();
        prop_assert_eq!(floor_chunk_coord(o), c);
        prop_assert_eq!(floor_chunk_coord(o + IVec3::new(CHUNK_SIZE - 1, CHUNK_SIZE - 1, CHUNK_SIZE - 1)), c);
        prop_assert_eq!(floor_chunk_coord(o - IVec3::new(1, 0, 0)), c.offset(-1, 0, 0));
    }
}
