use std::sync::Arc;

use super::*;
use strata_blocks::BlockRegistry;
use strata_chunk::Voxel;

fn make_registry() -> Arc<BlockRegistry> {
    Arc::new(
        BlockRegistry::from_toml_str(
            r#"
            [[blocks]]
            id = 1
            name = "stone"
            color = "808080"
            [[blocks]]
            id = 2
            name = "red_lamp"
            color = "ff0000"
            emission = [255, 0, 0, 4]
            [[blocks]]
            id = 3
            name = "blue_lamp"
            color = "0000ff"
            emission = [0, 0, 255, 3]
            [[blocks]]
            id = 4
            name = "green_lamp"
            color = "00ff00"
            emission = [0, 255, 0, 6]
            "#,
        )
        .unwrap(),
    )
}

fn store_with(chunks: &[ChunkCoord]) -> VoxelStore {
    let mut s = VoxelStore::new(make_registry());
    for c in chunks {
        s.ensure_chunk(*c);
    }
    s
}

const ORIGIN: ChunkCoord = ChunkCoord::new(0, 0, 0);

#[test]
fn single_red_source_fades_to_zero_at_its_range() {
    let mut s = store_with(&[ORIGIN]);
    s.set_block(IVec3::ZERO, 2);
    let mut lp = LightPropagator::new();
    let report = lp.relight(&mut s, ORIGIN, 1);
    assert_eq!(report.sources, 1);
    assert_eq!(report.changed, vec![ORIGIN]);

    let at = |x| s.visible_light(IVec3::new(x, 0, 0));
    assert_eq!(at(0), Rgba::new(255, 0, 0, 4));
    assert_eq!(at(1), Rgba::new(191, 0, 0, 3));
    let d3 = at(3);
    assert_eq!(d3.a, 1);
    assert!(d3.r > 0);
    assert_eq!((d3.g, d3.b), (0, 0));
    assert_eq!(at(4), Rgba::ZERO);
}

#[test]
fn working_light_is_invisible_until_publish() {
    let mut s = store_with(&[ORIGIN]);
    s.set_block(IVec3::new(8, 8, 8), 2);
    let mut lp = LightPropagator::new();
    let region: BTreeSet<ChunkCoord> = [ORIGIN].into_iter().collect();
    lp.flood(&mut s, &region, IVec3::new(8, 8, 8), Rgba::new(255, 0, 0, 4));
    assert_eq!(s.working_light(IVec3::new(9, 8, 8)).unwrap().a, 3);
    assert_eq!(s.visible_light(IVec3::new(9, 8, 8)), Rgba::ZERO);
    assert!(s.chunk_mut(ORIGIN).unwrap().publish_light());
    assert_eq!(s.visible_light(IVec3::new(9, 8, 8)).a, 3);
}

#[test]
fn solid_blocks_stop_light() {
    let mut s = store_with(&[ORIGIN]);
    let src = IVec3::new(8, 8, 8);
    s.set_block(src, 4);
    // enclose the lamp except for +x
    for step in &IVec3::AXIS_STEPS[..] {
        if *step != IVec3::new(1, 0, 0) {
            s.set_block(src + *step, 1);
        }
    }
    LightPropagator::new().relight(&mut s, ORIGIN, 0);
    assert_eq!(s.visible_light(src + IVec3::new(1, 0, 0)).a, 5);
    // stone itself never records light
    assert_eq!(s.visible_light(src + IVec3::new(-1, 0, 0)), Rgba::ZERO);
    // Open space would give 4 at (6,8,8); the detour around the shell is longer.
    let behind = s.visible_light(IVec3::new(6, 8, 8));
    assert!(behind.a < 4);
}

#[test]
fn stronger_source_wins_without_summing() {
    let mut s = store_with(&[ORIGIN]);
    s.set_block(IVec3::new(2, 8, 8), 3); // blue, 3
    s.set_block(IVec3::new(6, 8, 8), 4); // green, 6
    LightPropagator::new().relight(&mut s, ORIGIN, 0);
    // (4,8,8): blue at distance 2 -> 1, green at distance 2 -> 4
    let mid = s.visible_light(IVec3::new(4, 8, 8));
    assert_eq!(mid.a, 4);
    assert_eq!(mid.b, 0);
    assert_eq!(mid, attenuate(Rgba::new(0, 255, 0, 6), 4));
}

#[test]
fn light_crosses_chunk_seams() {
    let east = ChunkCoord::new(1, 0, 0);
    let mut s = store_with(&[ORIGIN, east]);
    s.set_block(IVec3::new(15, 4, 4), 4);
    let report = LightPropagator::new().relight(&mut s, ORIGIN, 1);
    assert!(report.touched.contains(&east));
    assert_eq!(s.visible_light(IVec3::new(16, 4, 4)).a, 5);
    assert_eq!(s.visible_light(IVec3::new(20, 4, 4)).a, 1);
}

#[test]
fn removed_source_clears_its_light() {
    let mut s = store_with(&[ORIGIN]);
    let p = IVec3::new(8, 8, 8);
    s.set_block(p, 4);
    let mut lp = LightPropagator::new();
    lp.relight(&mut s, ORIGIN, 1);
    assert_eq!(s.visible_light(IVec3::new(9, 8, 8)).a, 5);

    s.set_voxel_with_data(p, Voxel::of(0));
    assert!(s.get_voxel(p).unwrap().is_fading_light());
    let report = lp.relight(&mut s, ORIGIN, 1);
    assert_eq!(report.cleared, 1);
    assert_eq!(report.sources, 0);
    assert_eq!(s.visible_light(IVec3::new(9, 8, 8)), Rgba::ZERO);
    assert_eq!(s.get_voxel(p).unwrap().emission, Rgba::ZERO);
}

#[test]
fn empty_region_is_a_no_op() {
    let mut s = store_with(&[]);
    let report = LightPropagator::new().relight(&mut s, ORIGIN, 1);
    assert!(report.touched.is_empty());
}
