use std::sync::Arc;
use std::time::Duration;

use strata_blocks::{AIR, BiomeId, BlockRegistry};
use strata_chunk::{Chunk, ChunkOccupancy, Voxel, VoxelStore, decorate_voxel};
use strata_edit::VoxelDelta;
use strata_geom::IVec3;
use strata_runtime::{GenRequest, SchedulerConfig, SchedulerEvent, UpdateScheduler, WorldHooks};
use strata_world::{CHUNK_SIZE, ChunkCoord, floor_chunk_coord, local_index};

const GROUND: i32 = 4;
const SETTLE: Duration = Duration::from_secs(20);

/// Stone below `GROUND`, air above.
struct FlatHooks {
    stone: u8,
}

impl WorldHooks for FlatHooks {
    fn generate_voxels(&self, chunk: &mut Chunk, reg: &BlockRegistry) -> ChunkOccupancy {
        let origin = chunk.coord.origin();
        let s = CHUNK_SIZE as usize;
        let mut any = false;
        for z in 0..s {
            for y in 0..s {
                for x in 0..s {
                    let id = if origin.y + (y as i32) < GROUND { self.stone } else { AIR };
                    any |= id != AIR;
                    chunk.voxels_mut()[local_index(x, y, z)] =
                        decorate_voxel(reg, None, Voxel::of(id));
                }
            }
        }
        if any {
            ChunkOccupancy::Populated
        } else {
            ChunkOccupancy::Empty
        }
    }

    fn height(&self, _x: i32, _z: i32) -> f32 {
        GROUND as f32
    }

    fn biome(&self, _x: i32, _z: i32) -> BiomeId {
        0
    }
}

/// Flat terrain that drops a lamp into chunk (0,0,0) when decorating `trigger`.
struct LampDecorHooks {
    flat: FlatHooks,
    lamp: u8,
    trigger: ChunkCoord,
}

const DECOR_LAMP: IVec3 = IVec3::new(8, 8, 8);

impl WorldHooks for LampDecorHooks {
    fn generate_voxels(&self, chunk: &mut Chunk, reg: &BlockRegistry) -> ChunkOccupancy {
        self.flat.generate_voxels(chunk, reg)
    }

    fn height(&self, x: i32, z: i32) -> f32 {
        self.flat.height(x, z)
    }

    fn biome(&self, x: i32, z: i32) -> BiomeId {
        self.flat.biome(x, z)
    }

    fn place_decorations(&self, store: &mut VoxelStore, coord: ChunkCoord) -> Vec<ChunkCoord> {
        if coord != self.trigger || !store.set_block(DECOR_LAMP, self.lamp) {
            return Vec::new();
        }
        vec![floor_chunk_coord(DECOR_LAMP)]
    }
}

fn config() -> SchedulerConfig {
    SchedulerConfig {
        render_distance: 1,
        vertical_chunks: 1,
        gen_workers: 1,
        mesh_workers: 1,
        ..SchedulerConfig::default()
    }
}

fn scheduler() -> UpdateScheduler {
    let reg = Arc::new(BlockRegistry::builtin().unwrap());
    let stone = reg.id_by_name("stone").unwrap();
    UpdateScheduler::new(reg, Arc::new(FlatHooks { stone }), config())
}

fn generated() -> UpdateScheduler {
    let mut s = scheduler();
    assert_eq!(s.request_generation(ChunkCoord::new(0, 0, 0)), GenRequest::Start);
    assert!(s.run_until_settled(0.05, SETTLE));
    s
}

fn id(s: &UpdateScheduler, name: &str) -> u8 {
    s.registry().id_by_name(name).unwrap()
}

#[test]
fn sweep_generates_and_meshes_every_chunk() {
    let mut s = generated();
    assert_eq!(s.loaded_chunks().len(), 9);
    assert_eq!(
        s.drain_events(),
        vec![SchedulerEvent::GenerationFinished {
            center: ChunkCoord::new(0, 0, 0),
            chunks: 9,
        }]
    );
    let updates = s.drain_mesh_updates();
    let mut meshed: Vec<ChunkCoord> = updates.iter().map(|(c, _)| *c).collect();
    meshed.sort();
    meshed.dedup();
    assert_eq!(meshed, s.loaded_chunks());
    assert!(updates.iter().all(|(_, m)| !m.is_empty()));
    let stats = s.stats();
    assert_eq!(stats.generations_finished, 1);
    assert_eq!(stats.meshes_pending, 0);
    assert_eq!(stats.stale_chunks, 0);
}

#[test]
fn second_request_waits_for_the_running_sweep() {
    let mut s = scheduler();
    assert_eq!(s.request_generation(ChunkCoord::new(0, 0, 0)), GenRequest::Start);
    assert_eq!(s.request_generation(ChunkCoord::new(0, 0, 0)), GenRequest::Coalesced);
    assert_eq!(s.request_generation(ChunkCoord::new(2, 0, 0)), GenRequest::Queued);
    assert!(s.run_until_settled(0.05, SETTLE));
    // 3x3 around each center, overlapping in one column of three.
    assert_eq!(s.loaded_chunks().len(), 15);
    assert_eq!(s.drain_events().len(), 2);
}

#[test]
fn regenerating_loaded_area_finishes_immediately() {
    let mut s = generated();
    s.drain_events();
    assert_eq!(s.request_generation(ChunkCoord::new(0, 0, 0)), GenRequest::Start);
    assert!(!s.is_generating());
    assert_eq!(
        s.drain_events(),
        vec![SchedulerEvent::GenerationFinished {
            center: ChunkCoord::new(0, 0, 0),
            chunks: 0,
        }]
    );
}

#[test]
fn bottom_row_cannot_be_destroyed() {
    let mut s = generated();
    assert!(s.destroy_voxel(IVec3::new(3, 0, 3)).is_none());
    let delta = s.destroy_voxel(IVec3::new(3, 2, 3)).unwrap();
    assert_eq!(delta, VoxelDelta::new(IVec3::new(3, 2, 3), AIR));
    // Air and unloaded cells refuse too.
    assert!(s.destroy_voxel(IVec3::new(3, 10, 3)).is_none());
    assert!(s.destroy_voxel(IVec3::new(300, 2, 3)).is_none());
}

#[test]
fn edit_remeshes_owner_and_boundary_neighbors() {
    let mut s = generated();
    s.drain_mesh_updates();
    let stone = id(&s, "stone");

    s.place_voxel(IVec3::new(8, 8, 8), stone).unwrap();
    assert!(s.run_until_settled(0.05, SETTLE));
    let meshed: Vec<ChunkCoord> = s.drain_mesh_updates().into_iter().map(|(c, _)| c).collect();
    assert_eq!(meshed, vec![ChunkCoord::new(0, 0, 0)]);
    assert_eq!(s.store().get_voxel(IVec3::new(8, 8, 8)).unwrap().id, stone);

    s.place_voxel(IVec3::new(15, 8, 8), stone).unwrap();
    assert!(s.run_until_settled(0.05, SETTLE));
    let meshed: Vec<ChunkCoord> = s.drain_mesh_updates().into_iter().map(|(c, _)| c).collect();
    assert!(meshed.contains(&ChunkCoord::new(0, 0, 0)));
    assert!(meshed.contains(&ChunkCoord::new(1, 0, 0)));
}

#[test]
fn granular_block_falls_to_the_ground() {
    let mut s = generated();
    let sand = id(&s, "sand");
    s.place_voxel(IVec3::new(5, 10, 5), sand).unwrap();
    assert!(s.run_until_settled(0.05, SETTLE));
    assert_eq!(s.store().get_voxel(IVec3::new(5, 10, 5)).unwrap().id, AIR);
    assert_eq!(s.store().get_voxel(IVec3::new(5, GROUND, 5)).unwrap().id, sand);
    assert_eq!(s.store().get_voxel(IVec3::new(5, GROUND + 1, 5)).unwrap().id, AIR);
    assert!(s.stats().ticks > 0);
}

#[test]
fn placing_and_removing_a_lamp_updates_light() {
    let mut s = generated();
    let lamp = id(&s, "lamp");
    let beside = IVec3::new(9, 8, 8);
    s.place_voxel(IVec3::new(8, 8, 8), lamp).unwrap();
    assert!(s.run_until_settled(0.05, SETTLE));
    let lit = s.store().visible_light(beside);
    assert_eq!(lit.a, s.registry().get(lamp).unwrap().emission.a - 1);

    s.destroy_voxel(IVec3::new(8, 8, 8)).unwrap();
    assert!(s.run_until_settled(0.05, SETTLE));
    assert_eq!(s.store().visible_light(beside).a, 0);
}

#[test]
fn new_chunk_receives_light_from_loaded_neighbor() {
    let mut s = generated();
    let lamp = id(&s, "lamp");
    let emission = s.registry().get(lamp).unwrap().emission.a;
    s.place_voxel(IVec3::new(31, 8, 8), lamp).unwrap();
    assert!(s.run_until_settled(0.05, SETTLE));

    // The sweep fills cx 2..=4; the lamp stays in the already loaded cx 1.
    assert_eq!(s.request_generation(ChunkCoord::new(3, 0, 0)), GenRequest::Start);
    assert!(s.run_until_settled(0.05, SETTLE));
    assert_eq!(s.store().visible_light(IVec3::new(32, 8, 8)).a, emission - 1);
    assert_eq!(s.store().visible_light(IVec3::new(33, 8, 8)).a, emission - 2);
}

#[test]
fn decoration_in_diagonal_chunk_is_remeshed_and_lit() {
    let reg = Arc::new(BlockRegistry::builtin().unwrap());
    let stone = reg.id_by_name("stone").unwrap();
    let lamp = reg.id_by_name("lamp").unwrap();
    let hooks = LampDecorHooks {
        flat: FlatHooks { stone },
        lamp,
        trigger: ChunkCoord::new(1, 0, 2),
    };
    let mut s = UpdateScheduler::new(reg, Arc::new(hooks), config());
    assert_eq!(s.request_generation(ChunkCoord::new(0, 0, 0)), GenRequest::Start);
    assert!(s.run_until_settled(0.05, SETTLE));
    s.drain_mesh_updates();
    assert_eq!(s.store().get_voxel(DECOR_LAMP).unwrap().id, AIR);

    // (0,0,0) only touches the second sweep's chunks at corners.
    assert_eq!(s.request_generation(ChunkCoord::new(2, 0, 2)), GenRequest::Start);
    assert!(s.run_until_settled(0.05, SETTLE));
    assert_eq!(s.store().get_voxel(DECOR_LAMP).unwrap().id, lamp);
    let meshed: Vec<ChunkCoord> = s.drain_mesh_updates().into_iter().map(|(c, _)| c).collect();
    assert!(meshed.contains(&ChunkCoord::new(0, 0, 0)));
    let emission = s.registry().get(lamp).unwrap().emission.a;
    assert_eq!(
        s.store().visible_light(DECOR_LAMP + IVec3::new(1, 0, 0)).a,
        emission - 1
    );
}

#[test]
fn snapshot_round_trips_between_worlds() {
    let source = generated();
    let c = ChunkCoord::new(0, 0, 0);
    let ids = source.chunk_snapshot(c).unwrap();

    let mut sink = scheduler();
    assert!(sink.apply_chunk_snapshot(c, &ids));
    assert_eq!(sink.chunk_snapshot(c).unwrap(), ids);
    assert!(!sink.apply_chunk_snapshot(c, &ids[..10]));
    assert!(sink.run_until_settled(0.05, SETTLE));
    assert_eq!(sink.drain_mesh_updates().len(), 1);
}

#[test]
fn remote_delta_with_unknown_block_is_ignored() {
    let mut s = generated();
    assert!(!s.apply_remote_delta(VoxelDelta::new(IVec3::new(1, 8, 1), 250)));
    assert!(s.apply_remote_delta(VoxelDelta::new(IVec3::new(1, 2, 1), AIR)));
    assert!(s.run_until_settled(0.05, SETTLE));
    assert_eq!(s.store().get_voxel(IVec3::new(1, 2, 1)).unwrap().id, AIR);
}

#[test]
fn reset_discards_world_and_stale_results() {
    let mut s = scheduler();
    s.request_generation(ChunkCoord::new(0, 0, 0));
    let reg = s.registry().clone();
    let stone = reg.id_by_name("stone").unwrap();
    s.reset_world(Arc::new(FlatHooks { stone }));
    assert!(!s.is_generating());
    assert!(s.run_until_settled(0.05, SETTLE));
    assert!(s.loaded_chunks().is_empty());
    assert!(s.drain_events().is_empty());
}
