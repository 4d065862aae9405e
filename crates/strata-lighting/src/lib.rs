//! Point-light flood fill into chunk working buffers, then publish.
//!
//! A relight pass clears the working light of every chunk in its region,
//! floods each emitter found around the region breadth-first (strongest
//! contribution wins, no summing), and finally swaps working into visible
//! for each region chunk. Meshing only ever reads the visible buffer.
#![forbid(unsafe_code)]

use std::collections::{BTreeSet, VecDeque};

use hashbrown::{HashMap, HashSet};
use strata_blocks::Rgba;
use strata_chunk::VoxelStore;
use strata_geom::IVec3;
use strata_world::{CHUNK_SIZE, ChunkCoord, floor_chunk_coord, local_pos_of_index};

#[cfg(test)]
mod tests;

/// Outcome of one relight pass.
#[derive(Clone, Debug, Default)]
pub struct RelightReport {
    /// Chunks whose working buffer was rebuilt and published.
    pub touched: Vec<ChunkCoord>,
    /// Subset of `touched` whose visible light actually changed.
    pub changed: Vec<ChunkCoord>,
    pub sources: usize,
    pub cleared: usize,
    pub cells_written: usize,
}

/// Scales `base` to intensity `a` relative to the source's own intensity.
#[inline]
pub fn attenuate(base: Rgba, a: u8) -> Rgba {
    let scale = |c: u8| ((u32::from(c) * u32::from(a)) / u32::from(base.a.max(1))) as u8;
    Rgba::new(scale(base.r), scale(base.g), scale(base.b), a)
}

/// Reusable BFS scratch space.
#[derive(Default)]
pub struct LightPropagator {
    queue: VecDeque<(IVec3, u8)>,
    visited: HashSet<IVec3>,
    // Light recorded for cells outside the region being rebuilt.
    outside: HashMap<IVec3, Rgba>,
}

impl LightPropagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunk rings an emitter can reach past its own chunk.
    pub fn source_reach(store: &VoxelStore) -> i32 {
        let max = i32::from(store.registry().max_emission());
        ((max + CHUNK_SIZE - 1) / CHUNK_SIZE).max(1)
    }

    /// Relights the cube of chunks within `area` of `center`.
    pub fn relight(&mut self, store: &mut VoxelStore, center: ChunkCoord, area: i32) -> RelightReport {
        let mut report = RelightReport::default();
        let reach = Self::source_reach(store);

        let mut region: BTreeSet<ChunkCoord> = center
            .cube(area)
            .filter(|c| store.contains_chunk(*c))
            .collect();
        if region.is_empty() {
            return report;
        }

        // Fading emitters: reset them and widen the region over what they lit.
        let nearby: Vec<ChunkCoord> = center
            .cube(area + reach)
            .filter(|c| store.contains_chunk(*c))
            .collect();
        for c in nearby {
            for (pos, range) in Self::take_fading(store, c) {
                report.cleared += 1;
                let r = i32::from(range);
                let lo = floor_chunk_coord(pos - IVec3::new(r, r, r));
                let hi = floor_chunk_coord(pos + IVec3::new(r, r, r));
                for cz in lo.cz..=hi.cz {
                    for cy in lo.cy..=hi.cy {
                        for cx in lo.cx..=hi.cx {
                            let n = ChunkCoord::new(cx, cy, cz);
                            if store.contains_chunk(n) {
                                region.insert(n);
                            }
                        }
                    }
                }
            }
        }

        for c in &region {
            if let Some(chunk) = store.chunk_mut(*c) {
                chunk.clear_working_light();
            }
        }

        let scan: BTreeSet<ChunkCoord> = region
            .iter()
            .flat_map(|c| c.cube(reach))
            .filter(|c| store.contains_chunk(*c))
            .collect();
        let mut sources = Vec::new();
        for c in &scan {
            Self::collect_sources(store, *c, &mut sources);
        }
        report.sources = sources.len();

        self.outside.clear();
        for (pos, color) in sources {
            report.cells_written += self.flood(store, &region, pos, color);
        }

        for c in region {
            if let Some(chunk) = store.chunk_mut(c) {
                if chunk.publish_light() {
                    report.changed.push(c);
                }
                report.touched.push(c);
            }
        }
        log::trace!(
            target: "light",
            "relight {:?} area={} region={} sources={} cleared={} cells={}",
            center,
            area,
            report.touched.len(),
            report.sources,
            report.cleared,
            report.cells_written
        );
        report
    }

    fn take_fading(store: &mut VoxelStore, c: ChunkCoord) -> Vec<(IVec3, u8)> {
        let Some(chunk) = store.chunk_mut(c) else {
            return Vec::new();
        };
        let origin = c.origin();
        let mut out = Vec::new();
        for (i, v) in chunk.voxels_mut().iter_mut().enumerate() {
            if v.is_fading_light() {
                let (x, y, z) = local_pos_of_index(i);
                out.push((origin + IVec3::new(x as i32, y as i32, z as i32), v.emission.a));
                v.emission = Rgba::ZERO;
            }
        }
        out
    }

    fn collect_sources(store: &VoxelStore, c: ChunkCoord, out: &mut Vec<(IVec3, Rgba)>) {
        let Some(chunk) = store.chunk(c) else {
            return;
        };
        let origin = c.origin();
        for (i, v) in chunk.voxels().iter().enumerate() {
            if v.emission.a != 0 && !v.emission.rgb_is_zero() {
                let (x, y, z) = local_pos_of_index(i);
                out.push((origin + IVec3::new(x as i32, y as i32, z as i32), v.emission));
            }
        }
    }

    fn recorded(&self, store: &VoxelStore, region: &BTreeSet<ChunkCoord>, pos: IVec3) -> Rgba {
        if region.contains(&floor_chunk_coord(pos)) {
            store.working_light(pos).unwrap_or(Rgba::ZERO)
        } else {
            self.outside.get(&pos).copied().unwrap_or(Rgba::ZERO)
        }
    }

    /// Floods one source. Writes land in region chunks' working buffers;
    /// cells elsewhere are tracked only so paths can re-enter the region.
    pub fn flood(
        &mut self,
        store: &mut VoxelStore,
        region: &BTreeSet<ChunkCoord>,
        source: IVec3,
        color: Rgba,
    ) -> usize {
        self.queue.clear();
        self.visited.clear();
        self.queue.push_back((source, color.a));
        let mut written = 0;
        while let Some((pos, a)) = self.queue.pop_front() {
            if a == 0 || self.visited.contains(&pos) {
                continue;
            }
            let Some(voxel) = store.get_voxel(pos) else {
                continue;
            };
            if voxel.is_active() && pos != source {
                continue;
            }
            if self.recorded(store, region, pos).a >= a {
                continue;
            }
            self.visited.insert(pos);
            let light = attenuate(color, a);
            if region.contains(&floor_chunk_coord(pos)) {
                store.set_working_light(pos, light);
                written += 1;
            } else {
                self.outside.insert(pos, light);
            }
            for step in IVec3::AXIS_STEPS {
                self.queue.push_back((pos + step, a - 1));
            }
        }
        written
    }
}
