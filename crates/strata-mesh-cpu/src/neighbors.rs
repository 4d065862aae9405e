use strata_blocks::Rgba;
use strata_chunk::{Voxel, VoxelStore};
use strata_geom::IVec3;
use strata_world::{CHUNK_SIZE, ChunkCoord, local_index};

use crate::face::Face;

/// World-space reads the mesher needs.
pub trait VoxelAccess {
    fn voxel(&self, p: IVec3) -> Option<Voxel>;
    /// Published light, zero when unknown.
    fn visible_light(&self, p: IVec3) -> Rgba;

    #[inline]
    fn is_face_visible(&self, p: IVec3, layer: u8) -> bool {
        match self.voxel(p) {
            Some(v) => !v.is_active() || v.layer != layer,
            None => true,
        }
    }
}

impl VoxelAccess for VoxelStore {
    #[inline]
    fn voxel(&self, p: IVec3) -> Option<Voxel> {
        self.get_voxel(p)
    }

    #[inline]
    fn visible_light(&self, p: IVec3) -> Rgba {
        VoxelStore::visible_light(self, p)
    }
}

#[derive(Clone)]
struct BorderPlane {
    cells: Vec<Voxel>,
    light: Vec<Rgba>,
}

#[inline]
fn plane_index(face: Face, l: IVec3) -> usize {
    let s = CHUNK_SIZE as usize;
    let (a, b) = match face {
        Face::PosX | Face::NegX => (l.y, l.z),
        Face::PosY | Face::NegY => (l.x, l.z),
        Face::PosZ | Face::NegZ => (l.x, l.y),
    };
    a as usize + b as usize * s
}

/// Owned copy of one chunk plus the one-voxel shell of its six face
/// neighbors, so a mesh can be built away from the store.
#[derive(Clone)]
pub struct MeshNeighborhood {
    pub coord: ChunkCoord,
    origin: IVec3,
    center: Vec<Voxel>,
    center_light: Vec<Rgba>,
    borders: [Option<BorderPlane>; 6],
}

impl MeshNeighborhood {
    /// `None` when the chunk itself isn't loaded.
    pub fn capture(store: &VoxelStore, coord: ChunkCoord) -> Option<Self> {
        let chunk = store.chunk(coord)?;
        let s = CHUNK_SIZE;
        let mut borders: [Option<BorderPlane>; 6] = Default::default();
        for face in Face::ALL {
            let d = face.delta();
            let Some(n) = store.chunk(coord.offset(d.x, d.y, d.z)) else {
                continue;
            };
            let mut plane = BorderPlane {
                cells: vec![Voxel::AIR; (s * s) as usize],
                light: vec![Rgba::ZERO; (s * s) as usize],
            };
            for b in 0..s {
                for a in 0..s {
                    // Cell of the neighbor touching our face.
                    let l = match face {
                        Face::PosX => IVec3::new(0, a, b),
                        Face::NegX => IVec3::new(s - 1, a, b),
                        Face::PosY => IVec3::new(a, 0, b),
                        Face::NegY => IVec3::new(a, s - 1, b),
                        Face::PosZ => IVec3::new(a, b, 0),
                        Face::NegZ => IVec3::new(a, b, s - 1),
                    };
                    let i = plane_index(face, l);
                    plane.cells[i] = n.get_local(l.x, l.y, l.z).unwrap_or(Voxel::AIR);
                    plane.light[i] = n.visible_light(l.x, l.y, l.z).unwrap_or(Rgba::ZERO);
                }
            }
            borders[face.index()] = Some(plane);
        }
        Some(Self {
            coord,
            origin: coord.origin(),
            center: chunk.voxels().to_vec(),
            center_light: chunk.visible_lights().to_vec(),
            borders,
        })
    }

    // Center cell (no face) or a cell on one of the border planes.
    fn locate(&self, p: IVec3) -> Option<(Option<Face>, usize)> {
        let l = p - self.origin;
        let s = CHUNK_SIZE;
        let out = |v: i32| !(0..s).contains(&v);
        match (out(l.x), out(l.y), out(l.z)) {
            (false, false, false) => Some((
                None,
                local_index(l.x as usize, l.y as usize, l.z as usize),
            )),
            (true, false, false) if l.x == s => Some((Some(Face::PosX), plane_index(Face::PosX, l))),
            (true, false, false) if l.x == -1 => Some((Some(Face::NegX), plane_index(Face::NegX, l))),
            (false, true, false) if l.y == s => Some((Some(Face::PosY), plane_index(Face::PosY, l))),
            (false, true, false) if l.y == -1 => Some((Some(Face::NegY), plane_index(Face::NegY, l))),
            (false, false, true) if l.z == s => Some((Some(Face::PosZ), plane_index(Face::PosZ, l))),
            (false, false, true) if l.z == -1 => Some((Some(Face::NegZ), plane_index(Face::NegZ, l))),
            _ => None,
        }
    }
}

impl VoxelAccess for MeshNeighborhood {
    fn voxel(&self, p: IVec3) -> Option<Voxel> {
        match self.locate(p)? {
            (None, i) => Some(self.center[i]),
            (Some(face), i) => self.borders[face.index()].as_ref().map(|b| b.cells[i]),
        }
    }

    fn visible_light(&self, p: IVec3) -> Rgba {
        match self.locate(p) {
            Some((None, i)) => self.center_light[i],
            Some((Some(face), i)) => self.borders[face.index()]
                .as_ref()
                .map(|b| b.light[i])
                .unwrap_or(Rgba::ZERO),
            None => Rgba::ZERO,
        }
    }
}
