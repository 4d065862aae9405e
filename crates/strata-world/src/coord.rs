use serde::{Deserialize, Serialize};
use strata_geom::IVec3;

/// Chunk edge length in voxels.
pub const CHUNK_SIZE: i32 = 16;
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    #[inline]
    pub fn with_y(self, cy: i32) -> Self {
        Self { cy, ..self }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    /// World position of local voxel `(0,0,0)`.
    #[inline]
    pub fn origin(self) -> IVec3 {
        IVec3::new(
            self.cx * CHUNK_SIZE,
            self.cy * CHUNK_SIZE,
            self.cz * CHUNK_SIZE,
        )
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dy = i64::from(self.cy - other.cy);
        let dz = i64::from(self.cz - other.cz);
        dx * dx + dy * dy + dz * dz
    }

    /// All coordinates in the cube of the given radius, x fastest.
    pub fn cube(self, radius: i32) -> impl Iterator<Item = ChunkCoord> {
        let r = radius.max(0);
        (-r..=r).flat_map(move |dz| {
            (-r..=r).flat_map(move |dy| (-r..=r).map(move |dx| self.offset(dx, dy, dz)))
        })
    }

    pub fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.cx, self.cy, self.cz)
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}

impl From<IVec3> for ChunkCoord {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Chunk containing a world voxel position (floor division by [`CHUNK_SIZE`]).
#[inline]
pub fn floor_chunk_coord(p: IVec3) -> ChunkCoord {
    ChunkCoord::new(
        p.x.div_euclid(CHUNK_SIZE),
        p.y.div_euclid(CHUNK_SIZE),
        p.z.div_euclid(CHUNK_SIZE),
    )
}

/// Position of a world voxel inside its chunk, each component in `[0, CHUNK_SIZE)`.
#[inline]
pub fn local_of(p: IVec3) -> (usize, usize, usize) {
    (
        p.x.rem_euclid(CHUNK_SIZE) as usize,
        p.y.rem_euclid(CHUNK_SIZE) as usize,
        p.z.rem_euclid(CHUNK_SIZE) as usize,
    )
}

/// Dense index `x + y*S + z*S*S`.
#[inline]
pub fn local_index(x: usize, y: usize, z: usize) -> usize {
    let s = CHUNK_SIZE as usize;
    x + y * s + z * s * s
}

#[inline]
pub fn local_pos_of_index(i: usize) -> (usize, usize, usize) {
    let s = CHUNK_SIZE as usize;
    (i % s, (i / s) % s, i / (s * s))
}
