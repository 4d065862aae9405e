use strata_geom::{IVec3, Vec3};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

/// Corner offsets from the voxel's min corner, in emission order.
/// Triangles are `(0,1,2)` and `(0,2,3)`.
const CORNERS: [[[f32; 3]; 4]; 6] = [
    // +Y
    [[0., 1., 0.], [0., 1., 1.], [1., 1., 1.], [1., 1., 0.]],
    // -Y
    [[0., 0., 0.], [1., 0., 0.], [1., 0., 1.], [0., 0., 1.]],
    // +X
    [[1., 0., 1.], [1., 0., 0.], [1., 1., 0.], [1., 1., 1.]],
    // -X
    [[0., 0., 0.], [0., 0., 1.], [0., 1., 1.], [0., 1., 0.]],
    // +Z
    [[0., 0., 1.], [1., 0., 1.], [1., 1., 1.], [0., 1., 1.]],
    // -Z
    [[1., 0., 0.], [0., 0., 0.], [0., 1., 0.], [1., 1., 0.]],
];

const STD_UV: [[f32; 2]; 4] = [[0., 0.], [1., 0.], [1., 1.], [0., 1.]];
// The bottom face walks its corners the other way round.
const NEG_Y_UV: [[f32; 2]; 4] = [[0., 0.], [0., 1.], [1., 1.], [1., 0.]];

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        self.delta().as_vec3()
    }

    /// Returns the grid step out of this face.
    #[inline]
    pub fn delta(self) -> IVec3 {
        IVec3::AXIS_STEPS[self.index()]
    }

    #[inline]
    pub fn corners(self) -> &'static [[f32; 3]; 4] {
        &CORNERS[self.index()]
    }

    #[inline]
    pub fn uvs(self) -> &'static [[f32; 2]; 4] {
        match self {
            Face::NegY => &NEG_Y_UV,
            _ => &STD_UV,
        }
    }

    /// Direction of increasing `u` across the face, `w = 1`.
    #[inline]
    pub fn tangent(self) -> [f32; 4] {
        match self {
            Face::PosY | Face::NegY | Face::NegX => [0., 0., 1., 1.],
            Face::PosX => [0., 0., -1., 1.],
            Face::PosZ => [1., 0., 0., 1.],
            Face::NegZ => [-1., 0., 0., 1.],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    #[test]
    fn corners_lie_on_the_face_plane() {
        for f in Face::ALL {
            let n = f.delta();
            let plane = if n.x + n.y + n.z > 0 { 1.0 } else { 0.0 };
            let axis = if n.x != 0 { 0 } else if n.y != 0 { 1 } else { 2 };
            for c in f.corners() {
                assert_eq!(c[axis], plane, "{f:?}");
            }
        }
    }

    #[test]
    fn tangent_follows_u() {
        for f in Face::ALL {
            let uv = f.uvs();
            let c = f.corners();
            let u0 = (0..4).find(|i| uv[*i] == [0., 0.]).unwrap();
            let u1 = (0..4).find(|i| uv[*i] == [1., 0.]).unwrap();
            let d = sub(c[u1], c[u0]);
            let t = f.tangent();
            assert_eq!([t[0], t[1], t[2]], d, "{f:?}");
        }
    }

    #[test]
    fn winding_is_consistent_per_face() {
        // Every face winds the same way relative to its normal.
        let sign = |f: Face| {
            let c = f.corners();
            let e1 = sub(c[1], c[0]);
            let e2 = sub(c[2], c[0]);
            let cross = [
                e1[1] * e2[2] - e1[2] * e2[1],
                e1[2] * e2[0] - e1[0] * e2[2],
                e1[0] * e2[1] - e1[1] * e2[0],
            ];
            let n = f.normal();
            (cross[0] * n.x + cross[1] * n.y + cross[2] * n.z).signum()
        };
        let first = sign(Face::PosY);
        assert!(first != 0.0);
        for f in Face::ALL {
            assert_eq!(sign(f), first, "{f:?}");
        }
    }
}
