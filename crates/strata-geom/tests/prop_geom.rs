use proptest::num::f32::NORMAL;
use proptest::prelude::*;
use strata_geom::{IVec3, Vec3};

fn approx(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn bounded_f32() -> impl Strategy<Value = f32> {
    NORMAL.prop_filter("bounded", |v| v.is_finite() && v.abs() <= 1e4)
}

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    (bounded_f32(), bounded_f32(), bounded_f32()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn arb_ivec3() -> impl Strategy<Value = IVec3> {
    (-100_000i32..100_000, -100_000i32..100_000, -100_000i32..100_000)
        .prop_map(|(x, y, z)| IVec3::new(x, y, z))
}

proptest! {
    #[test]
    fn vec3_add_then_sub_restores(a in arb_vec3(), b in arb_vec3()) {
        let r = (a + b) - b;
        prop_assert!(approx(r.x, a.x, 1e-2) && approx(r.y, a.y, 1e-2) && approx(r.z, a.z, 1e-2));
    }

    #[test]
    fn normalized_has_unit_length(a in arb_vec3()) {
        prop_assume!(a.length() > 1e-3);
        prop_assert!(approx(a.normalized().length(), 1.0, 1e-3));
    }

    // Floor is consistent with integer cell bounds.
    #[test]
    fn floor_to_cell_contains_point(a in arb_vec3()) {
        let c = a.floor_to_cell();
        prop_assert!(c.x as f32 <= a.x && a.x < c.x as f32 + 1.0);
        prop_assert!(c.y as f32 <= a.y && a.y < c.y as f32 + 1.0);
        prop_assert!(c.z as f32 <= a.z && a.z < c.z as f32 + 1.0);
    }

    #[test]
    fn ivec3_manhattan_is_symmetric(a in arb_ivec3(), b in arb_ivec3()) {
        prop_assert_eq!(a.manhattan(b), b.manhattan(a));
        prop_assert_eq!(a.manhattan(a), 0);
        prop_assert_eq!((a - b) + b, a);
    }
}

proptest! {
    #[test]
    fn from_points_contains_every_point(points in prop::collection::vec(arb_vec3(), 1..16)) {
        let bb = strata_geom::Aabb::from_points(points.iter().copied()).unwrap();
        for p in &points {
            prop_assert!(bb.min.x <= p.x && p.x <= bb.max.x);
            prop_assert!(bb.min.y <= p.y && p.y <= bb.max.y);
            prop_assert!(bb.min.z <= p.z && p.z <= bb.max.z);
        }
    }
}
