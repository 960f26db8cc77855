use loft_geometry::*;
use std::f64::consts::PI;

fn example_curve() -> BSplineCurve<Vector3> {
    let knot_vec = KnotVec::uniform_knot(3, 3);
    let ctrl_pts = (0..6)
        .map(|i| {
            let t = i as f64;
            Vector3::new(t, f64::sin(t), t * t * 0.1)
        })
        .collect();
    BSplineCurve::new(knot_vec, ctrl_pts)
}

#[test]
fn knot_operations_round_trip() {
    let curve = example_curve();
    let mut modified = curve.clone();

    modified.insert_knot(0.15, 2).insert_knot(0.8, 1);
    assert_eq!(modified.knot_vec().len(), curve.knot_vec().len() + 3);
    assert!(modified.near2_as_curve(&curve));

    assert_eq!(modified.remove_knot_value(0.15, 2), 2);
    assert_eq!(modified.remove_knot_value(0.8, 1), 1);
    assert_eq!(modified.knot_vec(), curve.knot_vec());
    assert!(modified.near2_as_curve(&curve));
}

#[test]
fn degree_alteration_round_trip() {
    let curve = example_curve();
    let mut modified = curve.clone();
    modified.elevate_degree();
    assert_eq!(modified.degree(), 4);
    const N: usize = 50;
    for i in 0..=N {
        let t = i as f64 / N as f64;
        assert_near!(modified.subs(t), curve.subs(t));
    }
    modified.try_reduce_degree().unwrap();
    assert_eq!(modified.degree(), 3);
    assert!(modified.near_as_curve(&curve));
}

#[test]
fn bezier_decomposition_covers_spans() {
    let curve = example_curve();
    let beziers = curve.bezier_decomposition();
    assert_eq!(beziers.len(), 3);
    const N: usize = 30;
    for (i, bezier) in beziers.iter().enumerate() {
        for j in 0..=N {
            let t = (i as f64 + j as f64 / N as f64) / 3.0;
            assert_near2!(curve.subs(t), bezier.subs(t));
        }
    }
}

#[test]
fn inversion_is_involution() {
    let mut curve = example_curve();
    let org_curve = curve.clone();
    curve.invert();
    const N: usize = 30;
    for i in 0..=N {
        let t = i as f64 / N as f64;
        assert_near!(curve.subs(t), org_curve.subs(1.0 - t));
    }
    curve.invert();
    assert!(curve.near2_as_curve(&org_curve));
}

#[test]
fn arc_is_exactly_circular() {
    let arc = NurbsCurve::<Vector4>::circle_arc(
        Point3::new(0.5, -1.0, 2.0),
        Vector3::unit_y(),
        Vector3::unit_z(),
        3.0,
        0.3,
        0.3 + 1.8 * PI,
    );
    const N: usize = 100;
    for i in 0..=N {
        let t = i as f64 / N as f64;
        let pt = arc.subs(t);
        assert_near!(pt.distance(Point3::new(0.5, -1.0, 2.0)), 3.0);
        // the arc lies in the plane of the frame through its center
        assert_near!(pt.x, 0.5);
    }
}

#[test]
fn arc_weights_are_positive() {
    let arc = NurbsCurve::<Vector4>::circle_arc(
        Point3::origin(),
        Vector3::unit_x(),
        Vector3::unit_y(),
        1.0,
        0.0,
        2.0 * PI,
    );
    assert!(arc.control_points().iter().all(|pt| pt.w > 0.0));
    assert_eq!(arc.control_points().len(), 9);
    assert_eq!(arc.knot_vec().len(), 12);
}
