use loft_geometry::*;
use rand::prelude::*;
use std::f64::consts::PI;

/// the unit square at z = 0 with a heavy center control point
fn weighted_square() -> NurbsSurface<Vector4> {
    let knot_vec = KnotVec::bezier_knot(2);
    let points = (0..3)
        .map(|i| {
            (0..3)
                .map(|j| Point3::new(i as f64 / 2.0, j as f64 / 2.0, 0.0))
                .collect()
        })
        .collect();
    let mut weights = vec![vec![1.0; 3]; 3];
    weights[1][1] = 2.0;
    NurbsSurface::try_from_bspline_and_weights(
        BSplineSurface::new_unchecked((knot_vec.clone(), knot_vec), points),
        weights,
    )
    .unwrap()
}

#[test]
fn weighted_center_evaluation() {
    let surface = weighted_square();
    assert_near!(surface.subs(0.5, 0.5), Point3::new(0.5, 0.5, 0.0));
    // the u-derivative points along +x
    let uder = surface.uder(0.5, 0.5);
    assert!(uder.x > 0.0);
    assert!(uder.y.abs() < 1.0e-10 && uder.z.abs() < 1.0e-10);
}

#[test]
fn evaluation_commutes_with_lift() {
    let knot_vecs = (KnotVec::bezier_knot(2), KnotVec::uniform_knot(2, 2));
    let pts: Vec<Vec<_>> = (0..3)
        .map(|i| {
            (0..4)
                .map(|j| {
                    let (x, y) = (i as f64, j as f64);
                    Vector3::new(x, y, x * y - x * x * 0.5)
                })
                .collect()
        })
        .collect();
    let vector_surface = BSplineSurface::new(knot_vecs.clone(), pts.clone());
    let point_grid = pts
        .iter()
        .map(|row| row.iter().map(|v| Point3::from_vec(*v)).collect())
        .collect();
    let lifted: NurbsSurface<Vector4> =
        BSplineSurface::new(knot_vecs, point_grid).into();

    const N: usize = 20;
    for i in 0..=N {
        for j in 0..=N {
            let (u, v) = (i as f64 / N as f64, j as f64 / N as f64);
            assert_near!(lifted.subs(u, v), Point3::from_vec(vector_surface.subs(u, v)));
        }
    }

    // and the drop brings the control net back
    let dropped = lifted.to_euclidean();
    for (row0, row1) in dropped.control_points().iter().zip(&pts) {
        for (pt, v) in row0.iter().zip(row1) {
            assert_near!(*pt, Point3::from_vec(*v));
        }
    }
}

#[test]
fn bilinear_patch_evaluation() {
    let surface = NurbsSurface::<Vector4>::bilinear(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    );
    assert_near!(surface.subs(0.25, 0.75), Point3::new(0.25, 0.75, 0.0));
    assert_eq!(surface.degrees(), (3, 3));
    assert_eq!(
        surface.uknot_vec().as_slice(),
        &[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
    );
    assert_eq!(surface.uknot_vec(), surface.vknot_vec());
}

#[test]
fn quarter_cylinder_evaluation() {
    let surface = NurbsSurface::<Vector4>::cylinder(
        Point3::origin(),
        Vector3::unit_x(),
        Vector3::unit_y(),
        0.0,
        PI / 2.0,
        1.0,
        2.0,
    );
    let sqrt2_half = f64::sqrt(2.0) / 2.0;
    assert_near!(surface.subs(0.5, 0.5), Point3::new(sqrt2_half, sqrt2_half, 1.0));
    assert_near!(surface.subs(0.0, 0.0), Point3::new(1.0, 0.0, 0.0));
    assert_near!(surface.subs(1.0, 1.0), Point3::new(0.0, 1.0, 2.0));

    // weight positivity survives the structural operations
    let mut refined = surface.clone();
    refined.insert_vknot(0.5, 2).elevate_udegree();
    assert!(refined
        .control_points()
        .iter()
        .flatten()
        .all(|pt| pt.w > 0.0));
    assert!(refined.near2_as_surface(&surface));
}

#[test]
fn projection_round_trip_on_cylinder() {
    let surface = NurbsSurface::<Vector4>::cylinder(
        Point3::origin(),
        Vector3::unit_x(),
        Vector3::unit_y(),
        0.0,
        PI / 2.0,
        1.0,
        2.0,
    );
    let res = surface.project_point(Point3::new(0.0, 1.0, 2.0));
    assert!(res.converged);
    let (u, v) = res.uv;
    assert_near!(surface.subs(u, v), Point3::new(0.0, 1.0, 2.0));
    assert!(u.near(&1.0) && v.near(&1.0));

    // an off-surface point projects to the closest point of the cylinder
    let res = surface.project_point(Point3::new(2.0 * f64::cos(0.7), 2.0 * f64::sin(0.7), 1.3));
    assert!(res.converged);
    let (u, v) = res.uv;
    let pt = surface.subs(u, v);
    assert_near!(pt.z, 1.3);
    assert_near!(f64::atan2(pt.y, pt.x), 0.7);
}

#[test]
fn projection_of_interior_samples() {
    let mut rng = rand::rng();
    let surface = weighted_square();
    for _ in 0..20 {
        let u: f64 = rng.random_range(0.0..=1.0);
        let v: f64 = rng.random_range(0.0..=1.0);
        let pt = surface.subs(u, v);
        let res = surface.project_point(pt);
        assert!(res.converged);
        assert_near!(surface.subs(res.uv.0, res.uv.1), pt);
    }
}

#[test]
fn ruled_surface_boundaries() {
    let curve0 = NurbsCurve::<Vector4>::circle_arc(
        Point3::origin(),
        Vector3::unit_x(),
        Vector3::unit_y(),
        1.0,
        0.0,
        PI,
    );
    let curve1 = NurbsCurve::<Vector4>::new(BSplineCurve::new(
        KnotVec::bezier_knot(1),
        vec![
            Vector4::new(1.0, 0.0, 3.0, 1.0),
            Vector4::new(-1.0, 0.0, 3.0, 1.0),
        ],
    ));
    let surface = NurbsSurface::try_ruled(curve0.clone(), curve1.clone()).unwrap();
    assert_eq!(surface.udegree(), 1);

    const N: usize = 30;
    for i in 0..=N {
        let t = i as f64 / N as f64;
        assert_near!(surface.subs(0.0, t), curve0.subs(t));
        assert_near!(surface.subs(1.0, t), curve1.subs(t));
    }
}

#[test]
fn ruled_between_identical_curves_degenerates() {
    let curve = NurbsCurve::<Vector4>::circle_arc(
        Point3::new(0.0, 0.0, 1.0),
        Vector3::unit_x(),
        Vector3::unit_y(),
        2.0,
        0.0,
        PI / 2.0,
    );
    let surface = NurbsSurface::try_ruled(curve.clone(), curve.clone()).unwrap();
    const N: usize = 20;
    for i in 0..=N {
        let v = i as f64 / N as f64;
        let on_curve = curve.subs(v);
        for j in 0..=4 {
            let u = j as f64 / 4.0;
            assert_near!(surface.subs(u, v), on_curve);
        }
    }
}

#[test]
fn ruled_requires_same_domain() {
    let curve0 = NurbsCurve::<Vector4>::new(BSplineCurve::new(
        KnotVec::bezier_knot(1),
        vec![Vector4::new(0.0, 0.0, 0.0, 1.0), Vector4::new(1.0, 0.0, 0.0, 1.0)],
    ));
    let mut curve1 = curve0.clone();
    curve1.knot_translate(1.0);
    assert!(NurbsSurface::try_ruled(curve0, curve1).is_err());
}

#[test]
fn revolution_keeps_axis_distance() {
    let mut rng = rand::rng();
    let origin = Point3::new(
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
    );
    let axis = Vector3::new(
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
    )
    .normalize();
    // a quadratic generatrix in general position
    let generatrix = NurbsCurve::<Vector4>::new(BSplineCurve::new(
        KnotVec::bezier_knot(2),
        vec![
            Vector4::from_point_weight(origin + Vector3::new(2.0, 0.5, 0.0), 1.0),
            Vector4::from_point_weight(origin + Vector3::new(3.0, 1.0, 1.0), 1.5),
            Vector4::from_point_weight(origin + Vector3::new(2.5, 2.0, 0.5), 1.0),
        ],
    ));
    let angle = rng.random_range(0.5..=2.0 * PI);
    let surface =
        NurbsSurface::try_revolved(&generatrix, origin, axis, angle).unwrap();

    const N: usize = 25;
    for i in 0..=N {
        for j in 0..=N {
            let (u, v) = (i as f64 / N as f64, j as f64 / N as f64);
            let pt = surface.subs(u, v);
            let gen_pt = generatrix.subs(v);
            // distance to the axis line is preserved by the rotation
            let dist = |p: Point3| {
                let w = p - origin;
                (w - axis * w.dot(axis)).magnitude()
            };
            assert_near!(dist(pt), dist(gen_pt));
            // so is the height along the axis
            assert_near!((pt - origin).dot(axis), (gen_pt - origin).dot(axis));
        }
    }

    // u = 0 is the generatrix itself
    for j in 0..=N {
        let v = j as f64 / N as f64;
        assert_near!(surface.subs(0.0, v), generatrix.subs(v));
    }
}

#[test]
fn full_revolution_is_closed() {
    let generatrix = NurbsCurve::<Vector4>::new(BSplineCurve::new(
        KnotVec::bezier_knot(1),
        vec![Vector4::new(1.5, 0.0, 0.0, 1.0), Vector4::new(2.5, 0.0, 4.0, 1.0)],
    ));
    let surface = NurbsSurface::try_revolved(
        &generatrix,
        Point3::origin(),
        Vector3::unit_z(),
        2.0 * PI,
    )
    .unwrap();
    assert!(surface.is_uclosed());
    assert!(!surface.is_vclosed());
    for i in 0..=10 {
        let v = i as f64 / 10.0;
        assert_near!(surface.subs(0.0, v), surface.subs(1.0, v));
    }
}

#[test]
fn rational_bezier_decomposition_evaluates() {
    let mut surface = weighted_square();
    surface.insert_uknot(0.5, 1).insert_vknot(0.4, 2);
    let beziers = surface.bezier_decomposition();
    assert_eq!(beziers.len(), 2);
    assert_eq!(beziers[0].len(), 2);
    const N: usize = 10;
    let uspans = [(0.0, 0.5), (0.5, 1.0)];
    let vspans = [(0.0, 0.4), (0.4, 1.0)];
    for (i, &(ua, ub)) in uspans.iter().enumerate() {
        for (j, &(va, vb)) in vspans.iter().enumerate() {
            for a in 0..=N {
                for b in 0..=N {
                    let u = ua + (ub - ua) * (a as f64) / (N as f64);
                    let v = va + (vb - va) * (b as f64) / (N as f64);
                    assert_near!(surface.subs(u, v), beziers[i][j].subs(u, v));
                }
            }
        }
    }
}

#[test]
fn tangent_decomposition_on_cylinder() {
    let surface = NurbsSurface::<Vector4>::cylinder(
        Point3::origin(),
        Vector3::unit_x(),
        Vector3::unit_y(),
        0.0,
        PI / 2.0,
        1.0,
        2.0,
    );
    let (u, v) = (0.3, 0.6);
    let uder = surface.uder(u, v);
    let vder = surface.vder(u, v);
    let tangent = uder * 1.5 - vder * 0.25;
    let (a, b) = surface.uv_tangent(u, v, tangent).unwrap();
    assert_near!(a, 1.5);
    assert_near!(b, -0.25);

    // a ruled surface collapsing to a curve has parallel derivatives
    let curve = NurbsCurve::<Vector4>::new(BSplineCurve::new(
        KnotVec::bezier_knot(2),
        vec![
            Vector4::new(0.0, 0.0, 0.0, 1.0),
            Vector4::new(1.0, 1.0, 0.0, 1.0),
            Vector4::new(2.0, 0.0, 0.0, 1.0),
        ],
    ));
    let degenerate = NurbsSurface::try_ruled(curve.clone(), curve).unwrap();
    assert!(degenerate.uv_tangent(0.5, 0.5, Vector3::unit_x()).is_err());
}
