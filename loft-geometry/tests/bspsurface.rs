use loft_geometry::*;
use proptest::prelude::*;

#[test]
fn test_substitution() {
    let knot_vecs = (KnotVec::bezier_knot(1), KnotVec::bezier_knot(2));
    let ctrl_pts = vec![
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(0.5, -1.0),
            Vector2::new(1.0, 0.0),
        ],
        vec![
            Vector2::new(0.0, 1.0),
            Vector2::new(0.5, 2.0),
            Vector2::new(1.0, 1.0),
        ],
    ];
    let bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);

    // bspsurface: (v, 2v(1 - v)(2u - 1) + u)
    const N: usize = 100; // sample size
    for i in 0..=N {
        let u = (i as f64) / (N as f64);
        for j in 0..=N {
            let v = (j as f64) / (N as f64);
            assert_near2!(
                bspsurface.subs(u, v),
                Vector2::new(v, 2.0 * v * (1.0 - v) * (2.0 * u - 1.0) + u),
            );
        }
    }
}

#[test]
fn test_derivatives() {
    let knot_vecs = (KnotVec::bezier_knot(2), KnotVec::bezier_knot(2));
    let ctrl_pts = vec![
        vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(0.5, -1.0),
            Vector2::new(1.0, 0.0),
        ],
        vec![
            Vector2::new(0.0, 0.5),
            Vector2::new(0.5, 1.0),
            Vector2::new(1.0, 0.5),
        ],
        vec![
            Vector2::new(0.0, 1.0),
            Vector2::new(0.5, 2.0),
            Vector2::new(1.0, 1.0),
        ],
    ];
    let bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);

    // bspsurface: (v, 2 u^2 v^2 - 2 u^2 v - 6 u v^2 + 6uv + 2v^2 + u - 2v)
    const N: usize = 50; // sample size
    for i in 0..=N {
        let u = (i as f64) / (N as f64);
        for j in 0..=N {
            let v = (j as f64) / (N as f64);
            assert_near2!(
                bspsurface.uder(u, v),
                Vector2::new(0.0, 4.0 * u * v * v - 4.0 * u * v - 6.0 * v * v + 6.0 * v + 1.0),
            );
            assert_near2!(
                bspsurface.vder(u, v),
                Vector2::new(
                    1.0,
                    4.0 * u * u * v - 2.0 * u * u - 12.0 * u * v + 6.0 * u + 4.0 * v - 2.0,
                ),
            );
            assert_near2!(bspsurface.uuder(u, v), Vector2::new(0.0, 4.0 * v * (v - 1.0)));
            assert_near2!(
                bspsurface.vvder(u, v),
                Vector2::new(0.0, 4.0 * (u * u - 3.0 * u + 1.0)),
            );
            assert_near2!(
                bspsurface.uvder(u, v),
                Vector2::new(0.0, 8.0 * u * v - 4.0 * u - 12.0 * v + 6.0),
            );
        }
    }
}

fn example_surface() -> BSplineSurface<Vector3> {
    let uknot_vec = KnotVec::uniform_knot(3, 2);
    let vknot_vec = KnotVec::uniform_knot(2, 3);
    let ctrl_pts = (0..5)
        .map(|i| {
            (0..5)
                .map(|j| {
                    let (x, y) = (i as f64 * 0.5, j as f64 * 0.4);
                    Vector3::new(x, y, f64::sin(x + y) - 0.3 * x * y)
                })
                .collect()
        })
        .collect();
    BSplineSurface::new((uknot_vec, vknot_vec), ctrl_pts)
}

fn assert_sizing(surface: &BSplineSurface<Vector3>) {
    assert_eq!(
        surface.uknot_vec().len(),
        surface.control_points().len() + surface.udegree() + 1,
    );
    assert_eq!(
        surface.vknot_vec().len(),
        surface.control_points()[0].len() + surface.vdegree() + 1,
    );
    let monotone = |knots: &KnotVec| knots.windows(2).all(|w| w[0] <= w[1]);
    assert!(monotone(surface.uknot_vec()));
    assert!(monotone(surface.vknot_vec()));
}

#[test]
fn structural_operations_keep_sizing_invariants() {
    let mut surface = example_surface();
    assert_sizing(&surface);
    surface.insert_uknot(0.3, 2);
    assert_sizing(&surface);
    surface.refine_vknots(&[0.1, 0.55, 0.55]);
    assert_sizing(&surface);
    surface.elevate_udegree();
    assert_sizing(&surface);
    surface.elevate_vdegree_by(2);
    assert_sizing(&surface);
    surface.remove_vknot_value(0.55, 2);
    assert_sizing(&surface);
    surface.reverse_u();
    assert_sizing(&surface);
    surface.reverse_v();
    assert_sizing(&surface);
}

#[test]
fn insertion_saturates_at_degree() {
    // a cubic with an interior knot of full multiplicity
    let uknot_vec = KnotVec::from(vec![
        0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0, 1.0,
    ]);
    let vknot_vec = KnotVec::bezier_knot(1);
    let ctrl_pts = (0..7)
        .map(|i| {
            (0..2)
                .map(|j| Vector3::new(i as f64, j as f64, (i * i) as f64 * 0.1))
                .collect()
        })
        .collect();
    let mut surface = BSplineSurface::new((uknot_vec, vknot_vec), ctrl_pts);

    // a single insertion at a new value grows both containers
    let org_surface = surface.clone();
    surface.insert_uknot(0.25, 1);
    assert_eq!(surface.uknot_vec().len(), org_surface.uknot_vec().len() + 1);
    assert_eq!(
        surface.control_points().len(),
        org_surface.control_points().len() + 1,
    );
    assert!(surface.near2_as_surface(&org_surface));

    // inserting at the saturated value changes nothing at all
    let saturated = surface.clone();
    surface.insert_uknot(0.5, 1);
    assert_eq!(surface, saturated);
}

#[test]
fn insert_remove_round_trip() {
    let mut surface = example_surface();
    let org_surface = surface.clone();
    surface.insert_uknot(0.7, 3);
    assert_eq!(surface.uknot_vec().multiplicity_of(0.7), 3);
    assert_eq!(surface.remove_uknot_value(0.7, 3), 3);
    assert_eq!(surface.uknot_vec(), org_surface.uknot_vec());
    assert!(surface.near2_as_surface(&org_surface));
}

#[test]
fn elevation_preserves_evaluation() {
    let surface = example_surface();
    let mut elevated = surface.clone();
    elevated.elevate_udegree().elevate_vdegree();
    assert_eq!(elevated.udegree(), surface.udegree() + 1);
    assert_eq!(elevated.vdegree(), surface.vdegree() + 1);
    const N: usize = 20;
    for i in 0..=N {
        for j in 0..=N {
            let (u, v) = (i as f64 / N as f64, j as f64 / N as f64);
            assert_near!(elevated.subs(u, v), surface.subs(u, v));
        }
    }
}

#[test]
fn degree_reduction_inverts_elevation() {
    let surface = example_surface();
    let mut elevated = surface.clone();
    elevated.elevate_vdegree();
    elevated.try_reduce_vdegree().unwrap();
    assert_eq!(elevated.vdegree(), surface.vdegree());
    assert!(elevated.near2_as_surface(&surface));

    // the example surface itself is not an elevation of anything
    assert!(surface.clone().try_reduce_udegree().is_err());
}

#[test]
fn bezier_decomposition_covers_spans() {
    let surface = example_surface();
    let beziers = surface.bezier_decomposition();
    // distinct interior spans: u has 2, v has 3
    assert_eq!(beziers.len(), 2);
    beziers.iter().for_each(|strip| assert_eq!(strip.len(), 3));

    let (uknots, _) = surface.uknot_vec().to_single_multi();
    let (vknots, _) = surface.vknot_vec().to_single_multi();
    const N: usize = 8;
    for (i, us) in uknots.windows(2).enumerate() {
        for (j, vs) in vknots.windows(2).enumerate() {
            for a in 0..=N {
                for b in 0..=N {
                    let u = us[0] + (us[1] - us[0]) * (a as f64) / (N as f64);
                    let v = vs[0] + (vs[1] - vs[0]) * (b as f64) / (N as f64);
                    assert_near!(surface.subs(u, v), beziers[i][j].subs(u, v));
                }
            }
        }
    }
}

#[test]
fn reverse_involutions() {
    let surface = example_surface();
    let mut reversed = surface.clone();
    reversed.reverse_u();
    const N: usize = 20;
    for i in 0..=N {
        for j in 0..=N {
            let (u, v) = (i as f64 / N as f64, j as f64 / N as f64);
            assert_near!(reversed.subs(u, v), surface.subs(1.0 - u, v));
        }
    }
    reversed.reverse_u();
    assert!(reversed.near2_as_surface(&surface));

    reversed.reverse_v();
    for i in 0..=N {
        for j in 0..=N {
            let (u, v) = (i as f64 / N as f64, j as f64 / N as f64);
            assert_near!(reversed.subs(u, v), surface.subs(u, 1.0 - v));
        }
    }
    reversed.reverse_v();
    assert!(reversed.near2_as_surface(&surface));
}

proptest! {
    #[test]
    fn test_der_mn(
        (u, v) in (0f64..=1.0, 0f64..=1.0),
        (m, n) in (0usize..=3, 0usize..=3),
        (udegree, vdegree) in (2usize..=5, 2usize..=5),
        (udiv, vdiv) in (1usize..=4, 1usize..=4),
        pts in prop::array::uniform10(prop::array::uniform10(prop::array::uniform3(-10f64..=10.0))),
        u_derivate in prop::bool::ANY,
    ) {
        prop_assume!(udegree > m + 1);
        prop_assume!(vdegree > n + 1);
        let uknot_vec = KnotVec::uniform_knot(udegree, udiv);
        let vknot_vec = KnotVec::uniform_knot(vdegree, vdiv);
        let control_points = pts[..udegree + udiv]
            .iter()
            .map(|vec| {
                vec[..vdegree + vdiv]
                    .iter()
                    .map(|&p| Vector3::from(p))
                    .collect()
            })
            .collect::<Vec<Vec<_>>>();
        let bsp = BSplineSurface::new((uknot_vec, vknot_vec), control_points);

        const EPS: f64 = 1.0e-4;
        let (der0, der1) = if u_derivate {
            let der0 = bsp.der_mn(m + 1, n, u, v);
            let der1 = (bsp.der_mn(m, n, u + EPS, v) - bsp.der_mn(m, n, u - EPS, v)) / (2.0 * EPS);
            (der0, der1)
        } else {
            let der0 = bsp.der_mn(m, n + 1, u, v);
            let der1 = (bsp.der_mn(m, n, u, v + EPS) - bsp.der_mn(m, n, u, v - EPS)) / (2.0 * EPS);
            (der0, der1)
        };
        prop_assert!((der0 - der1).magnitude() < 0.01 * der0.magnitude().max(1.0));
    }
}
