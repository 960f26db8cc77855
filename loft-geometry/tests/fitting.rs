use loft_geometry::*;

fn hump_grid(rows: usize, cols: usize) -> Vec<Vec<Point3>> {
    (0..rows)
        .map(|i| {
            (0..cols)
                .map(|j| {
                    let (x, y) = (
                        i as f64 / (rows - 1) as f64,
                        j as f64 / (cols - 1) as f64,
                    );
                    Point3::new(x * 4.0, y * 3.0, f64::exp(-(x - 0.5) * (x - 0.5) * 4.0) * y)
                })
                .collect()
        })
        .collect()
}

#[test]
fn global_interpolation_passes_through_nodes() {
    let points = hump_grid(7, 6);
    let surface = fitting::interpolated_surface(&points, 3, 3).unwrap();
    let (uparams, vparams) = fitting::interpolation_parameters(&points).unwrap();
    for (i, &u) in uparams.iter().enumerate() {
        for (j, &v) in vparams.iter().enumerate() {
            assert_near!(surface.subs(u, v), points[i][j]);
        }
    }
    // sizing invariant of the output
    assert_eq!(
        surface.uknot_vec().len(),
        surface.control_points().len() + surface.udegree() + 1,
    );
    assert_eq!(
        surface.vknot_vec().len(),
        surface.control_points()[0].len() + surface.vdegree() + 1,
    );
}

#[test]
fn interpolation_with_mixed_degrees() {
    let points = hump_grid(5, 8);
    let surface = fitting::interpolated_surface(&points, 2, 4).unwrap();
    assert_eq!(surface.degrees(), (2, 4));
    let (uparams, vparams) = fitting::interpolation_parameters(&points).unwrap();
    for (i, &u) in uparams.iter().enumerate() {
        for (j, &v) in vparams.iter().enumerate() {
            assert_near!(surface.subs(u, v), points[i][j]);
        }
    }
}

#[test]
fn bicubic_local_interpolation_passes_through_nodes() {
    let points = hump_grid(6, 5);
    let surface = fitting::bicubic_interpolated_surface(&points).unwrap();
    assert_eq!(surface.degrees(), (3, 3));
    let (uparams, vparams) = fitting::interpolation_parameters(&points).unwrap();
    for (i, &u) in uparams.iter().enumerate() {
        for (j, &v) in vparams.iter().enumerate() {
            assert_near!(surface.subs(u, v), points[i][j]);
        }
    }
    // the interior knots end up doubled
    for &u in &uparams[1..uparams.len() - 1] {
        assert_eq!(surface.uknot_vec().multiplicity_of(u), 2);
    }
    for &v in &vparams[1..vparams.len() - 1] {
        assert_eq!(surface.vknot_vec().multiplicity_of(v), 2);
    }
}

#[test]
fn approximation_shrinks_the_net_and_pins_ends() {
    let points = hump_grid(10, 9);
    let surface = fitting::approximated_surface(&points, 6, 5, 3, 3).unwrap();
    assert_eq!(surface.control_points().len(), 6);
    assert_eq!(surface.control_points()[0].len(), 5);
    assert_near!(surface.subs(0.0, 0.0), points[0][0]);
    assert_near!(surface.subs(1.0, 1.0), points[9][8]);

    // the fit stays reasonably close to the samples
    let (uparams, vparams) = fitting::interpolation_parameters(&points).unwrap();
    for (i, &u) in uparams.iter().enumerate() {
        for (j, &v) in vparams.iter().enumerate() {
            let dist = surface.subs(u, v).distance(points[i][j]);
            assert!(dist < 0.1, "sample ({i}, {j}): distance {dist}");
        }
    }
}

#[test]
fn approximation_requires_shrinking() {
    let points = hump_grid(5, 5);
    assert!(fitting::approximated_surface(&points, 5, 4, 3, 3).is_err());
    assert!(fitting::approximated_surface(&points, 4, 5, 3, 3).is_err());
    assert!(fitting::approximated_surface(&points, 3, 3, 3, 3).is_err());
}
