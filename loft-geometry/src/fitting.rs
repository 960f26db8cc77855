//! Construction of surfaces through point grids: global interpolation,
//! bicubic local interpolation, and least-squares approximation. The solves
//! run on Euclidean control points; the results are lifted to rational
//! patches with all weights `1.0`.

use crate::errors::Error;
use crate::*;
use loft_base::lu::{self, Lu};

fn lift_unit_weights(
    knot_vecs: (KnotVec, KnotVec),
    control_points: Vec<Vec<Vector3>>,
) -> NurbsSurface<Vector4> {
    let control_points = control_points
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|v| Vector4::from_point(Point3::from_vec(v)))
                .collect()
        })
        .collect();
    NurbsSurface::new(BSplineSurface::new_unchecked(knot_vecs, control_points))
}

fn validate_grid(points: &[Vec<Point3>]) -> Result<()> {
    if points.is_empty() || points[0].is_empty() {
        return Err(Error::EmptyControlPoints);
    }
    let len = points[0].len();
    match points.iter().any(|row| row.len() != len) {
        true => Err(Error::IrregularControlPoints),
        false => Ok(()),
    }
}

fn transposed_grid<T: Clone>(grid: &[Vec<T>]) -> Vec<Vec<T>> {
    (0..grid[0].len())
        .map(|j| grid.iter().map(|row| row[j].clone()).collect())
        .collect()
}

/// Returns the normalized cumulative chord-length parameters of the rows,
/// averaged over all columns. Degenerate columns fall back to uniform spacing.
fn averaged_chord_parameters(points: &[Vec<Point3>]) -> Result<Vec<f64>> {
    let n = points.len();
    let m = points[0].len();
    let mut params = vec![0.0; n];
    for j in 0..m {
        let total: f64 = (1..n).map(|i| points[i][j].distance(points[i - 1][j])).sum();
        let mut acc = 0.0;
        for i in 1..n {
            acc += points[i][j].distance(points[i - 1][j]);
            params[i] += match total.so_small() {
                true => i as f64 / (n - 1) as f64,
                false => acc / total,
            };
        }
    }
    params.iter_mut().for_each(|t| *t /= m as f64);
    params[n - 1] = 1.0;
    match params.windows(2).any(|w| (w[1] - w[0]).so_small()) {
        true => Err(Error::ZeroRange),
        false => Ok(params),
    }
}

/// The knot vector consistent with the interpolation parameters: clamped ends
/// and interior knots by the averaging of `degree` consecutive parameters.
fn interpolation_knot_vec(params: &[f64], degree: usize) -> KnotVec {
    let n = params.len() - 1;
    let mut knots = vec![0.0; degree + 1];
    for j in 1..=(n - degree) {
        let avg = params[j..j + degree].iter().sum::<f64>() / degree as f64;
        knots.push(avg);
    }
    knots.extend(std::iter::repeat(1.0).take(degree + 1));
    KnotVec::try_from(knots).unwrap()
}

/// The knot vector for least-squares fitting, sized to `ncpts` control points
/// and placed by interpolating the data parameters.
fn approximation_knot_vec(params: &[f64], degree: usize, ncpts: usize) -> KnotVec {
    let r = params.len() - 1;
    let n = ncpts - 1;
    let d = (r + 1) as f64 / (n - degree + 1) as f64;
    let mut knots = vec![0.0; degree + 1];
    for j in 1..=(n - degree) {
        let jd = j as f64 * d;
        let i = jd.floor() as usize;
        let alpha = jd - i as f64;
        knots.push((1.0 - alpha) * params[i - 1] + alpha * params[i]);
    }
    knots.extend(std::iter::repeat(1.0).take(degree + 1));
    KnotVec::try_from(knots).unwrap()
}

/// Solves one direction of the global interpolation: returns the control
/// points of the curve through `points` at `params` over `knot_vec`.
fn interpolate_rows(
    points: Vec<Vec<Vector3>>,
    params: &[f64],
    knot_vec: &KnotVec,
    degree: usize,
) -> Result<Vec<Vec<Vector3>>> {
    let matrix = params
        .iter()
        .map(|&t| knot_vec.bspline_basis_functions(degree, t))
        .collect::<Vec<_>>();
    let lu = Lu::decompose(matrix).ok_or(Error::SingularSystem)?;
    let columns = transposed_grid(&points);
    let solved = columns.into_iter().map(|col| lu.solve(&col)).collect::<Vec<_>>();
    Ok(transposed_grid(&solved))
}

/// Interpolates the point grid by a B-spline surface of the given degrees.
///
/// The grid is parameterized by averaged chord lengths in each direction, the
/// knot vectors are computed by knot averaging, and the two families of
/// banded collocation systems are solved by LU decomposition: first one
/// u-system per column of the grid, then one v-system per row of the result.
/// # Failures
/// - [`Error::ZeroDegree`] - one of the degrees is zero.
/// - [`Error::TooLargeDegree`] - a degree is not less than the corresponding grid size.
/// - [`Error::ZeroRange`] - the chord parameterization of the grid is degenerate.
///
/// [`Error::ZeroDegree`]: errors/enum.Error.html#variant.ZeroDegree
/// [`Error::TooLargeDegree`]: errors/enum.Error.html#variant.TooLargeDegree
/// [`Error::ZeroRange`]: errors/enum.Error.html#variant.ZeroRange
/// # Examples
/// ```
/// use loft_geometry::*;
/// let points: Vec<Vec<Point3>> = (0..5)
///     .map(|i| {
///         (0..4)
///             .map(|j| {
///                 let (x, y) = (i as f64, j as f64);
///                 Point3::new(x, y, f64::sin(x) * 0.5 + y * y * 0.1)
///             })
///             .collect()
///     })
///     .collect();
/// let surface = fitting::interpolated_surface(&points, 3, 2).unwrap();
/// let (uparams, vparams) = fitting::interpolation_parameters(&points).unwrap();
/// // the surface passes through every node of the grid
/// for (i, &u) in uparams.iter().enumerate() {
///     for (j, &v) in vparams.iter().enumerate() {
///         assert_near!(surface.subs(u, v), points[i][j]);
///     }
/// }
/// ```
pub fn interpolated_surface(
    points: &[Vec<Point3>],
    udegree: usize,
    vdegree: usize,
) -> Result<NurbsSurface<Vector4>> {
    validate_grid(points)?;
    if udegree == 0 || vdegree == 0 {
        return Err(Error::ZeroDegree);
    }
    let (n, m) = (points.len(), points[0].len());
    if n <= udegree {
        return Err(Error::TooLargeDegree(n, udegree));
    }
    if m <= vdegree {
        return Err(Error::TooLargeDegree(m, vdegree));
    }

    let uparams = averaged_chord_parameters(points)?;
    let vparams = averaged_chord_parameters(&transposed_grid(points))?;
    let uknot_vec = interpolation_knot_vec(&uparams, udegree);
    let vknot_vec = interpolation_knot_vec(&vparams, vdegree);

    let grid: Vec<Vec<Vector3>> = points
        .iter()
        .map(|row| row.iter().map(|pt| pt.to_vec()).collect())
        .collect();

    // first the u-systems, one per column of the grid, then the v-systems on
    // the transpose of the intermediate result
    let intermediate = interpolate_rows(grid, &uparams, &uknot_vec, udegree)?;
    let control_points = transposed_grid(&interpolate_rows(
        transposed_grid(&intermediate),
        &vparams,
        &vknot_vec,
        vdegree,
    )?);

    Ok(lift_unit_weights((uknot_vec, vknot_vec), control_points))
}

/// Returns the parameters of the interpolation nodes of
/// [`interpolated_surface`] and [`bicubic_interpolated_surface`]: the surface
/// passes through `points[i][j]` at `(u_params[i], v_params[j])`.
pub fn interpolation_parameters(points: &[Vec<Point3>]) -> Result<(Vec<f64>, Vec<f64>)> {
    validate_grid(points)?;
    let uparams = averaged_chord_parameters(points)?;
    let vparams = averaged_chord_parameters(&transposed_grid(points))?;
    Ok((uparams, vparams))
}

/// The Bessel-style tangents of a polyline at its parameters: interior
/// tangents blend the adjacent chord slopes by the relative parameter steps,
/// the end tangents extrapolate the parabola through the first and last pair.
fn bessel_tangents(points: &[Vector3], params: &[f64]) -> Vec<Vector3> {
    let n = points.len() - 1;
    let slope =
        |k: usize| (points[k + 1] - points[k]) / (params[k + 1] - params[k]);
    if n == 1 {
        return vec![slope(0), slope(0)];
    }
    let mut tangents = vec![Vector3::zero(); n + 1];
    for k in 1..n {
        let delta0 = params[k] - params[k - 1];
        let delta1 = params[k + 1] - params[k];
        let alpha = delta0 / (delta0 + delta1);
        tangents[k] = slope(k - 1) * (1.0 - alpha) + slope(k) * alpha;
    }
    tangents[0] = slope(0) * 2.0 - tangents[1];
    tangents[n] = slope(n - 1) * 2.0 - tangents[n - 1];
    tangents
}

/// Interpolates the point grid by a bicubic B-spline surface with locally
/// estimated derivatives.
///
/// Per-node u- and v-tangents come from the Bessel scheme over the averaged
/// chord parameters; the twist vectors blend the four neighboring mixed
/// differences by the relative parameter steps. Each cell of the grid becomes
/// a bicubic Bézier patch whose four interior points are assembled from the
/// node, its tangents, and its twist. Adjacent patches share tangents, so one
/// knot per interior parameter is exactly removable and the returned knot
/// vectors have double interior knots.
/// # Failures
/// - [`Error::EmptyControlPoints`], [`Error::IrregularControlPoints`] - the grid is not a non-empty rectangle.
/// - [`Error::TooFewSamplePoints`] - fewer than two rows or columns.
/// - [`Error::ZeroRange`] - the chord parameterization of the grid is degenerate.
///
/// [`Error::EmptyControlPoints`]: errors/enum.Error.html#variant.EmptyControlPoints
/// [`Error::IrregularControlPoints`]: errors/enum.Error.html#variant.IrregularControlPoints
/// [`Error::TooFewSamplePoints`]: errors/enum.Error.html#variant.TooFewSamplePoints
/// [`Error::ZeroRange`]: errors/enum.Error.html#variant.ZeroRange
pub fn bicubic_interpolated_surface(points: &[Vec<Point3>]) -> Result<NurbsSurface<Vector4>> {
    validate_grid(points)?;
    let n = points.len() - 1;
    let m = points[0].len() - 1;
    if n < 1 || m < 1 {
        return Err(Error::TooFewSamplePoints(usize::min(n + 1, m + 1), 2));
    }

    let uparams = averaged_chord_parameters(points)?;
    let vparams = averaged_chord_parameters(&transposed_grid(points))?;

    let grid: Vec<Vec<Vector3>> = points
        .iter()
        .map(|row| row.iter().map(|pt| pt.to_vec()).collect())
        .collect();

    // tangents along u per column, along v per row
    let transposed = transposed_grid(&grid);
    let utangents = transposed_grid(
        &transposed
            .iter()
            .map(|col| bessel_tangents(col, &uparams))
            .collect::<Vec<_>>(),
    );
    let vtangents: Vec<Vec<Vector3>> = grid
        .iter()
        .map(|row| bessel_tangents(row, &vparams))
        .collect();

    // mixed differences per cell
    let mixed = |k: usize, l: usize| {
        let du = uparams[k + 1] - uparams[k];
        let dv = vparams[l + 1] - vparams[l];
        (grid[k + 1][l + 1] - grid[k][l + 1] - grid[k + 1][l] + grid[k][l]) / (du * dv)
    };
    let blend_indices = |k: usize, last: usize, params: &[f64]| {
        if k == 0 {
            (0, 0, 0.0)
        } else if k == last {
            (last - 1, last - 1, 0.0)
        } else {
            let delta0 = params[k] - params[k - 1];
            let delta1 = params[k + 1] - params[k];
            (k - 1, k, delta0 / (delta0 + delta1))
        }
    };
    let twist = |k: usize, l: usize| {
        let (km, kp, a) = blend_indices(k, n, &uparams);
        let (lm, lp, b) = blend_indices(l, m, &vparams);
        mixed(km, lm) * (1.0 - a) * (1.0 - b)
            + mixed(kp, lm) * a * (1.0 - b)
            + mixed(km, lp) * (1.0 - a) * b
            + mixed(kp, lp) * a * b
    };

    // assemble the Bézier control grid of size (3n + 1) x (3m + 1)
    let mut bezier = vec![vec![Vector3::zero(); 3 * m + 1]; 3 * n + 1];
    for k in 0..=n {
        for l in 0..=m {
            bezier[3 * k][3 * l] = grid[k][l];
        }
    }
    for k in 0..n {
        let du = (uparams[k + 1] - uparams[k]) / 3.0;
        for l in 0..=m {
            bezier[3 * k + 1][3 * l] = grid[k][l] + utangents[k][l] * du;
            bezier[3 * k + 2][3 * l] = grid[k + 1][l] - utangents[k + 1][l] * du;
        }
    }
    for l in 0..m {
        let dv = (vparams[l + 1] - vparams[l]) / 3.0;
        for k in 0..=n {
            bezier[3 * k][3 * l + 1] = grid[k][l] + vtangents[k][l] * dv;
            bezier[3 * k][3 * l + 2] = grid[k][l + 1] - vtangents[k][l + 1] * dv;
        }
    }
    for k in 0..n {
        let du = (uparams[k + 1] - uparams[k]) / 3.0;
        for l in 0..m {
            let dv = (vparams[l + 1] - vparams[l]) / 3.0;
            bezier[3 * k + 1][3 * l + 1] = grid[k][l]
                + utangents[k][l] * du
                + vtangents[k][l] * dv
                + twist(k, l) * (du * dv);
            bezier[3 * k + 2][3 * l + 1] = grid[k + 1][l] - utangents[k + 1][l] * du
                + vtangents[k + 1][l] * dv
                - twist(k + 1, l) * (du * dv);
            bezier[3 * k + 1][3 * l + 2] = grid[k][l + 1] + utangents[k][l + 1] * du
                - vtangents[k][l + 1] * dv
                - twist(k, l + 1) * (du * dv);
            bezier[3 * k + 2][3 * l + 2] = grid[k + 1][l + 1]
                - utangents[k + 1][l + 1] * du
                - vtangents[k + 1][l + 1] * dv
                + twist(k + 1, l + 1) * (du * dv);
        }
    }

    let bezier_knots = |params: &[f64]| {
        let mut knots = vec![0.0; 4];
        for &t in &params[1..params.len() - 1] {
            knots.extend_from_slice(&[t, t, t]);
        }
        knots.extend_from_slice(&[1.0; 4]);
        KnotVec::try_from(knots).unwrap()
    };
    let mut surface = BSplineSurface::new_unchecked(
        (bezier_knots(&uparams), bezier_knots(&vparams)),
        bezier,
    );

    // the patches join with C1 continuity, so one knot per interior
    // parameter comes out exactly
    uparams[1..n].iter().for_each(|&t| {
        surface.remove_uknot_value(t, 1);
    });
    vparams[1..m].iter().for_each(|&t| {
        surface.remove_vknot_value(t, 1);
    });
    let BSplineSurface {
        knot_vecs,
        control_points,
    } = surface;
    Ok(lift_unit_weights(knot_vecs, control_points))
}

/// Solves one direction of the least-squares fit: the end control points are
/// pinned to the data ends, the interior ones solve the normal equations.
fn lsq_rows(
    points: Vec<Vec<Vector3>>,
    params: &[f64],
    knot_vec: &KnotVec,
    degree: usize,
    ncpts: usize,
) -> Result<Vec<Vec<Vector3>>> {
    let r = params.len() - 1;
    let n = ncpts - 1;
    let basis = params
        .iter()
        .map(|&t| knot_vec.bspline_basis_functions(degree, t))
        .collect::<Vec<_>>();

    let columns = transposed_grid(&points);
    let mut solved = Vec::with_capacity(columns.len());
    if n < 2 {
        for col in columns {
            solved.push(vec![col[0], col[r]]);
        }
        return Ok(transposed_grid(&solved));
    }

    let n_mat: Vec<Vec<f64>> = (1..r)
        .map(|k| (1..n).map(|i| basis[k][i]).collect())
        .collect();
    let ntn = lu::multiplied(&lu::transposed(&n_mat), &n_mat);
    let lu = Lu::decompose(ntn).ok_or(Error::SingularSystem)?;

    for col in columns {
        let rhs: Vec<Vector3> = (1..n)
            .map(|i| {
                (1..r).fold(Vector3::zero(), |sum, k| {
                    let residual = col[k] - col[0] * basis[k][0] - col[r] * basis[k][n];
                    sum + residual * basis[k][i]
                })
            })
            .collect();
        let interior = lu.solve(&rhs);
        let mut control = Vec::with_capacity(ncpts);
        control.push(col[0]);
        control.extend(interior);
        control.push(col[r]);
        solved.push(control);
    }
    Ok(transposed_grid(&solved))
}

/// Approximates the point grid in the least-squares sense by a B-spline
/// surface with `rows * cols` control points of the given degrees.
///
/// The first and last control rows and columns are pinned to the data
/// boundary; the interior control points solve the per-direction normal
/// equations through the LU decomposition of the Gram matrices.
/// # Failures
/// - [`Error::ZeroDegree`] - one of the degrees is zero.
/// - [`Error::TooLargeDegree`] - a control count is not more than the corresponding degree.
/// - [`Error::TooFewSamplePoints`] - the requested control net is not strictly
///   smaller than the data grid.
/// - [`Error::SingularSystem`] - a normal-equation system is singular.
///
/// [`Error::ZeroDegree`]: errors/enum.Error.html#variant.ZeroDegree
/// [`Error::TooLargeDegree`]: errors/enum.Error.html#variant.TooLargeDegree
/// [`Error::TooFewSamplePoints`]: errors/enum.Error.html#variant.TooFewSamplePoints
/// [`Error::SingularSystem`]: errors/enum.Error.html#variant.SingularSystem
pub fn approximated_surface(
    points: &[Vec<Point3>],
    rows: usize,
    cols: usize,
    udegree: usize,
    vdegree: usize,
) -> Result<NurbsSurface<Vector4>> {
    validate_grid(points)?;
    if udegree == 0 || vdegree == 0 {
        return Err(Error::ZeroDegree);
    }
    if rows <= udegree {
        return Err(Error::TooLargeDegree(rows, udegree));
    }
    if cols <= vdegree {
        return Err(Error::TooLargeDegree(cols, vdegree));
    }
    if points.len() <= rows {
        return Err(Error::TooFewSamplePoints(points.len(), rows));
    }
    if points[0].len() <= cols {
        return Err(Error::TooFewSamplePoints(points[0].len(), cols));
    }

    let uparams = averaged_chord_parameters(points)?;
    let vparams = averaged_chord_parameters(&transposed_grid(points))?;
    let uknot_vec = approximation_knot_vec(&uparams, udegree, rows);
    let vknot_vec = approximation_knot_vec(&vparams, vdegree, cols);

    let grid: Vec<Vec<Vector3>> = points
        .iter()
        .map(|row| row.iter().map(|pt| pt.to_vec()).collect())
        .collect();

    let intermediate = lsq_rows(grid, &uparams, &uknot_vec, udegree, rows)?;
    let control_points = transposed_grid(&lsq_rows(
        transposed_grid(&intermediate),
        &vparams,
        &vknot_vec,
        vdegree,
        cols,
    )?);

    Ok(lift_unit_weights((uknot_vec, vknot_vec), control_points))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wavy_grid(rows: usize, cols: usize) -> Vec<Vec<Point3>> {
        (0..rows)
            .map(|i| {
                (0..cols)
                    .map(|j| {
                        let (x, y) = (i as f64, j as f64 * 0.8);
                        Point3::new(x, y, f64::sin(x * 0.9) + f64::cos(y * 0.7))
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn interpolation_reproduces_nodes() {
        let points = wavy_grid(6, 5);
        let surface = interpolated_surface(&points, 3, 3).unwrap();
        let (uparams, vparams) = interpolation_parameters(&points).unwrap();
        for (i, &u) in uparams.iter().enumerate() {
            for (j, &v) in vparams.iter().enumerate() {
                assert_near!(surface.subs(u, v), points[i][j]);
            }
        }
    }

    #[test]
    fn interpolation_argument_checks() {
        let points = wavy_grid(3, 3);
        assert_eq!(
            interpolated_surface(&points, 0, 2),
            Err(Error::ZeroDegree),
        );
        assert_eq!(
            interpolated_surface(&points, 3, 2),
            Err(Error::TooLargeDegree(3, 3)),
        );
        let ragged = vec![
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            vec![Point3::origin()],
        ];
        assert_eq!(
            interpolated_surface(&ragged, 1, 1),
            Err(Error::IrregularControlPoints),
        );
    }

    #[test]
    fn bicubic_reproduces_nodes() {
        let points = wavy_grid(5, 4);
        let surface = bicubic_interpolated_surface(&points).unwrap();
        assert_eq!(surface.degrees(), (3, 3));
        let (uparams, vparams) = interpolation_parameters(&points).unwrap();
        for (i, &u) in uparams.iter().enumerate() {
            for (j, &v) in vparams.iter().enumerate() {
                assert_near!(surface.subs(u, v), points[i][j]);
            }
        }
        // interior knots are doubled after the removal pass
        for &u in &uparams[1..uparams.len() - 1] {
            assert_eq!(surface.uknot_vec().multiplicity_of(u), 2);
        }
    }

    #[test]
    fn approximation_pins_corners() {
        let points = wavy_grid(8, 7);
        let surface = approximated_surface(&points, 5, 4, 3, 2).unwrap();
        assert_eq!(surface.control_points().len(), 5);
        assert_eq!(surface.control_points()[0].len(), 4);
        assert_near!(surface.subs(0.0, 0.0), points[0][0]);
        assert_near!(surface.subs(1.0, 0.0), points[7][0]);
        assert_near!(surface.subs(0.0, 1.0), points[0][6]);
        assert_near!(surface.subs(1.0, 1.0), points[7][6]);
    }

    #[test]
    fn approximation_of_plane_is_exact() {
        // a bilinear data set lies in the span of the fit space
        let points: Vec<Vec<Point3>> = (0..7)
            .map(|i| {
                (0..6)
                    .map(|j| Point3::new(i as f64, j as f64, i as f64 + 2.0 * j as f64))
                    .collect()
            })
            .collect();
        let surface = approximated_surface(&points, 4, 4, 2, 2).unwrap();
        for i in 0..=10 {
            for j in 0..=10 {
                let (u, v) = (i as f64 / 10.0, j as f64 / 10.0);
                let pt = surface.subs(u, v);
                assert_near!(pt.z, pt.x + 2.0 * pt.y);
            }
        }
    }
}
