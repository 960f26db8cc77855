use crate::errors::Error;
use crate::*;
use loft_base::ders::SurfaceDers;
use std::f64::consts::PI;

/// The result of projecting a point onto a surface.
///
/// Running out of the iteration budget is not a hard failure: the best
/// parameter found so far is returned with `converged == false`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedPoint {
    /// the parameter pair of the nearest surface point found
    pub uv: (f64, f64),
    /// whether the iteration met the tolerance criteria
    pub converged: bool,
}

impl<V> NurbsSurface<V> {
    /// constructor
    #[inline(always)]
    pub const fn new(bspsurface: BSplineSurface<V>) -> Self { NurbsSurface(bspsurface) }

    /// Returns the B-spline surface before rationalization.
    #[inline(always)]
    pub const fn non_rationalized(&self) -> &BSplineSurface<V> { &self.0 }
    /// Returns the mutable reference to the B-spline surface before rationalization.
    #[inline(always)]
    pub fn non_rationalized_mut(&mut self) -> &mut BSplineSurface<V> { &mut self.0 }
    /// Into the B-spline surface before rationalization.
    #[inline(always)]
    pub fn into_non_rationalized(self) -> BSplineSurface<V> { self.0 }

    /// Returns the reference of the knot vectors.
    #[inline(always)]
    pub const fn knot_vecs(&self) -> &(KnotVec, KnotVec) { &self.0.knot_vecs }
    /// Returns the u knot vector.
    #[inline(always)]
    pub const fn uknot_vec(&self) -> &KnotVec { &self.0.knot_vecs.0 }
    /// Returns the v knot vector.
    #[inline(always)]
    pub const fn vknot_vec(&self) -> &KnotVec { &self.0.knot_vecs.1 }
    /// Returns the `idx`th u knot.
    #[inline(always)]
    pub fn uknot(&self, idx: usize) -> f64 { self.0.knot_vecs.0[idx] }
    /// Returns the `idx`th v knot.
    #[inline(always)]
    pub fn vknot(&self, idx: usize) -> f64 { self.0.knot_vecs.1[idx] }

    /// Returns the reference of the control grid.
    #[inline(always)]
    pub const fn control_points(&self) -> &Vec<Vec<V>> { &self.0.control_points }
    /// Returns the reference of the control point corresponding to the index `(idx0, idx1)`.
    #[inline(always)]
    pub fn control_point(&self, idx0: usize, idx1: usize) -> &V {
        &self.0.control_points[idx0][idx1]
    }
    /// Returns the mutable reference of the control point corresponding to the index `(idx0, idx1)`.
    #[inline(always)]
    pub fn control_point_mut(&mut self, idx0: usize, idx1: usize) -> &mut V {
        &mut self.0.control_points[idx0][idx1]
    }
    /// Applies the given transformation to all control points.
    #[inline(always)]
    pub fn transform_control_points<F: FnMut(&mut V)>(&mut self, f: F) {
        self.0.transform_control_points(f)
    }

    /// Returns the u degree.
    #[inline(always)]
    pub fn udegree(&self) -> usize { self.0.udegree() }
    /// Returns the v degree.
    #[inline(always)]
    pub fn vdegree(&self) -> usize { self.0.vdegree() }
    /// Returns the degrees.
    #[inline(always)]
    pub fn degrees(&self) -> (usize, usize) { (self.0.udegree(), self.0.vdegree()) }
    /// Returns whether both knot vectors are clamped.
    #[inline(always)]
    pub fn is_clamped(&self) -> bool { self.0.is_clamped() }
    /// Swaps the two parametric directions.
    pub fn swap_axes(&mut self) -> &mut Self
    where V: Clone {
        self.0.swap_axes();
        self
    }
    /// The range of the parameters of the surface.
    #[inline(always)]
    pub fn parameter_range(&self) -> ((f64, f64), (f64, f64)) { self.0.parameter_range() }
    /// Creates the iso-curve along the v direction at the `row_idx`th control row.
    #[inline(always)]
    pub fn column_curve(&self, row_idx: usize) -> NurbsCurve<V>
    where V: Clone {
        NurbsCurve::new(self.0.column_curve(row_idx))
    }
    /// Creates the iso-curve along the u direction at the `column_idx`th control column.
    #[inline(always)]
    pub fn row_curve(&self, column_idx: usize) -> NurbsCurve<V>
    where V: Clone {
        NurbsCurve::new(self.0.row_curve(column_idx))
    }
}

impl<V: Homogeneous> NurbsSurface<V> {
    /// Constructs a rational surface from a non-rationalized surface and weights.
    /// # Failures
    /// The shapes of `surface.control_points()` and `weights` must coincide.
    pub fn try_from_bspline_and_weights(
        surface: BSplineSurface<V::Point>,
        weights: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let BSplineSurface {
            knot_vecs,
            control_points,
        } = surface;
        if control_points.len() != weights.len() {
            return Err(Error::DifferentLength);
        }
        let control_points = control_points
            .into_iter()
            .zip(weights)
            .map(|(control_points, weights)| {
                if control_points.len() != weights.len() {
                    return Err(Error::DifferentLength);
                }
                Ok(control_points
                    .into_iter()
                    .zip(weights)
                    .map(|(pt, w)| V::from_point_weight(pt, w))
                    .collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(BSplineSurface::new_unchecked(
            knot_vecs,
            control_points,
        )))
    }

    /// Projects every control point to Euclidean space, discarding the weights.
    /// The inverse of the unit-weight lift `NurbsSurface::from`.
    pub fn to_euclidean(&self) -> BSplineSurface<V::Point>
    where V: Copy {
        let control_points = self
            .0
            .control_points
            .iter()
            .map(|row| row.iter().map(|pt| pt.to_point()).collect())
            .collect();
        BSplineSurface::new_unchecked(self.0.knot_vecs.clone(), control_points)
    }
}

impl<V: Homogeneous> From<BSplineSurface<V::Point>> for NurbsSurface<V> {
    /// Lifts a Euclidean surface with all weights `1.0`.
    fn from(bsp: BSplineSurface<V::Point>) -> Self {
        let control_points = bsp
            .control_points
            .into_iter()
            .map(|vec| vec.into_iter().map(|p| V::from_point(p)).collect())
            .collect();
        Self(BSplineSurface {
            knot_vecs: bsp.knot_vecs,
            control_points,
        })
    }
}

impl<V: Homogeneous + VectorSpace<Scalar = f64>> NurbsSurface<V>
where V::Vector: Copy
{
    /// Substitutes to the NURBS surface: evaluates the homogeneous surface and
    /// projects to the Euclidean point.
    #[inline(always)]
    pub fn subs(&self, u: f64, v: f64) -> V::Point { self.0.subs(u, v).to_point() }

    /// Returns the closure of substitution.
    #[inline(always)]
    pub fn get_closure(&self) -> impl Fn(f64, f64) -> V::Point + '_ { move |u, v| self.subs(u, v) }

    /// Substitutes to the u-derivative of the rational surface.
    #[inline(always)]
    pub fn uder(&self, u: f64, v: f64) -> V::Vector {
        self.0.subs(u, v).rat_der(self.0.uder(u, v))
    }

    /// Substitutes to the v-derivative of the rational surface.
    #[inline(always)]
    pub fn vder(&self, u: f64, v: f64) -> V::Vector {
        self.0.subs(u, v).rat_der(self.0.vder(u, v))
    }

    /// Substitutes to the 2nd-order u-derivative of the rational surface.
    #[inline(always)]
    pub fn uuder(&self, u: f64, v: f64) -> V::Vector {
        self.0
            .subs(u, v)
            .rat_der2(self.0.uder(u, v), self.0.uuder(u, v))
    }

    /// Substitutes to the 2nd-order v-derivative of the rational surface.
    #[inline(always)]
    pub fn vvder(&self, u: f64, v: f64) -> V::Vector {
        self.0
            .subs(u, v)
            .rat_der2(self.0.vder(u, v), self.0.vvder(u, v))
    }

    /// Substitutes to the mixed derivative of the rational surface.
    #[inline(always)]
    pub fn uvder(&self, u: f64, v: f64) -> V::Vector {
        self.0.subs(u, v).rat_cross_der(
            self.0.uder(u, v),
            self.0.vder(u, v),
            self.0.uvder(u, v),
        )
    }

    /// Returns the triangular grid of all rational derivatives of total order
    /// up to `max_order` at the parameter `(u, v)`: the quotient rule applied
    /// to the derivatives of the homogeneous surface.
    ///
    /// The entry of orders `(0, 0)` is the position vector of the surface
    /// point; the entries with total order greater than `max_order` do not
    /// exist.
    #[inline(always)]
    pub fn ders(&self, max_order: usize, u: f64, v: f64) -> SurfaceDers<V::Vector> {
        self.0.ders(max_order, u, v).rat_ders()
    }
}

impl<V: Homogeneous + VectorSpace<Scalar = f64>> NurbsSurface<V>
where V::Point: Tolerance
{
    /// Returns whether the constant surface or not, i.e. all control points
    /// project to the same Euclidean point.
    #[inline(always)]
    pub fn is_const(&self) -> bool {
        let pt = self.0.control_points[0][0].to_point();
        self.0
            .control_points
            .iter()
            .flatten()
            .all(|vec| vec.to_point().near(&pt))
    }

    /// Determines whether `self` and `other` are near as rational surfaces.
    ///
    /// Divides each knot domain into the number of degree equal parts,
    /// and checks `|self(u, v) - other(u, v)| < TOLERANCE` at each sample.
    #[inline(always)]
    pub fn near_as_surface(&self, other: &Self) -> bool {
        self.0
            .sub_near_as_surface(&other.0, 2, move |x, y| x.to_point().near(&y.to_point()))
    }

    /// Determines whether `self` and `other` are near in square order as
    /// rational surfaces.
    #[inline(always)]
    pub fn near2_as_surface(&self, other: &Self) -> bool {
        self.0
            .sub_near_as_surface(&other.0, 2, move |x, y| x.to_point().near2(&y.to_point()))
    }
}

impl<V: Homogeneous + VectorSpace<Scalar = f64> + Tolerance> NurbsSurface<V> {
    /// Returns whether the surface is closed in the u direction.
    #[inline(always)]
    pub fn is_uclosed(&self) -> bool { self.0.is_uclosed() }
    /// Returns whether the surface is closed in the v direction.
    #[inline(always)]
    pub fn is_vclosed(&self) -> bool { self.0.is_vclosed() }

    /// Adds a u knot `x` without changing the surface.
    #[inline(always)]
    pub fn add_uknot(&mut self, x: f64) -> &mut Self {
        self.0.add_uknot(x);
        self
    }
    /// Adds a v knot `x` without changing the surface.
    #[inline(always)]
    pub fn add_vknot(&mut self, x: f64) -> &mut Self {
        self.0.add_vknot(x);
        self
    }
    /// Inserts the u knot `x` with multiplicity `mult`, saturating at the u degree.
    #[inline(always)]
    pub fn insert_uknot(&mut self, x: f64, mult: usize) -> &mut Self {
        self.0.insert_uknot(x, mult);
        self
    }
    /// Inserts the v knot `x` with multiplicity `mult`, saturating at the v degree.
    #[inline(always)]
    pub fn insert_vknot(&mut self, x: f64, mult: usize) -> &mut Self {
        self.0.insert_vknot(x, mult);
        self
    }
    /// Inserts all the given u knot values without changing the surface.
    #[inline(always)]
    pub fn refine_uknots(&mut self, knots: &[f64]) -> &mut Self {
        self.0.refine_uknots(knots);
        self
    }
    /// Inserts all the given v knot values without changing the surface.
    #[inline(always)]
    pub fn refine_vknots(&mut self, knots: &[f64]) -> &mut Self {
        self.0.refine_vknots(knots);
        self
    }
    /// Removes the u knot corresponding to the index `idx`.
    /// # Failures
    /// If the knot cannot be removed, returns [`Error::CannotRemoveKnot`].
    ///
    /// [`Error::CannotRemoveKnot`]: errors/enum.Error.html#variant.CannotRemoveKnot
    #[inline(always)]
    pub fn try_remove_uknot(&mut self, idx: usize) -> Result<&mut Self> {
        self.0.try_remove_uknot(idx).map(|_| ())?;
        Ok(self)
    }
    /// Removes the u knot corresponding to the index `idx`; does nothing if it
    /// cannot be removed.
    #[inline(always)]
    pub fn remove_uknot(&mut self, idx: usize) -> &mut Self {
        self.0.remove_uknot(idx);
        self
    }
    /// Removes the v knot corresponding to the index `idx`.
    /// # Failures
    /// If the knot cannot be removed, returns [`Error::CannotRemoveKnot`].
    ///
    /// [`Error::CannotRemoveKnot`]: errors/enum.Error.html#variant.CannotRemoveKnot
    #[inline(always)]
    pub fn try_remove_vknot(&mut self, idx: usize) -> Result<&mut Self> {
        self.0.try_remove_vknot(idx).map(|_| ())?;
        Ok(self)
    }
    /// Removes the v knot corresponding to the index `idx`; does nothing if it
    /// cannot be removed.
    #[inline(always)]
    pub fn remove_vknot(&mut self, idx: usize) -> &mut Self {
        self.0.remove_vknot(idx);
        self
    }
    /// Removes the u knot value `x` up to `times` times and returns the number
    /// of knots actually removed.
    #[inline(always)]
    pub fn remove_uknot_value(&mut self, x: f64, times: usize) -> usize {
        self.0.remove_uknot_value(x, times)
    }
    /// Removes the v knot value `x` up to `times` times and returns the number
    /// of knots actually removed.
    #[inline(always)]
    pub fn remove_vknot_value(&mut self, x: f64, times: usize) -> usize {
        self.0.remove_vknot_value(x, times)
    }
    /// Elevates the u degree by one.
    #[inline(always)]
    pub fn elevate_udegree(&mut self) -> &mut Self {
        self.0.elevate_udegree();
        self
    }
    /// Elevates the v degree by one.
    #[inline(always)]
    pub fn elevate_vdegree(&mut self) -> &mut Self {
        self.0.elevate_vdegree();
        self
    }
    /// Elevates the u degree by `times`.
    #[inline(always)]
    pub fn elevate_udegree_by(&mut self, times: usize) -> &mut Self {
        self.0.elevate_udegree_by(times);
        self
    }
    /// Elevates the v degree by `times`.
    #[inline(always)]
    pub fn elevate_vdegree_by(&mut self, times: usize) -> &mut Self {
        self.0.elevate_vdegree_by(times);
        self
    }
    /// Lowers the u degree by one if the tolerance permits on every column.
    /// # Failures
    /// Returns [`Error::CannotReduceDegree`] and leaves `self` unchanged otherwise.
    ///
    /// [`Error::CannotReduceDegree`]: errors/enum.Error.html#variant.CannotReduceDegree
    #[inline(always)]
    pub fn try_reduce_udegree(&mut self) -> Result<&mut Self> {
        self.0.try_reduce_udegree().map(|_| ())?;
        Ok(self)
    }
    /// Lowers the v degree by one if the tolerance permits on every row.
    /// # Failures
    /// Returns [`Error::CannotReduceDegree`] and leaves `self` unchanged otherwise.
    ///
    /// [`Error::CannotReduceDegree`]: errors/enum.Error.html#variant.CannotReduceDegree
    #[inline(always)]
    pub fn try_reduce_vdegree(&mut self) -> Result<&mut Self> {
        self.0.try_reduce_vdegree().map(|_| ())?;
        Ok(self)
    }
    /// Separates the surface into a grid of rational Bézier patches; the cell
    /// `(i, j)` covers the `i`th u knot span and the `j`th v knot span.
    #[inline(always)]
    pub fn bezier_decomposition(&self) -> Vec<Vec<NurbsSurface<V>>> {
        self.0
            .bezier_decomposition()
            .into_iter()
            .map(|strip| strip.into_iter().map(NurbsSurface::new).collect())
            .collect()
    }
    /// Cuts the surface into two surfaces at the parameter `u`.
    #[inline(always)]
    pub fn ucut(&mut self, u: f64) -> Self { Self::new(self.0.ucut(u)) }
    /// Cuts the surface into two surfaces at the parameter `v`.
    #[inline(always)]
    pub fn vcut(&mut self, v: f64) -> Self { Self::new(self.0.vcut(v)) }
    /// Reverses the u direction. An involution.
    #[inline(always)]
    pub fn reverse_u(&mut self) -> &mut Self {
        self.0.reverse_u();
        self
    }
    /// Reverses the v direction. An involution.
    #[inline(always)]
    pub fn reverse_v(&mut self) -> &mut Self {
        self.0.reverse_v();
        self
    }
    /// Normalizes the knot vectors.
    #[inline(always)]
    pub fn knot_normalize(&mut self) -> &mut Self {
        self.0.knot_vecs.0.normalize();
        self.0.knot_vecs.1.normalize();
        self
    }

    /// Creates the ruled surface between two rational curves.
    /// # Failures
    /// Returns [`Error::DifferentBackFront`] if the domains of the two curves
    /// do not coincide.
    ///
    /// [`Error::DifferentBackFront`]: errors/enum.Error.html#variant.DifferentBackFront
    pub fn try_ruled(curve0: NurbsCurve<V>, curve1: NurbsCurve<V>) -> Result<Self> {
        Ok(NurbsSurface(BSplineSurface::try_ruled(
            curve0.into_non_rationalized(),
            curve1.into_non_rationalized(),
        )?))
    }
}

impl NurbsSurface<Vector4> {
    /// Returns the normal unit vector at the parameter `(u, v)`.
    #[inline(always)]
    pub fn normal(&self, u: f64, v: f64) -> Vector3 {
        let pt = self.0.subs(u, v);
        let ud = self.0.uder(u, v);
        let vd = self.0.vder(u, v);
        pt.rat_der(ud).cross(pt.rat_der(vd)).normalize()
    }

    /// Decomposes a spatial tangent vector at the parameter `(u, v)` into its
    /// parametric components `(a, b)` with `a * uder + b * vder = tangent` in
    /// the least-squares sense.
    /// # Failures
    /// Returns [`Error::DegenerateTangents`] if the partial derivatives are
    /// parallel, i.e. the Gram matrix is singular.
    ///
    /// [`Error::DegenerateTangents`]: errors/enum.Error.html#variant.DegenerateTangents
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let surface = NurbsSurface::<Vector4>::bilinear(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(2.0, 0.0, 0.0),
    ///     Point3::new(2.0, 1.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// );
    /// let (a, b) = surface.uv_tangent(0.5, 0.5, Vector3::new(2.0, 1.0, 0.0)).unwrap();
    /// assert_near!(a, 1.0);
    /// assert_near!(b, 1.0);
    /// ```
    pub fn uv_tangent(&self, u: f64, v: f64, tangent: Vector3) -> Result<(f64, f64)> {
        let uder = self.uder(u, v);
        let vder = self.vder(u, v);
        let matrix = Matrix2::new(
            uder.dot(uder),
            uder.dot(vder),
            uder.dot(vder),
            vder.dot(vder),
        );
        if matrix.determinant().so_small2() {
            return Err(Error::DegenerateTangents);
        }
        let sol = matrix.invert().unwrap() * Vector2::new(uder.dot(tangent), vder.dot(tangent));
        Ok((sol.x, sol.y))
    }

    /// Samples the surface on a `rows * udegree` by `columns * vdegree` grid
    /// and refines each u-segment by projecting `point` on the secant line
    /// between adjacent samples. Returns the parameter pair of the closest
    /// candidate. Used as the seed of [`NurbsSurface::project_point`].
    pub fn presearch(&self, point: Point3) -> (f64, f64) {
        let ((u0, u1), (v0, v1)) = self.parameter_range();
        let (udegree, vdegree) = self.degrees();
        let division0 = self.0.control_points.len() * usize::max(udegree, 1);
        let division1 = self.0.control_points[0].len() * usize::max(vdegree, 1);

        let mut res = (u0, v0);
        let mut min = f64::INFINITY;
        for j in 0..=division1 {
            let v = v0 + (v1 - v0) * (j as f64) / (division1 as f64);
            let mut prev_u = u0;
            let mut prev_pt = self.subs(prev_u, v);
            for i in 1..=division0 {
                let u = u0 + (u1 - u0) * (i as f64) / (division0 as f64);
                let pt = self.subs(u, v);
                let chord = pt - prev_pt;
                let t = match chord.magnitude2().so_small2() {
                    true => 0.0,
                    false => ((point - prev_pt).dot(chord) / chord.magnitude2()).clamp(0.0, 1.0),
                };
                let candidate = prev_pt + chord * t;
                let dist = candidate.distance2(point);
                if dist < min {
                    min = dist;
                    res = (prev_u + (u - prev_u) * t, v);
                }
                prev_u = u;
                prev_pt = pt;
            }
        }
        res
    }

    /// Searches the parameter `(u, v)` which minimizes `|self(u, v) - point|`
    /// by Newton's method on the distance function, starting from `hint`.
    ///
    /// Each iteration solves the full second-order system on the residual
    /// `r = self(u, v) - point`; a singular system skips the update but spends
    /// the iteration. After each update, open directions are clamped to the
    /// knot range and closed directions are wrapped modulo the domain length.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::bezier_knot(3), KnotVec::bezier_knot(2));
    /// let ctrl_pts = vec![
    ///     vec![Vector4::new(0.0, 0.0, 0.0, 1.0), Vector4::new(0.5, -1.0, 1.0, 2.0), Vector4::new(1.0, 0.0, 0.0, 1.0)],
    ///     vec![Vector4::new(0.0, 1.0, 0.5, 1.0), Vector4::new(0.5, 1.0, 1.0, 1.0), Vector4::new(1.0, 1.0, 0.5, 1.0)],
    ///     vec![Vector4::new(0.0, 2.0, 0.5, 1.0), Vector4::new(0.5, 2.0, 1.5, 1.0), Vector4::new(1.0, 2.0, 0.5, 1.0)],
    ///     vec![Vector4::new(0.0, 3.0, 0.0, 1.0), Vector4::new(0.5, 3.5, 1.0, 2.0), Vector4::new(1.0, 3.0, 0.0, 1.0)],
    /// ];
    /// let surface = NurbsSurface::new(BSplineSurface::new(knot_vecs, ctrl_pts));
    /// let pt = surface.subs(0.3, 0.7);
    /// let res = surface.search_nearest_parameter(pt, (0.5, 0.5), 100);
    /// assert!(res.converged);
    /// let (u, v) = res.uv;
    /// assert_near!(surface.subs(u, v), pt);
    /// ```
    pub fn search_nearest_parameter(
        &self,
        point: Point3,
        hint: (f64, f64),
        trials: usize,
    ) -> ProjectedPoint {
        let ((u0, u1), (v0, v1)) = self.parameter_range();
        let uclosed = self.is_uclosed();
        let vclosed = self.is_vclosed();
        let wrap = |t: f64, t0: f64, t1: f64, closed: bool| match closed {
            true => t0 + (t - t0).rem_euclid(t1 - t0),
            false => t.clamp(t0, t1),
        };
        let (mut u, mut v) = hint;
        for _ in 0..trials {
            let ders = self.ders(2, u, v);
            let r = ders[0][0] - point.to_vec();
            let (su, sv) = (ders[1][0], ders[0][1]);
            let (suu, suv, svv) = (ders[2][0], ders[1][1], ders[0][2]);

            let dist = r.magnitude();
            if dist < TOLERANCE {
                return ProjectedPoint {
                    uv: (u, v),
                    converged: true,
                };
            }
            let ucos = su.dot(r).abs() / (su.magnitude() * dist);
            let vcos = sv.dot(r).abs() / (sv.magnitude() * dist);
            if ucos < TOLERANCE && vcos < TOLERANCE {
                return ProjectedPoint {
                    uv: (u, v),
                    converged: true,
                };
            }

            let matrix = Matrix2::new(
                su.dot(su) + r.dot(suu),
                su.dot(sv) + r.dot(suv),
                su.dot(sv) + r.dot(suv),
                sv.dot(sv) + r.dot(svv),
            );
            if matrix.determinant().so_small2() {
                continue;
            }
            let delta = matrix.invert().unwrap() * -Vector2::new(su.dot(r), sv.dot(r));

            let next_u = wrap(u + delta.x, u0, u1, uclosed);
            let next_v = wrap(v + delta.y, v0, v1, vclosed);
            let step = (su * (next_u - u)).magnitude() + (sv * (next_v - v)).magnitude();
            u = next_u;
            v = next_v;
            if step < TOLERANCE {
                return ProjectedPoint {
                    uv: (u, v),
                    converged: true,
                };
            }
        }
        ProjectedPoint {
            uv: (u, v),
            converged: false,
        }
    }

    /// Returns the parameter pair whose surface point is closest to `point`:
    /// a dense sampling seed refined by up to 10 Newton iterations.
    ///
    /// Non-convergence is reported through the flag of the result, not as an
    /// error; the parameter returned is then the best iterate found.
    #[inline(always)]
    pub fn project_point(&self, point: Point3) -> ProjectedPoint {
        let hint = self.presearch(point);
        self.search_nearest_parameter(point, hint, 10)
    }

    /// Constructs the bilinear patch spanned by four corner points, given in
    /// the cyclic order `p00`, `p10`, `p11`, `p01`. The patch is represented
    /// bicubically: the 4 by 4 control grid blends the corners at the
    /// parameters i/3, j/3 with all weights `1.0`.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let surface = NurbsSurface::<Vector4>::bilinear(
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(1.0, 1.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// );
    /// assert_eq!(surface.degrees(), (3, 3));
    /// assert_near!(surface.subs(0.25, 0.75), Point3::new(0.25, 0.75, 0.0));
    /// ```
    pub fn bilinear(p00: Point3, p10: Point3, p11: Point3, p01: Point3) -> Self {
        let control_points = (0..4)
            .map(|i| {
                let s = i as f64 / 3.0;
                (0..4)
                    .map(|j| {
                        let t = j as f64 / 3.0;
                        let pt = p00.to_vec() * (1.0 - s) * (1.0 - t)
                            + p10.to_vec() * s * (1.0 - t)
                            + p11.to_vec() * s * t
                            + p01.to_vec() * (1.0 - s) * t;
                        Vector4::from_point(Point3::from_vec(pt))
                    })
                    .collect()
            })
            .collect();
        NurbsSurface(BSplineSurface::new_unchecked(
            (KnotVec::bezier_knot(3), KnotVec::bezier_knot(3)),
            control_points,
        ))
    }

    /// Constructs the cylindrical surface swept by the circular arc of the
    /// given radius around `origin` in the plane of the orthonormal frame
    /// `(x_axis, y_axis)`, extruded by `height` along `x_axis × y_axis`.
    ///
    /// The u direction is the extrusion (degree 2, three control rows at the
    /// heights 0, h/2, h), the v direction is the arc; the weights of each row
    /// are the weights of the arc.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// use std::f64::consts::PI;
    /// let surface = NurbsSurface::<Vector4>::cylinder(
    ///     Point3::origin(),
    ///     Vector3::unit_x(),
    ///     Vector3::unit_y(),
    ///     0.0,
    ///     PI / 2.0,
    ///     1.0,
    ///     2.0,
    /// );
    /// let angle = PI / 4.0;
    /// assert_near!(
    ///     surface.subs(0.5, 0.5),
    ///     Point3::new(f64::cos(angle), f64::sin(angle), 1.0),
    /// );
    /// ```
    pub fn cylinder(
        origin: Point3,
        x_axis: Vector3,
        y_axis: Vector3,
        angle0: f64,
        angle1: f64,
        radius: f64,
        height: f64,
    ) -> Self {
        let arc = NurbsCurve::<Vector4>::circle_arc(origin, x_axis, y_axis, radius, angle0, angle1);
        let axis = x_axis.cross(y_axis);
        let control_points = [0.0, 0.5, 1.0]
            .iter()
            .map(|t| {
                let translation = axis * (height * t);
                arc.control_points()
                    .iter()
                    .map(|pt| {
                        let moved = translation * pt.weight();
                        Vector4::new(pt.x + moved.x, pt.y + moved.y, pt.z + moved.z, pt.w)
                    })
                    .collect()
            })
            .collect();
        NurbsSurface(BSplineSurface::new_unchecked(
            (KnotVec::bezier_knot(2), arc.knot_vec().clone()),
            control_points,
        ))
    }

    /// Constructs the surface of revolution of the generatrix curve about the
    /// axis line `(origin, axis)` with the total sweep `angle`.
    ///
    /// The u direction is the rotation: the sweep is split into
    /// `ceil(2 * angle / pi)` segments of equal angle so that no segment
    /// exceeds a quarter turn, represented by quadratic rational arcs with
    /// doubled interior knots. For each generatrix control point the rotated
    /// control points are placed in its rotation plane; the odd-index points
    /// are the intersections of the tangent rays of their neighbors, with the
    /// weight `cos(delta / 2)` times the generatrix weight.
    /// # Failures
    /// Returns [`Error::TangentRaysDoNotIntersect`] if adjacent tangent rays
    /// fail to meet, which only happens for degenerate frames.
    ///
    /// [`Error::TangentRaysDoNotIntersect`]: errors/enum.Error.html#variant.TangentRaysDoNotIntersect
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// use std::f64::consts::PI;
    /// // a line parallel to the z-axis at distance 2, swept fully around
    /// let generatrix = NurbsCurve::<Vector4>::new(BSplineCurve::new(
    ///     KnotVec::bezier_knot(1),
    ///     vec![Vector4::new(2.0, 0.0, 0.0, 1.0), Vector4::new(2.0, 0.0, 3.0, 1.0)],
    /// ));
    /// let surface = NurbsSurface::try_revolved(
    ///     &generatrix,
    ///     Point3::origin(),
    ///     Vector3::unit_z(),
    ///     2.0 * PI,
    /// ).unwrap();
    /// // every surface point keeps the generatrix distance from the axis
    /// for i in 0..5 {
    ///     for j in 0..5 {
    ///         let (u, v) = (i as f64 / 4.0, j as f64 / 4.0);
    ///         let pt = surface.subs(u, v);
    ///         assert_near!(Vector2::new(pt.x, pt.y).magnitude(), 2.0);
    ///         assert_near!(pt.z, 3.0 * v);
    ///     }
    /// }
    /// ```
    pub fn try_revolved(
        generatrix: &NurbsCurve<Vector4>,
        origin: Point3,
        axis: Vector3,
        angle: f64,
    ) -> Result<Self> {
        let axis = axis.normalize();
        let narcs = usize::max(f64::ceil(2.0 * angle.abs() / PI) as usize, 1);
        let delta = angle / narcs as f64;
        let arc_weight = f64::cos(delta / 2.0);

        let mut columns = Vec::with_capacity(generatrix.control_points().len());
        for g in generatrix.control_points() {
            let pt = g.to_point();
            let weight = g.weight();
            let foot = origin + axis * axis.dot(pt - origin);
            let radial = pt - foot;
            let radius = radial.magnitude();

            let mut column = Vec::with_capacity(2 * narcs + 1);
            if radius.so_small() {
                // the point lies on the axis: the whole column degenerates to it
                column.push(*g);
                for _ in 0..narcs {
                    column.push(Vector4::from_point_weight(pt, weight * arc_weight));
                    column.push(*g);
                }
            } else {
                let x_dir = radial / radius;
                let y_dir = axis.cross(x_dir);
                let point_at = |theta: f64| {
                    foot + (x_dir * f64::cos(theta) + y_dir * f64::sin(theta)) * radius
                };
                let tangent_at =
                    |theta: f64| -x_dir * f64::sin(theta) + y_dir * f64::cos(theta);

                column.push(*g);
                for i in 0..narcs {
                    let start = delta * i as f64;
                    let end = delta * (i + 1) as f64;
                    let mid = ray_ray_intersection(
                        point_at(start),
                        tangent_at(start),
                        point_at(end),
                        tangent_at(end),
                    )
                    .ok_or(Error::TangentRaysDoNotIntersect)?;
                    column.push(Vector4::from_point_weight(mid, weight * arc_weight));
                    column.push(Vector4::from_point_weight(point_at(end), weight));
                }
            }
            columns.push(column);
        }

        // transpose: the rotation runs along u
        let control_points = (0..2 * narcs + 1)
            .map(|i| columns.iter().map(|column| column[i]).collect())
            .collect();

        let mut uknots = vec![0.0; 3];
        for i in 1..narcs {
            let t = i as f64 / narcs as f64;
            uknots.extend_from_slice(&[t, t]);
        }
        uknots.extend_from_slice(&[1.0; 3]);
        Ok(NurbsSurface(BSplineSurface::new_unchecked(
            (
                KnotVec::try_from(uknots).unwrap(),
                generatrix.knot_vec().clone(),
            ),
            control_points,
        )))
    }
}

/// Returns the intersection point of the two rays `p + s * d`. `None` if the
/// rays are parallel or skew.
fn ray_ray_intersection(p0: Point3, d0: Vector3, p1: Point3, d1: Vector3) -> Option<Point3> {
    let normal = d0.cross(d1);
    if normal.magnitude2().so_small2() {
        return None;
    }
    let w = p1 - p0;
    let s = w.cross(d1).dot(normal) / normal.magnitude2();
    let t = w.cross(d0).dot(normal) / normal.magnitude2();
    let q0 = p0 + d0 * s;
    let q1 = p1 + d1 * t;
    match q0.near(&q1) {
        true => Some(q0 + (q1 - q0) / 2.0),
        false => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_intersection_in_plane() {
        let p = ray_ray_intersection(
            Point3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
        )
        .unwrap();
        assert_near!(p, Point3::new(1.0, 1.0, 0.0));

        // parallel rays never intersect
        assert!(ray_ray_intersection(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_x(),
            Point3::new(0.0, 1.0, 0.0),
            Vector3::unit_x(),
        )
        .is_none());

        // skew rays do not intersect either
        assert!(ray_ray_intersection(
            Point3::new(0.0, 0.0, 0.0),
            Vector3::unit_x(),
            Point3::new(0.0, 1.0, 1.0),
            Vector3::unit_y(),
        )
        .is_none());
    }

    #[test]
    fn projection_on_cylinder() {
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
    }

    #[test]
    fn rational_ders_match_specialized_derivatives() {
        let knot_vecs = (KnotVec::bezier_knot(2), KnotVec::bezier_knot(2));
        let ctrl_pts = vec![
            vec![
                Vector4::new(0.0, 0.0, 0.0, 1.0),
                Vector4::new(1.0, -1.0, 0.0, 2.0),
                Vector4::new(1.0, 0.0, 0.0, 1.0),
            ],
            vec![
                Vector4::new(0.0, 2.0, 1.0, 2.0),
                Vector4::new(2.0, 4.0, 2.0, 4.0),
                Vector4::new(2.0, 2.0, 1.0, 2.0),
            ],
            vec![
                Vector4::new(0.0, 4.0, 0.0, 1.0),
                Vector4::new(2.0, 8.0, 0.0, 2.0),
                Vector4::new(2.0, 4.0, 0.0, 1.0),
            ],
        ];
        let surface = NurbsSurface::new(BSplineSurface::new(knot_vecs, ctrl_pts));
        let (u, v) = (0.3, 0.6);
        let ders = surface.ders(2, u, v);
        assert_near!(ders[0][0], surface.subs(u, v).to_vec());
        assert_near!(ders[1][0], surface.uder(u, v));
        assert_near!(ders[0][1], surface.vder(u, v));
        assert_near!(ders[2][0], surface.uuder(u, v));
        assert_near!(ders[1][1], surface.uvder(u, v));
        assert_near!(ders[0][2], surface.vvder(u, v));
    }
}
