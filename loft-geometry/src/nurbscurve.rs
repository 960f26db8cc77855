use crate::errors::Error;
use crate::*;
use std::f64::consts::PI;

impl<V> NurbsCurve<V> {
    /// constructor
    #[inline(always)]
    pub const fn new(curve: BSplineCurve<V>) -> Self { NurbsCurve(curve) }

    /// Returns the B-spline curve before rationalization.
    #[inline(always)]
    pub const fn non_rationalized(&self) -> &BSplineCurve<V> { &self.0 }

    /// Into the B-spline curve before rationalization.
    #[inline(always)]
    pub fn into_non_rationalized(self) -> BSplineCurve<V> { self.0 }

    /// Returns the reference of the knot vector.
    #[inline(always)]
    pub const fn knot_vec(&self) -> &KnotVec { self.0.knot_vec() }

    /// Returns the `idx`th knot.
    #[inline(always)]
    pub fn knot(&self, idx: usize) -> f64 { self.0.knot(idx) }

    /// Returns the reference of the control points.
    #[inline(always)]
    pub const fn control_points(&self) -> &Vec<V> { self.0.control_points() }

    /// Returns the reference of the `idx`th control point.
    #[inline(always)]
    pub fn control_point(&self, idx: usize) -> &V { self.0.control_point(idx) }

    /// Returns the mutable reference of the `idx`th control point.
    #[inline(always)]
    pub fn control_point_mut(&mut self, idx: usize) -> &mut V { self.0.control_point_mut(idx) }

    /// Returns the degree of the NURBS curve.
    #[inline(always)]
    pub fn degree(&self) -> usize { self.0.degree() }

    /// Inverts the direction of the curve.
    #[inline(always)]
    pub fn invert(&mut self) -> &mut Self {
        self.0.invert();
        self
    }

    /// Determines whether the knot vector is clamped.
    #[inline(always)]
    pub fn is_clamped(&self) -> bool { self.0.is_clamped() }

    /// Normalizes the knot vector.
    #[inline(always)]
    pub fn knot_normalize(&mut self) -> &mut Self {
        self.0.knot_normalize();
        self
    }

    /// Translates the knot vector.
    #[inline(always)]
    pub fn knot_translate(&mut self, x: f64) -> &mut Self {
        self.0.knot_translate(x);
        self
    }
}

impl<V: Homogeneous> NurbsCurve<V> {
    /// Constructs a rational curve from a non-rationalized curve and weights.
    /// # Failures
    /// The lengths of `curve.control_points()` and `weights` must be the same.
    pub fn try_from_bspline_and_weights(
        curve: BSplineCurve<V::Point>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        if curve.control_points().len() != weights.len() {
            return Err(Error::DifferentLength);
        }
        let knot_vec = curve.knot_vec().clone();
        let control_points = curve
            .control_points()
            .iter()
            .zip(weights)
            .map(|(&pt, w)| V::from_point_weight(pt, w))
            .collect();
        Ok(NurbsCurve(BSplineCurve::new_unchecked(
            knot_vec,
            control_points,
        )))
    }
}

impl<V: Homogeneous + VectorSpace<Scalar = f64>> NurbsCurve<V> {
    /// Substitutes to the NURBS curve: evaluates the homogeneous curve and
    /// projects to the Euclidean point.
    #[inline(always)]
    pub fn subs(&self, t: f64) -> V::Point { self.0.subs(t).to_point() }

    /// Substitutes to the derivative of the NURBS curve.
    #[inline(always)]
    pub fn der(&self, t: f64) -> V::Vector { self.0.subs(t).rat_der(self.0.der(t)) }

    /// Substitutes to the 2nd-order derivative of the NURBS curve.
    #[inline(always)]
    pub fn der2(&self, t: f64) -> V::Vector {
        self.0.subs(t).rat_der2(self.0.der(t), self.0.der2(t))
    }

    /// Returns the closure of substitution.
    #[inline(always)]
    pub fn get_closure(&self) -> impl Fn(f64) -> V::Point + '_ { move |t| self.subs(t) }
}

impl<V: Homogeneous + VectorSpace<Scalar = f64> + Tolerance> NurbsCurve<V>
where V::Point: Tolerance
{
    /// Adds a knot without changing the curve.
    #[inline(always)]
    pub fn add_knot(&mut self, x: f64) -> &mut Self {
        self.0.add_knot(x);
        self
    }
    /// Inserts the knot `x` with multiplicity `mult`, saturating at the degree.
    #[inline(always)]
    pub fn insert_knot(&mut self, x: f64, mult: usize) -> &mut Self {
        self.0.insert_knot(x, mult);
        self
    }
    /// Inserts all the given knot values without changing the curve.
    #[inline(always)]
    pub fn refine_knots(&mut self, knots: &[f64]) -> &mut Self {
        self.0.refine_knots(knots);
        self
    }
    /// Removes the knot corresponding to the index `idx`.
    /// # Failures
    /// If the knot cannot be removed, returns [`Error::CannotRemoveKnot`].
    ///
    /// [`Error::CannotRemoveKnot`]: errors/enum.Error.html#variant.CannotRemoveKnot
    #[inline(always)]
    pub fn try_remove_knot(&mut self, idx: usize) -> Result<&mut Self> {
        self.0.try_remove_knot(idx).map(|_| ())?;
        Ok(self)
    }
    /// Removes the knot value `x` up to `times` times and returns the number
    /// of knots actually removed.
    #[inline(always)]
    pub fn remove_knot_value(&mut self, x: f64, times: usize) -> usize {
        self.0.remove_knot_value(x, times)
    }
    /// Elevates the degree by one.
    #[inline(always)]
    pub fn elevate_degree(&mut self) -> &mut Self {
        self.0.elevate_degree();
        self
    }
    /// Lowers the degree by one if the tolerance permits.
    /// # Failures
    /// Returns [`Error::CannotReduceDegree`] if the curve is not degree-reducible.
    ///
    /// [`Error::CannotReduceDegree`]: errors/enum.Error.html#variant.CannotReduceDegree
    #[inline(always)]
    pub fn try_reduce_degree(&mut self) -> Result<&mut Self> {
        self.0.try_reduce_degree().map(|_| ())?;
        Ok(self)
    }
    /// Makes the curve clamped.
    #[inline(always)]
    pub fn clamp(&mut self) -> &mut Self {
        self.0.clamp();
        self
    }
    /// Separates the curve into rational Bézier segments.
    #[inline(always)]
    pub fn bezier_decomposition(&self) -> Vec<NurbsCurve<V>> {
        self.0
            .bezier_decomposition()
            .into_iter()
            .map(NurbsCurve::new)
            .collect()
    }
    /// Determines whether `self` and `other` are near as rational curves.
    #[inline(always)]
    pub fn near_as_curve(&self, other: &Self) -> bool {
        self.0
            .sub_near_as_curve(&other.0, 2, |x, y| x.to_point().near(&y.to_point()))
    }
}

impl<V: Homogeneous> From<BSplineCurve<V::Point>> for NurbsCurve<V> {
    /// Lifts a Euclidean curve with all weights `1.0`.
    fn from(curve: BSplineCurve<V::Point>) -> Self {
        let knot_vec = curve.knot_vec().clone();
        let control_points = curve
            .control_points()
            .iter()
            .map(|&p| V::from_point(p))
            .collect();
        NurbsCurve(BSplineCurve::new_unchecked(knot_vec, control_points))
    }
}

impl NurbsCurve<Vector4> {
    /// Constructs the circular arc of the given radius around `origin`,
    /// swept from `angle0` to `angle1` in the plane spanned by the orthonormal
    /// frame `(x_axis, y_axis)`.
    ///
    /// The arc is split into `ceil(2 * angle / pi)` rational quadratic
    /// segments so that no segment sweeps more than a quarter turn; the knot
    /// vector has interior knots of multiplicity 2 and the odd-index control
    /// points carry the weight `cos(angle / segments / 2)`.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// use std::f64::consts::PI;
    /// let arc = NurbsCurve::<Vector4>::circle_arc(
    ///     Point3::origin(),
    ///     Vector3::unit_x(),
    ///     Vector3::unit_y(),
    ///     2.0,
    ///     0.0,
    ///     PI * 1.5,
    /// );
    /// const N: usize = 50;
    /// for i in 0..=N {
    ///     let t = i as f64 / N as f64;
    ///     let pt = arc.subs(t);
    ///     assert_near!(pt.to_vec().magnitude(), 2.0);
    /// }
    /// assert_near!(arc.subs(0.0), Point3::new(2.0, 0.0, 0.0));
    /// assert_near!(arc.subs(1.0), Point3::new(0.0, -2.0, 0.0));
    /// ```
    pub fn circle_arc(
        origin: Point3,
        x_axis: Vector3,
        y_axis: Vector3,
        radius: f64,
        angle0: f64,
        angle1: f64,
    ) -> NurbsCurve<Vector4> {
        let angle = angle1 - angle0;
        let narcs = f64::ceil(2.0 * angle.abs() / PI) as usize;
        let narcs = usize::max(narcs, 1);
        let delta = angle / narcs as f64;
        let weight = f64::cos(delta / 2.0);

        let point_at = |theta: f64, r: f64| {
            origin + (x_axis * f64::cos(theta) + y_axis * f64::sin(theta)) * r
        };
        let mut control_points = Vec::with_capacity(2 * narcs + 1);
        control_points.push(Vector4::from_point(point_at(angle0, radius)));
        for i in 0..narcs {
            let mid = angle0 + delta * (i as f64 + 0.5);
            let end = angle0 + delta * (i + 1) as f64;
            control_points.push(Vector4::from_point_weight(
                point_at(mid, radius / weight),
                weight,
            ));
            control_points.push(Vector4::from_point(point_at(end, radius)));
        }

        let mut knots = vec![0.0; 3];
        for i in 1..narcs {
            let t = i as f64 / narcs as f64;
            knots.extend_from_slice(&[t, t]);
        }
        knots.extend_from_slice(&[1.0; 3]);
        NurbsCurve(BSplineCurve::new_unchecked(
            KnotVec::try_from(knots).unwrap(),
            control_points,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_arc_hits_quadrant_points() {
        let arc = NurbsCurve::<Vector4>::circle_arc(
            Point3::new(1.0, 0.0, 0.0),
            Vector3::unit_y(),
            Vector3::unit_z(),
            1.0,
            0.0,
            PI / 2.0,
        );
        assert_eq!(arc.degree(), 2);
        assert_near!(arc.subs(0.0), Point3::new(1.0, 1.0, 0.0));
        assert_near!(arc.subs(1.0), Point3::new(1.0, 0.0, 1.0));
        // a quarter arc is a single rational Bézier segment
        assert_eq!(arc.control_points().len(), 3);
        assert_near!(arc.control_points()[1][3], f64::cos(PI / 4.0));
    }

    #[test]
    fn rational_derivative_is_tangent() {
        let arc = NurbsCurve::<Vector4>::circle_arc(
            Point3::origin(),
            Vector3::unit_x(),
            Vector3::unit_y(),
            1.5,
            0.0,
            PI,
        );
        for i in 1..10 {
            let t = i as f64 / 10.0;
            let pt = arc.subs(t).to_vec();
            let der = arc.der(t);
            // the tangent of a circle is orthogonal to the radius
            assert!(pt.dot(der).abs() < 1.0e-6, "t = {t}: {}", pt.dot(der));
        }
    }
}
