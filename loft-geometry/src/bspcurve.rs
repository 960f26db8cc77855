use crate::errors::Error;
use crate::*;
use std::convert::TryInto;

impl<V> BSplineCurve<V> {
    /// constructor.
    /// # Arguments
    /// * `knot_vec` - the knot vector
    /// * `control_points` - the vector of the control points
    /// # Panics
    /// There are 3 rules for constructing a B-spline curve:
    /// * The number of knots is more than the one of control points.
    /// * There exist at least two different knots.
    /// * There is at least one control point.
    #[inline(always)]
    pub fn new(knot_vec: KnotVec, control_points: Vec<V>) -> BSplineCurve<V> {
        BSplineCurve::try_new(knot_vec, control_points).unwrap_or_else(|e| panic!("{}", e))
    }

    /// constructor.
    /// # Failures
    /// Checks the 3 rules of [`BSplineCurve::new`] and returns the
    /// corresponding error if one of them is violated.
    #[inline(always)]
    pub fn try_new(knot_vec: KnotVec, control_points: Vec<V>) -> Result<BSplineCurve<V>> {
        if control_points.is_empty() {
            Err(Error::EmptyControlPoints)
        } else if knot_vec.len() <= control_points.len() {
            Err(Error::TooShortKnotVector(
                knot_vec.len(),
                control_points.len(),
            ))
        } else if knot_vec.range_length().so_small() {
            Err(Error::ZeroRange)
        } else {
            Ok(BSplineCurve::new_unchecked(knot_vec, control_points))
        }
    }

    /// constructor.
    /// This method does NOT check the 3 rules of [`BSplineCurve::new`].
    /// The programmer must guarantee these conditions before using this method.
    #[inline(always)]
    pub const fn new_unchecked(knot_vec: KnotVec, control_points: Vec<V>) -> BSplineCurve<V> {
        BSplineCurve {
            knot_vec,
            control_points,
        }
    }

    /// constructor.
    /// This method checks the 3 rules of [`BSplineCurve::new`] in the debug mode.
    #[inline(always)]
    pub fn debug_new(knot_vec: KnotVec, control_points: Vec<V>) -> BSplineCurve<V> {
        match cfg!(debug_assertions) {
            true => Self::new(knot_vec, control_points),
            false => Self::new_unchecked(knot_vec, control_points),
        }
    }

    /// Returns the reference of the knot vector
    #[inline(always)]
    pub const fn knot_vec(&self) -> &KnotVec { &self.knot_vec }

    /// Returns the `idx`th knot
    #[inline(always)]
    pub fn knot(&self, idx: usize) -> f64 { self.knot_vec[idx] }

    /// Returns the reference of the control points
    #[inline(always)]
    pub const fn control_points(&self) -> &Vec<V> { &self.control_points }

    /// Returns the reference of the `idx`th control point
    #[inline(always)]
    pub fn control_point(&self, idx: usize) -> &V { &self.control_points[idx] }

    /// Returns the mutable reference of the `idx`th control point
    #[inline(always)]
    pub fn control_point_mut(&mut self, idx: usize) -> &mut V { &mut self.control_points[idx] }

    /// Returns the iterator over the mutable references of the control points.
    #[inline(always)]
    pub fn control_points_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.control_points.iter_mut()
    }

    /// Applies the given transformation to all control points.
    #[inline(always)]
    pub fn transform_control_points<F: FnMut(&mut V)>(&mut self, f: F) {
        self.control_points.iter_mut().for_each(f)
    }

    /// Returns the degree of the B-spline curve.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::from(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    /// let ctrl_pts = vec![Vector2::new(1.0, 2.0), Vector2::new(2.0, 3.0), Vector2::new(3.0, 4.0)];
    /// let bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    /// assert_eq!(bspcurve.degree(), 2);
    /// ```
    #[inline(always)]
    pub fn degree(&self) -> usize { self.knot_vec.len() - self.control_points.len() - 1 }

    /// Inverts the direction of the curve: reflects the knot vector and
    /// reverses the control points. `self.invert().invert()` is the original curve.
    #[inline(always)]
    pub fn invert(&mut self) -> &mut Self {
        self.knot_vec.invert();
        self.control_points.reverse();
        self
    }

    /// Determines whether the knot vector is clamped.
    #[inline(always)]
    pub fn is_clamped(&self) -> bool { self.knot_vec.is_clamped(self.degree()) }

    /// Normalizes the knot vector.
    #[inline(always)]
    pub fn knot_normalize(&mut self) -> &mut Self {
        self.knot_vec.try_normalize().unwrap();
        self
    }

    /// Translates the knot vector.
    #[inline(always)]
    pub fn knot_translate(&mut self, x: f64) -> &mut Self {
        self.knot_vec.translate(x);
        self
    }
}

impl<V: VectorSpace<Scalar = f64>> BSplineCurve<V> {
    /// Substitutes to the B-spline curve.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::from(vec![-1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
    /// let ctrl_pts = vec![Vector2::new(-1.0, 1.0), Vector2::new(0.0, -1.0), Vector2::new(1.0, 1.0)];
    /// let bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    ///
    /// // bspcurve coincides with (t, t^2).
    /// const N: usize = 100; // sample size
    /// for i in 0..=N {
    ///     let t = -1.0 + 2.0 * (i as f64) / (N as f64);
    ///     assert_near2!(bspcurve.subs(t), Vector2::new(t, t * t));
    /// }
    /// ```
    #[inline(always)]
    pub fn subs(&self, t: f64) -> V {
        let basis = self
            .knot_vec
            .try_bspline_basis_functions(self.degree(), t)
            .unwrap();
        self.control_points
            .iter()
            .zip(basis)
            .fold(V::zero(), |sum, (pt, basis)| sum + *pt * basis)
    }

    /// Substitutes to the derivative of the B-spline curve.
    #[inline(always)]
    pub fn der(&self, t: f64) -> V {
        let k = self.degree();
        if k < 1 {
            return V::zero();
        }
        let BSplineCurve {
            ref knot_vec,
            ref control_points,
        } = self;
        let basis = knot_vec.try_bspline_basis_functions(k - 1, t).unwrap();
        let closure = move |sum: V, (i, pt): (usize, &V)| {
            let coef0 = inv_or_zero(knot_vec[i + k] - knot_vec[i]);
            let coef1 = inv_or_zero(knot_vec[i + k + 1] - knot_vec[i + 1]);
            sum + *pt * (basis[i] * coef0 - basis[i + 1] * coef1)
        };
        control_points.iter().enumerate().fold(V::zero(), closure) * k as f64
    }

    /// Substitutes to the 2nd-order derivative of the B-spline curve.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::bezier_knot(3);
    /// let ctrl_pts = vec![
    ///     Vector2::new(0.0, 0.0),
    ///     Vector2::new(1.0, 1.0),
    ///     Vector2::new(0.0, 1.0),
    ///     Vector2::new(1.0, 0.0),
    /// ];
    /// let bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    ///
    /// // bspcurve = (4t^3 - 6t^2 + 3t, -3t^2 + 3t), so der2 = (24t - 12, -6)
    /// const N: usize = 100; // sample size
    /// for i in 0..=N {
    ///     let t = 1.0 / (N as f64) * (i as f64);
    ///     assert_near2!(bspcurve.der2(t), Vector2::new(24.0 * t - 12.0, -6.0));
    /// }
    /// ```
    #[inline(always)]
    pub fn der2(&self, t: f64) -> V {
        let k = self.degree();
        if k < 2 {
            return V::zero();
        }
        let BSplineCurve {
            ref knot_vec,
            ref control_points,
        } = self;
        let basis = knot_vec.try_bspline_basis_functions(k - 2, t).unwrap();
        let closure = move |sum: V, (i, pt): (usize, &V)| {
            let a = inv_or_zero(knot_vec[i + k] - knot_vec[i]);
            let b = inv_or_zero(knot_vec[i + k + 1] - knot_vec[i + 1]);
            let c = inv_or_zero(knot_vec[i + k - 1] - knot_vec[i]);
            let d = inv_or_zero(knot_vec[i + k] - knot_vec[i + 1]);
            let e = inv_or_zero(knot_vec[i + k + 1] - knot_vec[i + 2]);
            sum + *pt * (basis[i] * a * c - basis[i + 1] * (a + b) * d + basis[i + 2] * b * e)
        };
        control_points.iter().enumerate().fold(V::zero(), closure) * k as f64 * (k - 1) as f64
    }

    /// Returns the closure of substitution.
    #[inline(always)]
    pub fn get_closure(&self) -> impl Fn(f64) -> V + '_ { move |t| self.subs(t) }

    #[inline(always)]
    fn delta_control_points(&self, i: usize) -> V {
        if i == 0 {
            self.control_points[i]
        } else if i == self.control_points.len() {
            self.control_points[i - 1] * (-1.0)
        } else {
            self.control_points[i] - self.control_points[i - 1]
        }
    }

    /// Returns the derivative of the B-spline curve as another B-spline over
    /// the same knot vector.
    pub fn derivation(&self) -> BSplineCurve<V> {
        let n = self.control_points.len();
        let k = self.degree();
        let knot_vec = self.knot_vec.clone();
        let mut new_points = Vec::with_capacity(n + 1);
        if k > 0 {
            let (knot_vec, new_points) = (&knot_vec, &mut new_points);
            (0..=n).for_each(move |i| {
                let delta = knot_vec[i + k] - knot_vec[i];
                let coef = (k as f64) * inv_or_zero(delta);
                new_points.push(self.delta_control_points(i) * coef);
            });
        } else {
            new_points = vec![V::zero(); n];
        }
        BSplineCurve::new_unchecked(knot_vec, new_points)
    }

    pub(crate) fn sub_near_as_curve<F: Fn(&V, &V) -> bool>(
        &self,
        other: &BSplineCurve<V>,
        div_coef: usize,
        ord: F,
    ) -> bool {
        if !self.knot_vec.same_range(&other.knot_vec) {
            return false;
        }

        let division = std::cmp::max(self.degree(), other.degree()) * div_coef;
        for i in 0..(self.knot_vec.len() - 1) {
            let delta = self.knot_vec[i + 1] - self.knot_vec[i];
            if delta.so_small() {
                continue;
            }

            for j in 0..division {
                let t = self.knot_vec[i] + delta * (j as f64) / (division as f64);
                if !ord(&self.subs(t), &other.subs(t)) {
                    return false;
                }
            }
        }
        true
    }
}

impl<V: VectorSpace<Scalar = f64> + Tolerance> BSplineCurve<V> {
    /// Returns whether all control points are the same or not.
    /// If the knot vector is clamped, it means whether the curve is constant or not.
    pub fn is_const(&self) -> bool {
        self.control_points
            .iter()
            .all(move |pt| pt.near(&self.control_points[0]))
    }

    /// Adds a knot `x` without changing `self` as a curve.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::bezier_knot(2);
    /// let ctrl_pts = vec![Vector2::new(-1.0, 1.0), Vector2::new(0.0, -1.0), Vector2::new(1.0, 1.0)];
    /// let mut bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    /// let org_curve = bspcurve.clone();
    ///
    /// bspcurve.add_knot(0.5).add_knot(0.5).add_knot(0.25).add_knot(0.75);
    /// assert_eq!(bspcurve.knot_vec().len(), org_curve.knot_vec().len() + 4);
    /// assert!(bspcurve.near2_as_curve(&org_curve));
    /// ```
    /// # Remarks
    /// If the added knot `x` is out of the range of the knot vector, the knot vector is extended.
    pub fn add_knot(&mut self, x: f64) -> &mut Self {
        if x < self.knot_vec[0] {
            self.knot_vec.add_knot(x);
            self.control_points.insert(0, V::zero());
            return self;
        }

        let k = self.degree();
        let n = self.control_points.len();

        let idx = self.knot_vec.add_knot(x);
        let start = if idx > k { idx - k } else { 0 };
        let end = if idx > n {
            self.control_points.push(V::zero());
            n + 1
        } else {
            self.control_points
                .insert(idx - 1, self.control_points[idx - 1]);
            idx
        };
        for i in start..end {
            let i0 = end + start - i - 1;
            let delta = self.knot_vec[i0 + k + 1] - self.knot_vec[i0];
            let a = (self.knot_vec[idx] - self.knot_vec[i0]) * inv_or_zero(delta);
            let p = self.delta_control_points(i0) * (1.0 - a);
            self.control_points[i0] = self.control_points[i0] - p;
        }
        self
    }

    /// Inserts the knot `x` with multiplicity `mult`, saturating at the degree.
    ///
    /// If the current multiplicity `s` of `x` already equals the degree, the
    /// curve is returned unchanged; otherwise at most `degree - s` copies are
    /// inserted.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::from(vec![0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0, 1.0]);
    /// let ctrl_pts: Vec<_> = (0..7).map(|i| Vector2::new(i as f64, (i % 3) as f64)).collect();
    /// let mut bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    ///
    /// // 0.5 already has multiplicity 3 = degree, so this is a no-op.
    /// let org_curve = bspcurve.clone();
    /// bspcurve.insert_knot(0.5, 2);
    /// assert_eq!(bspcurve, org_curve);
    ///
    /// // 0.25 is a new knot; multiplicity saturates at the degree.
    /// bspcurve.insert_knot(0.25, 5);
    /// assert_eq!(bspcurve.knot_vec().multiplicity_of(0.25), 3);
    /// assert!(bspcurve.near2_as_curve(&org_curve));
    /// ```
    pub fn insert_knot(&mut self, x: f64, mult: usize) -> &mut Self {
        let degree = self.degree();
        let s = self.knot_vec.multiplicity_of(x);
        if s >= degree {
            return self;
        }
        for _ in 0..mult.min(degree - s) {
            self.add_knot(x);
        }
        self
    }

    /// Inserts all the given knot values in sequence without changing `self`
    /// as a curve. The resulting knot vector is the sorted merge of the old
    /// one and `knots`.
    pub fn refine_knots(&mut self, knots: &[f64]) -> &mut Self {
        knots.iter().for_each(|&x| {
            self.add_knot(x);
        });
        self
    }

    /// Removes a knot corresponding to the index `idx` without changing `self`
    /// as a curve. If the knot cannot be removed, does not change `self`.
    pub fn remove_knot(&mut self, idx: usize) -> &mut Self {
        let _ = self.try_remove_knot(idx);
        self
    }

    /// Removes a knot corresponding to the index `idx` without changing `self`
    /// as a curve.
    /// # Failures
    /// If the knot cannot be removed, returns
    /// [`Error::CannotRemoveKnot`](./errors/enum.Error.html#variant.CannotRemoveKnot).
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// use errors::Error;
    /// let knot_vec = KnotVec::bezier_knot(2);
    /// let ctrl_pts = vec![Vector2::new(-1.0, 1.0), Vector2::new(0.0, -1.0), Vector2::new(1.0, 1.0)];
    /// let mut bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    /// let org_curve = bspcurve.clone();
    /// bspcurve.add_knot(0.5).add_knot(0.5).add_knot(0.25).add_knot(0.75);
    /// assert!(bspcurve.try_remove_knot(3).is_ok());
    /// assert_eq!(bspcurve.try_remove_knot(2), Err(Error::CannotRemoveKnot(2)));
    /// ```
    pub fn try_remove_knot(&mut self, idx: usize) -> Result<&mut BSplineCurve<V>> {
        let k = self.degree();
        let n = self.control_points.len();
        let knot_vec = &self.knot_vec;

        if idx < k + 1 || idx >= n {
            return Err(Error::CannotRemoveKnot(idx));
        }

        let mut new_points = Vec::with_capacity(k + 1);
        new_points.push(self.control_points[idx - k - 1]);
        for i in (idx - k)..idx {
            let delta = knot_vec[i + k + 1] - knot_vec[i];
            let a = inv_or_zero(delta) * (knot_vec[idx] - knot_vec[i]);
            if a.so_small() {
                break;
            } else {
                let p = self.control_points[i] / a - *new_points.last().unwrap() * (1.0 - a) / a;
                new_points.push(p);
            }
        }

        if !new_points.last().unwrap().near(&self.control_points[idx]) {
            return Err(Error::CannotRemoveKnot(idx));
        }

        for (i, vec) in new_points.into_iter().skip(1).enumerate() {
            self.control_points[idx - k + i] = vec;
        }

        self.control_points.remove(idx);
        self.knot_vec.remove(idx);
        Ok(self)
    }

    /// Removes the knot value `x` up to `times` times, keeping the curve
    /// within tolerance, and returns the number of knots actually removed.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::bezier_knot(2);
    /// let ctrl_pts = vec![Vector2::new(-1.0, 1.0), Vector2::new(0.0, -1.0), Vector2::new(1.0, 1.0)];
    /// let mut bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    /// let org_curve = bspcurve.clone();
    /// bspcurve.insert_knot(0.5, 2);
    ///
    /// assert_eq!(bspcurve.remove_knot_value(0.5, 2), 2);
    /// assert_eq!(bspcurve.remove_knot_value(0.5, 1), 0);
    /// assert!(bspcurve.near2_as_curve(&org_curve));
    /// ```
    pub fn remove_knot_value(&mut self, x: f64, times: usize) -> usize {
        let mut removed = 0;
        for _ in 0..times {
            let Some(idx) = self.knot_vec.floor(x).filter(|&idx| self.knot_vec[idx].near(&x))
            else {
                break;
            };
            if self.try_remove_knot(idx).is_err() {
                break;
            }
            removed += 1;
        }
        removed
    }

    /// elevate 1 degree for a Bézier curve.
    fn elevate_degree_bezier(&mut self) -> &mut Self {
        let k = self.degree();
        self.knot_vec.add_knot(self.knot_vec[0]);
        self.knot_vec
            .add_knot(self.knot_vec[self.knot_vec.len() - 1]);
        self.control_points.push(V::zero());
        for i in 0..=(k + 1) {
            let i0 = k + 1 - i;
            let a = (i0 as f64) / ((k + 1) as f64);
            let p = self.delta_control_points(i0) * a;
            self.control_points[i0] = self.control_points[i0] - p;
        }
        self
    }

    /// reduce 1 degree for a Bézier curve by inverting the elevation
    /// recurrence; fails if the residual leaves the tolerance.
    fn try_reduce_degree_bezier(&mut self) -> Result<&mut Self> {
        let k = self.degree();
        if k < 1 {
            return Err(Error::CannotReduceDegree);
        }
        let mut new_points = Vec::with_capacity(k);
        new_points.push(self.control_points[0]);
        for i in 1..k {
            let a = (i as f64) / (k as f64);
            let p = (self.control_points[i] - *new_points.last().unwrap() * a) / (1.0 - a);
            new_points.push(p);
        }
        if !new_points.last().unwrap().near(&self.control_points[k]) {
            return Err(Error::CannotReduceDegree);
        }
        self.knot_vec.remove(0);
        let m = self.knot_vec.len();
        self.knot_vec.remove(m - 1);
        self.control_points = new_points;
        Ok(self)
    }

    /// elevate 1 degree.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::bezier_knot(1);
    /// let ctrl_pts = vec![Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)];
    /// let mut bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    /// bspcurve.elevate_degree();
    /// assert_eq!(bspcurve.degree(), 2);
    /// assert_eq!(bspcurve.knot_vec(), &KnotVec::bezier_knot(2));
    /// assert_eq!(bspcurve.control_point(1), &Vector2::new(0.5, 0.5));
    /// ```
    pub fn elevate_degree(&mut self) -> &mut Self {
        let mut result = CurveCollector::Singleton;
        for mut bezier in self.bezier_decomposition() {
            result.concat(bezier.elevate_degree_bezier());
        }
        *self = result.try_into().unwrap();
        self
    }

    /// Lowers the degree by one if the curve is, within tolerance, the degree
    /// elevation of a lower-degree curve.
    /// # Failures
    /// Returns [`Error::CannotReduceDegree`] if some Bézier segment is not
    /// degree-reducible; `self` is not changed in that case.
    ///
    /// [`Error::CannotReduceDegree`]: errors/enum.Error.html#variant.CannotReduceDegree
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::uniform_knot(2, 2);
    /// let ctrl_pts = vec![
    ///     Vector2::new(0.0, 0.0),
    ///     Vector2::new(1.0, 2.0),
    ///     Vector2::new(2.0, -1.0),
    ///     Vector2::new(3.0, 1.0),
    /// ];
    /// let mut bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    /// let org_curve = bspcurve.clone();
    ///
    /// assert!(bspcurve.try_reduce_degree().is_err());
    ///
    /// bspcurve.elevate_degree();
    /// bspcurve.try_reduce_degree().unwrap();
    /// assert_eq!(bspcurve.degree(), 2);
    /// assert!(bspcurve.near2_as_curve(&org_curve));
    /// ```
    pub fn try_reduce_degree(&mut self) -> Result<&mut Self> {
        let mut result = CurveCollector::Singleton;
        for mut bezier in self.bezier_decomposition() {
            result.try_concat(bezier.try_reduce_degree_bezier()?)?;
        }
        *self = result.try_into().unwrap();
        self.optimize();
        Ok(self)
    }

    /// Makes the B-spline curve clamped.
    #[inline(always)]
    pub fn clamp(&mut self) -> &mut Self {
        let degree = self.degree();

        let s = self.knot_vec.multiplicity(0);
        for _ in s..=degree {
            self.add_knot(self.knot_vec[0]);
        }

        let n = self.knot_vec.len();
        let s = self.knot_vec.multiplicity(n - 1);
        for _ in s..=degree {
            self.add_knot(self.knot_vec[n - 1]);
        }
        self
    }

    /// Repeats [`BSplineCurve::try_remove_knot`] from the back knot in turn
    /// until no knot can be removed.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::bezier_knot(2);
    /// let ctrl_pts = vec![Vector2::new(1.0, 2.0), Vector2::new(2.0, 3.0), Vector2::new(3.0, 4.0)];
    /// let mut bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    /// let org_curve = bspcurve.clone();
    ///
    /// bspcurve.add_knot(0.5).add_knot(0.5).add_knot(0.25).add_knot(0.75);
    /// bspcurve.optimize();
    /// assert_eq!(bspcurve.knot_vec(), &KnotVec::bezier_knot(2));
    /// assert!(bspcurve.near2_as_curve(&org_curve));
    /// ```
    pub fn optimize(&mut self) -> &mut Self {
        loop {
            let n = self.knot_vec.len();
            let closure = |flag, i| flag && self.try_remove_knot(n - i).is_err();
            if (1..=n).fold(true, closure) {
                break;
            }
        }
        self
    }

    /// Makes two splines have the same degree by elevating the lower one.
    pub fn syncro_degree(&mut self, other: &mut Self) {
        let (degree0, degree1) = (self.degree(), other.degree());
        for _ in degree0..degree1 {
            self.elevate_degree();
        }
        for _ in degree1..degree0 {
            other.elevate_degree();
        }
    }

    /// Cuts the curve into two curves at the parameter `t`.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::uniform_knot(2, 3);
    /// let ctrl_pts = vec![
    ///     Vector2::new(0.0, 0.0),
    ///     Vector2::new(1.0, 0.0),
    ///     Vector2::new(2.0, 2.0),
    ///     Vector2::new(4.0, 3.0),
    ///     Vector2::new(5.0, 6.0),
    /// ];
    /// let bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    ///
    /// let mut part0 = bspcurve.clone();
    /// let part1 = part0.cut(0.56);
    /// const N: usize = 100;
    /// for i in 0..=N {
    ///     let t = 0.56 * (i as f64) / (N as f64);
    ///     assert_near2!(bspcurve.subs(t), part0.subs(t));
    /// }
    /// for i in 0..=N {
    ///     let t = 0.56 + 0.44 * (i as f64) / (N as f64);
    ///     assert_near2!(bspcurve.subs(t), part1.subs(t));
    /// }
    /// ```
    pub fn cut(&mut self, mut t: f64) -> BSplineCurve<V> {
        let degree = self.degree();

        let idx = match self.knot_vec.floor(t) {
            Some(idx) => idx,
            None => {
                let bspline = self.clone();
                let knot_vec = KnotVec::from(vec![t, self.knot_vec[0]]);
                let ctrl_pts = vec![V::zero()];
                *self = BSplineCurve::new(knot_vec, ctrl_pts);
                return bspline;
            }
        };
        let s = if t.near(&self.knot_vec[idx]) {
            t = self.knot_vec[idx];
            self.knot_vec.multiplicity(idx)
        } else {
            0
        };

        for _ in s..=degree {
            self.add_knot(t);
        }

        let k = self.knot_vec.floor(t).unwrap();
        let m = self.knot_vec.len();
        let n = self.control_points.len();
        let knot_vec0 = self.knot_vec.sub_vec(0..=k);
        let knot_vec1 = self.knot_vec.sub_vec((k - degree)..m);
        let control_points0 = Vec::from(&self.control_points[0..(k - degree)]);
        let control_points1 = Vec::from(&self.control_points[(k - degree)..n]);
        *self = BSplineCurve::new_unchecked(knot_vec0, control_points0);
        BSplineCurve::new_unchecked(knot_vec1, control_points1)
    }

    /// Separates `self` into Bézier curves at each distinct knot.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::uniform_knot(2, 2);
    /// let ctrl_pts = vec![Vector2::new(0.0, 1.0), Vector2::new(1.0, 2.0), Vector2::new(2.0, 3.0), Vector2::new(3.0, 4.0)];
    /// let bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    /// let beziers = bspcurve.bezier_decomposition();
    ///
    /// const N: usize = 100;
    /// for i in 0..=N {
    ///     let t = 0.5 * (i as f64) / (N as f64);
    ///     assert_near2!(bspcurve.subs(t), beziers[0].subs(t));
    /// }
    /// for i in 0..=N {
    ///     let t = 0.5 + 0.5 * (i as f64) / (N as f64);
    ///     assert_near2!(bspcurve.subs(t), beziers[1].subs(t));
    /// }
    /// ```
    pub fn bezier_decomposition(&self) -> Vec<BSplineCurve<V>> {
        let mut bspline = self.clone();
        bspline.clamp();
        let (knots, _) = self.knot_vec.to_single_multi();
        let n = knots.len();

        let mut result = Vec::new();
        for i in 2..n {
            result.push(bspline.cut(knots[n - i]));
        }
        result.push(bspline);
        result.reverse();
        result
    }

    /// Concats two B-spline curves.
    /// # Failures
    /// If the back of the knot vector of `self` does not coincide with the
    /// front of the one of `other`, returns
    /// [`Error::DifferentBackFront`](./errors/enum.Error.html#variant.DifferentBackFront).
    /// # Remarks
    /// This method does not change `other` as a curve, but side effects such
    /// as degree synchronization or knot clamping do occur.
    pub fn try_concat(&mut self, other: &mut BSplineCurve<V>) -> Result<&mut Self> {
        self.syncro_degree(other);
        self.clamp();
        other.clamp();
        self.knot_vec.try_concat(&other.knot_vec, self.degree())?;
        self.control_points.extend(other.control_points.iter().copied());
        Ok(self)
    }

    /// Concats two B-spline curves.
    /// # Panics
    /// Panics under the failure conditions of [`BSplineCurve::try_concat`].
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vec = KnotVec::uniform_knot(2, 3);
    /// let ctrl_pts = vec![
    ///     Vector2::new(0.0, 0.0),
    ///     Vector2::new(1.0, 0.0),
    ///     Vector2::new(2.0, 2.0),
    ///     Vector2::new(4.0, 3.0),
    ///     Vector2::new(5.0, 6.0),
    /// ];
    /// let bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
    ///
    /// let mut part0 = bspcurve.clone();
    /// let mut part1 = part0.cut(0.56);
    /// part0.concat(&mut part1);
    /// assert!(bspcurve.near2_as_curve(&part0));
    /// ```
    #[inline(always)]
    pub fn concat(&mut self, other: &mut Self) -> &mut Self {
        self.try_concat(other)
            .unwrap_or_else(|error| panic!("{}", error))
    }

    /// Determines whether `self` and `other` are near as B-spline curves.
    ///
    /// Divides each knot interval into the number of degree equal parts and
    /// checks `|self(t) - other(t)| < TOLERANCE` at each end point `t`.
    #[inline(always)]
    pub fn near_as_curve(&self, other: &BSplineCurve<V>) -> bool {
        self.sub_near_as_curve(other, 1, |x, y| x.near(y))
    }

    /// Determines whether `self` and `other` are near in square order as
    /// B-spline curves.
    #[inline(always)]
    pub fn near2_as_curve(&self, other: &BSplineCurve<V>) -> bool {
        self.sub_near_as_curve(other, 1, |x, y| x.near2(y))
    }
}

impl<V: VectorSpace<Scalar = f64> + Tolerance> CurveCollector<V> {
    /// Concats `curve` to the collector.
    /// # Failures
    /// Returns the failures of [`BSplineCurve::try_concat`] as is.
    pub fn try_concat(&mut self, curve: &mut BSplineCurve<V>) -> Result<&mut Self> {
        match self {
            CurveCollector::Singleton => {
                *self = CurveCollector::Curve(curve.clone());
            }
            CurveCollector::Curve(ref mut curve0) => {
                curve0.try_concat(curve)?;
            }
        }
        Ok(self)
    }
    /// Concats `curve` to the collector.
    /// # Panics
    /// Panics under the failure conditions of [`BSplineCurve::try_concat`].
    #[inline(always)]
    pub fn concat(&mut self, curve: &mut BSplineCurve<V>) -> &mut Self {
        self.try_concat(curve)
            .unwrap_or_else(|error| panic!("{}", error))
    }
}

impl<V> CurveCollector<V> {
    /// Returns the entity curve.
    /// # Panics
    /// Panics if `self` is the singleton.
    #[inline(always)]
    pub fn unwrap(self) -> BSplineCurve<V> {
        match self {
            CurveCollector::Curve(curve) => curve,
            CurveCollector::Singleton => panic!("This curve collector is singleton."),
        }
    }
}

impl<V> std::convert::TryFrom<CurveCollector<V>> for BSplineCurve<V> {
    type Error = Error;
    #[inline(always)]
    fn try_from(collector: CurveCollector<V>) -> Result<BSplineCurve<V>> {
        match collector {
            CurveCollector::Curve(curve) => Ok(curve),
            CurveCollector::Singleton => Err(Error::EmptyControlPoints),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_knot_saturation() {
        let knot_vec = KnotVec::from(vec![0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.5, 1.0, 1.0, 1.0, 1.0]);
        let ctrl_pts: Vec<_> = (0..7)
            .map(|i| Vector3::new(i as f64, (i * i) as f64, 0.0))
            .collect();
        let mut curve = BSplineCurve::new(knot_vec, ctrl_pts);
        let org_curve = curve.clone();

        // a first insertion grows the knot vector and control polygon by one
        curve.insert_knot(0.25, 1);
        assert_eq!(curve.knot_vec().len(), org_curve.knot_vec().len() + 1);
        assert_eq!(
            curve.control_points().len(),
            org_curve.control_points().len() + 1
        );
        assert!(curve.near2_as_curve(&org_curve));

        // saturated: multiplicity of 0.5 equals the degree
        let before = curve.clone();
        curve.insert_knot(0.5, 4);
        assert_eq!(curve, before);
    }

    #[test]
    fn reduce_after_elevation_round_trip() {
        let knot_vec = KnotVec::uniform_knot(3, 2);
        let ctrl_pts = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 2.0, 0.0),
            Vector3::new(2.0, -1.0, 1.0),
            Vector3::new(3.0, 1.0, 0.5),
            Vector3::new(4.0, 0.0, 0.0),
        ];
        let mut curve = BSplineCurve::new(knot_vec, ctrl_pts);
        let org_curve = curve.clone();
        curve.elevate_degree();
        assert_eq!(curve.degree(), 4);
        curve.try_reduce_degree().unwrap();
        assert_eq!(curve.degree(), 3);
        assert!(curve.near2_as_curve(&org_curve));
    }

    #[test]
    fn refine_knots_merges_sorted() {
        let knot_vec = KnotVec::uniform_knot(2, 2);
        let ctrl_pts = vec![
            Vector2::new(0.0, 1.0),
            Vector2::new(1.0, 2.0),
            Vector2::new(2.0, 3.0),
            Vector2::new(3.0, 4.0),
        ];
        let mut curve = BSplineCurve::new(knot_vec, ctrl_pts);
        let org_curve = curve.clone();
        curve.refine_knots(&[0.25, 0.25, 0.75]);
        assert_eq!(
            curve.knot_vec().as_slice(),
            &[0.0, 0.0, 0.0, 0.25, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0],
        );
        assert!(curve.near2_as_curve(&org_curve));
    }
}
