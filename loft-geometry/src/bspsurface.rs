use crate::errors::Error;
use crate::*;
use loft_base::ders::SurfaceDers;

/// The iterator over the control points in a row, i.e. along the u direction.
#[derive(Clone, Debug)]
pub struct CPRowIter<'a, V> {
    iter: std::slice::Iter<'a, Vec<V>>,
    idx: usize,
}

/// The iterator over the control points in a column, i.e. along the v direction.
pub type CPColumnIter<'a, V> = std::slice::Iter<'a, V>;

impl<'a, V> Iterator for CPRowIter<'a, V> {
    type Item = &'a V;
    #[inline(always)]
    fn next(&mut self) -> Option<&'a V> { self.iter.next().map(|arr| &arr[self.idx]) }
    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) { self.iter.size_hint() }
}

impl<V> ExactSizeIterator for CPRowIter<'_, V> {}
impl<V> std::iter::FusedIterator for CPRowIter<'_, V> {}

impl<V> BSplineSurface<V> {
    /// constructor.
    /// # Arguments
    /// * `knot_vecs` - the knot vectors
    /// * `control_points` - the matrix of control points
    /// # Panics
    /// There are 3 rules for constructing a B-spline surface:
    /// * The number of knots is more than the one of control points in each direction.
    /// * There exist at least two different knots in each knot vector.
    /// * The control grid is a non-empty rectangle.
    #[inline(always)]
    pub fn new(knot_vecs: (KnotVec, KnotVec), control_points: Vec<Vec<V>>) -> BSplineSurface<V> {
        BSplineSurface::try_new(knot_vecs, control_points).unwrap_or_else(|e| panic!("{}", e))
    }

    /// constructor.
    /// # Failures
    /// Checks the 3 rules of [`BSplineSurface::new`] and returns the
    /// corresponding error if one of them is violated.
    pub fn try_new(
        knot_vecs: (KnotVec, KnotVec),
        control_points: Vec<Vec<V>>,
    ) -> Result<BSplineSurface<V>> {
        if control_points.is_empty() || control_points[0].is_empty() {
            Err(Error::EmptyControlPoints)
        } else if knot_vecs.0.len() <= control_points.len() {
            Err(Error::TooShortKnotVector(
                knot_vecs.0.len(),
                control_points.len(),
            ))
        } else if knot_vecs.1.len() <= control_points[0].len() {
            Err(Error::TooShortKnotVector(
                knot_vecs.1.len(),
                control_points[0].len(),
            ))
        } else if knot_vecs.0.range_length().so_small() || knot_vecs.1.range_length().so_small() {
            Err(Error::ZeroRange)
        } else {
            let len = control_points[0].len();
            match control_points.iter().any(|vec| vec.len() != len) {
                true => Err(Error::IrregularControlPoints),
                false => Ok(BSplineSurface::new_unchecked(knot_vecs, control_points)),
            }
        }
    }

    /// constructor.
    /// This method does NOT check the 3 rules of [`BSplineSurface::new`].
    /// The programmer must guarantee these conditions before using this method.
    #[inline(always)]
    pub const fn new_unchecked(
        knot_vecs: (KnotVec, KnotVec),
        control_points: Vec<Vec<V>>,
    ) -> BSplineSurface<V> {
        BSplineSurface {
            knot_vecs,
            control_points,
        }
    }

    /// constructor.
    /// This method checks the 3 rules of [`BSplineSurface::new`] in the debug mode.
    #[inline(always)]
    pub fn debug_new(
        knot_vecs: (KnotVec, KnotVec),
        control_points: Vec<Vec<V>>,
    ) -> BSplineSurface<V> {
        match cfg!(debug_assertions) {
            true => Self::new(knot_vecs, control_points),
            false => Self::new_unchecked(knot_vecs, control_points),
        }
    }

    /// Returns the reference of the knot vectors
    #[inline(always)]
    pub const fn knot_vecs(&self) -> &(KnotVec, KnotVec) { &self.knot_vecs }

    /// Returns the u knot vector.
    #[inline(always)]
    pub const fn uknot_vec(&self) -> &KnotVec { &self.knot_vecs.0 }
    /// Returns the v knot vector.
    #[inline(always)]
    pub const fn vknot_vec(&self) -> &KnotVec { &self.knot_vecs.1 }

    /// Returns the `idx`th u knot.
    #[inline(always)]
    pub fn uknot(&self, idx: usize) -> f64 { self.knot_vecs.0[idx] }
    /// Returns the `idx`th v knot.
    #[inline(always)]
    pub fn vknot(&self, idx: usize) -> f64 { self.knot_vecs.1[idx] }

    /// Returns the reference of the control grid.
    #[inline(always)]
    pub const fn control_points(&self) -> &Vec<Vec<V>> { &self.control_points }

    /// Returns the reference of the control point corresponding to the index `(idx0, idx1)`.
    #[inline(always)]
    pub fn control_point(&self, idx0: usize, idx1: usize) -> &V { &self.control_points[idx0][idx1] }

    /// Returns the mutable reference of the control point corresponding to the index `(idx0, idx1)`.
    #[inline(always)]
    pub fn control_point_mut(&mut self, idx0: usize, idx1: usize) -> &mut V {
        &mut self.control_points[idx0][idx1]
    }

    /// Returns the iterator over all control points.
    #[inline(always)]
    pub fn control_points_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.control_points.iter_mut().flatten()
    }

    /// Applies the given transformation to all control points.
    #[inline(always)]
    pub fn transform_control_points<F: FnMut(&mut V)>(&mut self, f: F) {
        self.control_points.iter_mut().flatten().for_each(f)
    }

    /// Returns the iterator over the control points in the `column_idx`th row.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::bezier_knot(1), KnotVec::bezier_knot(2));
    /// let ctrl_pts = vec![
    ///     vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 1.0), Vector3::new(2.0, 0.0, 2.0)],
    ///     vec![Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 1.0, 1.0), Vector3::new(2.0, 1.0, 2.0)],
    /// ];
    /// let bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    /// let mut iter = bspsurface.ctrl_pts_row_iter(1);
    /// assert_eq!(iter.next(), Some(&Vector3::new(1.0, 0.0, 1.0)));
    /// assert_eq!(iter.next(), Some(&Vector3::new(1.0, 1.0, 1.0)));
    /// assert_eq!(iter.next(), None);
    /// ```
    #[inline(always)]
    pub fn ctrl_pts_row_iter(&self, column_idx: usize) -> CPRowIter<'_, V> {
        CPRowIter {
            iter: self.control_points.iter(),
            idx: column_idx,
        }
    }

    /// Returns the iterator over the control points in the `row_idx`th column.
    #[inline(always)]
    pub fn ctrl_pts_column_iter(&self, row_idx: usize) -> CPColumnIter<'_, V> {
        self.control_points[row_idx].iter()
    }

    /// Returns the u degree of the B-spline surface.
    #[inline(always)]
    pub fn udegree(&self) -> usize { self.knot_vecs.0.len() - self.control_points.len() - 1 }

    /// Returns the v degree of the B-spline surface.
    #[inline(always)]
    pub fn vdegree(&self) -> usize { self.knot_vecs.1.len() - self.control_points[0].len() - 1 }

    /// Returns the degrees of the B-spline surface.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let uknot_vec = KnotVec::from(vec![0.0, 0.0, 1.0, 1.0]);
    /// let vknot_vec = KnotVec::from(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    /// let ctrl_pts = vec![
    ///     vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 1.0), Vector3::new(2.0, 0.0, 2.0)],
    ///     vec![Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 1.0, 1.0), Vector3::new(2.0, 1.0, 2.0)],
    /// ];
    /// let bspsurface = BSplineSurface::new((uknot_vec, vknot_vec), ctrl_pts);
    /// assert_eq!(bspsurface.degrees(), (1, 2));
    /// ```
    #[inline(always)]
    pub fn degrees(&self) -> (usize, usize) { (self.udegree(), self.vdegree()) }

    /// Returns whether both knot vectors are clamped.
    #[inline(always)]
    pub fn is_clamped(&self) -> bool {
        self.knot_vecs.0.is_clamped(self.udegree()) && self.knot_vecs.1.is_clamped(self.vdegree())
    }

    /// Swaps the two parametric directions: transposes the control grid and
    /// exchanges the knot vectors. Every one-directional algorithm in this
    /// module is written for the v direction and dispatched to the u direction
    /// through this transposition.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs0 = (KnotVec::bezier_knot(1), KnotVec::bezier_knot(2));
    /// let ctrl_pts0 = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
    ///     vec![Vector2::new(0.0, 1.0), Vector2::new(0.5, 2.0), Vector2::new(1.0, 1.0)],
    /// ];
    /// let mut bspsurface0 = BSplineSurface::new(knot_vecs0, ctrl_pts0);
    ///
    /// let knot_vecs1 = (KnotVec::bezier_knot(2), KnotVec::bezier_knot(1));
    /// let ctrl_pts1 = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.0, 1.0)],
    ///     vec![Vector2::new(0.5, -1.0), Vector2::new(0.5, 2.0)],
    ///     vec![Vector2::new(1.0, 0.0), Vector2::new(1.0, 1.0)],
    /// ];
    /// let bspsurface1 = BSplineSurface::new(knot_vecs1, ctrl_pts1);
    /// assert_eq!(bspsurface0.swap_axes(), &bspsurface1);
    /// ```
    pub fn swap_axes(&mut self) -> &mut Self
    where V: Clone {
        std::mem::swap(&mut self.knot_vecs.0, &mut self.knot_vecs.1);

        let n0 = self.control_points.len();
        let n1 = self.control_points[0].len();
        let mut new_points = vec![Vec::with_capacity(n0); n1];
        for pts in &self.control_points {
            for (vec0, pt) in new_points.iter_mut().zip(pts) {
                vec0.push(pt.clone());
            }
        }
        self.control_points = new_points;
        self
    }

    /// The range of the parameters of the surface.
    #[inline(always)]
    pub fn parameter_range(&self) -> ((f64, f64), (f64, f64)) {
        (
            (
                self.knot_vecs.0[0],
                self.knot_vecs.0[self.knot_vecs.0.len() - 1],
            ),
            (
                self.knot_vecs.1[0],
                self.knot_vecs.1[self.knot_vecs.1.len() - 1],
            ),
        )
    }

    /// Creates the curve whose control points are the `row_idx`th row of `self`,
    /// i.e. the iso-curve along the v direction.
    pub fn column_curve(&self, row_idx: usize) -> BSplineCurve<V>
    where V: Clone {
        let knot_vec = self.vknot_vec().clone();
        let ctrl_pts = self.control_points[row_idx].clone();
        BSplineCurve::new_unchecked(knot_vec, ctrl_pts)
    }

    /// Creates the curve whose control points are the `column_idx`th column of
    /// `self`, i.e. the iso-curve along the u direction.
    pub fn row_curve(&self, column_idx: usize) -> BSplineCurve<V>
    where V: Clone {
        let knot_vec = self.uknot_vec().clone();
        let ctrl_pts: Vec<_> = self.ctrl_pts_row_iter(column_idx).cloned().collect();
        BSplineCurve::new_unchecked(knot_vec, ctrl_pts)
    }
}

impl<V: VectorSpace<Scalar = f64>> BSplineSurface<V> {
    /// Substitutes to the B-spline surface.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::bezier_knot(1), KnotVec::bezier_knot(2));
    /// let ctrl_pts = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
    ///     vec![Vector2::new(0.0, 1.0), Vector2::new(0.5, 2.0), Vector2::new(1.0, 1.0)],
    /// ];
    /// let bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    ///
    /// // bspsurface: (v, 2v(1 - v)(2u - 1) + u)
    /// const N: usize = 50; // sample size
    /// for i in 0..=N {
    ///     let u = (i as f64) / (N as f64);
    ///     for j in 0..=N {
    ///         let v = (j as f64) / (N as f64);
    ///         assert_near2!(
    ///             bspsurface.subs(u, v),
    ///             Vector2::new(v, 2.0 * v * (1.0 - v) * (2.0 * u - 1.0) + u),
    ///         );
    ///     }
    /// }
    /// ```
    #[inline(always)]
    pub fn subs(&self, u: f64, v: f64) -> V {
        let (degree0, degree1) = self.degrees();
        let BSplineSurface {
            knot_vecs: (ref uknot_vec, ref vknot_vec),
            ref control_points,
        } = self;
        let basis0 = uknot_vec.bspline_basis_functions(degree0, u);
        let basis1 = vknot_vec.bspline_basis_functions(degree1, v);
        let closure = move |sum: V, (vec, b0): (&Vec<V>, f64)| {
            let closure = move |sum: V, (pt, b1): (&V, &f64)| sum + *pt * (b0 * b1);
            vec.iter().zip(&basis1).fold(sum, closure)
        };
        control_points.iter().zip(basis0).fold(V::zero(), closure)
    }

    /// Substitutes to the u-derivative of the B-spline surface.
    #[inline(always)]
    pub fn uder(&self, u: f64, v: f64) -> V {
        let (degree0, degree1) = self.degrees();
        if degree0 < 1 {
            return V::zero();
        }
        let BSplineSurface {
            knot_vecs: (ref uknot_vec, ref vknot_vec),
            ref control_points,
        } = self;
        let basis0 = uknot_vec.bspline_basis_functions(degree0 - 1, u);
        let basis1 = vknot_vec.bspline_basis_functions(degree1, v);
        let closure = move |sum: V, (i, vec): (usize, &Vec<V>)| {
            let coef0 = inv_or_zero(uknot_vec[i + degree0] - uknot_vec[i]);
            let coef1 = inv_or_zero(uknot_vec[i + degree0 + 1] - uknot_vec[i + 1]);
            let closure = |sum: V, (pt, b1): (&V, &f64)| {
                sum + *pt * (basis0[i] * coef0 - basis0[i + 1] * coef1) * *b1
            };
            vec.iter().zip(&basis1).fold(sum, closure)
        };
        control_points.iter().enumerate().fold(V::zero(), closure) * degree0 as f64
    }

    /// Substitutes to the v-derivative of the B-spline surface.
    #[inline(always)]
    pub fn vder(&self, u: f64, v: f64) -> V {
        let (degree0, degree1) = self.degrees();
        if degree1 < 1 {
            return V::zero();
        }
        let BSplineSurface {
            knot_vecs: (ref uknot_vec, ref vknot_vec),
            ref control_points,
        } = self;
        let basis0 = uknot_vec.bspline_basis_functions(degree0, u);
        let basis1 = vknot_vec.bspline_basis_functions(degree1 - 1, v);
        let closure = |sum: V, (vec, b0): (&Vec<V>, f64)| {
            let closure = |sum: V, (i, pt): (usize, &V)| {
                let coef0 = inv_or_zero(vknot_vec[i + degree1] - vknot_vec[i]);
                let coef1 = inv_or_zero(vknot_vec[i + degree1 + 1] - vknot_vec[i + 1]);
                sum + *pt * (basis1[i] * coef0 - basis1[i + 1] * coef1) * b0
            };
            vec.iter().enumerate().fold(sum, closure)
        };
        control_points.iter().zip(basis0).fold(V::zero(), closure) * degree1 as f64
    }

    /// Substitutes to the 2nd-order u-derivative of the B-spline surface.
    #[inline(always)]
    pub fn uuder(&self, u: f64, v: f64) -> V {
        let (degree0, degree1) = self.degrees();
        if degree0 < 2 {
            return V::zero();
        }
        let BSplineSurface {
            knot_vecs: (ref uknot_vec, ref vknot_vec),
            ref control_points,
        } = self;
        let basis0 = uknot_vec.bspline_basis_functions(degree0 - 2, u);
        let basis1 = vknot_vec.bspline_basis_functions(degree1, v);
        let closure = move |sum: V, (i, vec): (usize, &Vec<V>)| {
            let a = inv_or_zero(uknot_vec[i + degree0] - uknot_vec[i]);
            let b = inv_or_zero(uknot_vec[i + degree0 + 1] - uknot_vec[i + 1]);
            let c = inv_or_zero(uknot_vec[i + degree0 - 1] - uknot_vec[i]);
            let d = inv_or_zero(uknot_vec[i + degree0] - uknot_vec[i + 1]);
            let e = inv_or_zero(uknot_vec[i + degree0 + 1] - uknot_vec[i + 2]);
            let closure = |sum: V, (pt, b1): (&V, &f64)| {
                sum + *pt
                    * (basis0[i] * a * c - basis0[i + 1] * (a + b) * d + basis0[i + 2] * b * e)
                    * *b1
            };
            vec.iter().zip(&basis1).fold(sum, closure)
        };
        control_points.iter().enumerate().fold(V::zero(), closure)
            * degree0 as f64
            * (degree0 - 1) as f64
    }

    /// Substitutes to the 2nd-order v-derivative of the B-spline surface.
    #[inline(always)]
    pub fn vvder(&self, u: f64, v: f64) -> V {
        let (degree0, degree1) = self.degrees();
        if degree1 < 2 {
            return V::zero();
        }
        let BSplineSurface {
            knot_vecs: (ref uknot_vec, ref vknot_vec),
            ref control_points,
        } = self;
        let basis0 = uknot_vec.bspline_basis_functions(degree0, u);
        let basis1 = vknot_vec.bspline_basis_functions(degree1 - 2, v);
        let closure = |sum: V, (vec, b0): (&Vec<V>, f64)| {
            let closure = |sum: V, (i, pt): (usize, &V)| {
                let a = inv_or_zero(vknot_vec[i + degree1] - vknot_vec[i]);
                let b = inv_or_zero(vknot_vec[i + degree1 + 1] - vknot_vec[i + 1]);
                let c = inv_or_zero(vknot_vec[i + degree1 - 1] - vknot_vec[i]);
                let d = inv_or_zero(vknot_vec[i + degree1] - vknot_vec[i + 1]);
                let e = inv_or_zero(vknot_vec[i + degree1 + 1] - vknot_vec[i + 2]);
                sum + *pt
                    * (basis1[i] * a * c - basis1[i + 1] * (a + b) * d + basis1[i + 2] * b * e)
                    * b0
            };
            vec.iter().enumerate().fold(sum, closure)
        };
        control_points.iter().zip(basis0).fold(V::zero(), closure)
            * degree1 as f64
            * (degree1 - 1) as f64
    }

    /// Substitutes to the mixed derivative of the B-spline surface.
    #[inline(always)]
    pub fn uvder(&self, u: f64, v: f64) -> V {
        let (degree0, degree1) = self.degrees();
        if degree0 < 1 || degree1 < 1 {
            return V::zero();
        }
        let BSplineSurface {
            knot_vecs: (ref uknot_vec, ref vknot_vec),
            ref control_points,
        } = self;
        let basis0 = uknot_vec.bspline_basis_functions(degree0 - 1, u);
        let basis1 = vknot_vec.bspline_basis_functions(degree1 - 1, v);
        let closure = |sum: V, (i, vec): (usize, &Vec<V>)| {
            let coef0 = inv_or_zero(uknot_vec[i + degree0] - uknot_vec[i]);
            let coef1 = inv_or_zero(uknot_vec[i + degree0 + 1] - uknot_vec[i + 1]);
            let b0 = basis0[i] * coef0 - basis0[i + 1] * coef1;
            let closure = |sum: V, (j, pt): (usize, &V)| {
                let coef0 = inv_or_zero(vknot_vec[j + degree1] - vknot_vec[j]);
                let coef1 = inv_or_zero(vknot_vec[j + degree1 + 1] - vknot_vec[j + 1]);
                sum + *pt * (basis1[j] * coef0 - basis1[j + 1] * coef1) * b0
            };
            vec.iter().enumerate().fold(sum, closure)
        };
        control_points.iter().enumerate().fold(V::zero(), closure) * degree0 as f64 * degree1 as f64
    }

    /// Returns the closure of substitution.
    #[inline(always)]
    pub fn get_closure(&self) -> impl Fn(f64, f64) -> V + '_ { move |u, v| self.subs(u, v) }

    #[inline(always)]
    fn udelta_control_points(&self, i: usize, j: usize) -> V {
        if i == 0 {
            self.control_points[i][j]
        } else if i == self.control_points.len() {
            self.control_points[i - 1][j] * (-1.0)
        } else {
            self.control_points[i][j] - self.control_points[i - 1][j]
        }
    }

    #[inline(always)]
    fn vdelta_control_points(&self, i: usize, j: usize) -> V {
        if j == 0 {
            self.control_points[i][j]
        } else if j == self.control_points[0].len() {
            self.control_points[i][j - 1] * (-1.0)
        } else {
            self.control_points[i][j] - self.control_points[i][j - 1]
        }
    }

    /// Returns the u-derivative of the B-spline surface as another B-spline
    /// surface over the same knot vectors.
    pub fn uderivation(&self) -> BSplineSurface<V> {
        let n0 = self.control_points.len();
        let n1 = self.control_points[0].len();
        let (k, _) = self.degrees();
        let (uknot_vec, vknot_vec) = self.knot_vecs.clone();

        let new_points = if k > 0 {
            (0..=n0)
                .map(|i| {
                    let delta = uknot_vec[i + k] - uknot_vec[i];
                    let coef = (k as f64) * inv_or_zero(delta);
                    (0..n1)
                        .map(|j| self.udelta_control_points(i, j) * coef)
                        .collect()
                })
                .collect()
        } else {
            vec![vec![V::zero(); n1]; n0]
        };

        BSplineSurface::new_unchecked((uknot_vec, vknot_vec), new_points)
    }

    /// Returns the v-derivative of the B-spline surface as another B-spline
    /// surface over the same knot vectors.
    pub fn vderivation(&self) -> BSplineSurface<V> {
        let n0 = self.control_points.len();
        let n1 = self.control_points[0].len();
        let (_, k) = self.degrees();
        let (uknot_vec, vknot_vec) = self.knot_vecs.clone();

        let new_points = if k > 0 {
            let mut new_points = vec![Vec::with_capacity(n1 + 1); n0];
            for j in 0..=n1 {
                let delta = vknot_vec[j + k] - vknot_vec[j];
                let coef = (k as f64) * inv_or_zero(delta);
                for (i, vec) in new_points.iter_mut().enumerate() {
                    vec.push(self.vdelta_control_points(i, j) * coef)
                }
            }
            new_points
        } else {
            vec![vec![V::zero(); n1]; n0]
        };

        BSplineSurface::new_unchecked((uknot_vec, vknot_vec), new_points)
    }

    /// Substitutes to the derivative of u-order `m` and v-order `n`, obtained
    /// by iterating the derivative-surface construction.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::bezier_knot(2), KnotVec::bezier_knot(2));
    /// let ctrl_pts = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
    ///     vec![Vector2::new(0.0, 0.5), Vector2::new(0.5, 1.0), Vector2::new(1.0, 0.5)],
    ///     vec![Vector2::new(0.0, 1.0), Vector2::new(0.5, 2.0), Vector2::new(1.0, 1.0)],
    /// ];
    /// let bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    /// assert_near2!(bspsurface.der_mn(0, 0, 0.25, 0.5), bspsurface.subs(0.25, 0.5));
    /// assert_near2!(bspsurface.der_mn(1, 0, 0.25, 0.5), bspsurface.uder(0.25, 0.5));
    /// assert_near2!(bspsurface.der_mn(1, 1, 0.25, 0.5), bspsurface.uvder(0.25, 0.5));
    /// ```
    pub fn der_mn(&self, m: usize, n: usize, u: f64, v: f64) -> V {
        let (udegree, vdegree) = self.degrees();
        if m > udegree || n > vdegree {
            return V::zero();
        }
        let mut surface = std::borrow::Cow::Borrowed(self);
        for _ in 0..m {
            surface = std::borrow::Cow::Owned(surface.uderivation());
        }
        for _ in 0..n {
            surface = std::borrow::Cow::Owned(surface.vderivation());
        }
        surface.subs(u, v)
    }

    /// Returns the triangular grid of all derivatives of total order up to
    /// `max_order` at the parameter `(u, v)`.
    pub fn ders(&self, max_order: usize, u: f64, v: f64) -> SurfaceDers<V> {
        let mut ders = SurfaceDers::new(max_order);
        for m in 0..=max_order {
            for n in 0..=max_order - m {
                ders[m][n] = self.der_mn(m, n, u, v);
            }
        }
        ders
    }

    pub(crate) fn sub_near_as_surface<F: Fn(&V, &V) -> bool>(
        &self,
        other: &BSplineSurface<V>,
        div_coef: usize,
        ord: F,
    ) -> bool {
        if !self.knot_vecs.0.same_range(&other.knot_vecs.0) {
            return false;
        }
        if !self.knot_vecs.1.same_range(&other.knot_vecs.1) {
            return false;
        }

        let (self_degree0, self_degree1) = self.degrees();
        let (other_degree0, other_degree1) = other.degrees();
        let division0 = usize::max(self_degree0, other_degree0) * div_coef;
        let division1 = usize::max(self_degree1, other_degree1) * div_coef;

        for i0 in 1..self.knot_vecs.0.len() {
            let delta0 = self.knot_vecs.0[i0] - self.knot_vecs.0[i0 - 1];
            if delta0.so_small() {
                continue;
            }
            for j0 in 0..division0 {
                let u = self.knot_vecs.0[i0 - 1] + delta0 * (j0 as f64) / (division0 as f64);
                for i1 in 1..self.knot_vecs.1.len() {
                    let delta1 = self.knot_vecs.1[i1] - self.knot_vecs.1[i1 - 1];
                    if delta1.so_small() {
                        continue;
                    }
                    for j1 in 0..division1 {
                        let v =
                            self.knot_vecs.1[i1 - 1] + delta1 * (j1 as f64) / (division1 as f64);
                        if !ord(&self.subs(u, v), &other.subs(u, v)) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

impl<V: Tolerance> BSplineSurface<V> {
    /// Returns whether all control points are the same or not.
    /// If the knot vectors are clamped, it means whether the surface is constant or not.
    #[inline(always)]
    pub fn is_const(&self) -> bool {
        self.control_points
            .iter()
            .flatten()
            .all(|pt| pt.near(&self.control_points[0][0]))
    }

    /// Returns whether the surface is closed in the u direction, i.e. the
    /// first and last control rows coincide up to tolerance.
    #[inline(always)]
    pub fn is_uclosed(&self) -> bool {
        let last = self.control_points.len() - 1;
        (0..self.control_points[0].len())
            .all(|j| self.control_points[0][j].near(&self.control_points[last][j]))
    }

    /// Returns whether the surface is closed in the v direction, i.e. the
    /// first and last control columns coincide up to tolerance.
    #[inline(always)]
    pub fn is_vclosed(&self) -> bool {
        let last = self.control_points[0].len() - 1;
        self.control_points
            .iter()
            .all(|row| row[0].near(&row[last]))
    }
}

impl<V: VectorSpace<Scalar = f64> + Tolerance> BSplineSurface<V> {
    /// Executes the curve operation `op` on every row of the control grid,
    /// treated as a curve in the v direction, and replaces the v knot vector
    /// by the one produced on the rows. Every row receives the same input
    /// knot vector, so every row yields the same output knot vector.
    fn row_dispatch<F>(&mut self, mut op: F) -> Result<&mut Self>
    where F: FnMut(&mut BSplineCurve<V>) -> Result<()> {
        let vknot_vec = self.knot_vecs.1.clone();
        let mut new_rows = Vec::with_capacity(self.control_points.len());
        for row in &self.control_points {
            let mut curve = BSplineCurve::new_unchecked(vknot_vec.clone(), row.clone());
            op(&mut curve)?;
            new_rows.push(curve);
        }
        self.knot_vecs.1 = new_rows[0].knot_vec().clone();
        self.control_points = new_rows
            .into_iter()
            .map(|curve| curve.control_points)
            .collect();
        Ok(self)
    }

    /// Executes the curve operation `op` on every column by transposing,
    /// dispatching to the rows, and transposing back.
    fn column_dispatch<F>(&mut self, op: F) -> Result<&mut Self>
    where F: FnMut(&mut BSplineCurve<V>) -> Result<()> {
        self.swap_axes();
        let res = self.row_dispatch(op).map(|_| ());
        self.swap_axes();
        res?;
        Ok(self)
    }

    /// Adds a u knot `x` without changing `self` as a surface.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::bezier_knot(1), KnotVec::bezier_knot(2));
    /// let ctrl_pts = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
    ///     vec![Vector2::new(0.0, 1.0), Vector2::new(0.5, 2.0), Vector2::new(1.0, 1.0)],
    /// ];
    /// let mut bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    /// let org_surface = bspsurface.clone();
    /// bspsurface.add_uknot(0.3).add_uknot(0.5);
    /// assert_eq!(bspsurface.uknot_vec().len(), org_surface.uknot_vec().len() + 2);
    /// assert!(bspsurface.near2_as_surface(&org_surface));
    /// ```
    #[inline(always)]
    pub fn add_uknot(&mut self, x: f64) -> &mut Self {
        self.column_dispatch(|curve| {
            curve.add_knot(x);
            Ok(())
        })
        .unwrap()
    }

    /// Adds a v knot `x` without changing `self` as a surface.
    #[inline(always)]
    pub fn add_vknot(&mut self, x: f64) -> &mut Self {
        self.row_dispatch(|curve| {
            curve.add_knot(x);
            Ok(())
        })
        .unwrap()
    }

    /// Inserts the u knot `x` with multiplicity `mult`, saturating at the u degree.
    ///
    /// If the current multiplicity of `x` already equals the degree, the
    /// surface is unchanged; otherwise at most `degree - multiplicity` copies
    /// are inserted.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::bezier_knot(2), KnotVec::bezier_knot(1));
    /// let ctrl_pts = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.0, 1.0)],
    ///     vec![Vector2::new(0.5, -1.0), Vector2::new(0.5, 2.0)],
    ///     vec![Vector2::new(1.0, 0.0), Vector2::new(1.0, 1.0)],
    /// ];
    /// let mut bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    /// let org_surface = bspsurface.clone();
    ///
    /// bspsurface.insert_uknot(0.5, 3);
    /// assert_eq!(bspsurface.uknot_vec().multiplicity_of(0.5), 2);
    /// assert!(bspsurface.near2_as_surface(&org_surface));
    ///
    /// // saturated now
    /// let saturated = bspsurface.clone();
    /// bspsurface.insert_uknot(0.5, 1);
    /// assert_eq!(bspsurface, saturated);
    /// ```
    pub fn insert_uknot(&mut self, x: f64, mult: usize) -> &mut Self {
        let degree = self.udegree();
        let s = self.knot_vecs.0.multiplicity_of(x);
        if s >= degree {
            return self;
        }
        for _ in 0..mult.min(degree - s) {
            self.add_uknot(x);
        }
        self
    }

    /// Inserts the v knot `x` with multiplicity `mult`, saturating at the v degree.
    pub fn insert_vknot(&mut self, x: f64, mult: usize) -> &mut Self {
        let degree = self.vdegree();
        let s = self.knot_vecs.1.multiplicity_of(x);
        if s >= degree {
            return self;
        }
        for _ in 0..mult.min(degree - s) {
            self.add_vknot(x);
        }
        self
    }

    /// Inserts all the given u knot values in sequence without changing `self`
    /// as a surface. The new u knot vector is the sorted merge of the old one
    /// and `knots`.
    pub fn refine_uknots(&mut self, knots: &[f64]) -> &mut Self {
        self.column_dispatch(|curve| {
            curve.refine_knots(knots);
            Ok(())
        })
        .unwrap()
    }

    /// Inserts all the given v knot values in sequence without changing `self`
    /// as a surface.
    pub fn refine_vknots(&mut self, knots: &[f64]) -> &mut Self {
        self.row_dispatch(|curve| {
            curve.refine_knots(knots);
            Ok(())
        })
        .unwrap()
    }

    /// Removes the u knot corresponding to the index `idx` without changing
    /// `self` as a surface. The removal succeeds only if the residual of every
    /// column stays within tolerance; otherwise `self` is unchanged.
    /// # Failures
    /// If the knot cannot be removed, returns
    /// [`Error::CannotRemoveKnot`](./errors/enum.Error.html#variant.CannotRemoveKnot).
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// use errors::Error;
    /// let knot_vecs = (KnotVec::bezier_knot(2), KnotVec::bezier_knot(2));
    /// let ctrl_pts = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
    ///     vec![Vector2::new(0.0, 1.0), Vector2::new(0.5, 2.0), Vector2::new(1.0, 1.0)],
    ///     vec![Vector2::new(0.0, 2.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 2.0)],
    /// ];
    /// let mut bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    /// let org_surface = bspsurface.clone();
    ///
    /// bspsurface.add_uknot(0.3).add_uknot(0.5);
    ///
    /// assert!(bspsurface.try_remove_uknot(3).is_ok());
    /// assert_eq!(bspsurface.try_remove_uknot(2), Err(Error::CannotRemoveKnot(2)));
    /// assert_eq!(bspsurface.uknot_vec().len(), org_surface.uknot_vec().len() + 1);
    /// assert!(bspsurface.near2_as_surface(&org_surface));
    /// ```
    pub fn try_remove_uknot(&mut self, idx: usize) -> Result<&mut Self> {
        let mut removed = self.clone();
        removed
            .column_dispatch(|curve| curve.try_remove_knot(idx).map(|_| ()))
            .map(|_| ())?;
        *self = removed;
        Ok(self)
    }

    /// Removes the u knot corresponding to the index `idx`.
    /// If the knot cannot be removed, does not change `self`.
    #[inline(always)]
    pub fn remove_uknot(&mut self, idx: usize) -> &mut Self {
        let _ = self.try_remove_uknot(idx);
        self
    }

    /// Removes the v knot corresponding to the index `idx` without changing
    /// `self` as a surface.
    /// # Failures
    /// If the knot cannot be removed, returns
    /// [`Error::CannotRemoveKnot`](./errors/enum.Error.html#variant.CannotRemoveKnot).
    pub fn try_remove_vknot(&mut self, idx: usize) -> Result<&mut Self> {
        let mut removed = self.clone();
        removed
            .row_dispatch(|curve| curve.try_remove_knot(idx).map(|_| ()))
            .map(|_| ())?;
        *self = removed;
        Ok(self)
    }

    /// Removes the v knot corresponding to the index `idx`.
    /// If the knot cannot be removed, does not change `self`.
    #[inline(always)]
    pub fn remove_vknot(&mut self, idx: usize) -> &mut Self {
        let _ = self.try_remove_vknot(idx);
        self
    }

    /// Removes the u knot value `x` up to `times` times, keeping the surface
    /// within tolerance, and returns the number of knots actually removed.
    pub fn remove_uknot_value(&mut self, x: f64, times: usize) -> usize {
        let mut removed = 0;
        for _ in 0..times {
            let Some(idx) = self.knot_vecs.0.floor(x).filter(|&idx| self.uknot(idx).near(&x))
            else {
                break;
            };
            if self.try_remove_uknot(idx).is_err() {
                break;
            }
            removed += 1;
        }
        removed
    }

    /// Removes the v knot value `x` up to `times` times, keeping the surface
    /// within tolerance, and returns the number of knots actually removed.
    pub fn remove_vknot_value(&mut self, x: f64, times: usize) -> usize {
        let mut removed = 0;
        for _ in 0..times {
            let Some(idx) = self.knot_vecs.1.floor(x).filter(|&idx| self.vknot(idx).near(&x))
            else {
                break;
            };
            if self.try_remove_vknot(idx).is_err() {
                break;
            }
            removed += 1;
        }
        removed
    }

    /// Elevates the v degree by one.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::bezier_knot(2), KnotVec::bezier_knot(2));
    /// let ctrl_pts = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
    ///     vec![Vector2::new(0.0, 1.0), Vector2::new(0.5, 2.0), Vector2::new(1.0, 1.0)],
    ///     vec![Vector2::new(0.0, 2.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 2.0)],
    /// ];
    /// let mut bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    /// let org_surface = bspsurface.clone();
    ///
    /// bspsurface.elevate_vdegree();
    /// assert_eq!(bspsurface.udegree(), org_surface.udegree());
    /// assert_eq!(bspsurface.vdegree(), org_surface.vdegree() + 1);
    /// assert!(bspsurface.near2_as_surface(&org_surface));
    /// ```
    pub fn elevate_vdegree(&mut self) -> &mut Self {
        self.row_dispatch(|curve| {
            curve.elevate_degree();
            Ok(())
        })
        .unwrap()
    }

    /// Elevates the u degree by one.
    pub fn elevate_udegree(&mut self) -> &mut Self {
        self.column_dispatch(|curve| {
            curve.elevate_degree();
            Ok(())
        })
        .unwrap()
    }

    /// Elevates the u degree by `times`.
    pub fn elevate_udegree_by(&mut self, times: usize) -> &mut Self {
        (0..times).for_each(|_| {
            self.elevate_udegree();
        });
        self
    }

    /// Elevates the v degree by `times`.
    pub fn elevate_vdegree_by(&mut self, times: usize) -> &mut Self {
        (0..times).for_each(|_| {
            self.elevate_vdegree();
        });
        self
    }

    /// Lowers the v degree by one if every row is, within tolerance, the
    /// degree elevation of a lower-degree curve.
    /// # Failures
    /// Returns [`Error::CannotReduceDegree`] if some row is not
    /// degree-reducible; `self` is unchanged in that case.
    ///
    /// [`Error::CannotReduceDegree`]: errors/enum.Error.html#variant.CannotReduceDegree
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::bezier_knot(1), KnotVec::bezier_knot(2));
    /// let ctrl_pts = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
    ///     vec![Vector2::new(0.0, 1.0), Vector2::new(0.5, 2.0), Vector2::new(1.0, 1.0)],
    /// ];
    /// let mut bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    /// let org_surface = bspsurface.clone();
    ///
    /// assert!(bspsurface.try_reduce_vdegree().is_err());
    /// bspsurface.elevate_vdegree();
    /// bspsurface.try_reduce_vdegree().unwrap();
    /// assert_eq!(bspsurface.vdegree(), 2);
    /// assert!(bspsurface.near2_as_surface(&org_surface));
    /// ```
    pub fn try_reduce_vdegree(&mut self) -> Result<&mut Self> {
        let mut reduced = self.clone();
        reduced
            .row_dispatch(|curve| curve.try_reduce_degree().map(|_| ()))
            .map(|_| ())?;
        *self = reduced;
        Ok(self)
    }

    /// Lowers the u degree by one if every column is, within tolerance, the
    /// degree elevation of a lower-degree curve.
    /// # Failures
    /// Returns [`Error::CannotReduceDegree`] if some column is not
    /// degree-reducible; `self` is unchanged in that case.
    ///
    /// [`Error::CannotReduceDegree`]: errors/enum.Error.html#variant.CannotReduceDegree
    pub fn try_reduce_udegree(&mut self) -> Result<&mut Self> {
        let mut reduced = self.clone();
        reduced
            .column_dispatch(|curve| curve.try_reduce_degree().map(|_| ()))
            .map(|_| ())?;
        *self = reduced;
        Ok(self)
    }

    /// Makes both knot vectors clamped.
    pub fn clamp(&mut self) -> &mut Self {
        self.row_dispatch(|curve| {
            curve.clamp();
            Ok(())
        })
        .unwrap();
        self.column_dispatch(|curve| {
            curve.clamp();
            Ok(())
        })
        .unwrap()
    }

    /// Cuts the surface into two surfaces at the parameter `u`.
    pub fn ucut(&mut self, mut u: f64) -> BSplineSurface<V> {
        let degree = self.udegree();

        let idx = match self.uknot_vec().floor(u) {
            Some(idx) => idx,
            None => {
                let bspline = self.clone();
                let uknot_vec = KnotVec::from(vec![u, self.uknot_vec()[0]]);
                let vknot_vec = self.vknot_vec().clone();
                let ctrl_pts = vec![vec![V::zero(); self.control_points[0].len()]];
                *self = BSplineSurface::new_unchecked((uknot_vec, vknot_vec), ctrl_pts);
                return bspline;
            }
        };
        let s = if u.near(&self.uknot_vec()[idx]) {
            u = self.uknot_vec()[idx];
            self.uknot_vec().multiplicity(idx)
        } else {
            0
        };

        for _ in s..=degree {
            self.add_uknot(u);
        }

        let vknot_vec = self.vknot_vec().clone();
        let k = self.uknot_vec().floor(u).unwrap();
        let m = self.uknot_vec().len();
        let n = self.control_points.len();
        let knot_vec0 = self.uknot_vec().sub_vec(0..=k);
        let knot_vec1 = self.uknot_vec().sub_vec((k - degree)..m);
        let control_points0 = Vec::from(&self.control_points[0..(k - degree)]);
        let control_points1 = Vec::from(&self.control_points[(k - degree)..n]);
        *self = BSplineSurface::new_unchecked((knot_vec0, vknot_vec.clone()), control_points0);
        BSplineSurface::new_unchecked((knot_vec1, vknot_vec), control_points1)
    }

    /// Cuts the surface into two surfaces at the parameter `v`.
    pub fn vcut(&mut self, v: f64) -> BSplineSurface<V> {
        self.swap_axes();
        let mut res = self.ucut(v);
        self.swap_axes();
        res.swap_axes();
        res
    }

    /// Separates `self` into a grid of Bézier surfaces at each distinct
    /// interior knot. The cell `(i, j)` of the result covers the `i`th u knot
    /// span and the `j`th v knot span.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::uniform_knot(2, 2), KnotVec::bezier_knot(2));
    /// let ctrl_pts = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
    ///     vec![Vector2::new(0.0, 1.0), Vector2::new(0.5, 2.0), Vector2::new(1.0, 1.0)],
    ///     vec![Vector2::new(0.0, 2.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 2.0)],
    ///     vec![Vector2::new(0.0, 3.0), Vector2::new(0.5, -2.0), Vector2::new(1.0, 3.0)],
    /// ];
    /// let bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    /// let beziers = bspsurface.bezier_decomposition();
    /// assert_eq!(beziers.len(), 2);
    /// assert_eq!(beziers[0].len(), 1);
    ///
    /// // the cell (i, j) coincides with the surface on its span
    /// const N: usize = 10;
    /// for i in 0..=N {
    ///     for j in 0..=N {
    ///         let u = 0.5 * (i as f64) / (N as f64);
    ///         let v = (j as f64) / (N as f64);
    ///         assert_near2!(bspsurface.subs(u, v), beziers[0][0].subs(u, v));
    ///         assert_near2!(bspsurface.subs(u + 0.5, v), beziers[1][0].subs(u + 0.5, v));
    ///     }
    /// }
    /// ```
    pub fn bezier_decomposition(&self) -> Vec<Vec<BSplineSurface<V>>> {
        let mut bspline = self.clone();
        bspline.clamp();
        let (uknots, _) = self.knot_vecs.0.to_single_multi();
        let n = uknots.len();

        let mut ustrips = Vec::new();
        for i in 2..n {
            ustrips.push(bspline.ucut(uknots[n - i]));
        }
        ustrips.push(bspline);
        ustrips.reverse();

        ustrips
            .into_iter()
            .map(|mut strip| {
                let (vknots, _) = strip.knot_vecs.1.to_single_multi();
                let n = vknots.len();
                let mut cells = Vec::new();
                for j in 2..n {
                    cells.push(strip.vcut(vknots[n - j]));
                }
                cells.push(strip);
                cells.reverse();
                cells
            })
            .collect()
    }

    /// Reverses the u direction: reflects the u knot vector into the same
    /// range and reverses the order of the control rows. An involution.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let knot_vecs = (KnotVec::uniform_knot(1, 2), KnotVec::bezier_knot(1));
    /// let ctrl_pts = vec![
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.0, 1.0)],
    ///     vec![Vector2::new(0.5, 0.0), Vector2::new(0.5, 1.0)],
    ///     vec![Vector2::new(1.0, 0.0), Vector2::new(1.0, 1.0)],
    /// ];
    /// let mut bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
    /// let org_surface = bspsurface.clone();
    ///
    /// bspsurface.reverse_u();
    /// assert_near2!(bspsurface.subs(0.3, 0.5), org_surface.subs(0.7, 0.5));
    ///
    /// bspsurface.reverse_u();
    /// assert_eq!(bspsurface, org_surface);
    /// ```
    pub fn reverse_u(&mut self) -> &mut Self {
        self.knot_vecs.0.invert();
        self.control_points.reverse();
        self
    }

    /// Reverses the v direction: reflects the v knot vector into the same
    /// range and reverses every control row. An involution.
    pub fn reverse_v(&mut self) -> &mut Self {
        self.knot_vecs.1.invert();
        self.control_points.iter_mut().for_each(|row| row.reverse());
        self
    }

    /// Creates the ruled surface between two curves: the straight-line blend
    /// from `curve0` at u = 0 to `curve1` at u = 1, with the curves running in
    /// the v direction.
    ///
    /// The degrees are synchronized by elevation and the knot vectors are
    /// merged by mutual refinement, so the two rows of the control grid are
    /// the refined curves themselves.
    /// # Failures
    /// Returns [`Error::DifferentBackFront`] if the domains of the two curves
    /// do not coincide.
    ///
    /// [`Error::DifferentBackFront`]: errors/enum.Error.html#variant.DifferentBackFront
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// let curve0 = BSplineCurve::new(
    ///     KnotVec::bezier_knot(2),
    ///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
    /// );
    /// let curve1 = BSplineCurve::new(
    ///     KnotVec::bezier_knot(1),
    ///     vec![Vector2::new(0.0, 2.0), Vector2::new(1.0, 2.0)],
    /// );
    /// let surface = BSplineSurface::try_ruled(curve0.clone(), curve1.clone()).unwrap();
    /// const N: usize = 10;
    /// for i in 0..=N {
    ///     let t = (i as f64) / (N as f64);
    ///     assert_near2!(surface.subs(0.0, t), curve0.subs(t));
    ///     assert_near2!(surface.subs(1.0, t), curve1.subs(t));
    /// }
    /// ```
    pub fn try_ruled(
        mut curve0: BSplineCurve<V>,
        mut curve1: BSplineCurve<V>,
    ) -> Result<BSplineSurface<V>> {
        if !curve0.knot_vec().same_range(curve1.knot_vec()) {
            let back0 = curve0.knot_vec()[curve0.knot_vec().len() - 1];
            let back1 = curve1.knot_vec()[curve1.knot_vec().len() - 1];
            return Err(Error::DifferentBackFront(back0, back1));
        }
        curve0.syncro_degree(&mut curve1);

        curve0.optimize();
        curve1.optimize();
        curve0.knot_normalize();
        curve1.knot_normalize();

        // refine both curves to the merged knot vector
        let missing = curve0.knot_vec().missing_knots(curve1.knot_vec());
        curve0.refine_knots(&missing);
        let missing = curve1.knot_vec().missing_knots(curve0.knot_vec());
        curve1.refine_knots(&missing);

        let uknot_vec = KnotVec::try_from(vec![0.0, 0.0, 1.0, 1.0]).unwrap();
        let vknot_vec = curve0.knot_vec().clone();
        let control_points = vec![
            curve0.control_points().clone(),
            curve1.control_points().clone(),
        ];
        Ok(BSplineSurface::new_unchecked(
            (uknot_vec, vknot_vec),
            control_points,
        ))
    }

    /// Determines whether `self` and `other` are near as B-spline surfaces.
    ///
    /// Divides each knot interval into the number of degree equal parts and
    /// checks `|self(u, v) - other(u, v)| < TOLERANCE` at each sample.
    #[inline(always)]
    pub fn near_as_surface(&self, other: &BSplineSurface<V>) -> bool {
        self.sub_near_as_surface(other, 1, |x, y| x.near(y))
    }

    /// Determines whether `self` and `other` are near in square order as
    /// B-spline surfaces.
    #[inline(always)]
    pub fn near2_as_surface(&self, other: &BSplineSurface<V>) -> bool {
        self.sub_near_as_surface(other, 1, |x, y| x.near2(y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_surface() -> BSplineSurface<Vector3> {
        let uknot_vec = KnotVec::uniform_knot(2, 2);
        let vknot_vec = KnotVec::uniform_knot(2, 3);
        let mut ctrl_pts = Vec::new();
        for i in 0..4 {
            let mut row = Vec::new();
            for j in 0..5 {
                let (x, y) = (i as f64, j as f64);
                row.push(Vector3::new(x, y, x * x - y + (x * y) * 0.5));
            }
            ctrl_pts.push(row);
        }
        BSplineSurface::new((uknot_vec, vknot_vec), ctrl_pts)
    }

    #[test]
    fn refinement_preserves_surface() {
        let mut surface = test_surface();
        let org_surface = surface.clone();
        surface.refine_uknots(&[0.1, 0.7]).refine_vknots(&[0.4, 0.9]);
        assert_eq!(surface.uknot_vec().len(), org_surface.uknot_vec().len() + 2);
        assert_eq!(surface.vknot_vec().len(), org_surface.vknot_vec().len() + 2);
        assert!(surface.near2_as_surface(&org_surface));
    }

    #[test]
    fn insert_then_remove_value_round_trip() {
        let mut surface = test_surface();
        let org_surface = surface.clone();
        surface.insert_uknot(0.3, 2);
        assert_eq!(surface.uknot_vec().multiplicity_of(0.3), 2);
        assert_eq!(surface.remove_uknot_value(0.3, 2), 2);
        assert_eq!(surface.uknot_vec(), org_surface.uknot_vec());
        assert!(surface.near2_as_surface(&org_surface));
    }

    #[test]
    fn insertion_at_full_multiplicity_is_noop() {
        let mut surface = test_surface();
        surface.insert_uknot(0.5, 2);
        let saturated = surface.clone();
        surface.insert_uknot(0.5, 3);
        assert_eq!(surface, saturated);
    }

    #[test]
    fn degree_elevation_preserves_surface() {
        let mut surface = test_surface();
        let org_surface = surface.clone();
        surface.elevate_udegree_by(2).elevate_vdegree();
        assert_eq!(surface.degrees(), (4, 3));
        assert!(surface.near2_as_surface(&org_surface));
    }

    #[test]
    fn reverse_is_involution() {
        let mut surface = test_surface();
        let org_surface = surface.clone();
        surface.reverse_u();
        assert_near2!(surface.subs(0.25, 0.5), org_surface.subs(0.75, 0.5));
        surface.reverse_u();
        assert!(surface.near2_as_surface(&org_surface));
        surface.reverse_v();
        assert_near2!(surface.subs(0.25, 0.4), org_surface.subs(0.25, 0.6));
        surface.reverse_v();
        assert!(surface.near2_as_surface(&org_surface));
    }

    #[test]
    fn bezier_grid_matches_span_count() {
        let surface = test_surface();
        let beziers = surface.bezier_decomposition();
        assert_eq!(beziers.len(), 2);
        beziers.iter().for_each(|strip| assert_eq!(strip.len(), 3));
        for strip in &beziers {
            for cell in strip {
                assert_eq!(cell.control_points().len(), 3);
                assert_eq!(cell.control_points()[0].len(), 3);
            }
        }
    }

    #[test]
    fn second_derivatives_against_finite_difference() {
        let surface = test_surface();
        const EPS: f64 = 1.0e-4;
        let (u, v) = (0.4, 0.6);
        let uuder = surface.uuder(u, v);
        let num = (surface.uder(u + EPS, v) - surface.uder(u - EPS, v)) / (2.0 * EPS);
        assert!((uuder - num).magnitude() < 1.0e-5, "{uuder:?} {num:?}");
        let vvder = surface.vvder(u, v);
        let num = (surface.vder(u, v + EPS) - surface.vder(u, v - EPS)) / (2.0 * EPS);
        assert!((vvder - num).magnitude() < 1.0e-5, "{vvder:?} {num:?}");
        let uvder = surface.uvder(u, v);
        let num = (surface.uder(u, v + EPS) - surface.uder(u, v - EPS)) / (2.0 * EPS);
        assert!((uvder - num).magnitude() < 1.0e-5, "{uvder:?} {num:?}");
    }
}
