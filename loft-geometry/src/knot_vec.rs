use crate::errors::Error;
use crate::*;
use std::slice::SliceIndex;

impl KnotVec {
    /// empty constructor
    pub const fn new() -> KnotVec { KnotVec(Vec::new()) }

    /// Returns the length of the knot range.
    #[inline(always)]
    pub fn range_length(&self) -> f64 {
        match self.is_empty() {
            true => 0.0,
            false => self[self.len() - 1] - self[0],
        }
    }

    /// Returns whether two knot vectors have the same range.
    #[inline(always)]
    pub fn same_range(&self, other: &KnotVec) -> bool {
        match (self.is_empty(), other.is_empty()) {
            (false, false) => {
                self[0].near(&other[0]) && self.range_length().near(&other.range_length())
            }
            (true, true) => true,
            _ => false,
        }
    }

    /// Removes one knot.
    #[inline(always)]
    pub fn remove(&mut self, idx: usize) -> f64 { self.0.remove(idx) }

    /// Returns the maximum index `i` with `self[i] <= x`,
    /// `None` if `x < self[0]` or `self` is empty.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let knot_vec = KnotVec::from(vec![0.0, 0.0, 1.0, 2.0, 3.0, 3.0]);
    /// assert_eq!(knot_vec.floor(1.5), Some(2));
    /// assert_eq!(knot_vec.floor(-1.0), None);
    /// ```
    #[inline(always)]
    pub fn floor(&self, x: f64) -> Option<usize> { self.iter().rposition(|t| *t <= x) }

    /// the multiplicity of the `i`th knot
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let knot_vec = KnotVec::from(vec![0.0, 0.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0]);
    /// assert_eq!(knot_vec.multiplicity(5), 3);
    /// ```
    #[inline(always)]
    pub fn multiplicity(&self, i: usize) -> usize {
        self.iter().filter(|u| self[i].near(u)).count()
    }

    /// the multiplicity of the knot value `x`, i.e. the number of knots
    /// equal to `x` up to tolerance. Zero if `x` is not a knot.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let knot_vec = KnotVec::from(vec![0.0, 0.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0]);
    /// assert_eq!(knot_vec.multiplicity_of(2.0), 3);
    /// assert_eq!(knot_vec.multiplicity_of(1.5), 0);
    /// ```
    #[inline(always)]
    pub fn multiplicity_of(&self, x: f64) -> usize {
        self.iter().filter(|u| x.near(u)).count()
    }

    /// Adds a knot and returns the index of the added knot.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let mut knot_vec = KnotVec::from(vec![0.0, 0.0, 1.0, 2.0, 3.0, 3.0]);
    /// let idx = knot_vec.add_knot(1.5);
    /// assert_eq!(idx, 3);
    /// assert_eq!(knot_vec, KnotVec::from(vec![0.0, 0.0, 1.0, 1.5, 2.0, 3.0, 3.0]));
    /// ```
    #[inline(always)]
    pub fn add_knot(&mut self, knot: f64) -> usize {
        match self.floor(knot) {
            Some(idx) => {
                self.0.insert(idx + 1, knot);
                idx + 1
            }
            None => {
                self.0.insert(0, knot);
                0
            }
        }
    }

    /// Returns the knots of `other` which are missing from `self`, counted
    /// with multiplicity. Inserting the result into `self` makes `self` a
    /// superset of `other`.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let knot_vec0 = KnotVec::from(vec![0.0, 0.0, 0.5, 1.0, 1.0]);
    /// let knot_vec1 = KnotVec::from(vec![0.0, 0.0, 0.25, 0.5, 0.5, 1.0, 1.0]);
    /// assert_eq!(knot_vec0.missing_knots(&knot_vec1), vec![0.25, 0.5]);
    /// assert!(knot_vec1.missing_knots(&knot_vec0).is_empty());
    /// ```
    pub fn missing_knots(&self, other: &KnotVec) -> Vec<f64> {
        let (knots, mults) = other.to_single_multi();
        let mut res = Vec::new();
        for (knot, mult) in knots.into_iter().zip(mults) {
            let current = self.multiplicity_of(knot);
            res.extend(std::iter::repeat(knot).take(mult.saturating_sub(current)));
        }
        res
    }

    /// Calculates the B-spline basis functions at `t` with degree `degree`.
    /// # Panics
    /// Panics if the knot vector is not longer than `degree`, or has zero range.
    /// # Remarks
    /// The B-spline basis function is based on the characteristic function of
    /// the right-open interval [s, t), so the value corresponding to the end
    /// point t = t_n is always 0.0.
    pub fn bspline_basis_functions(&self, degree: usize, t: f64) -> Vec<f64> {
        match self.try_bspline_basis_functions(degree, t) {
            Ok(got) => got,
            Err(error) => panic!("{}", error),
        }
    }

    /// Calculates the B-spline basis functions at `t` with degree `degree`.
    /// # Failures
    /// - If the range of the knot vector is zero, returns [`Error::ZeroRange`].
    /// - If the length of `self` is not more than `degree`, returns [`Error::TooLargeDegree`].
    ///
    /// [`Error::ZeroRange`]: errors/enum.Error.html#variant.ZeroRange
    /// [`Error::TooLargeDegree`]: errors/enum.Error.html#variant.TooLargeDegree
    /// # Examples
    /// ```
    /// use loft_geometry::{assert_near2, KnotVec, Tolerance};
    /// const N: usize = 100; // sample size in tests
    ///
    /// // the B-spline basis functions are a partition of unity in (t_k, t_{n - k}).
    /// let knot_vec = KnotVec::from(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    /// let degree = 2;
    /// for i in 0..N {
    ///     let t = 2.0 + 4.0 / (N as f64) * (i as f64);
    ///     let res = knot_vec.try_bspline_basis_functions(degree, t).unwrap();
    ///     let sum = res.iter().fold(0.0, |sum, a| sum + a);
    ///     assert_near2!(sum, 1.0);
    /// }
    /// ```
    pub fn try_bspline_basis_functions(&self, degree: usize, t: f64) -> Result<Vec<f64>> {
        let n = self.len() - 1;
        if self[0].near(&self[n]) {
            return Err(Error::ZeroRange);
        } else if n < degree {
            return Err(Error::TooLargeDegree(n + 1, degree));
        }

        let idx = {
            let idx = self
                .floor(t)
                .unwrap_or_else(|| self.floor(self[0]).unwrap());
            if idx == n {
                n - self.multiplicity(n)
            } else {
                idx
            }
        };
        let mut res = vec![0.0; n];
        res[idx] = 1.0;

        for k in 1..=degree {
            let base = if idx < k { 0 } else { idx - k };
            let delta = self[base + k] - self[base];
            let max = if idx + k < n { idx } else { n - k - 1 };
            let mut a = inv_or_zero(delta) * (t - self[base]);
            for i in base..=max {
                let delta = self[i + k + 1] - self[i + 1];
                let b = inv_or_zero(delta) * (self[i + k + 1] - t);
                res[i] = a * res[i] + b * res[i + 1];
                a = 1.0 - b;
            }
        }

        res.truncate(n - degree);
        Ok(res)
    }

    /// Normalizes the knot vector, i.e. makes the first value 0 and the last value 1.
    /// # Failures
    /// Returns [`Error::ZeroRange`] if the range of the knot vector is so small.
    ///
    /// [`Error::ZeroRange`]: errors/enum.Error.html#variant.ZeroRange
    pub fn try_normalize(&mut self) -> Result<&mut Self> {
        let range = self.range_length();
        if range.so_small() {
            return Err(Error::ZeroRange);
        }

        let start = self[0];
        for vec in self.0.as_mut_slice() {
            *vec -= start;
            *vec /= range;
        }

        Ok(self)
    }

    /// Normalizes the knot vector, i.e. makes the first value 0 and the last value 1.
    /// # Panics
    /// Panics if the range of the knot vector is so small.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let mut knot_vec = KnotVec::from(vec![1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 5.0]);
    /// knot_vec.normalize();
    /// let res: Vec<f64> = knot_vec.into();
    /// assert_eq!(res, vec![0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0]);
    /// ```
    #[inline(always)]
    pub fn normalize(&mut self) -> &mut Self {
        self.try_normalize()
            .unwrap_or_else(|error| panic!("{}", error))
    }

    /// Translates the knot vector.
    pub fn translate(&mut self, x: f64) -> &mut Self {
        for vec in &mut self.0 {
            *vec += x;
        }
        self
    }

    /// Inverts the knot vector: reverses the order and reflects each knot
    /// affinely into the same range.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let mut knot_vec = KnotVec::from(vec![1.0, 1.0, 1.0, 3.0, 5.0, 6.0]);
    /// knot_vec.invert();
    /// let res: Vec<f64> = knot_vec.into();
    /// assert_eq!(res, vec![1.0, 2.0, 4.0, 6.0, 6.0, 6.0]);
    /// ```
    pub fn invert(&mut self) -> &mut Self {
        let n = self.len();
        if n == 0 {
            return self;
        }
        let range = self[0] + self[n - 1];
        let clone = self.0.clone();
        for (knot1, knot0) in clone.iter().rev().zip(&mut self.0) {
            *knot0 = range - knot1;
        }
        self
    }

    /// Determines whether the knot vector is clamped for the given degree.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let knot_vec = KnotVec::from(vec![0.0, 0.0, 0.0, 0.25, 0.5, 0.75, 1.0, 1.0, 1.0]);
    /// assert!(knot_vec.is_clamped(2));
    /// assert!(!knot_vec.is_clamped(3));
    /// ```
    #[inline(always)]
    pub fn is_clamped(&self, degree: usize) -> bool {
        self.multiplicity(0) > degree && self.multiplicity(self.len() - 1) > degree
    }

    /// Concats two knot vectors.
    /// # Failures
    /// * If at least one of `self` or `other` is not clamped, returns [`Error::NotClampedKnotVector`].
    /// * If the last knot of `self` and the first knot of `other` are different, returns
    ///   [`Error::DifferentBackFront`].
    ///
    /// [`Error::NotClampedKnotVector`]: errors/enum.Error.html#variant.NotClampedKnotVector
    /// [`Error::DifferentBackFront`]: errors/enum.Error.html#variant.DifferentBackFront
    pub fn try_concat(&mut self, other: &KnotVec, degree: usize) -> Result<&mut Self> {
        if !self.is_clamped(degree) || !other.is_clamped(degree) {
            return Err(Error::NotClampedKnotVector);
        }
        let back = self.0.last().unwrap();
        let front = other.0.first().unwrap();
        if front < back || !front.near(back) {
            return Err(Error::DifferentBackFront(*back, *front));
        }

        self.0.truncate(self.len() - degree - 1);
        self.0.extend_from_slice(other);

        Ok(self)
    }

    /// Concats two knot vectors.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let mut knot_vec0 = KnotVec::from(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    /// let knot_vec1 = KnotVec::from(vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    /// knot_vec0.concat(&knot_vec1, 2);
    /// assert_eq!(knot_vec0.as_slice(), &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    /// ```
    /// # Panics
    /// Panics under the failure conditions of [`KnotVec::try_concat`].
    #[inline(always)]
    pub fn concat(&mut self, other: &KnotVec, degree: usize) -> &mut Self {
        self.try_concat(other, degree)
            .unwrap_or_else(|error| panic!("{}", error))
    }

    /// Returns the sub-vector of the specified range.
    #[inline(always)]
    pub fn sub_vec<I: SliceIndex<[f64], Output = [f64]>>(&self, range: I) -> KnotVec {
        KnotVec(Vec::from(&self.0[range]))
    }

    /// Decomposes into the vector of distinct knots and the vector of multiplicities.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// let knot_vec = KnotVec::from(vec![0.0, 0.0, 0.0, 1.0, 2.0, 2.0, 2.0, 2.0, 3.0, 3.0]);
    /// let (knots, mults) = knot_vec.to_single_multi();
    /// assert_eq!(knots, vec![0.0, 1.0, 2.0, 3.0]);
    /// assert_eq!(mults, vec![3, 1, 4, 2]);
    /// ```
    pub fn to_single_multi(&self) -> (Vec<f64>, Vec<usize>) {
        let mut knots = Vec::new();
        let mut mults = Vec::new();

        let mut iter = self.as_slice().iter().peekable();
        let mut mult = 1;
        while let Some(knot) = iter.next() {
            if let Some(next) = iter.peek() {
                if knot.near(next) {
                    mult += 1;
                } else {
                    knots.push(*knot);
                    mults.push(mult);
                    mult = 1;
                }
            } else {
                knots.push(*knot);
                mults.push(mult);
            }
        }
        (knots, mults)
    }

    /// Constructs from the single-multi description.
    pub fn from_single_multi(knots: Vec<f64>, mults: Vec<usize>) -> Result<KnotVec> {
        for i in 1..knots.len() {
            if knots[i - 1] > knots[i] {
                return Err(Error::NotSortedVector);
            }
        }

        let mut vec = Vec::new();
        for (knot, mult) in knots.into_iter().zip(mults) {
            vec.extend(std::iter::repeat(knot).take(mult));
        }
        Ok(KnotVec(vec))
    }

    /// Constructs from `Vec<f64>`. Does not sort, only checks that the vector is sorted.
    pub fn try_from(vec: Vec<f64>) -> Result<KnotVec> {
        for i in 1..vec.len() {
            if vec[i - 1] > vec[i] {
                return Err(Error::NotSortedVector);
            }
        }
        Ok(KnotVec(vec))
    }

    /// Constructs the knot vector of a Bézier spline.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// assert_eq!(
    ///     *KnotVec::bezier_knot(3),
    ///     vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
    /// );
    /// ```
    pub fn bezier_knot(degree: usize) -> KnotVec {
        let mut vec = vec![0.0; degree + 1];
        vec.extend(std::iter::repeat(1.0).take(degree + 1));
        KnotVec(vec)
    }

    /// Constructs the clamped uniform knot vector.
    /// # Examples
    /// ```
    /// use loft_geometry::KnotVec;
    /// assert_eq!(
    ///     *KnotVec::uniform_knot(2, 5),
    ///     vec![0.0, 0.0, 0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 1.0, 1.0],
    /// );
    /// ```
    pub fn uniform_knot(degree: usize, division: usize) -> KnotVec {
        let mut vec = vec![0.0; degree + 1];
        vec.extend((1..division).map(|i| (i as f64) / (division as f64)));
        vec.extend(std::iter::repeat(1.0).take(degree + 1));
        KnotVec(vec)
    }
}

impl From<Vec<f64>> for KnotVec {
    /// Constructs from `Vec<f64>`. The vector will be sorted.
    fn from(mut vec: Vec<f64>) -> KnotVec {
        vec.sort_by(|a, b| a.partial_cmp(b).unwrap());
        KnotVec(vec)
    }
}

impl From<&Vec<f64>> for KnotVec {
    /// Constructs from a reference. The cloned vector will be sorted.
    #[inline(always)]
    fn from(vec: &Vec<f64>) -> KnotVec { KnotVec::from(vec.clone()) }
}

impl From<KnotVec> for Vec<f64> {
    #[inline(always)]
    fn from(knotvec: KnotVec) -> Vec<f64> { knotvec.0 }
}

impl std::iter::FromIterator<f64> for KnotVec {
    #[inline(always)]
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> KnotVec {
        KnotVec::try_from(iter.into_iter().collect::<Vec<_>>()).unwrap()
    }
}

impl<'a> IntoIterator for &'a KnotVec {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl std::ops::Deref for KnotVec {
    type Target = Vec<f64>;
    #[inline(always)]
    fn deref(&self) -> &Vec<f64> { &self.0 }
}

impl AsRef<[f64]> for KnotVec {
    #[inline(always)]
    fn as_ref(&self) -> &[f64] { &self.0 }
}
