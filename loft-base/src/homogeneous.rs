use crate::cgmath64::*;

/// Homogeneous coordinate of a Euclidean space.
/// # Examples
/// ```
/// use loft_base::cgmath64::*;
/// use loft_base::homogeneous::*;
/// assert_eq!(Vector4::new(8.0, 6.0, 4.0, 2.0).truncate(), Vector3::new(8.0, 6.0, 4.0));
/// assert_eq!(Vector4::new(8.0, 6.0, 4.0, 2.0).weight(), 2.0);
/// assert_eq!(Vector4::new(8.0, 6.0, 4.0, 2.0).to_point(), Point3::new(4.0, 3.0, 2.0));
/// assert_eq!(Vector4::from_point(Point3::new(4.0, 3.0, 2.0)), Vector4::new(4.0, 3.0, 2.0, 1.0));
/// assert_eq!(
///     Vector4::from_point_weight(Point3::new(4.0, 3.0, 2.0), 2.0),
///     Vector4::new(8.0, 6.0, 4.0, 2.0),
/// );
/// ```
pub trait Homogeneous: VectorSpace<Scalar = f64> {
    /// The tangent vector of `Self::Point`
    type Vector: VectorSpace<Scalar = f64>;
    /// The point expressed by homogeneous coordinate
    type Point: EuclideanSpace<Scalar = f64, Diff = Self::Vector>;
    /// Returns the first dim - 1 components.
    fn truncate(self) -> Self::Vector;
    /// Returns the last component.
    fn weight(self) -> f64;
    /// Returns the homogeneous coordinate with weight `1.0`.
    fn from_point(point: Self::Point) -> Self;
    /// Returns the homogeneous coordinate of `point` lifted by `weight`,
    /// i.e. the coordinate whose projection is `point` and whose last component is `weight`.
    fn from_point_weight(point: Self::Point, weight: f64) -> Self;
    /// Returns the projection to the hyperplane whose last component is `1.0`.
    #[inline(always)]
    fn to_point(self) -> Self::Point { Self::Point::from_vec(self.truncate() / self.weight()) }
    /// Returns the derivation of the rational curve.
    ///
    /// For a curve c(t), returns the derivation of the projected curve at the point `self` = c(t).
    /// # Examples
    /// ```
    /// use loft_base::cgmath64::*;
    /// use loft_base::homogeneous::*;
    /// let t = 1.5;
    /// // c(t) = (t^2, t^3, t^4, t), whose projection is (t, t^2, t^3)
    /// let pt = Vector4::new(t * t, t * t * t, t * t * t * t, t);
    /// let der = Vector4::new(2.0 * t, 3.0 * t * t, 4.0 * t * t * t, 1.0);
    /// assert_eq!(pt.rat_der(der), Vector3::new(1.0, 2.0 * t, 3.0 * t * t));
    /// ```
    #[inline(always)]
    fn rat_der(self, der: Self) -> Self::Vector {
        let res = (der * self.weight() - self * der.weight()) / (self.weight() * self.weight());
        res.truncate()
    }
    /// Returns the 2nd-order derivation of the rational curve.
    /// # Arguments
    /// * `self` - the point of the curve c(t)
    /// * `der` - the derivation c'(t)
    /// * `der2` - the 2nd-order derivation c''(t)
    #[inline(always)]
    fn rat_der2(self, der: Self, der2: Self) -> Self::Vector {
        let pre_coef1 = der.weight() / (self.weight() * self.weight());
        let coef1 = pre_coef1 + pre_coef1;
        let der_last2 = der.weight() * der.weight();
        let coef2 = (der_last2 + der_last2 - der2.weight() * self.weight())
            / (self.weight() * self.weight() * self.weight());
        let res = der2 / self.weight() - der * coef1 + self * coef2;
        res.truncate()
    }
    /// Returns the cross derivation of the rational surface.
    /// # Arguments
    /// * `self` - the point of the surface s(u, v)
    /// * `uder` - the u-derivation s_u(u, v)
    /// * `vder` - the v-derivation s_v(u, v)
    /// * `uvder` - the mixed derivation s_{uv}(u, v)
    #[inline(always)]
    fn rat_cross_der(self, uder: Self, vder: Self, uvder: Self) -> Self::Vector {
        let self_weight2 = self.weight() * self.weight();
        let coef1 = vder.weight() / self_weight2;
        let coef2 = uder.weight() / self_weight2;
        let der_weight2 = uder.weight() * vder.weight();
        let coef3 = (der_weight2 + der_weight2 - uvder.weight() * self.weight())
            / (self_weight2 * self.weight());
        let res = uvder / self.weight() - uder * coef1 - vder * coef2 + self * coef3;
        res.truncate()
    }
}

impl Homogeneous for Vector2 {
    type Vector = Vector1;
    type Point = Point1;
    #[inline(always)]
    fn truncate(self) -> Vector1 { Vector1::new(self[0]) }
    #[inline(always)]
    fn weight(self) -> f64 { self[1] }
    #[inline(always)]
    fn from_point(point: Point1) -> Self { Vector2::new(point[0], 1.0) }
    #[inline(always)]
    fn from_point_weight(point: Point1, weight: f64) -> Self {
        Vector2::new(point[0] * weight, weight)
    }
}

impl Homogeneous for Vector3 {
    type Vector = Vector2;
    type Point = Point2;
    #[inline(always)]
    fn truncate(self) -> Vector2 { self.truncate() }
    #[inline(always)]
    fn weight(self) -> f64 { self[2] }
    #[inline(always)]
    fn from_point(point: Point2) -> Self { Vector3::new(point[0], point[1], 1.0) }
    #[inline(always)]
    fn from_point_weight(point: Point2, weight: f64) -> Self {
        Vector3::new(point[0] * weight, point[1] * weight, weight)
    }
}

impl Homogeneous for Vector4 {
    type Vector = Vector3;
    type Point = Point3;
    #[inline(always)]
    fn truncate(self) -> Vector3 { self.truncate() }
    #[inline(always)]
    fn weight(self) -> f64 { self[3] }
    #[inline(always)]
    fn from_point(point: Point3) -> Self { point.to_homogeneous() }
    #[inline(always)]
    fn from_point_weight(point: Point3, weight: f64) -> Self {
        Vector4::new(point[0] * weight, point[1] * weight, point[2] * weight, weight)
    }
}
