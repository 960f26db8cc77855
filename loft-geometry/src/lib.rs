//! # Overview
//! `loft_geometry` is the tensor-product spline kernel of the package: knot
//! vectors, B-spline and NURBS curves and surfaces, the structural operations
//! on them (knot insertion and removal, degree alteration, Bézier
//! decomposition), inverse projection, and surface construction from
//! primitive geometry or point grids.

#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]

use serde::{Deserialize, Serialize};

/// re-export `loft_base`
pub mod base {
    pub use loft_base::cgmath64::*;
    pub use loft_base::ders::*;
    pub use loft_base::homogeneous::*;
    pub use loft_base::tolerance::*;
    pub use loft_base::{assert_near, assert_near2, prop_assert_near, prop_assert_near2};
}
pub use base::*;

/// knot vector
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct KnotVec(Vec<f64>);

/// B-spline curve
/// # Examples
/// ```
/// use loft_geometry::*;
///
/// // knot vector of a quadratic spline with three segments
/// let knot_vec = KnotVec::uniform_knot(2, 3);
/// let ctrl_pts = vec![
///     Vector2::new(0.0, 0.0),
///     Vector2::new(1.0, 1.0),
///     Vector2::new(2.0, -1.0),
///     Vector2::new(3.0, 1.0),
///     Vector2::new(4.0, 0.0),
/// ];
/// let bspcurve = BSplineCurve::new(knot_vec, ctrl_pts);
///
/// // a clamped curve interpolates its end control points
/// assert_near2!(bspcurve.subs(0.0), Vector2::new(0.0, 0.0));
/// assert_near2!(bspcurve.subs(1.0), Vector2::new(4.0, 0.0));
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BSplineCurve<V> {
    knot_vec: KnotVec,
    control_points: Vec<V>,
}

/// B-spline surface
/// # Examples
/// ```
/// use loft_geometry::*;
///
/// let knot_vecs = (KnotVec::bezier_knot(1), KnotVec::bezier_knot(2));
/// let ctrl_pts = vec![
///     vec![Vector2::new(0.0, 0.0), Vector2::new(0.5, -1.0), Vector2::new(1.0, 0.0)],
///     vec![Vector2::new(0.0, 1.0), Vector2::new(0.5, 2.0), Vector2::new(1.0, 1.0)],
/// ];
/// let bspsurface = BSplineSurface::new(knot_vecs, ctrl_pts);
///
/// // bspsurface: (v, 2v(1 - v)(2u - 1) + u)
/// assert_near2!(bspsurface.subs(0.5, 0.5), Vector2::new(0.5, 0.5));
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BSplineSurface<V> {
    knot_vecs: (KnotVec, KnotVec),
    control_points: Vec<Vec<V>>,
}

/// NURBS curve: a rational view of a B-spline curve with homogeneous control points.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NurbsCurve<V>(BSplineCurve<V>);

/// NURBS surface: a rational view of a B-spline surface with homogeneous control points.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct NurbsSurface<V>(BSplineSurface<V>);

/// Curve accumulator for recursive concatenation.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub enum CurveCollector<V> {
    /// the empty curve
    Singleton,
    /// a non-empty curve
    Curve(BSplineCurve<V>),
}

/// Error handler for [`Error`](./errors/enum.Error.html)
pub type Result<T> = std::result::Result<T, crate::errors::Error>;

#[doc(hidden)]
pub mod bspcurve;
/// Defines iterators on control points of a B-spline surface.
pub mod bspsurface;
/// Enumerates `Error`.
pub mod errors;
/// Surface interpolation and approximation through point grids.
pub mod fitting;
#[doc(hidden)]
pub mod knot_vec;
#[doc(hidden)]
pub mod nurbscurve;
#[doc(hidden)]
pub mod nurbssurface;

pub use nurbssurface::ProjectedPoint;

#[doc(hidden)]
#[inline(always)]
pub fn inv_or_zero(delta: f64) -> f64 {
    if delta.so_small() {
        0.0
    } else {
        1.0 / delta
    }
}
