use thiserror::Error;

/// Geometrical errors
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    /// The following operations fail if the knot vector has zero range:
    /// * creating `BSplineCurve` or `BSplineSurface`,
    /// * calculating B-spline basis functions,
    /// * normalizing the knot vector.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// use errors::Error;
    /// let mut knot_vec = KnotVec::from(vec![0.0, 0.0, 0.0, 0.0]);
    /// assert_eq!(knot_vec.try_normalize(), Err(Error::ZeroRange));
    /// assert_eq!(knot_vec.try_bspline_basis_functions(1, 0.0), Err(Error::ZeroRange));
    /// ```
    #[error("This knot vector consists of a single value.")]
    ZeroRange,
    /// Two knot vectors (or two curve domains) whose back and front do not
    /// coincide cannot be concatenated, and two such curves cannot bound a
    /// ruled surface.
    #[error("Cannot join two knot ranges whose the back of the first and the front of the second are different.
the back of the first: {0}
the front of the second: {1}")]
    DifferentBackFront(f64, f64),
    /// If the knot vector is not clamped, then one cannot concat the vector with another one.
    #[error("This knot vector is not clamped.")]
    NotClampedKnotVector,
    /// Creating a knot vector by `KnotVec::try_from()` fails if the given vector is not sorted.
    /// # Examples
    /// ```
    /// use loft_geometry::*;
    /// use errors::Error;
    /// assert_eq!(KnotVec::try_from(vec![1.0, 3.0, 0.0, 2.0]), Err(Error::NotSortedVector));
    /// ```
    #[error("This knot vector is not sorted.")]
    NotSortedVector,
    /// The given degree is too large for the length of the knot vector.
    #[error("This knot vector is too short compared to the degree.
the length of knot_vec: {0}
the degree: {1}")]
    TooLargeDegree(usize, usize),
    /// The specified knot cannot be removed without changing the shape.
    #[error("The {0}th knot in this knot vector cannot be removed.")]
    CannotRemoveKnot(usize),
    /// An empty vector of points cannot construct a B-spline.
    #[error("The control points must not be empty.")]
    EmptyControlPoints,
    /// The knot vector must be longer than the corresponding array of control points.
    #[error("The knot vector must be longer than the control points.
the length of knot_vec: {0}
the number of control points: {1}")]
    TooShortKnotVector(usize, usize),
    /// The rows of the control grid of a B-spline surface must all have the same length.
    #[error("The number of control points is irregular")]
    IrregularControlPoints,
    /// The lengths of a zipped pair of containers do not coincide,
    /// e.g. control points and their weights.
    #[error("The given containers have different lengths.")]
    DifferentLength,
    /// The degree cannot be lowered without leaving the tolerance.
    #[error("This spline is not the degree elevation of a lower-degree spline.")]
    CannotReduceDegree,
    /// Constructing a surface of revolution requires the tangent rays of
    /// adjacent rotated control points to intersect.
    #[error("The tangent rays of the rotated control points do not intersect.")]
    TangentRaysDoNotIntersect,
    /// Fitting requires strictly more sample points than control points.
    #[error("Not enough sample points for the requested control net.
the number of sample points: {0}
the number of control points: {1}")]
    TooFewSamplePoints(usize, usize),
    /// Fitting requires a positive degree in each direction.
    #[error("The degree must be positive.")]
    ZeroDegree,
    /// The tangent plane directions are parallel, so the 2x2 tangent system is singular.
    #[error("The partial derivatives at this parameter are parallel.")]
    DegenerateTangents,
    /// A linear system arising in fitting is singular.
    #[error("The collocation system is singular.")]
    SingularSystem,
}

#[test]
#[rustfmt::skip]
fn print_messages() {
    use std::io::Write;
    let stderr = &mut std::io::stderr();
    writeln!(stderr, "****** test of the expressions of error messages ******\n").unwrap();
    writeln!(stderr, "{}\n", Error::ZeroRange).unwrap();
    writeln!(stderr, "{}\n", Error::DifferentBackFront(0.0, 1.0)).unwrap();
    writeln!(stderr, "{}\n", Error::NotClampedKnotVector).unwrap();
    writeln!(stderr, "{}\n", Error::NotSortedVector).unwrap();
    writeln!(stderr, "{}\n", Error::TooLargeDegree(1, 2)).unwrap();
    writeln!(stderr, "{}\n", Error::CannotRemoveKnot(7)).unwrap();
    writeln!(stderr, "{}\n", Error::EmptyControlPoints).unwrap();
    writeln!(stderr, "{}\n", Error::TooShortKnotVector(1, 2)).unwrap();
    writeln!(stderr, "{}\n", Error::IrregularControlPoints).unwrap();
    writeln!(stderr, "{}\n", Error::DifferentLength).unwrap();
    writeln!(stderr, "{}\n", Error::CannotReduceDegree).unwrap();
    writeln!(stderr, "{}\n", Error::TangentRaysDoNotIntersect).unwrap();
    writeln!(stderr, "{}\n", Error::TooFewSamplePoints(3, 5)).unwrap();
    writeln!(stderr, "{}\n", Error::ZeroDegree).unwrap();
    writeln!(stderr, "{}\n", Error::DegenerateTangents).unwrap();
    writeln!(stderr, "{}\n", Error::SingularSystem).unwrap();
    writeln!(stderr, "*******************************************************").unwrap();
}
