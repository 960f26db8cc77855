//! Basic structs and traits shared by the whole package: `f64`-scalar
//! re-definitions of the cgmath types, tolerance comparisons, homogeneous
//! coordinates, derivative grids, and dense linear algebra.

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

/// re-export of cgmath with `f64`-scalar type aliases
pub mod cgmath64;
/// derivative grids of curves and surfaces, and the rational quotient rule
pub mod ders;
/// homogeneous coordinates over the cgmath vector types
pub mod homogeneous;
/// dense LU decomposition with partial pivoting
pub mod lu;
/// tolerance constants, comparison traits and assertion macros
pub mod tolerance;
