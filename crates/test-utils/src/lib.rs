//! Test helpers for the climatology crates.
//!
//! Generators write wind files, scalar NetCDF grids and both cyclone archive
//! layouts byte for byte; [`write_data_dir`] lays them out the way the
//! overlay loader expects. The assertion macros compare floats and
//! lat/lon pairs within a tolerance.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Assert two numbers differ by at most `epsilon`.
///
/// ```ignore
/// assert_approx_eq!(overlay.value(Domain::Wind, 0.0, 0.0), 5.0, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert both members of a `(x, y)` pair, such as an isoline vertex,
/// are within `epsilon`.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}
