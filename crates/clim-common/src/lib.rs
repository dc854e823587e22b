//! Common types shared across the climatology overlay crates.

pub mod bbox;
pub mod color;
pub mod domain;
pub mod error;
pub mod progress;
pub mod viewport;

pub use bbox::BoundingBox;
pub use color::Rgb;
pub use domain::{Domain, Month, MONTH_SLOTS};
pub use error::{ClimError, ClimResult};
pub use progress::{NoProgress, ProgressSink, ProgressUpdate};
pub use viewport::{EquirectangularTransform, GeoTransform, Viewport};

/// Normalize a longitude into `[0, 360)`.
pub fn positive_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
