//! Host-supplied view description and coordinate transforms.
//!
//! The overlay never projects coordinates itself; the host chart passes a
//! [`Viewport`] and an implementation of [`GeoTransform`] and the overlay
//! only uses them to decide which region to query.

use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// The visible chart region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub bounds: BoundingBox,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Longitude at the center of the view, in degrees.
    pub center_lon: f64,
}

impl Viewport {
    pub fn new(bounds: BoundingBox, pixel_width: u32, pixel_height: u32) -> Self {
        let center_lon = bounds.min_lon + bounds.lon_span() / 2.0;
        Self {
            bounds,
            pixel_width,
            pixel_height,
            center_lon,
        }
    }
}

/// Conversion between geographic and pixel coordinates.
pub trait GeoTransform {
    /// Pixel position `(x, y)` of a geographic point.
    fn geo_to_pixel(&self, lat: f64, lon: f64) -> (f64, f64);

    /// Geographic position `(lat, lon)` of a pixel.
    fn pixel_to_geo(&self, x: f64, y: f64) -> (f64, f64);
}

/// Plate carrée mapping of a viewport's bounds onto its pixel rectangle.
///
/// Useful for hosts without their own projection and for tests.
#[derive(Debug, Clone, Copy)]
pub struct EquirectangularTransform {
    viewport: Viewport,
}

impl EquirectangularTransform {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    fn scale(&self) -> (f64, f64) {
        let b = &self.viewport.bounds;
        let sx = self.viewport.pixel_width as f64 / b.lon_span().max(f64::EPSILON);
        let sy = self.viewport.pixel_height as f64 / b.lat_span().max(f64::EPSILON);
        (sx, sy)
    }
}

impl GeoTransform for EquirectangularTransform {
    fn geo_to_pixel(&self, lat: f64, lon: f64) -> (f64, f64) {
        let b = &self.viewport.bounds;
        let (sx, sy) = self.scale();
        let mut dlon = lon - b.min_lon;
        if b.crosses_antimeridian() && dlon < 0.0 {
            dlon += 360.0;
        }
        (dlon * sx, (b.max_lat - lat) * sy)
    }

    fn pixel_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        let b = &self.viewport.bounds;
        let (sx, sy) = self.scale();
        let mut lon = b.min_lon + x / sx;
        if lon > 180.0 {
            lon -= 360.0;
        }
        (b.max_lat - y / sy, lon)
    }
}
