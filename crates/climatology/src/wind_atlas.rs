//! Wind-rose summaries for the visible region.
//!
//! Roses are placed on a lattice that starts at the wind grid's spacing and
//! doubles until there is at most one rose per [`ROSE_SPACING_PX`] pixels in
//! either direction.

use std::f64::consts::PI;

use clim_common::{positive_degrees, GeoTransform, Viewport};
use grid_store::{WindCell, WindField};
use serde::Serialize;
use tracing::debug;

pub const ROSE_SPACING_PX: u32 = 70;

/// Radius of the rose's center circle in pixels.
pub const ROSE_RADIUS_PX: f64 = 12.0;

/// Petal length, in pixels, for a direction holding every observation.
pub const PETAL_SCALE_PX: f64 = 70.0;

/// Petals longer than this fraction are clipped and marked as split.
pub const MAX_PETAL_FRACTION: f64 = 0.4;

const MS_TO_KNOTS: f64 = 3.6 / 1.852;

/// Upper bound on the lattice step, in degrees.
const MAX_STEP: f64 = 360.0;

/// Number shown inside a rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "percent")]
pub enum RoseLabel {
    Storm(u8),
    Calm(u8),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindPetal {
    /// Radians, `2π · d / dir_count`.
    pub angle: f64,
    /// Share of the cell's observations from this direction.
    pub fraction: f64,
    /// `fraction` clipped to [`MAX_PETAL_FRACTION`].
    pub clipped_fraction: f64,
    pub split: bool,
    /// Distance of the petal tip from the rose center, pixels.
    pub length_px: f64,
    pub average_knots: f64,
    pub barbs: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindRose {
    pub lat: f64,
    pub lon: f64,
    pub x: f64,
    pub y: f64,
    pub label: Option<RoseLabel>,
    pub petals: Vec<WindPetal>,
}

/// Lattice step in degrees for a viewport.
pub fn atlas_step(field: &WindField, viewport: &Viewport) -> f64 {
    let mut step = 360.0 / field.longitudes().max(1) as f64;
    let rows_fit = (viewport.pixel_height / ROSE_SPACING_PX).max(1) as f64;
    let cols_fit = (viewport.pixel_width / ROSE_SPACING_PX).max(1) as f64;
    let lat_span = viewport.bounds.lat_span();
    let lon_span = viewport.bounds.lon_span();

    while (lat_span / step > rows_fit || lon_span / step > cols_fit) && step < MAX_STEP {
        step *= 2.0;
    }
    step
}

/// Bar count for a speed: one per started 5 knots above 2.
pub fn barb_count(knots: f64) -> u32 {
    if !(knots > 2.0) {
        return 0;
    }
    ((knots - 2.0) / 5.0).ceil() as u32
}

/// Rose label: storm frequency when it dominates, calm otherwise.
pub fn rose_label(cell: &WindCell) -> Option<RoseLabel> {
    if cell.storm as u32 * 2 > cell.calm as u32 {
        Some(RoseLabel::Storm(cell.storm))
    } else if cell.calm > 0 {
        Some(RoseLabel::Calm(cell.calm))
    } else {
        None
    }
}

pub fn petals(cell: &WindCell, dir_count: usize) -> Vec<WindPetal> {
    (0..dir_count)
        .map(|d| {
            let fraction = cell.direction_fraction(d);
            let split = fraction >= MAX_PETAL_FRACTION;
            let clipped_fraction = fraction.min(MAX_PETAL_FRACTION);
            let average_knots = cell.direction_average_speed(d) * MS_TO_KNOTS;
            WindPetal {
                angle: 2.0 * PI * d as f64 / dir_count as f64,
                fraction,
                clipped_fraction,
                split,
                length_px: ROSE_RADIUS_PX + PETAL_SCALE_PX * clipped_fraction,
                average_knots,
                barbs: barb_count(average_knots),
            }
        })
        .collect()
}

/// Wind roses covering the viewport.
///
/// The lattice starts one degree outside the view on each side so roses
/// on the edge are kept. Cells without observations produce no rose.
pub fn wind_atlas(field: &WindField, viewport: &Viewport, transform: &dyn GeoTransform) -> Vec<WindRose> {
    let step = atlas_step(field, viewport);
    let bounds = &viewport.bounds;
    let lat_end = bounds.max_lat + 1.0;
    let lon_end = bounds.min_lon + bounds.lon_span() + 1.0;
    let lat_start = (bounds.min_lat / step).round() * step - 1.0;
    let lon_start = (bounds.min_lon / step).round() * step - 1.0;

    let mut roses = Vec::new();
    let mut i = 0u32;
    loop {
        let lat = lat_start + i as f64 * step;
        if lat > lat_end {
            break;
        }
        let mut j = 0u32;
        loop {
            let lon = lon_start + j as f64 * step;
            if lon > lon_end {
                break;
            }
            if let Some(cell) = field.cell_at(lat, positive_degrees(lon)) {
                let (x, y) = transform.geo_to_pixel(lat, lon);
                roses.push(WindRose {
                    lat,
                    lon,
                    x,
                    y,
                    label: rose_label(cell),
                    petals: petals(cell, field.dir_count()),
                });
            }
            j += 1;
        }
        i += 1;
    }

    debug!(step, roses = roses.len(), "Built wind atlas");
    roses
}
