//! Monthly scalar climatology grids (sea level pressure, sea temperature).
//!
//! Each grid is a fixed `[13][rows][cols]` block of signed 16-bit samples.
//! Rows run from north to south, columns eastward from the grid's first
//! longitude. The raw value `32767` marks a missing sample.

use clim_common::{positive_degrees, Domain, Month, MONTH_SLOTS};

use crate::error::{GridResult, GridStoreError};
use crate::interpolation::{bilinear_cyclic, CyclicGrid};

/// Raw sample value meaning "no data".
pub const NO_DATA: i16 = 32767;

/// The two scalar datasets and their fixed layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// COADS sea level pressure, 2° bins.
    Pressure,
    /// COADS sea surface temperature, 1° bins.
    SeaTemperature,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 2] = [ScalarKind::Pressure, ScalarKind::SeaTemperature];

    /// Expected `[months, rows, cols]` shape.
    pub fn shape(self) -> [usize; 3] {
        match self {
            ScalarKind::Pressure => [MONTH_SLOTS, 90, 180],
            ScalarKind::SeaTemperature => [MONTH_SLOTS, 180, 360],
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ScalarKind::Pressure => "slpcoadsclim5079.nc",
            ScalarKind::SeaTemperature => "sstcoadsclim6079.1deg.nc",
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            ScalarKind::Pressure => Domain::Pressure,
            ScalarKind::SeaTemperature => Domain::SeaTemperature,
        }
    }

    pub fn from_domain(domain: Domain) -> Option<Self> {
        match domain {
            Domain::Pressure => Some(ScalarKind::Pressure),
            Domain::SeaTemperature => Some(ScalarKind::SeaTemperature),
            _ => None,
        }
    }

    /// Physical value of a decoded raw sample.
    pub fn scale(self, raw: f64) -> f64 {
        match self {
            ScalarKind::Pressure => raw * 0.01 + 1000.0,
            ScalarKind::SeaTemperature => raw * 0.001 + 15.0,
        }
    }

    /// Fractional `(row, col)` grid position of a geographic point.
    ///
    /// Bin centers sit half a bin in from the north edge; the pressure
    /// grid's first column is centered at 1.5°E, the temperature grid's at
    /// 0.5°E.
    pub fn grid_coords(self, lat: f64, lon: f64) -> (f64, f64) {
        match self {
            ScalarKind::Pressure => ((-lat + 90.0) / 2.0 - 0.5, positive_degrees(lon - 1.5) / 2.0),
            ScalarKind::SeaTemperature => ((-lat + 90.0) - 0.5, positive_degrees(lon - 0.5)),
        }
    }

    /// Geographic center `(lat, lon)` of a grid cell.
    pub fn cell_center(self, row: usize, col: usize) -> (f64, f64) {
        match self {
            ScalarKind::Pressure => (90.0 - 2.0 * (row as f64 + 0.5), 2.0 * col as f64 + 1.5),
            ScalarKind::SeaTemperature => (89.5 - row as f64, col as f64 + 0.5),
        }
    }
}

/// A decoded `[13][rows][cols]` grid.
#[derive(Debug, Clone)]
pub struct ScalarGrid {
    kind: ScalarKind,
    data: Vec<i16>,
}

impl ScalarGrid {
    /// Wrap raw samples in month-major, row-major order.
    pub fn from_raw(kind: ScalarKind, data: Vec<i16>) -> GridResult<Self> {
        let [months, rows, cols] = kind.shape();
        let expected = months * rows * cols;
        if data.len() != expected {
            return Err(GridStoreError::shape(format!(
                "{:?} grid has {} samples, expected {}x{}x{} = {}",
                kind,
                data.len(),
                months,
                rows,
                cols,
                expected
            )));
        }
        Ok(Self { kind, data })
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn rows(&self) -> usize {
        self.kind.shape()[1]
    }

    pub fn cols(&self) -> usize {
        self.kind.shape()[2]
    }

    /// Raw samples of one month slot.
    pub fn month_slice(&self, month: Month) -> &[i16] {
        let plane = self.rows() * self.cols();
        let start = month.index() * plane;
        &self.data[start..start + plane]
    }

    /// Decoded raw sample: NaN for the sentinel, unscaled otherwise.
    pub fn raw_sample(&self, month: Month, row: usize, col: usize) -> f64 {
        decode_sample(self.month_slice(month)[row * self.cols() + col])
    }

    /// Scaled sample at a grid cell.
    pub fn sample(&self, month: Month, row: usize, col: usize) -> f64 {
        self.kind.scale(self.raw_sample(month, row, col))
    }

    /// Interpolated physical value at a geographic point.
    pub fn value(&self, month: Month, lat: f64, lon: f64) -> f64 {
        let (x, y) = self.kind.grid_coords(lat, lon);
        let plane = MonthPlane {
            grid: self,
            month,
        };
        self.kind.scale(bilinear_cyclic(&plane, x, y))
    }
}

/// Turn the sentinel into NaN at the decode boundary.
pub fn decode_sample(raw: i16) -> f64 {
    if raw == NO_DATA {
        f64::NAN
    } else {
        raw as f64
    }
}

struct MonthPlane<'a> {
    grid: &'a ScalarGrid,
    month: Month,
}

impl CyclicGrid for MonthPlane<'_> {
    fn rows(&self) -> usize {
        self.grid.rows()
    }

    fn cols(&self) -> usize {
        self.grid.cols()
    }

    fn sample(&self, row: usize, col: usize) -> f64 {
        self.grid.raw_sample(self.month, row, col)
    }
}
