//! Bilinear interpolation on grids whose columns wrap around the globe.
//!
//! Rows run along latitude and never wrap; rows outside the grid are
//! clamped to the first or last row. Columns run along longitude and wrap
//! modulo the column count.
//!
//! Missing samples are NaN and are not skipped: any NaN corner makes the
//! interpolated result NaN, even when its weight is zero.

/// A grid that can be sampled by `(row, column)`.
pub trait CyclicGrid {
    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
    /// Decoded sample, NaN when missing. Indices are always in range.
    fn sample(&self, row: usize, col: usize) -> f64;
}

/// Value at `x` on the segment `(x1, y1)..(x2, y2)`.
///
/// A zero-length segment yields `y1`.
pub fn interp_value(x: f64, x1: f64, x2: f64, y1: f64, y2: f64) -> f64 {
    if x2 - x1 != 0.0 {
        (y2 - y1) * (x - x1) / (x2 - x1) + y1
    } else {
        y1
    }
}

/// Bilinear interpolation at fractional grid position `(x, y)`.
///
/// `x` is the row coordinate, `y` the column coordinate.
pub fn bilinear_cyclic<G: CyclicGrid + ?Sized>(grid: &G, x: f64, y: f64) -> f64 {
    let rows = grid.rows();
    let cols = grid.cols();
    if rows == 0 || cols == 0 || !x.is_finite() || !y.is_finite() {
        return f64::NAN;
    }

    let x = x.clamp(0.0, (rows - 1) as f64);
    let y = y.rem_euclid(cols as f64);

    let x0 = x.floor() as usize;
    let x1 = (x0 + 1).min(rows - 1);
    // rem_euclid may round up to exactly `cols`
    let y0 = (y.floor() as usize).min(cols - 1);
    let y1 = (y0 + 1) % cols;

    let v00 = grid.sample(x0, y0);
    let v01 = grid.sample(x0, y1);
    let v10 = grid.sample(x1, y0);
    let v11 = grid.sample(x1, y1);

    let (xf, yf) = (x0 as f64, y0 as f64);
    let v0 = interp_value(y, yf, yf + 1.0, v00, v01);
    let v1 = interp_value(y, yf, yf + 1.0, v10, v11);
    interp_value(x, xf, xf + 1.0, v0, v1)
}
