//! Monthly wind-rose fields.
//!
//! A wind file starts with three little-endian `u16` values (latitude bins,
//! longitude bins, direction bins) followed by one record per cell, latitude
//! outer and longitude inner:
//!
//! ```text
//! storm: u8            255 = no observations, record ends here
//! calm: u8
//! directions: [u8; dir_count]   occurrence count per direction
//! speeds: [u8; dir_count]       speed sum per direction
//! ```
//!
//! Files are usually gzip-compressed; compression is detected from the
//! stream's magic bytes.

use std::io::Read;
use std::path::Path;

use bytes::Buf;
use clim_common::positive_degrees;

use crate::error::{GridResult, GridStoreError};
use crate::interpolation::{bilinear_cyclic, CyclicGrid};

/// Storm byte value marking a cell without observations.
pub const ABSENT_CELL: u8 = 255;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const HEADER_LEN: usize = 6;

/// Wind statistics of one grid cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindCell {
    /// Storm frequency, percent.
    pub storm: u8,
    /// Calm frequency, percent.
    pub calm: u8,
    /// Occurrence count per direction bin, clockwise from north.
    pub directions: Vec<u8>,
    /// Speed sum per direction bin, m/s.
    pub speeds: Vec<u8>,
}

impl WindCell {
    pub fn total_observations(&self) -> u32 {
        self.directions.iter().map(|&d| d as u32).sum()
    }

    /// Count-weighted mean speed over all directions; zero without
    /// observations.
    pub fn average_speed(&self) -> f64 {
        let count = self.total_observations();
        if count == 0 {
            return 0.0;
        }
        let sum: u32 = self.speeds.iter().map(|&s| s as u32).sum();
        sum as f64 / count as f64
    }

    /// Mean speed of one direction bin.
    pub fn direction_average_speed(&self, dir: usize) -> f64 {
        match (self.directions.get(dir), self.speeds.get(dir)) {
            (Some(&count), Some(&sum)) if count > 0 => sum as f64 / count as f64,
            _ => 0.0,
        }
    }

    /// Share of observations coming from one direction bin.
    pub fn direction_fraction(&self, dir: usize) -> f64 {
        let total = self.total_observations();
        match self.directions.get(dir) {
            Some(&count) if total > 0 => count as f64 / total as f64,
            _ => 0.0,
        }
    }
}

/// One month of wind statistics.
#[derive(Debug, Clone)]
pub struct WindField {
    latitudes: usize,
    longitudes: usize,
    dir_count: usize,
    cells: Vec<Option<WindCell>>,
}

impl WindField {
    /// Build a field from already decoded cells, latitude-major.
    pub fn new(
        latitudes: usize,
        longitudes: usize,
        dir_count: usize,
        cells: Vec<Option<WindCell>>,
    ) -> GridResult<Self> {
        if cells.len() != latitudes * longitudes {
            return Err(GridStoreError::shape(format!(
                "wind field has {} cells, expected {}x{}",
                cells.len(),
                latitudes,
                longitudes
            )));
        }
        if let Some(bad) = cells
            .iter()
            .flatten()
            .find(|c| c.directions.len() != dir_count || c.speeds.len() != dir_count)
        {
            return Err(GridStoreError::shape(format!(
                "wind cell has {} direction bins, expected {}",
                bad.directions.len(),
                dir_count
            )));
        }
        Ok(Self {
            latitudes,
            longitudes,
            dir_count,
            cells,
        })
    }

    /// Decode an uncompressed wind stream.
    pub fn decode(mut buf: &[u8]) -> GridResult<Self> {
        if buf.remaining() < HEADER_LEN {
            return Err(GridStoreError::Truncated {
                needed: HEADER_LEN - buf.remaining(),
                context: "wind header".to_string(),
            });
        }
        let latitudes = buf.get_u16_le() as usize;
        let longitudes = buf.get_u16_le() as usize;
        let dir_count = buf.get_u16_le() as usize;

        let mut cells = Vec::with_capacity(latitudes * longitudes);
        for lat in 0..latitudes {
            for lon in 0..longitudes {
                cells.push(decode_cell(&mut buf, dir_count, lat, lon)?);
            }
        }

        if buf.has_remaining() {
            tracing::debug!(trailing = buf.remaining(), "Ignoring trailing bytes in wind file");
        }

        Self::new(latitudes, longitudes, dir_count, cells)
    }

    /// Decode a wind stream, inflating it first when it is gzip-compressed.
    pub fn decode_maybe_gzip(data: &[u8]) -> GridResult<Self> {
        if data.starts_with(&GZIP_MAGIC) {
            let inflated = decompress_gzip(data)?;
            Self::decode(&inflated)
        } else {
            Self::decode(data)
        }
    }

    /// Read and decode a wind file.
    pub fn read(path: &Path) -> GridResult<Self> {
        let data = std::fs::read(path).map_err(|e| GridStoreError::open(path, e))?;
        Self::decode_maybe_gzip(&data)
    }

    pub fn latitudes(&self) -> usize {
        self.latitudes
    }

    pub fn longitudes(&self) -> usize {
        self.longitudes
    }

    pub fn dir_count(&self) -> usize {
        self.dir_count
    }

    /// Cell spacing in degrees of longitude.
    pub fn lon_step(&self) -> f64 {
        360.0 / self.longitudes.max(1) as f64
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&WindCell> {
        if row >= self.latitudes || col >= self.longitudes {
            return None;
        }
        self.cells[row * self.longitudes + col].as_ref()
    }

    /// Fractional `(row, col)` position of a geographic point.
    pub fn grid_coords(&self, lat: f64, lon: f64) -> (f64, f64) {
        let x = self.latitudes as f64 * (0.5 + (lat - 0.25) / 180.0);
        let y = self.longitudes as f64 * positive_degrees(lon) / 360.0;
        (x, y)
    }

    /// Nearest cell to a geographic point, `None` when it holds no data.
    pub fn cell_at(&self, lat: f64, lon: f64) -> Option<&WindCell> {
        if self.latitudes == 0 || self.longitudes == 0 || !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let (x, y) = self.grid_coords(lat, lon);
        let row = (x.round().max(0.0) as usize).min(self.latitudes - 1);
        let col = (y.round() as usize) % self.longitudes;
        self.cell(row, col)
    }

    /// Interpolated mean wind speed in m/s; NaN near cells without data.
    pub fn interpolate_speed(&self, lat: f64, lon: f64) -> f64 {
        let (x, y) = self.grid_coords(lat, lon);
        bilinear_cyclic(self, x, y)
    }
}

impl CyclicGrid for WindField {
    fn rows(&self) -> usize {
        self.latitudes
    }

    fn cols(&self) -> usize {
        self.longitudes
    }

    fn sample(&self, row: usize, col: usize) -> f64 {
        self.cell(row, col)
            .map(WindCell::average_speed)
            .unwrap_or(f64::NAN)
    }
}

fn decode_cell(buf: &mut &[u8], dir_count: usize, lat: usize, lon: usize) -> GridResult<Option<WindCell>> {
    let truncated = |needed: usize| GridStoreError::Truncated {
        needed,
        context: format!("wind cell ({}, {})", lat, lon),
    };

    if !buf.has_remaining() {
        return Err(truncated(1));
    }
    let storm = buf.get_u8();
    if storm == ABSENT_CELL {
        return Ok(None);
    }

    let body = 1 + 2 * dir_count;
    if buf.remaining() < body {
        return Err(truncated(body - buf.remaining()));
    }
    let calm = buf.get_u8();
    let mut directions = vec![0u8; dir_count];
    buf.copy_to_slice(&mut directions);
    let mut speeds = vec![0u8; dir_count];
    buf.copy_to_slice(&mut speeds);

    Ok(Some(WindCell {
        storm,
        calm,
        directions,
        speeds,
    }))
}

/// Inflate a gzip stream.
pub fn decompress_gzip(data: &[u8]) -> GridResult<Vec<u8>> {
    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| GridStoreError::Decompression(e.to_string()))?;
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn header(lat: u16, lon: u16, dirs: u16) -> Vec<u8> {
        let mut out = Vec::new();
        for v in [lat, lon, dirs] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_decode_single_cell() {
        let mut data = header(1, 1, 2);
        data.extend_from_slice(&[3, 10, 4, 6, 20, 30]);
        let field = WindField::decode(&data).unwrap();

        let cell = field.cell(0, 0).unwrap();
        assert_eq!(cell.storm, 3);
        assert_eq!(cell.calm, 10);
        assert_eq!(cell.directions, vec![4, 6]);
        assert_eq!(cell.speeds, vec![20, 30]);
        assert!((cell.average_speed() - 5.0).abs() < 1e-12);
        assert!((cell.direction_average_speed(0) - 5.0).abs() < 1e-12);
        assert!((cell.direction_fraction(1) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_absent_cell_sentinel() {
        let mut data = header(1, 2, 1);
        data.push(ABSENT_CELL);
        data.extend_from_slice(&[0, 0, 2, 8]);
        let field = WindField::decode(&data).unwrap();
        assert!(field.cell(0, 0).is_none());
        assert!(field.cell(0, 1).is_some());
    }

    #[test]
    fn test_zero_observations_average_to_zero() {
        let cell = WindCell {
            storm: 0,
            calm: 100,
            directions: vec![0; 8],
            speeds: vec![0; 8],
        };
        assert_eq!(cell.average_speed(), 0.0);
        assert_eq!(cell.direction_fraction(3), 0.0);
    }

    #[test]
    fn test_truncated_stream() {
        let mut data = header(1, 1, 4);
        data.extend_from_slice(&[1, 2, 3]);
        let err = WindField::decode(&data).unwrap_err();
        assert!(matches!(err, GridStoreError::Truncated { .. }));

        let err = WindField::decode(&[1, 0]).unwrap_err();
        assert!(matches!(err, GridStoreError::Truncated { needed: 4, .. }));
    }

    #[test]
    fn test_gzip_is_sniffed() {
        let mut raw = header(1, 1, 1);
        raw.extend_from_slice(&[0, 0, 1, 7]);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&raw).unwrap();
        let compressed = encoder.finish().unwrap();

        let field = WindField::decode_maybe_gzip(&compressed).unwrap();
        assert_eq!(field.cell(0, 0).unwrap().average_speed(), 7.0);
        let plain = WindField::decode_maybe_gzip(&raw).unwrap();
        assert_eq!(plain.dir_count(), 1);
    }
}
