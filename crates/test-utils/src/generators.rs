//! Test data generators for synthetic climatology files.
//!
//! The generators produce bytes and text in the exact on-disk layouts the
//! decoders read, so tests can build small files without shipping real
//! datasets.

use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

/// Creates a grid whose value grows linearly with the column index.
pub fn create_column_ramp(width: usize, height: usize, step: f64) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for _ in 0..height {
        for col in 0..width {
            data.push(col as f64 * step);
        }
    }
    data
}

/// Creates a grid with a single peak in the middle, falling off radially.
pub fn create_peak_grid(width: usize, height: usize, peak: f64) -> Vec<f64> {
    let cx = (width as f64 - 1.0) / 2.0;
    let cy = (height as f64 - 1.0) / 2.0;
    let radius = cx.max(cy).max(1.0);
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let d = ((col as f64 - cx).powi(2) + (row as f64 - cy).powi(2)).sqrt();
            data.push(peak * (1.0 - d / radius).max(0.0));
        }
    }
    data
}

/// Raw raster of a scalar grid: `months * rows * cols` samples, each
/// month filled with `value`.
pub fn create_scalar_raw(months: usize, rows: usize, cols: usize, value: i16) -> Vec<i16> {
    vec![value; months * rows * cols]
}

/// Write a scalar climatology file: `time`, `lat` and `lon` coordinate
/// variables plus an `i16` `data` variable of `shape`.
pub fn write_scalar_netcdf(path: &Path, shape: [usize; 3], raw: &[i16]) -> Result<(), netcdf::Error> {
    let [months, rows, cols] = shape;
    let mut file = netcdf::create(path)?;
    file.add_dimension("time", months)?;
    file.add_dimension("lat", rows)?;
    file.add_dimension("lon", cols)?;

    let axes: [(&str, usize, f32, f32); 3] = [
        ("time", months, 1.0, 1.0),
        ("lat", rows, 90.0, -180.0 / rows as f32),
        ("lon", cols, 0.0, 360.0 / cols as f32),
    ];
    for (name, len, start, step) in axes {
        let values: Vec<f32> = (0..len).map(|i| start + step * i as f32).collect();
        let mut var = file.add_variable::<f32>(name, &[name])?;
        var.put_values(&values, ..)?;
    }

    let mut data = file.add_variable::<i16>("data", &["time", "lat", "lon"])?;
    data.put_values(raw, ..)?;
    Ok(())
}

/// One wind cell as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWindCell {
    pub storm: u8,
    pub calm: u8,
    pub directions: Vec<u8>,
    pub speeds: Vec<u8>,
}

impl RawWindCell {
    /// Cell with the same count and speed sum in every direction.
    pub fn uniform(dir_count: usize, count: u8, speed_sum: u8) -> Self {
        Self {
            storm: 0,
            calm: 0,
            directions: vec![count; dir_count],
            speeds: vec![speed_sum; dir_count],
        }
    }
}

/// Encode a wind file, `None` cells written as the 255 storm sentinel.
pub fn encode_wind_file(
    latitudes: u16,
    longitudes: u16,
    dir_count: u16,
    cells: &[Option<RawWindCell>],
) -> Vec<u8> {
    let mut out = Vec::new();
    for v in [latitudes, longitudes, dir_count] {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for cell in cells {
        match cell {
            None => out.push(255),
            Some(c) => {
                out.push(c.storm);
                out.push(c.calm);
                out.extend_from_slice(&c.directions);
                out.extend_from_slice(&c.speeds);
            }
        }
    }
    out
}

/// Wind file where every cell averages `speed_sum / count` m/s.
pub fn uniform_wind_file(latitudes: u16, longitudes: u16, dir_count: u16, count: u8, speed_sum: u8) -> Vec<u8> {
    let cell = RawWindCell::uniform(dir_count as usize, count, speed_sum);
    let cells = vec![Some(cell); latitudes as usize * longitudes as usize];
    encode_wind_file(latitudes, longitudes, dir_count, &cells)
}

/// Gzip-compress bytes.
pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("Failed to write gzip stream");
    encoder.finish().expect("Failed to finish gzip stream")
}

// ============================================================================
// Fixed-column best track lines
// ============================================================================

/// One 17-column observation: phase, latitude and west longitude in
/// degrees (written in tenths), wind in knots, pressure in hPa.
pub fn best_track_observation(phase: char, lat: f64, lon_west: f64, wind: u32, pressure: u32) -> String {
    format!(
        "{}{:03}{:04} {:>3} {:>4}",
        phase,
        (lat.abs() * 10.0).round() as u32,
        (lon_west * 10.0).round() as u32,
        wind,
        pressure
    )
}

/// An observation slot with zero coordinates, dropped on decode.
pub fn best_track_empty_observation() -> String {
    best_track_observation(' ', 0.0, 0.0, 0, 0)
}

/// Storm header line declaring `days` daily lines.
pub fn best_track_header(seq: u32, month: u32, day: u32, year: i32, days: u32, name: &str) -> String {
    format!(
        "{:05} {:02}/{:02}/{:04} M={:2}  1 SNBR=   1 {:<11}XING=0",
        seq, month, day, year, days, name
    )
}

/// Daily line with four observations at 00, 06, 12 and 18 UTC.
pub fn best_track_day(seq: u32, month: u32, day: u32, observations: [&str; 4]) -> String {
    format!("{:05} {:02}/{:02}{}", seq, month, day, observations.concat())
}

/// Trailer line carrying the storm class (`HR`, `TS`, `SS`, ...).
pub fn best_track_trailer(seq: u32, class: &str) -> String {
    format!("{:05} {}", seq, class)
}

// ============================================================================
// Storm log lines
// ============================================================================

/// The three lines opening a storm log track.
pub fn storm_log_header(name: &str, year: i32) -> [String; 3] {
    [
        format!("Date: 01-31 DEC {}", year),
        format!("Tropical Cyclone {}", name),
        "ADV  LAT    LON      TIME     WIND  PR  STAT".to_string(),
    ]
}

/// One storm log observation line.
#[allow(clippy::too_many_arguments)]
pub fn storm_log_observation(
    adv: u32,
    lat: f64,
    lon: f64,
    month: u32,
    day: u32,
    hour: u32,
    wind: u32,
    pressure: u32,
    status: &str,
) -> String {
    format!(
        "{:>3} {:>7.2} {:>8.2} {:02}/{:02}/{:02}Z {:>5} {:>5}  {}",
        adv, lat, lon, month, day, hour, wind, pressure, status
    )
}
