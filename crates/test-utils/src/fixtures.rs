//! Common test fixtures for climatology overlay tests.
//!
//! Pre-built archive texts and a helper that lays out a complete data
//! directory in a temporary location.

use std::path::Path;

use crate::generators::{
    best_track_day, best_track_empty_observation, best_track_header, best_track_observation,
    best_track_trailer, gzip_bytes, storm_log_header, storm_log_observation, uniform_wind_file,
};

/// Common bounding box definitions for testing, `(min_lon, min_lat, max_lon, max_lat)`.
pub mod bbox {
    /// Whole globe in 0..360 longitudes
    pub const GLOBAL: (f64, f64, f64, f64) = (0.0, -90.0, 360.0, 90.0);

    /// North Atlantic hurricane region
    pub const ATLANTIC: (f64, f64, f64, f64) = (-100.0, 5.0, -10.0, 50.0);

    /// Crosses the antimeridian
    pub const PACIFIC: (f64, f64, f64, f64) = (160.0, -50.0, -140.0, 50.0);

    /// A small chart extent
    pub const SMALL: (f64, f64, f64, f64) = (-10.0, 40.0, -5.0, 45.0);
}

/// El Niño index table: a header, then a year and twelve monthly values.
pub const ELNINO_SAMPLE: &str = "\
YEAR  JAN   FEB   MAR   APR   MAY   JUN   JUL   AUG   SEP   OCT   NOV   DEC
1997  -0.5  -0.4  -0.2   0.1   0.6   1.0   1.2   1.5   1.8   2.1   2.3   2.3
1998   2.2   1.9   1.5   1.0   0.5  -0.1  -0.7  -1.0  -1.2  -1.2  -1.4  -1.5
1999  -1.5  -1.3  -1.1  -1.0  -1.0  -1.0  -1.1  -1.1  -1.2  -1.4  -1.6  -1.7
2000  -1.7  -1.4  -1.1  -0.8  -0.7  -0.6  -0.6  -0.5  -0.5  -0.6  -0.7
";

/// A fixed-column best track archive with two storms.
///
/// The first storm (year 1992, hurricane) has two daily lines with one
/// dropped slot; the second (1993, tropical storm) has one daily line.
pub fn best_track_sample() -> String {
    let empty = best_track_empty_observation();
    let lines = vec![
        best_track_header(1, 8, 22, 1992, 2, "ANDREW"),
        best_track_day(
            2,
            8,
            22,
            [
                &best_track_observation('*', 25.0, 70.0, 90, 985),
                &best_track_observation('*', 25.2, 71.0, 100, 975),
                &best_track_observation('*', 25.4, 72.5, 120, 955),
                &best_track_observation('*', 25.5, 74.0, 130, 940),
            ],
        ),
        best_track_day(
            3,
            8,
            23,
            [
                &best_track_observation('*', 25.6, 75.5, 140, 930),
                &best_track_observation('E', 25.8, 77.0, 110, 960),
                &best_track_observation('L', 26.0, 78.5, 40, 1000),
                &empty,
            ],
        ),
        best_track_trailer(4, "HR"),
        best_track_header(5, 9, 1, 1993, 1, "BRET"),
        best_track_day(
            6,
            9,
            1,
            [
                &best_track_observation('S', 12.0, 40.0, 35, 1008),
                &best_track_observation('W', 12.5, 41.0, 30, 1009),
                &empty,
                &empty,
            ],
        ),
        best_track_trailer(7, "TS"),
    ];
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// A storm log archive with two tracks; the second crosses December into
/// January.
pub fn storm_log_sample() -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.extend(storm_log_header("ALAN", 1997));
    lines.push(storm_log_observation(1, -14.0, 170.0, 11, 20, 0, 35, 995, "TROPICAL STORM"));
    lines.push(storm_log_observation(2, -15.0, 171.0, 11, 20, 12, 25, 1000, "TROPICAL DEPRESSION"));
    lines.extend(storm_log_header("BART", 1998));
    lines.push(storm_log_observation(1, -16.0, 175.0, 12, 31, 18, 45, 990, "TROPICAL STORM"));
    lines.push(storm_log_observation(2, -17.0, 176.5, 1, 1, 6, 55, 982, "CYCLONE-1"));
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Write a data directory with all thirteen wind months, the El Niño table
/// and one archive of each format. Scalar grids are not written.
pub fn write_data_dir(dir: &Path) -> std::io::Result<()> {
    // 18 x 36 cells of 10° each, 8 directions, 5 m/s everywhere
    let wind = gzip_bytes(&uniform_wind_file(18, 36, 8, 2, 10));
    for month in 1..=13 {
        std::fs::write(dir.join(format!("wind{:02}.gz", month)), &wind)?;
    }
    std::fs::write(dir.join("elnino_years.txt"), ELNINO_SAMPLE)?;
    std::fs::write(dir.join("tracks.atl"), best_track_sample())?;
    std::fs::write(dir.join("tracks.spa.dat"), storm_log_sample())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_track_sample_line_count() {
        assert_eq!(best_track_sample().lines().count(), 7);
    }

    #[test]
    fn test_storm_log_sample_has_two_tracks() {
        let text = storm_log_sample();
        assert_eq!(text.lines().filter(|l| l.starts_with("Date")).count(), 2);
    }

    #[test]
    fn test_write_data_dir() {
        let dir = crate::temp_test_dir();
        write_data_dir(dir.path()).unwrap();
        assert!(dir.path().join("wind13.gz").exists());
        assert!(dir.path().join("tracks.spa.dat").exists());
    }
}
