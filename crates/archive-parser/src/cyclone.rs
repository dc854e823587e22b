//! Cyclone track model shared by both archive formats.

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use crate::basin::Basin;
use crate::error::ArchiveError;

/// Storm phase at one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StormPhase {
    Tropical,
    Subtropical,
    Extratropical,
    Wave,
    Remnant,
    Unknown,
}

impl StormPhase {
    pub const ALL: [StormPhase; 6] = [
        StormPhase::Tropical,
        StormPhase::Subtropical,
        StormPhase::Extratropical,
        StormPhase::Wave,
        StormPhase::Remnant,
        StormPhase::Unknown,
    ];

    /// Phase from the single-character code of the fixed-column format.
    pub fn from_code(code: char) -> Self {
        match code {
            '*' => StormPhase::Tropical,
            'S' => StormPhase::Subtropical,
            'E' => StormPhase::Extratropical,
            'W' => StormPhase::Wave,
            'L' => StormPhase::Remnant,
            _ => StormPhase::Unknown,
        }
    }
}

/// Storm classification from the track trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackCategory {
    Hurricane,
    TropicalCyclone,
    SubtropicalCyclone,
    Unknown,
}

impl TrackCategory {
    /// Category from the two-letter trailer code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "HR" => TrackCategory::Hurricane,
            "TS" => TrackCategory::TropicalCyclone,
            "SS" => TrackCategory::SubtropicalCyclone,
            _ => TrackCategory::Unknown,
        }
    }
}

/// One six-hourly fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycloneObservation {
    pub time: NaiveDateTime,
    /// Degrees, north positive.
    pub lat: f64,
    /// Degrees, east positive.
    pub lon: f64,
    /// Maximum sustained wind in knots.
    pub wind_knots: f64,
    /// Central pressure in hPa; zero or NaN when not recorded.
    pub pressure: f64,
    pub phase: StormPhase,
}

impl CycloneObservation {
    pub fn year(&self) -> i32 {
        self.time.year()
    }

    /// Calendar month `1..=12`.
    pub fn month(&self) -> u32 {
        self.time.month()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycloneTrack {
    pub basin: Basin,
    pub category: TrackCategory,
    pub observations: Vec<CycloneObservation>,
}

impl CycloneTrack {
    pub fn new(basin: Basin, category: TrackCategory) -> Self {
        Self {
            basin,
            category,
            observations: Vec::new(),
        }
    }

    pub fn peak_wind(&self) -> f64 {
        self.observations
            .iter()
            .map(|o| o.wind_knots)
            .fold(0.0, f64::max)
    }

    pub fn first_time(&self) -> Option<NaiveDateTime> {
        self.observations.first().map(|o| o.time)
    }
}

/// Result of decoding one archive.
///
/// Decoding stops at the first structural error; the tracks completed
/// before it are kept and the error is reported alongside them.
#[derive(Debug, Default)]
pub struct ArchiveDecode {
    pub tracks: Vec<CycloneTrack>,
    pub failure: Option<ArchiveError>,
}

impl ArchiveDecode {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_phase_codes() {
        assert_eq!(StormPhase::from_code('*'), StormPhase::Tropical);
        assert_eq!(StormPhase::from_code('L'), StormPhase::Remnant);
        assert_eq!(StormPhase::from_code(' '), StormPhase::Unknown);
    }

    #[test]
    fn test_category_codes() {
        assert_eq!(TrackCategory::from_code("HR"), TrackCategory::Hurricane);
        assert_eq!(TrackCategory::from_code("SS"), TrackCategory::SubtropicalCyclone);
        assert_eq!(TrackCategory::from_code("XX"), TrackCategory::Unknown);
    }

    #[test]
    fn test_peak_wind() {
        let time = NaiveDate::from_ymd_opt(2000, 9, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let mut track = CycloneTrack::new(Basin::Atlantic, TrackCategory::Hurricane);
        for wind in [40.0, 85.0, 60.0] {
            track.observations.push(CycloneObservation {
                time,
                lat: 20.0,
                lon: -60.0,
                wind_knots: wind,
                pressure: 990.0,
                phase: StormPhase::Tropical,
            });
        }
        assert_eq!(track.peak_wind(), 85.0);
        assert_eq!(track.observations[0].month(), 9);
    }
}
