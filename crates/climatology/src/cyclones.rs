//! Cyclone track filtering and segment generation.
//!
//! Observations are tested one by one. A rejected observation is simply
//! skipped: the next accepted one connects to the last accepted one of the
//! same track.

use std::collections::BTreeSet;

use archive_parser::{Basin, CycloneObservation, CycloneTrack, ElNinoIndex, ElNinoPhase, StormPhase};
use chrono::NaiveDateTime;
use clim_common::{GeoTransform, Month, Rgb, Viewport};
use serde::Serialize;
use tracing::debug;

/// Wind speed, in knots, at which a track reaches full intensity.
const FULL_INTENSITY_KNOTS: f64 = 150.0;

/// Which storm phases are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseToggles {
    pub tropical: bool,
    pub subtropical: bool,
    pub extratropical: bool,
    pub wave: bool,
    pub remnant: bool,
    pub unknown: bool,
}

impl Default for PhaseToggles {
    fn default() -> Self {
        Self {
            tropical: true,
            subtropical: true,
            extratropical: true,
            wave: false,
            remnant: true,
            unknown: false,
        }
    }
}

impl PhaseToggles {
    pub fn all() -> Self {
        Self {
            tropical: true,
            subtropical: true,
            extratropical: true,
            wave: true,
            remnant: true,
            unknown: true,
        }
    }

    pub fn allows(&self, phase: StormPhase) -> bool {
        match phase {
            StormPhase::Tropical => self.tropical,
            StormPhase::Subtropical => self.subtropical,
            StormPhase::Extratropical => self.extratropical,
            StormPhase::Wave => self.wave,
            StormPhase::Remnant => self.remnant,
            StormPhase::Unknown => self.unknown,
        }
    }
}

/// Which El Niño phases are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElNinoToggles {
    pub el_nino: bool,
    pub la_nina: bool,
    pub neutral: bool,
    pub not_available: bool,
}

impl Default for ElNinoToggles {
    fn default() -> Self {
        Self {
            el_nino: true,
            la_nina: true,
            neutral: true,
            not_available: true,
        }
    }
}

impl ElNinoToggles {
    pub fn allows(&self, phase: ElNinoPhase) -> bool {
        match phase {
            ElNinoPhase::ElNino => self.el_nino,
            ElNinoPhase::LaNina => self.la_nina,
            ElNinoPhase::Neutral => self.neutral,
            ElNinoPhase::NotAvailable => self.not_available,
        }
    }
}

/// Selection of cyclone observations to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct CycloneFilter {
    /// Calendar month to keep; [`Month::ANNUAL`] keeps every month.
    pub month: Month,
    /// Inclusive lower time bound.
    pub start: Option<NaiveDateTime>,
    /// Inclusive upper time bound.
    pub end: Option<NaiveDateTime>,
    pub el_nino: ElNinoToggles,
    pub phases: PhaseToggles,
    /// Knots.
    pub min_wind: f64,
    /// hPa, compared against the recorded value.
    pub max_pressure: f64,
    /// Basins to draw.
    pub basins: BTreeSet<Basin>,
}

impl Default for CycloneFilter {
    fn default() -> Self {
        Self {
            month: Month::ANNUAL,
            start: None,
            end: None,
            el_nino: ElNinoToggles::default(),
            phases: PhaseToggles::default(),
            min_wind: 0.0,
            max_pressure: 2000.0,
            basins: Basin::ALL.into_iter().collect(),
        }
    }
}

impl CycloneFilter {
    /// Whether one observation passes every test.
    ///
    /// Without an El Niño index every observation counts as not available.
    pub fn accepts(&self, obs: &CycloneObservation, el_nino: Option<&ElNinoIndex>) -> bool {
        if let Some(month) = self.month.calendar() {
            if obs.month() != month {
                return false;
            }
        }
        if self.start.is_some_and(|start| obs.time < start) {
            return false;
        }
        if self.end.is_some_and(|end| obs.time > end) {
            return false;
        }

        let phase = el_nino
            .map(|index| index.classify(obs.year(), obs.month()))
            .unwrap_or(ElNinoPhase::NotAvailable);
        if !self.el_nino.allows(phase) {
            return false;
        }

        if !self.phases.allows(obs.phase) {
            return false;
        }

        obs.wind_knots >= self.min_wind && !(obs.pressure > self.max_pressure)
    }
}

/// A drawable piece of a track between two accepted observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSegment {
    pub basin: Basin,
    pub from_lat: f64,
    pub from_lon: f64,
    pub to_lat: f64,
    pub to_lon: f64,
    /// Pixel positions from the host transform.
    pub from_px: (f64, f64),
    pub to_px: (f64, f64),
    pub color: Rgb,
    /// Phase at the segment's end.
    pub phase: StormPhase,
    pub intensity: f64,
}

/// Color of a track at an observation: hue by phase, brightness by wind.
pub fn phase_color(phase: StormPhase, wind_knots: f64) -> (Rgb, f64) {
    let intensity = (wind_knots / FULL_INTENSITY_KNOTS).clamp(0.0, 1.0);
    let full = (intensity * 255.0).round() as u8;
    let half = (intensity * 127.5).round() as u8;
    let color = match phase {
        StormPhase::Tropical => Rgb::new(full, 0, 0),
        StormPhase::Subtropical => Rgb::new(half, half, 0),
        StormPhase::Extratropical => Rgb::new(0, full, 0),
        _ => Rgb::new(0, 0, full),
    };
    (color, intensity)
}

fn between_inclusive(value: f64, a: f64, b: f64) -> bool {
    value >= a.min(b) && value <= a.max(b)
}

/// Whether a segment from `last_lon` to `lon` would be drawn the long way
/// around a view centered at `center_lon`.
pub fn crosses_far_side(center_lon: f64, last_lon: f64, lon: f64) -> bool {
    between_inclusive(center_lon, last_lon + 180.0, lon + 180.0)
        || between_inclusive(center_lon, last_lon - 180.0, lon - 180.0)
}

/// Segments of the filtered tracks of the filter's basins.
pub fn cyclone_segments<'a, I>(
    tracks: I,
    filter: &CycloneFilter,
    el_nino: Option<&ElNinoIndex>,
    viewport: &Viewport,
    transform: &dyn GeoTransform,
) -> Vec<TrackSegment>
where
    I: IntoIterator<Item = &'a CycloneTrack>,
{
    let mut segments = Vec::new();
    let mut tracks_seen = 0usize;

    for track in tracks {
        if !filter.basins.contains(&track.basin) {
            continue;
        }
        tracks_seen += 1;

        let mut last: Option<&CycloneObservation> = None;
        for obs in &track.observations {
            if !filter.accepts(obs, el_nino) {
                continue;
            }
            if let Some(prev) = last {
                if !crosses_far_side(viewport.center_lon, prev.lon, obs.lon) {
                    let (color, intensity) = phase_color(obs.phase, obs.wind_knots);
                    segments.push(TrackSegment {
                        basin: track.basin,
                        from_lat: prev.lat,
                        from_lon: prev.lon,
                        to_lat: obs.lat,
                        to_lon: obs.lon,
                        from_px: transform.geo_to_pixel(prev.lat, prev.lon),
                        to_px: transform.geo_to_pixel(obs.lat, obs.lon),
                        color,
                        phase: obs.phase,
                        intensity,
                    });
                }
            }
            last = Some(obs);
        }
    }

    debug!(tracks = tracks_seen, segments = segments.len(), "Built cyclone segments");
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_colors() {
        assert_eq!(phase_color(StormPhase::Tropical, 150.0).0, Rgb::new(255, 0, 0));
        assert_eq!(phase_color(StormPhase::Tropical, 300.0).1, 1.0);
        assert_eq!(phase_color(StormPhase::Subtropical, 150.0).0, Rgb::new(128, 128, 0));
        assert_eq!(phase_color(StormPhase::Extratropical, 75.0).0, Rgb::new(0, 128, 0));
        assert_eq!(phase_color(StormPhase::Remnant, 0.0).0, Rgb::new(0, 0, 0));
        assert_eq!(phase_color(StormPhase::Wave, 150.0).0, Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_far_side() {
        // view centered on 0, segment hugging the antimeridian
        assert!(!crosses_far_side(0.0, 170.0, 175.0));
        // unwrapped track passing the antipode of the view center
        assert!(crosses_far_side(0.0, 170.0, 190.0));
        assert!(crosses_far_side(0.0, -175.0, -185.0));
        assert!(!crosses_far_side(180.0, 170.0, 190.0));
    }

    #[test]
    fn test_default_toggles() {
        let phases = PhaseToggles::default();
        assert!(phases.allows(StormPhase::Tropical));
        assert!(!phases.allows(StormPhase::Wave));
        assert!(!phases.allows(StormPhase::Unknown));
        assert!(PhaseToggles::all().allows(StormPhase::Unknown));
        assert!(ElNinoToggles::default().allows(ElNinoPhase::NotAvailable));
    }
}
