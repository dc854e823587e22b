//! Report builders behind each subcommand.
//!
//! Every command turns overlay queries into a serializable report; `main`
//! only prints them.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use archive_parser::{Basin, ElNinoPhase};
use chrono::{NaiveDate, NaiveDateTime};
use clim_common::{BoundingBox, Domain, EquirectangularTransform, Month, Viewport};
use climatology::{Availability, CycloneFilter, Overlay, WindRose};
use renderer::IsoLineSettings;
use serde::Serialize;
use tracing::info;

// ============================================================================
// Argument parsers
// ============================================================================

pub fn parse_domain(s: &str) -> Result<Domain, String> {
    Domain::from_name(s).ok_or_else(|| {
        let names: Vec<_> = Domain::ALL.iter().map(|d| d.name()).collect();
        format!("unknown domain '{}', expected one of {}", s, names.join(", "))
    })
}

pub fn parse_basin(s: &str) -> Result<Basin, String> {
    Basin::from_name(s).ok_or_else(|| {
        let names: Vec<_> = Basin::ALL.iter().map(|b| b.name()).collect();
        format!("unknown basin '{}', expected one of {}", s, names.join(", "))
    })
}

/// Month slot `0..=12`, or `annual`.
pub fn parse_month(s: &str) -> Result<Month, String> {
    if s.eq_ignore_ascii_case("annual") {
        return Ok(Month::ANNUAL);
    }
    s.parse::<usize>()
        .ok()
        .and_then(Month::new)
        .ok_or_else(|| format!("month slot must be 0..=12 or 'annual', got '{}'", s))
}

pub fn parse_bbox(s: &str) -> Result<BoundingBox, String> {
    BoundingBox::from_csv(s).map_err(|e| e.to_string())
}

pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", s, e))
}

fn start_of(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

fn end_of(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(23, 59, 59)
}

// ============================================================================
// Reports
// ============================================================================

#[derive(Debug, Serialize)]
pub struct Summary {
    pub data_dir: String,
    pub availability: Availability,
    pub tracks: BTreeMap<Basin, usize>,
    pub el_nino_years: usize,
}

pub fn summary(overlay: &Overlay) -> Summary {
    let availability = overlay.availability();
    let tracks = availability
        .cyclone_basins
        .iter()
        .map(|&b| (b, overlay.cyclone_tracks(b).len()))
        .collect();
    Summary {
        data_dir: overlay.config().data_dir.display().to_string(),
        el_nino_years: overlay.el_nino_index().map(|i| i.len()).unwrap_or(0),
        tracks,
        availability,
    }
}

#[derive(Debug, Serialize)]
pub struct ValueReport {
    pub domain: Domain,
    pub month: Month,
    pub lat: f64,
    pub lon: f64,
    /// `None` where the domain has no data.
    pub value: Option<f64>,
    pub units: &'static str,
    pub color: String,
}

pub fn value(overlay: &Overlay, domain: Domain, lat: f64, lon: f64) -> ValueReport {
    let v = overlay.value(domain, lat, lon);
    ValueReport {
        domain,
        month: overlay.month(),
        lat,
        lon,
        value: (!v.is_nan()).then_some(v),
        units: domain.units(),
        color: overlay.color(domain, v).to_string(),
    }
}

#[derive(Debug, Serialize)]
pub struct IsoLineSummary {
    pub value: f64,
    pub polylines: usize,
    pub closed: usize,
    pub points: usize,
}

pub fn isolines(overlay: &mut Overlay, domain: Domain, settings: &IsoLineSettings) -> Result<Vec<IsoLineSummary>> {
    let mut progress = |u: clim_common::ProgressUpdate<'_>| {
        tracing::debug!(step = u.step, total = u.total, "{}", u.message);
        std::ops::ControlFlow::Continue(())
    };
    let lines = overlay
        .isolines(domain, settings, &mut progress)
        .with_context(|| format!("building {} isolines", domain))?;

    Ok(lines
        .iter()
        .map(|line| IsoLineSummary {
            value: line.value,
            polylines: line.polylines.len(),
            closed: line.polylines.iter().filter(|p| p.closed).count(),
            points: line.point_count(),
        })
        .collect())
}

/// Options of the `tracks` subcommand.
#[derive(Debug, Clone, Default)]
pub struct TrackQuery {
    pub basins: Vec<Basin>,
    pub month: Option<Month>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub min_wind: Option<f64>,
    pub max_pressure: Option<f64>,
    pub all_phases: bool,
}

impl TrackQuery {
    pub fn filter(&self) -> CycloneFilter {
        let mut filter = CycloneFilter::default();
        if !self.basins.is_empty() {
            filter.basins = self.basins.iter().copied().collect();
        }
        if let Some(month) = self.month {
            filter.month = month;
        }
        filter.start = self.start.and_then(start_of);
        filter.end = self.end.and_then(end_of);
        if let Some(min_wind) = self.min_wind {
            filter.min_wind = min_wind;
        }
        if let Some(max_pressure) = self.max_pressure {
            filter.max_pressure = max_pressure;
        }
        if self.all_phases {
            filter.phases = climatology::PhaseToggles::all();
        }
        filter
    }
}

#[derive(Debug, Serialize)]
pub struct TrackReport {
    pub segments: usize,
    pub by_basin: BTreeMap<Basin, usize>,
    pub peak_intensity: f64,
}

pub fn tracks(overlay: &Overlay, query: &TrackQuery, viewport: &Viewport) -> TrackReport {
    let transform = EquirectangularTransform::new(*viewport);
    let segments = overlay.cyclone_segments(&query.filter(), viewport, &transform);

    let mut by_basin = BTreeMap::new();
    for segment in &segments {
        *by_basin.entry(segment.basin).or_insert(0) += 1;
    }
    TrackReport {
        segments: segments.len(),
        by_basin,
        peak_intensity: segments.iter().map(|s| s.intensity).fold(0.0, f64::max),
    }
}

#[derive(Debug, Serialize)]
pub struct ElNinoReport {
    pub year: i32,
    pub month: u32,
    pub index: Option<f64>,
    pub phase: ElNinoPhase,
    pub label: &'static str,
}

pub fn elnino(overlay: &Overlay, year: i32, month: u32) -> ElNinoReport {
    let index = overlay
        .el_nino_index()
        .map(|i| i.value(year, month))
        .filter(|v| !v.is_nan());
    let phase = overlay.el_nino_classification(year, month);
    ElNinoReport {
        year,
        month,
        index,
        phase,
        label: phase.name(),
    }
}

pub fn atlas(overlay: &Overlay, viewport: &Viewport) -> Vec<WindRose> {
    let transform = EquirectangularTransform::new(*viewport);
    overlay.wind_atlas(viewport, &transform)
}

/// Write the domain's overlay raster as a PNG.
pub fn raster(overlay: &Overlay, domain: Domain, output: &Path) -> Result<(u32, u32)> {
    let image = overlay.raster(domain)?;
    image
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(domain = %domain, path = %output.display(), width = image.width(), height = image.height(), "Wrote raster");
    Ok((image.width(), image.height()))
}

/// Load an overlay with progress logged per stage.
pub fn open_overlay(config: climatology::OverlayConfig) -> Result<Overlay> {
    let mut progress = |u: clim_common::ProgressUpdate<'_>| {
        info!(step = u.step + 1, total = u.total, "Loading {}", u.message);
        std::ops::ControlFlow::Continue(())
    };
    let overlay = Overlay::open(config, &mut progress).context("loading climatology data")?;
    Ok(overlay)
}
