//! The overlay facade: loaded datasets plus the caches built from them.

use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;

use archive_parser::{
    Basin, BasinGroup, CycloneArchiveStore, CycloneTrack, ElNinoIndex, ElNinoPhase, ELNINO_FILE,
};
use clim_common::{
    ClimError, ClimResult, Domain, GeoTransform, Month, ProgressSink, ProgressUpdate, Rgb, Viewport,
};
use grid_store::{ScalarGrid, ScalarGridStore, ScalarKind, WindCell, WindField, WindFieldStore};
use image::RgbaImage;
use renderer::{
    label_anchors, render_overlay_raster, ColorGradient, FieldGeometry, IsoLine, IsoLineCache,
    IsoLineSettings, LabelAnchor, LabelGlyph, LabelGlyphCache, SampledField,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::OverlayConfig;
use crate::cyclones::{cyclone_segments, CycloneFilter, TrackSegment};
use crate::numbers::{number_grid, NumberLabel};
use crate::wind_atlas::{wind_atlas, WindRose};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadStage {
    Wind,
    Scalar(ScalarKind),
    Cyclones(BasinGroup),
    ElNino,
}

const LOAD_STAGES: [LoadStage; 7] = [
    LoadStage::Wind,
    LoadStage::Scalar(ScalarKind::Pressure),
    LoadStage::Scalar(ScalarKind::SeaTemperature),
    LoadStage::Cyclones(BasinGroup::Pacific),
    LoadStage::Cyclones(BasinGroup::Atlantic),
    LoadStage::Cyclones(BasinGroup::Indian),
    LoadStage::ElNino,
];

impl LoadStage {
    fn message(self) -> &'static str {
        match self {
            LoadStage::Wind => "wind data",
            LoadStage::Scalar(ScalarKind::Pressure) => "sea level pressure",
            LoadStage::Scalar(ScalarKind::SeaTemperature) => "sea surface temperature",
            LoadStage::Cyclones(BasinGroup::Pacific) => "cyclone data (pacific)",
            LoadStage::Cyclones(BasinGroup::Atlantic) => "cyclone data (atlantic)",
            LoadStage::Cyclones(BasinGroup::Indian) => "cyclone data (indian)",
            LoadStage::ElNino => "el nino years",
        }
    }
}

/// Which datasets are usable for the active month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub month: Month,
    pub wind_months: usize,
    pub wind: bool,
    pub current: bool,
    pub pressure: bool,
    pub sea_temperature: bool,
    pub cyclone_basins: Vec<Basin>,
    pub el_nino: bool,
}

impl Availability {
    pub fn is_available(&self, domain: Domain) -> bool {
        match domain {
            Domain::Wind => self.wind,
            Domain::Current => self.current,
            Domain::Pressure => self.pressure,
            Domain::SeaTemperature => self.sea_temperature,
        }
    }
}

/// Climatology datasets and the derived per-month caches.
#[derive(Debug)]
pub struct Overlay {
    config: OverlayConfig,
    month: Month,
    wind: WindFieldStore,
    scalars: ScalarGridStore,
    cyclones: CycloneArchiveStore,
    el_nino: Option<ElNinoIndex>,
    isolines: IsoLineCache,
    glyphs: Option<LabelGlyphCache>,
}

impl Overlay {
    /// An overlay with no data loaded yet.
    pub fn new(config: OverlayConfig) -> ClimResult<Self> {
        config.validate()?;
        let month = config.initial_month()?;
        Ok(Self {
            config,
            month,
            wind: WindFieldStore::new(),
            scalars: ScalarGridStore::new(),
            cyclones: CycloneArchiveStore::new(),
            el_nino: None,
            isolines: IsoLineCache::new(),
            glyphs: None,
        })
    }

    /// Create and load in one step.
    pub fn open(config: OverlayConfig, progress: &mut dyn ProgressSink) -> ClimResult<Self> {
        let mut overlay = Self::new(config)?;
        overlay.load(progress)?;
        Ok(overlay)
    }

    /// Load every dataset from the configured data directory.
    ///
    /// Missing or broken files leave their dataset absent and do not fail
    /// the load. Returns [`ClimError::Aborted`] when `progress` asks to
    /// stop; stages finished before that stay loaded.
    pub fn load(&mut self, progress: &mut dyn ProgressSink) -> ClimResult<()> {
        let dir = self.config.data_dir.clone();
        info!(data_dir = %dir.display(), "Loading climatology data");

        for (step, stage) in LOAD_STAGES.into_iter().enumerate() {
            let update = ProgressUpdate {
                step,
                total: LOAD_STAGES.len(),
                message: stage.message(),
            };
            if let ControlFlow::Break(()) = progress.update(update) {
                info!(step, stage = stage.message(), "Climatology load aborted");
                return Err(ClimError::Aborted);
            }
            self.load_stage(&dir, stage);
        }

        self.isolines.clear();
        info!(
            wind_months = self.wind.loaded_months(),
            pressure = self.scalars.get(ScalarKind::Pressure).is_some(),
            sea_temperature = self.scalars.get(ScalarKind::SeaTemperature).is_some(),
            basins = self.cyclones.loaded_basins().count(),
            el_nino = self.el_nino.is_some(),
            "Climatology data loaded"
        );
        Ok(())
    }

    fn load_stage(&mut self, dir: &Path, stage: LoadStage) {
        match stage {
            LoadStage::Wind => self.wind = WindFieldStore::load_dir(dir),
            LoadStage::Scalar(kind) => {
                if let Err(e) = self.scalars.load_kind(dir, kind) {
                    debug!(domain = %kind.domain(), error = %e, "Domain left unavailable");
                }
            }
            LoadStage::Cyclones(group) => {
                let tracks = self.cyclones.load_group(dir, group);
                debug!(group = group.name(), tracks, "Loaded basin group");
            }
            LoadStage::ElNino => {
                let path = dir.join(ELNINO_FILE);
                self.el_nino = match ElNinoIndex::load(&path) {
                    Ok(index) => Some(index),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "El Niño index unavailable");
                        None
                    }
                };
            }
        }
    }

    // ========================================================================
    // In-memory data
    // ========================================================================

    pub fn insert_wind_field(&mut self, month: Month, field: WindField) {
        self.wind.insert(month, field);
        self.isolines.invalidate(Domain::Wind);
    }

    pub fn insert_scalar_grid(&mut self, grid: ScalarGrid) {
        let domain = grid.kind().domain();
        self.scalars.insert(grid);
        self.isolines.invalidate(domain);
    }

    pub fn insert_tracks(&mut self, basin: Basin, tracks: Vec<CycloneTrack>) {
        self.cyclones.insert(basin, tracks);
    }

    pub fn set_el_nino_index(&mut self, index: ElNinoIndex) {
        self.el_nino = Some(index);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn month(&self) -> Month {
        self.month
    }

    /// Select the month slot for every later query.
    ///
    /// Cached isolines of the previous month are dropped on the next
    /// isoline request.
    pub fn set_month(&mut self, month: Month) {
        if month != self.month {
            debug!(from = self.month.index(), to = month.index(), "Month changed");
            self.month = month;
        }
    }

    pub fn availability(&self) -> Availability {
        Availability {
            month: self.month,
            wind_months: self.wind.loaded_months(),
            wind: self.wind.get(self.month).is_some(),
            current: false,
            pressure: self.scalars.get(ScalarKind::Pressure).is_some(),
            sea_temperature: self.scalars.get(ScalarKind::SeaTemperature).is_some(),
            cyclone_basins: self.cyclones.loaded_basins().collect(),
            el_nino: self.el_nino.is_some(),
        }
    }

    /// Value of a domain at a point for the active month; NaN when the
    /// dataset is absent or the point has no data.
    pub fn value(&self, domain: Domain, lat: f64, lon: f64) -> f64 {
        domain_value(&self.wind, &self.scalars, self.month, domain, lat, lon)
    }

    pub fn color(&self, domain: Domain, value: f64) -> Rgb {
        ColorGradient::for_domain(domain).color(value)
    }

    /// Isolines with explicit settings, built on first request.
    pub fn isolines(
        &mut self,
        domain: Domain,
        settings: &IsoLineSettings,
        progress: &mut dyn ProgressSink,
    ) -> ClimResult<Vec<Arc<IsoLine>>> {
        let Self {
            month,
            wind,
            scalars,
            isolines,
            ..
        } = self;
        let month = *month;
        isolines.get_or_build(
            domain,
            month,
            settings,
            || sample_field(wind, scalars, month, domain),
            progress,
        )
    }

    /// Isolines with the configured settings for the domain.
    pub fn configured_isolines(
        &mut self,
        domain: Domain,
        progress: &mut dyn ProgressSink,
    ) -> ClimResult<Vec<Arc<IsoLine>>> {
        let settings = *self.config.isolines.get(domain);
        self.isolines(domain, &settings, progress)
    }

    /// Label positions for a set of isolines at the configured density.
    pub fn isoline_labels(
        &self,
        lines: &[Arc<IsoLine>],
        viewport: &Viewport,
        transform: &dyn GeoTransform,
    ) -> Vec<LabelAnchor> {
        lines
            .iter()
            .flat_map(|line| label_anchors(line, transform, viewport, self.config.label_density))
            .collect()
    }

    pub fn wind_cell(&self, month: Month, lat: f64, lon: f64) -> Option<&WindCell> {
        self.wind.cell(month, lat, lon)
    }

    pub fn cyclone_tracks(&self, basin: Basin) -> &[CycloneTrack] {
        self.cyclones.tracks(basin)
    }

    pub fn cyclone_segments(
        &self,
        filter: &CycloneFilter,
        viewport: &Viewport,
        transform: &dyn GeoTransform,
    ) -> Vec<TrackSegment> {
        let tracks = Basin::ALL.into_iter().flat_map(|b| self.cyclones.tracks(b));
        cyclone_segments(tracks, filter, self.el_nino.as_ref(), viewport, transform)
    }

    /// El Niño phase of a calendar month `1..=12`.
    pub fn el_nino_classification(&self, year: i32, month: u32) -> ElNinoPhase {
        self.el_nino
            .as_ref()
            .map(|index| index.classify(year, month))
            .unwrap_or(ElNinoPhase::NotAvailable)
    }

    pub fn el_nino_index(&self) -> Option<&ElNinoIndex> {
        self.el_nino.as_ref()
    }

    /// Full-globe RGBA raster of a domain for the active month.
    pub fn raster(&self, domain: Domain) -> ClimResult<RgbaImage> {
        if !self.availability().is_available(domain) {
            return Err(ClimError::NotAvailable(format!("{} data", domain)));
        }
        let gradient = ColorGradient::for_domain(domain);
        Ok(render_overlay_raster(domain, &gradient, |lat, lon| {
            self.value(domain, lat, lon)
        }))
    }

    /// Wind roses for the viewport; empty without wind data.
    pub fn wind_atlas(&self, viewport: &Viewport, transform: &dyn GeoTransform) -> Vec<WindRose> {
        match self.wind.get(self.month) {
            Some(field) => wind_atlas(field, viewport, transform),
            None => Vec::new(),
        }
    }

    /// Value labels on the configured pixel spacing, with their glyphs
    /// rendered into the glyph cache.
    pub fn numbers(
        &mut self,
        domain: Domain,
        viewport: &Viewport,
        transform: &dyn GeoTransform,
    ) -> ClimResult<Vec<NumberLabel>> {
        let labels = number_grid(viewport, transform, self.config.numbers_spacing, |lat, lon| {
            domain_value(&self.wind, &self.scalars, self.month, domain, lat, lon)
        });
        let glyphs = self.glyph_cache()?;
        for label in &labels {
            glyphs.get(label.value);
        }
        Ok(labels)
    }

    /// The pre-rendered label for a value.
    pub fn label_glyph(&mut self, value: f64) -> ClimResult<Arc<LabelGlyph>> {
        Ok(self.glyph_cache()?.get(value))
    }

    fn glyph_cache(&mut self) -> ClimResult<&mut LabelGlyphCache> {
        if self.glyphs.is_none() {
            let cache = LabelGlyphCache::with_font(
                self.config.glyph_font_size,
                self.config.glyph_cache_capacity,
            )?;
            self.glyphs = Some(cache);
        }
        self.glyphs
            .as_mut()
            .ok_or_else(|| ClimError::NotAvailable("label glyphs".into()))
    }
}

fn domain_value(
    wind: &WindFieldStore,
    scalars: &ScalarGridStore,
    month: Month,
    domain: Domain,
    lat: f64,
    lon: f64,
) -> f64 {
    match domain {
        Domain::Wind => wind.speed(month, lat, lon),
        Domain::Current => f64::NAN,
        Domain::Pressure => scalars.value(ScalarKind::Pressure, month, lat, lon),
        Domain::SeaTemperature => scalars.value(ScalarKind::SeaTemperature, month, lat, lon),
    }
}

/// The native grid of a domain as a contourable field.
fn sample_field(
    wind: &WindFieldStore,
    scalars: &ScalarGridStore,
    month: Month,
    domain: Domain,
) -> ClimResult<SampledField> {
    match ScalarKind::from_domain(domain) {
        Some(kind) => {
            let grid = scalars
                .get(kind)
                .ok_or_else(|| ClimError::NotAvailable(format!("{} data", domain)))?;
            scalar_field(grid, month)
        }
        None if domain == Domain::Wind => {
            let field = wind
                .get(month)
                .ok_or_else(|| ClimError::NotAvailable(format!("wind data for month {}", month.index())))?;
            wind_field(field)
        }
        None => Err(ClimError::NotAvailable(format!("{} data", domain))),
    }
}

fn scalar_field(grid: &ScalarGrid, month: Month) -> ClimResult<SampledField> {
    let kind = grid.kind();
    let (rows, cols) = (grid.rows(), grid.cols());
    let (lat0, lon0) = kind.cell_center(0, 0);
    let (lat1, lon1) = kind.cell_center(1, 1);
    let geometry = FieldGeometry {
        lat0,
        lat_step: lat1 - lat0,
        lon0,
        lon_step: lon1 - lon0,
    };

    let mut values = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            values.push(grid.sample(month, row, col));
        }
    }
    SampledField::new(values, cols, rows, true, geometry)
}

fn wind_field(field: &WindField) -> ClimResult<SampledField> {
    let (rows, cols) = (field.latitudes(), field.longitudes());
    if rows == 0 || cols == 0 {
        return Err(ClimError::malformed("wind field has no cells"));
    }
    // rows run south to north from a quarter degree above the south pole
    let geometry = FieldGeometry {
        lat0: 0.25 - 90.0,
        lat_step: 180.0 / rows as f64,
        lon0: 0.0,
        lon_step: field.lon_step(),
    };

    let mut values = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            values.push(field.cell(row, col).map(WindCell::average_speed).unwrap_or(f64::NAN));
        }
    }
    SampledField::new(values, cols, rows, true, geometry)
}
