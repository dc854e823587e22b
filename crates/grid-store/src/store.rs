//! Loaded datasets, one slot per month or per scalar kind.
//!
//! Loading never fails as a whole: a file that cannot be opened or decoded
//! leaves its slot empty and is logged.

use std::path::Path;

use clim_common::{Month, MONTH_SLOTS};
use tracing::{debug, info, warn};

use crate::error::GridResult;
use crate::native::read_scalar_grid;
use crate::scalar::{ScalarGrid, ScalarKind};
use crate::wind::{WindCell, WindField};

/// File name of a month's wind file: `wind01.gz` .. `wind13.gz`.
pub fn wind_file_name(month: Month) -> String {
    format!("wind{:02}.gz", month.index() + 1)
}

/// Wind fields for the twelve months and the annual climatology.
#[derive(Debug, Default)]
pub struct WindFieldStore {
    months: [Option<WindField>; MONTH_SLOTS],
}

impl WindFieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every month found in `dir`.
    pub fn load_dir(dir: &Path) -> Self {
        let mut store = Self::new();
        for month in Month::all() {
            let path = dir.join(wind_file_name(month));
            match WindField::read(&path) {
                Ok(field) => {
                    debug!(
                        month = month.index(),
                        latitudes = field.latitudes(),
                        longitudes = field.longitudes(),
                        directions = field.dir_count(),
                        "Loaded wind field"
                    );
                    store.insert(month, field);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Wind field unavailable"),
            }
        }
        info!(months = store.loaded_months(), "Wind fields loaded");
        store
    }

    pub fn insert(&mut self, month: Month, field: WindField) {
        self.months[month.index()] = Some(field);
    }

    pub fn get(&self, month: Month) -> Option<&WindField> {
        self.months[month.index()].as_ref()
    }

    pub fn loaded_months(&self) -> usize {
        self.months.iter().filter(|m| m.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded_months() == 0
    }

    /// Mean wind speed, NaN when the month or the surrounding cells are
    /// missing.
    pub fn speed(&self, month: Month, lat: f64, lon: f64) -> f64 {
        self.get(month)
            .map(|f| f.interpolate_speed(lat, lon))
            .unwrap_or(f64::NAN)
    }

    pub fn cell(&self, month: Month, lat: f64, lon: f64) -> Option<&WindCell> {
        self.get(month)?.cell_at(lat, lon)
    }
}

/// Pressure and sea temperature grids.
#[derive(Debug, Default)]
pub struct ScalarGridStore {
    pressure: Option<ScalarGrid>,
    sea_temperature: Option<ScalarGrid>,
}

impl ScalarGridStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one kind from `dir`, keeping the slot empty on failure.
    pub fn load_kind(&mut self, dir: &Path, kind: ScalarKind) -> GridResult<()> {
        let path = dir.join(kind.file_name());
        match read_scalar_grid(&path, kind) {
            Ok(grid) => {
                info!(kind = ?kind, path = %path.display(), "Loaded scalar grid");
                self.insert(grid);
                Ok(())
            }
            Err(e) => {
                warn!(kind = ?kind, path = %path.display(), error = %e, "Scalar grid unavailable");
                self.clear(kind);
                Err(e)
            }
        }
    }

    pub fn insert(&mut self, grid: ScalarGrid) {
        match grid.kind() {
            ScalarKind::Pressure => self.pressure = Some(grid),
            ScalarKind::SeaTemperature => self.sea_temperature = Some(grid),
        }
    }

    pub fn clear(&mut self, kind: ScalarKind) {
        match kind {
            ScalarKind::Pressure => self.pressure = None,
            ScalarKind::SeaTemperature => self.sea_temperature = None,
        }
    }

    pub fn get(&self, kind: ScalarKind) -> Option<&ScalarGrid> {
        match kind {
            ScalarKind::Pressure => self.pressure.as_ref(),
            ScalarKind::SeaTemperature => self.sea_temperature.as_ref(),
        }
    }

    /// Interpolated value, NaN when the grid is absent.
    pub fn value(&self, kind: ScalarKind, month: Month, lat: f64, lon: f64) -> f64 {
        self.get(kind)
            .map(|g| g.value(month, lat, lon))
            .unwrap_or(f64::NAN)
    }
}
