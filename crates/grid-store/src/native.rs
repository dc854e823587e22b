//! NetCDF reader for the scalar climatology files.
//!
//! A valid file has exactly three dimensions and four variables, and its
//! `data` variable is a `[13][rows][cols]` array of 16-bit integers.

use std::path::Path;

use tracing::debug;

use crate::error::{GridResult, GridStoreError};
use crate::scalar::{ScalarGrid, ScalarKind};

/// Name of the sample variable.
pub const DATA_VARIABLE: &str = "data";
const EXPECTED_DIMENSIONS: usize = 3;
const EXPECTED_VARIABLES: usize = 4;

/// Read and validate one scalar grid file.
pub fn read_scalar_grid(path: &Path, kind: ScalarKind) -> GridResult<ScalarGrid> {
    if !path.exists() {
        return Err(GridStoreError::open(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        ));
    }

    let file = netcdf::open(path)
        .map_err(|e| GridStoreError::Container(format!("failed to open {}: {}", path.display(), e)))?;

    let dims = file.dimensions().count();
    let vars = file.variables().count();
    if dims != EXPECTED_DIMENSIONS || vars != EXPECTED_VARIABLES {
        return Err(GridStoreError::shape(format!(
            "{} has {} dimensions and {} variables, expected {} and {}",
            path.display(),
            dims,
            vars,
            EXPECTED_DIMENSIONS,
            EXPECTED_VARIABLES
        )));
    }

    let var = file.variable(DATA_VARIABLE).ok_or_else(|| {
        GridStoreError::shape(format!("{} has no '{}' variable", path.display(), DATA_VARIABLE))
    })?;

    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if shape != kind.shape() {
        return Err(GridStoreError::shape(format!(
            "'{}' in {} has shape {:?}, expected {:?}",
            DATA_VARIABLE,
            path.display(),
            shape,
            kind.shape()
        )));
    }

    let raw: Vec<i16> = var
        .get_values(..)
        .map_err(|e| GridStoreError::Container(format!("failed to read '{}': {}", DATA_VARIABLE, e)))?;

    debug!(path = %path.display(), samples = raw.len(), "Read scalar grid");
    ScalarGrid::from_raw(kind, raw)
}
