//! Integration tests for scalar grid sampling.

use clim_common::Month;
use grid_store::{read_scalar_grid, GridStoreError, ScalarGrid, ScalarGridStore, ScalarKind, NO_DATA};
use test_utils::{assert_approx_eq, create_scalar_raw, temp_test_dir, write_scalar_netcdf};

/// Sea temperature grid whose raw value is `10 * col` in every row.
fn sst_column_ramp() -> ScalarGrid {
    let [months, rows, cols] = ScalarKind::SeaTemperature.shape();
    let mut raw = Vec::with_capacity(months * rows * cols);
    for _ in 0..months * rows {
        for col in 0..cols {
            raw.push((col * 10) as i16);
        }
    }
    ScalarGrid::from_raw(ScalarKind::SeaTemperature, raw).unwrap()
}

#[test]
fn test_sst_grid_point_exact() {
    let grid = sst_column_ramp();
    // cell (row 10, col 20) is centered at 79.5N, 20.5E
    let v = grid.value(Month::new(3).unwrap(), 79.5, 20.5);
    assert_approx_eq!(v, 200.0 * 0.001 + 15.0, 1e-9);
}

#[test]
fn test_sst_seam_continuity() {
    let grid = sst_column_ramp();
    // the wrap between col 359 and col 0 sits at 0.5E
    let below = grid.value(Month::ANNUAL, 0.0, 0.5 - 1e-7);
    let above = grid.value(Month::ANNUAL, 0.0, 0.5 + 1e-7);
    assert_approx_eq!(below, above, 1e-5);
    // and 360 degrees later
    assert_approx_eq!(grid.value(Month::ANNUAL, 0.0, 360.5), above, 1e-5);
}

#[test]
fn test_pressure_nan_corner() {
    let [months, rows, cols] = ScalarKind::Pressure.shape();
    let mut raw = create_scalar_raw(months, rows, cols, 1300);
    // month 0, row 20, col 30
    raw[20 * cols + 30] = NO_DATA;
    let grid = ScalarGrid::from_raw(ScalarKind::Pressure, raw).unwrap();
    let month = Month::new(0).unwrap();

    let (lat, lon) = ScalarKind::Pressure.cell_center(20, 30);
    assert!(grid.value(month, lat, lon).is_nan());
    assert!(grid.value(month, lat + 1.0, lon + 1.0).is_nan());
    assert_approx_eq!(grid.value(month, lat + 10.0, lon), 1013.0, 1e-9);
    // other months are untouched
    assert_approx_eq!(grid.value(Month::ANNUAL, lat, lon), 1013.0, 1e-9);
}

#[test]
fn test_store_without_files_reports_absence() {
    let dir = temp_test_dir();
    let mut store = ScalarGridStore::new();
    assert!(store.load_kind(dir.path(), ScalarKind::Pressure).is_err());
    assert!(store.get(ScalarKind::Pressure).is_none());
    assert!(store
        .value(ScalarKind::Pressure, Month::ANNUAL, 0.0, 0.0)
        .is_nan());
}

#[test]
fn test_store_loads_pressure_netcdf() {
    let dir = temp_test_dir();
    let [months, rows, cols] = ScalarKind::Pressure.shape();
    let mut raw = create_scalar_raw(months, rows, cols, 1300);
    // annual slot, row 20, col 30
    raw[(12 * rows + 20) * cols + 30] = NO_DATA;
    write_scalar_netcdf(&dir.path().join(ScalarKind::Pressure.file_name()), [months, rows, cols], &raw).unwrap();

    let mut store = ScalarGridStore::new();
    store.load_kind(dir.path(), ScalarKind::Pressure).unwrap();
    assert!(store.get(ScalarKind::Pressure).is_some());

    let (lat, lon) = ScalarKind::Pressure.cell_center(20, 30);
    assert_approx_eq!(store.value(ScalarKind::Pressure, Month::new(0).unwrap(), lat, lon), 1013.0, 1e-9);
    assert!(store.value(ScalarKind::Pressure, Month::ANNUAL, lat, lon).is_nan());
}

#[test]
fn test_netcdf_with_wrong_shape_is_rejected() {
    let dir = temp_test_dir();
    let path = dir.path().join(ScalarKind::Pressure.file_name());
    // sea temperature resolution under the pressure file name
    let [months, rows, cols] = ScalarKind::SeaTemperature.shape();
    write_scalar_netcdf(&path, [months, rows, cols], &create_scalar_raw(months, rows, cols, 0)).unwrap();

    let err = read_scalar_grid(&path, ScalarKind::Pressure).unwrap_err();
    assert!(matches!(err, GridStoreError::Shape(_)), "unexpected error {:?}", err);

    let mut store = ScalarGridStore::new();
    assert!(store.load_kind(dir.path(), ScalarKind::Pressure).is_err());
    assert!(store.get(ScalarKind::Pressure).is_none());
}
