//! Integration tests for the overlay facade over a synthetic data directory.

use std::collections::{BTreeSet, HashMap};
use std::ops::ControlFlow;
use std::sync::Arc;

use archive_parser::{Basin, ElNinoPhase, StormPhase};
use clim_common::{
    BoundingBox, ClimError, Domain, EquirectangularTransform, Month, NoProgress, ProgressUpdate, Rgb,
    Viewport,
};
use climatology::{CycloneFilter, ElNinoToggles, Overlay, OverlayConfig, PhaseToggles};
use grid_store::{ScalarGrid, ScalarKind};
use renderer::{GlyphKey, IsoLineSettings};
use test_utils::{
    assert_approx_eq, bbox, create_scalar_raw, temp_test_dir, write_data_dir, write_scalar_netcdf,
};

fn loaded_overlay() -> (tempfile::TempDir, Overlay) {
    let dir = temp_test_dir();
    write_data_dir(dir.path()).unwrap();
    let config = OverlayConfig {
        data_dir: dir.path().to_path_buf(),
        ..OverlayConfig::default()
    };
    let overlay = Overlay::open(config, &mut NoProgress).unwrap();
    (dir, overlay)
}

fn viewport(b: (f64, f64, f64, f64), width: u32, height: u32) -> Viewport {
    Viewport::new(BoundingBox::new(b.0, b.1, b.2, b.3), width, height)
}

/// Sea temperature grid rising 0.2 °C per row from -3 °C in the north.
fn sst_row_ramp() -> ScalarGrid {
    let [months, rows, cols] = ScalarKind::SeaTemperature.shape();
    let mut raw = Vec::with_capacity(months * rows * cols);
    for _ in 0..months {
        for row in 0..rows {
            let value = (row as i16 - 90) * 200;
            raw.extend(std::iter::repeat(value).take(cols));
        }
    }
    ScalarGrid::from_raw(ScalarKind::SeaTemperature, raw).unwrap()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_reports_availability() {
    let (_dir, overlay) = loaded_overlay();
    let availability = overlay.availability();

    assert_eq!(availability.wind_months, 13);
    assert!(availability.is_available(Domain::Wind));
    assert!(!availability.is_available(Domain::Current));
    // no grid files in the fixture directory
    assert!(!availability.is_available(Domain::Pressure));
    assert!(!availability.is_available(Domain::SeaTemperature));
    assert_eq!(availability.cyclone_basins, vec![Basin::SouthPacific, Basin::Atlantic]);
    assert!(availability.el_nino);
}

#[test]
fn test_load_reads_scalar_grid_files() {
    let dir = temp_test_dir();
    write_data_dir(dir.path()).unwrap();
    let pressure = ScalarKind::Pressure.shape();
    let [months, rows, cols] = pressure;
    write_scalar_netcdf(
        &dir.path().join(ScalarKind::Pressure.file_name()),
        pressure,
        &create_scalar_raw(months, rows, cols, 1300),
    )
    .unwrap();
    // pressure resolution in the sea temperature file
    write_scalar_netcdf(
        &dir.path().join(ScalarKind::SeaTemperature.file_name()),
        pressure,
        &create_scalar_raw(months, rows, cols, 0),
    )
    .unwrap();

    let config = OverlayConfig {
        data_dir: dir.path().to_path_buf(),
        ..OverlayConfig::default()
    };
    let overlay = Overlay::open(config, &mut NoProgress).unwrap();
    let availability = overlay.availability();
    assert!(availability.is_available(Domain::Pressure));
    assert!(!availability.is_available(Domain::SeaTemperature));

    assert_approx_eq!(overlay.value(Domain::Pressure, 12.0, 250.0), 1013.0, 1e-9);
    assert!(overlay.value(Domain::SeaTemperature, 12.0, 250.0).is_nan());
    assert!(overlay.raster(Domain::Pressure).is_ok());
}

#[test]
fn test_load_progress_and_abort() {
    let dir = temp_test_dir();
    write_data_dir(dir.path()).unwrap();
    let config = OverlayConfig {
        data_dir: dir.path().to_path_buf(),
        ..OverlayConfig::default()
    };
    let mut overlay = Overlay::new(config).unwrap();

    let mut seen = Vec::new();
    let mut progress = |u: ProgressUpdate<'_>| {
        seen.push((u.step, u.total));
        if u.step == 3 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    };
    let result = overlay.load(&mut progress);

    assert!(matches!(result, Err(ClimError::Aborted)));
    assert_eq!(seen, vec![(0, 7), (1, 7), (2, 7), (3, 7)]);
    // stages before the abort stay loaded
    let availability = overlay.availability();
    assert!(availability.wind);
    assert!(availability.cyclone_basins.is_empty());
    assert!(!availability.el_nino);
}

#[test]
fn test_missing_data_dir_loads_nothing() {
    let dir = temp_test_dir();
    let config = OverlayConfig {
        data_dir: dir.path().join("absent"),
        ..OverlayConfig::default()
    };
    let overlay = Overlay::open(config, &mut NoProgress).unwrap();
    let availability = overlay.availability();
    assert_eq!(availability.wind_months, 0);
    assert!(availability.cyclone_basins.is_empty());
    assert!(overlay.value(Domain::Wind, 10.0, 10.0).is_nan());
}

// ============================================================================
// Point queries
// ============================================================================

#[test]
fn test_values_and_colors() {
    let (_dir, mut overlay) = loaded_overlay();

    assert_approx_eq!(overlay.value(Domain::Wind, 12.0, 250.0), 5.0, 1e-9);
    assert!(overlay.value(Domain::Current, 12.0, 250.0).is_nan());
    assert!(overlay.value(Domain::Pressure, 12.0, 250.0).is_nan());

    overlay.insert_scalar_grid(sst_row_ramp());
    // row 65 is centered at 24.5°N and holds 15 + (65 - 90) * 0.2 = 10 °C
    assert_approx_eq!(overlay.value(Domain::SeaTemperature, 24.5, 100.5), 10.0, 1e-6);
    assert!(overlay.availability().is_available(Domain::SeaTemperature));

    assert_eq!(overlay.color(Domain::Wind, 0.0), Rgb::from_hex(0xffffff));
    assert_eq!(overlay.color(Domain::Wind, f64::NAN), overlay.color(Domain::Wind, -10.0));
}

#[test]
fn test_wind_cell_lookup() {
    let (_dir, overlay) = loaded_overlay();
    let cell = overlay.wind_cell(Month::ANNUAL, -40.0, 33.0).unwrap();
    assert_eq!(cell.directions.len(), 8);
    assert_approx_eq!(cell.average_speed(), 5.0, 1e-9);
}

#[test]
fn test_el_nino_classification() {
    let (_dir, overlay) = loaded_overlay();
    assert_eq!(overlay.el_nino_classification(1998, 1), ElNinoPhase::ElNino);
    assert_eq!(overlay.el_nino_classification(1999, 1), ElNinoPhase::LaNina);
    assert_eq!(overlay.el_nino_classification(1997, 1), ElNinoPhase::Neutral);
    // December of 2000 is missing from the table
    assert_eq!(overlay.el_nino_classification(2000, 12), ElNinoPhase::NotAvailable);
    assert_eq!(overlay.el_nino_classification(1950, 6), ElNinoPhase::NotAvailable);
}

#[test]
fn test_month_selection() {
    let (_dir, mut overlay) = loaded_overlay();
    assert_eq!(overlay.month(), Month::new(0).unwrap());
    overlay.set_month(Month::ANNUAL);
    assert_eq!(overlay.availability().month, Month::ANNUAL);
    assert!(overlay.availability().wind);
}

// ============================================================================
// Isolines
// ============================================================================

#[test]
fn test_isolines_built_once_per_month() {
    let (_dir, mut overlay) = loaded_overlay();
    overlay.insert_scalar_grid(sst_row_ramp());
    let settings = IsoLineSettings::for_domain(Domain::SeaTemperature);

    let first = overlay
        .isolines(Domain::SeaTemperature, &settings, &mut NoProgress)
        .unwrap();
    assert_eq!(first.len(), 18);

    let second = overlay
        .isolines(Domain::SeaTemperature, &settings, &mut NoProgress)
        .unwrap();
    assert!(first.iter().zip(&second).all(|(a, b)| Arc::ptr_eq(a, b)));

    overlay.set_month(Month::new(5).unwrap());
    let third = overlay
        .isolines(Domain::SeaTemperature, &settings, &mut NoProgress)
        .unwrap();
    assert!(!Arc::ptr_eq(&first[0], &third[0]));
}

#[test]
fn test_isoline_wraps_around_globe() {
    let (_dir, mut overlay) = loaded_overlay();
    overlay.insert_scalar_grid(sst_row_ramp());
    let settings = IsoLineSettings::new(2.0, 10.0, 10.0);

    let lines = overlay
        .isolines(Domain::SeaTemperature, &settings, &mut NoProgress)
        .unwrap();
    assert_eq!(lines.len(), 1);

    let line = &lines[0];
    assert_eq!(line.value, 10.0);
    assert_eq!(line.polylines.len(), 1);
    assert!(line.polylines[0].closed);
    for p in &line.polylines[0].points {
        assert_approx_eq!(p.lat, 24.5, 0.01);
    }
}

#[test]
fn test_isolines_unavailable_domain() {
    let (_dir, mut overlay) = loaded_overlay();
    let err = overlay
        .configured_isolines(Domain::Current, &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, ClimError::NotAvailable(_)));

    let err = overlay
        .configured_isolines(Domain::Pressure, &mut NoProgress)
        .unwrap_err();
    assert!(err.is_unavailable());
}

#[test]
fn test_isoline_labels_inside_viewport() {
    let (_dir, mut overlay) = loaded_overlay();
    overlay.insert_scalar_grid(sst_row_ramp());
    let settings = IsoLineSettings::new(2.0, 10.0, 10.0);
    let lines = overlay
        .isolines(Domain::SeaTemperature, &settings, &mut NoProgress)
        .unwrap();

    let vp = viewport((0.0, 0.0, 90.0, 45.0), 900, 450);
    let transform = EquirectangularTransform::new(vp);
    let labels = overlay.isoline_labels(&lines, &vp, &transform);

    assert!(!labels.is_empty());
    for label in &labels {
        assert_eq!(label.text, "10");
        assert!((0.0..=900.0).contains(&label.x));
        assert_approx_eq!(label.y, 205.0, 0.2);
    }
}

// ============================================================================
// Cyclones
// ============================================================================

fn atlantic_filter() -> CycloneFilter {
    CycloneFilter {
        basins: BTreeSet::from([Basin::Atlantic]),
        ..CycloneFilter::default()
    }
}

#[test]
fn test_cyclone_tracks_by_basin() {
    let (_dir, overlay) = loaded_overlay();
    assert_eq!(overlay.cyclone_tracks(Basin::Atlantic).len(), 2);
    assert_eq!(overlay.cyclone_tracks(Basin::SouthPacific).len(), 2);
    assert!(overlay.cyclone_tracks(Basin::NorthIndian).is_empty());
}

#[test]
fn test_cyclone_segments_default_filter() {
    let (_dir, overlay) = loaded_overlay();
    let vp = viewport(bbox::ATLANTIC, 900, 450);
    let transform = EquirectangularTransform::new(vp);

    let segments = overlay.cyclone_segments(&atlantic_filter(), &vp, &transform);
    // seven fixes of the 1992 storm; the 1993 storm keeps a single fix
    // once its wave phase is filtered out
    assert_eq!(segments.len(), 6);

    let extratropical = &segments[4];
    assert_eq!(extratropical.phase, StormPhase::Extratropical);
    assert_eq!(extratropical.color, Rgb::new(0, 187, 0));
    assert_approx_eq!(extratropical.from_lon, -75.5, 1e-9);
    assert_approx_eq!(extratropical.to_lon, -77.0, 1e-9);

    let tropical = &segments[0];
    assert_eq!(tropical.color.r, (100.0_f64 / 150.0 * 255.0).round() as u8);
    let (x, y) = transform.geo_to_pixel(25.0, -70.0);
    assert_approx_eq!(tropical.from_px.0, x, 1e-9);
    assert_approx_eq!(tropical.from_px.1, y, 1e-9);
}

#[test]
fn test_cyclone_filters() {
    let (_dir, overlay) = loaded_overlay();
    let vp = viewport(bbox::ATLANTIC, 900, 450);
    let transform = EquirectangularTransform::new(vp);

    // rejected fixes are skipped without breaking the track
    let strong = CycloneFilter {
        min_wind: 100.0,
        ..atlantic_filter()
    };
    assert_eq!(overlay.cyclone_segments(&strong, &vp, &transform).len(), 4);

    let deep = CycloneFilter {
        max_pressure: 950.0,
        ..atlantic_filter()
    };
    assert_eq!(overlay.cyclone_segments(&deep, &vp, &transform).len(), 1);

    let september = CycloneFilter {
        month: Month::from_calendar(9).unwrap(),
        ..atlantic_filter()
    };
    assert!(overlay.cyclone_segments(&september, &vp, &transform).is_empty());

    let august = CycloneFilter {
        month: Month::from_calendar(8).unwrap(),
        ..atlantic_filter()
    };
    assert_eq!(overlay.cyclone_segments(&august, &vp, &transform).len(), 6);

    // 1992 has no index values
    let classified_only = CycloneFilter {
        el_nino: ElNinoToggles {
            not_available: false,
            ..ElNinoToggles::default()
        },
        ..atlantic_filter()
    };
    assert!(overlay.cyclone_segments(&classified_only, &vp, &transform).is_empty());

    let until_noon = CycloneFilter {
        end: chrono::NaiveDate::from_ymd_opt(1992, 8, 22)
            .and_then(|d| d.and_hms_opt(12, 0, 0)),
        ..atlantic_filter()
    };
    assert_eq!(overlay.cyclone_segments(&until_noon, &vp, &transform).len(), 2);
}

#[test]
fn test_cyclone_segments_far_side_of_view() {
    let (_dir, overlay) = loaded_overlay();
    let filter = CycloneFilter {
        basins: BTreeSet::from([Basin::SouthPacific]),
        phases: PhaseToggles::all(),
        ..CycloneFilter::default()
    };

    let vp = viewport(bbox::PACIFIC, 900, 450);
    let transform = EquirectangularTransform::new(vp);
    assert_eq!(overlay.cyclone_segments(&filter, &vp, &transform).len(), 2);

    // centered on the antipode of the 1997 storm, only the 1998 storm stays
    let far = Viewport {
        center_lon: -9.5,
        ..vp
    };
    let segments = overlay.cyclone_segments(&filter, &far, &transform);
    assert_eq!(segments.len(), 1);
    assert_approx_eq!(segments[0].from_lon, 175.0, 1e-9);
}

// ============================================================================
// Wind atlas, numbers and rasters
// ============================================================================

#[test]
fn test_wind_atlas_lattice() {
    let (_dir, overlay) = loaded_overlay();
    let vp = viewport((-30.0, -30.0, 30.0, 30.0), 420, 420);
    let transform = EquirectangularTransform::new(vp);

    let roses = overlay.wind_atlas(&vp, &transform);
    assert_eq!(roses.len(), 49);
    assert_approx_eq!(roses[0].lat, -31.0, 1e-9);
    assert_approx_eq!(roses[1].lon, -21.0, 1e-9);

    let rose = &roses[0];
    assert_eq!(rose.label, None);
    assert_eq!(rose.petals.len(), 8);
    for petal in &rose.petals {
        assert_approx_eq!(petal.fraction, 0.125, 1e-12);
        assert!(!petal.split);
        assert_approx_eq!(petal.average_knots, 5.0 * 3.6 / 1.852, 1e-9);
        assert_eq!(petal.barbs, 2);
    }

    // a small view doubles the step until roses are 70 px apart
    let coarse = viewport((-30.0, -30.0, 30.0, 30.0), 140, 140);
    let coarse_transform = EquirectangularTransform::new(coarse);
    assert!(overlay.wind_atlas(&coarse, &coarse_transform).len() < roses.len());
}

#[test]
fn test_numbers_grid_warms_glyphs() {
    let (_dir, mut overlay) = loaded_overlay();
    let vp = viewport((0.0, -50.0, 100.0, 50.0), 200, 100);
    let transform = EquirectangularTransform::new(vp);

    let labels = overlay.numbers(Domain::Wind, &vp, &transform).unwrap();
    assert_eq!(labels.len(), 3);
    assert!(labels.iter().all(|l| l.key == GlyphKey::Value(5)));

    let glyph = overlay.label_glyph(5.2).unwrap();
    assert_eq!(glyph.text, "5");
    assert!(glyph.width() > 10);

    let unavailable = overlay.numbers(Domain::Current, &vp, &transform).unwrap();
    assert!(unavailable.iter().all(|l| l.key == GlyphKey::NotAvailable));
    assert_eq!(overlay.label_glyph(f64::NAN).unwrap().text, "N/A");
}

#[test]
fn test_wind_raster() {
    let (_dir, overlay) = loaded_overlay();
    let raster = overlay.raster(Domain::Wind).unwrap();
    assert_eq!((raster.width(), raster.height()), (721, 720));
    assert!(matches!(overlay.raster(Domain::Pressure), Err(ClimError::NotAvailable(_))));
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_from_yaml() {
    let yaml = r#"
data_dir: /srv/climatology
month: 12
isolines:
  pressure:
    spacing: 2.0
    min: 980.0
    max: 1040.0
label_density: 250
"#;
    let config = OverlayConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.data_dir, std::path::PathBuf::from("/srv/climatology"));
    assert_eq!(config.initial_month().unwrap(), Month::ANNUAL);
    assert_eq!(config.isolines.pressure, IsoLineSettings::new(2.0, 980.0, 1040.0));
    assert_eq!(config.isolines.wind, IsoLineSettings::for_domain(Domain::Wind));
    assert_eq!(config.label_density, 250.0);
    assert_eq!(config.numbers_spacing, 50);
}

#[test]
fn test_config_rejects_invalid_values() {
    assert!(matches!(
        OverlayConfig::from_yaml_str("month: 13"),
        Err(ClimError::Config(_))
    ));
    let bad_spacing = "isolines:\n  wind:\n    spacing: 0.0\n    min: 0.0\n    max: 10.0\n";
    assert!(OverlayConfig::from_yaml_str(bad_spacing).is_err());
    assert!(OverlayConfig::from_yaml_str("numbers_spacing: 0").is_err());
    assert!(OverlayConfig::from_yaml_str("label_density: [1, 2]").is_err());
}

#[test]
fn test_config_from_env() {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("CLIMATOLOGY_DATA_DIR", "/data/clim"),
        ("CLIMATOLOGY_MONTH", "6"),
        ("CLIMATOLOGY_NUMBERS_SPACING", "80"),
    ]);
    let config = OverlayConfig::from_env_with(|name| vars.get(name).map(|v| v.to_string())).unwrap();
    assert_eq!(config.data_dir, std::path::PathBuf::from("/data/clim"));
    assert_eq!(config.month, 6);
    assert_eq!(config.numbers_spacing, 80);
    assert_eq!(config.glyph_cache_capacity, 256);

    let bad = OverlayConfig::from_env_with(|name| (name == "CLIMATOLOGY_MONTH").then(|| "june".to_string()));
    assert!(matches!(bad, Err(ClimError::Config(_))));
}

#[test]
fn test_config_file_missing() {
    let dir = temp_test_dir();
    let err = OverlayConfig::from_yaml(dir.path().join("overlay.yaml")).unwrap_err();
    assert!(matches!(err, ClimError::MissingResource { .. }));
}
