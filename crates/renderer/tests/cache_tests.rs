//! Tests for the isoline and label glyph caches.

use std::cell::Cell;
use std::ops::ControlFlow;
use std::sync::Arc;

use clim_common::{ClimError, ClimResult, Domain, Month, NoProgress, ProgressUpdate};
use image::{Rgb, RgbImage};
use renderer::contour::{FieldGeometry, SampledField};
use renderer::isoline_cache::{IsoLineCache, IsoLineSettings};
use renderer::label_cache::{GlyphKey, LabelGlyphCache, TextRasterizer};
use test_utils::create_peak_grid;

fn peak_field() -> ClimResult<SampledField> {
    SampledField::new(create_peak_grid(21, 21, 10.0), 21, 21, false, FieldGeometry::global(21, 21))
}

fn month(index: usize) -> Month {
    Month::new(index).unwrap()
}

// ============================================================================
// IsoLineCache tests
// ============================================================================

#[test]
fn test_same_key_returns_same_lines() {
    let mut cache = IsoLineCache::new();
    let settings = IsoLineSettings::new(2.0, 0.0, 10.0);

    let first = cache
        .get_or_build(Domain::Pressure, month(0), &settings, peak_field, &mut NoProgress)
        .unwrap();
    assert_eq!(first.len(), 6);
    assert!(cache.is_complete(Domain::Pressure));

    let second = cache
        .get_or_build(
            Domain::Pressure,
            month(0),
            &settings,
            || -> ClimResult<SampledField> { panic!("field sampled again") },
            &mut NoProgress,
        )
        .unwrap();
    assert_eq!(first.len(), second.len());
    assert!(first.iter().zip(&second).all(|(a, b)| Arc::ptr_eq(a, b)));
    assert_eq!(second[0].value, 0.0);
    assert_eq!(second[5].value, 10.0);
}

#[test]
fn test_abort_keeps_built_levels_and_resumes() {
    let mut cache = IsoLineCache::new();
    let settings = IsoLineSettings::new(2.0, 0.0, 10.0);

    let mut abort_at_two = |u: ProgressUpdate<'_>| {
        if u.step >= 2 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    };
    let err = cache
        .get_or_build(Domain::Pressure, month(3), &settings, peak_field, &mut abort_at_two)
        .unwrap_err();
    assert!(matches!(err, ClimError::Aborted));
    assert_eq!(cache.cached_levels(Domain::Pressure), 2);
    assert!(!cache.is_complete(Domain::Pressure));

    let mut steps = Vec::new();
    let mut record = |u: ProgressUpdate<'_>| {
        steps.push(u.step);
        ControlFlow::Continue(())
    };
    let lines = cache
        .get_or_build(Domain::Pressure, month(3), &settings, peak_field, &mut record)
        .unwrap();
    assert_eq!(lines.len(), 6);
    assert_eq!(steps, vec![2, 3, 4, 5]);
}

#[test]
fn test_month_change_clears_every_domain() {
    let mut cache = IsoLineCache::new();
    let settings = IsoLineSettings::new(5.0, 0.0, 10.0);
    let sampled = Cell::new(0);
    let counting = || {
        sampled.set(sampled.get() + 1);
        peak_field()
    };

    cache
        .get_or_build(Domain::Wind, month(0), &settings, counting, &mut NoProgress)
        .unwrap();
    cache
        .get_or_build(Domain::SeaTemperature, month(0), &settings, counting, &mut NoProgress)
        .unwrap();
    cache
        .get_or_build(Domain::Wind, month(0), &settings, counting, &mut NoProgress)
        .unwrap();
    assert_eq!(sampled.get(), 2);

    cache
        .get_or_build(Domain::Wind, month(1), &settings, counting, &mut NoProgress)
        .unwrap();
    assert_eq!(sampled.get(), 3);
    assert_eq!(cache.month(), Some(month(1)));
    assert_eq!(cache.cached_levels(Domain::SeaTemperature), 0);
}

#[test]
fn test_settings_change_replaces_domain_set() {
    let mut cache = IsoLineCache::new();
    let coarse = IsoLineSettings::new(5.0, 0.0, 10.0);
    let fine = IsoLineSettings::new(1.0, 0.0, 10.0);

    let a = cache
        .get_or_build(Domain::Wind, month(0), &coarse, peak_field, &mut NoProgress)
        .unwrap();
    let b = cache
        .get_or_build(Domain::Wind, month(0), &fine, peak_field, &mut NoProgress)
        .unwrap();
    assert_eq!(a.len(), 3);
    assert_eq!(b.len(), 11);
    assert_eq!(cache.cached_levels(Domain::Wind), 11);
}

#[test]
fn test_invalid_settings_rejected() {
    let mut cache = IsoLineCache::new();
    let bad = IsoLineSettings::new(0.0, 0.0, 10.0);
    let err = cache
        .get_or_build(Domain::Wind, month(0), &bad, peak_field, &mut NoProgress)
        .unwrap_err();
    assert!(matches!(err, ClimError::Config(_)));
}

#[test]
fn test_field_error_is_returned() {
    let mut cache = IsoLineCache::new();
    let settings = IsoLineSettings::for_domain(Domain::Current);
    let err = cache
        .get_or_build(
            Domain::Current,
            month(0),
            &settings,
            || Err(ClimError::NotAvailable("current".into())),
            &mut NoProgress,
        )
        .unwrap_err();
    assert!(err.is_unavailable());
    assert_eq!(cache.cached_levels(Domain::Current), 0);
}

// ============================================================================
// LabelGlyphCache tests
// ============================================================================

/// Draws each character as a 3x5 black block with a one pixel gap.
struct BlockRasterizer {
    renders: Cell<usize>,
}

impl TextRasterizer for BlockRasterizer {
    fn render(&self, text: &str) -> RgbImage {
        self.renders.set(self.renders.get() + 1);
        let width = text.chars().count() as u32 * 4;
        let mut img = RgbImage::from_pixel(width, 5, Rgb([255, 255, 255]));
        for (i, _) in text.chars().enumerate() {
            for x in 0..3 {
                for y in 0..5 {
                    img.put_pixel(i as u32 * 4 + x, y, Rgb([0, 0, 0]));
                }
            }
        }
        img
    }
}

fn block_cache(capacity: usize) -> LabelGlyphCache<BlockRasterizer> {
    LabelGlyphCache::new(BlockRasterizer { renders: Cell::new(0) }, capacity)
}

#[test]
fn test_glyph_reused_for_same_rounded_value() {
    let mut cache = block_cache(8);
    let a = cache.get(1012.6);
    let b = cache.get(1013.4);

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.key, GlyphKey::Value(1013));
    assert_eq!(a.text, "1013");
    assert_eq!((a.width(), a.height()), (16 + 10, 5 + 2));
    assert_eq!(a.pixels.get_pixel(5, 1).0, [0, 0, 0, 255]);
    assert_eq!(a.pixels.get_pixel(8, 1).0[3], 0);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_nan_glyph() {
    let mut cache = block_cache(8);
    let glyph = cache.get(f64::NAN);
    assert_eq!(glyph.key, GlyphKey::NotAvailable);
    assert_eq!(glyph.text, "N/A");
    assert!(Arc::ptr_eq(&glyph, &cache.get(f64::NAN)));
}

#[test]
fn test_glyph_cache_is_bounded() {
    let mut cache = block_cache(2);
    cache.get(1.0);
    cache.get(2.0);
    cache.get(1.0);
    cache.get(3.0);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.capacity(), 2);
    // 2.0 was least recently used
    assert!(!cache.contains(2.0));
    assert!(cache.contains(1.0));
    assert!(cache.contains(3.0));
}
