//! Regular grid of value labels across the viewport.

use clim_common::{GeoTransform, Viewport};
use renderer::GlyphKey;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberLabel {
    pub x: f64,
    pub y: f64,
    pub lat: f64,
    pub lon: f64,
    /// NaN where the domain has no data.
    pub value: f64,
    #[serde(skip)]
    pub key: GlyphKey,
}

/// Sample `sampler` every `spacing` pixels, starting one spacing in from
/// the top-left corner and stopping one spacing short of the far edges.
pub fn number_grid<F>(
    viewport: &Viewport,
    transform: &dyn GeoTransform,
    spacing: u32,
    mut sampler: F,
) -> Vec<NumberLabel>
where
    F: FnMut(f64, f64) -> f64,
{
    if spacing == 0 {
        return Vec::new();
    }
    let (w, h) = (viewport.pixel_width, viewport.pixel_height);

    let mut labels = Vec::new();
    let mut y = spacing;
    while y + spacing <= h {
        let mut x = spacing;
        while x + spacing <= w {
            let (lat, lon) = transform.pixel_to_geo(x as f64, y as f64);
            let value = sampler(lat, lon);
            labels.push(NumberLabel {
                x: x as f64,
                y: y as f64,
                lat,
                lon,
                value,
                key: GlyphKey::for_value(value),
            });
            x += spacing;
        }
        y += spacing;
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use clim_common::{BoundingBox, EquirectangularTransform};

    #[test]
    fn test_grid_positions() {
        let viewport = Viewport::new(BoundingBox::new(0.0, -50.0, 100.0, 50.0), 200, 100);
        let transform = EquirectangularTransform::new(viewport);
        let labels = number_grid(&viewport, &transform, 50, |lat, _| lat);

        // x in {50, 100, 150}, y in {50}
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[0].x, 50.0);
        assert_eq!(labels[2].x, 150.0);
        assert!(labels.iter().all(|l| l.y == 50.0));
        assert!((labels[0].lat).abs() < 1e-9);
        assert!((labels[1].lon - 50.0).abs() < 1e-9);
        assert_eq!(labels[0].key, GlyphKey::Value(0));
    }

    #[test]
    fn test_small_or_degenerate() {
        let viewport = Viewport::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 60, 60);
        let transform = EquirectangularTransform::new(viewport);
        assert!(number_grid(&viewport, &transform, 50, |_, _| 1.0).is_empty());
        assert!(number_grid(&viewport, &transform, 0, |_, _| 1.0).is_empty());
    }

    #[test]
    fn test_nan_key() {
        let viewport = Viewport::new(BoundingBox::new(0.0, 0.0, 10.0, 10.0), 100, 100);
        let transform = EquirectangularTransform::new(viewport);
        let labels = number_grid(&viewport, &transform, 50, |_, _| f64::NAN);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].key, GlyphKey::NotAvailable);
    }
}
