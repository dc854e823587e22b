//! Color ramps for the overlay domains and the Mercator overlay raster.

use std::borrow::Cow;
use std::f64::consts::PI;

use clim_common::{ClimError, ClimResult, Domain, Rgb};
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Alpha of raster pixels that carry data.
pub const OVERLAY_ALPHA: u8 = 220;

/// A threshold and the color shown at it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub value: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(value: f64, hex: u32) -> Self {
        Self {
            value,
            color: Rgb::from_hex(hex),
        }
    }
}

/// Wind speed, m/s.
const WIND_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 0xffffff),
    ColorStop::new(2.0, 0x00ffff),
    ColorStop::new(4.0, 0x00e4e4),
    ColorStop::new(5.0, 0x00d9e4),
    ColorStop::new(6.0, 0x00d9d4),
    ColorStop::new(7.0, 0x00d9b2),
    ColorStop::new(8.0, 0x00d96e),
    ColorStop::new(9.0, 0x00d92a),
    ColorStop::new(10.0, 0x00d900),
    ColorStop::new(11.0, 0x2ad900),
    ColorStop::new(12.0, 0x6ed900),
    ColorStop::new(13.0, 0xb2d900),
    ColorStop::new(14.0, 0xd4d400),
    ColorStop::new(15.0, 0xd9a600),
    ColorStop::new(16.0, 0xd90000),
    ColorStop::new(17.0, 0xd90040),
    ColorStop::new(18.0, 0xd90060),
    ColorStop::new(19.0, 0xae0080),
    ColorStop::new(20.0, 0x8300a0),
    ColorStop::new(21.0, 0x5700c0),
    ColorStop::new(25.0, 0x0000d0),
    ColorStop::new(30.0, 0x000000),
];

/// Current speed, knots.
const CURRENT_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 0xd90000),
    ColorStop::new(1.0, 0xd92a00),
    ColorStop::new(2.0, 0xd96e00),
    ColorStop::new(3.0, 0xd9b200),
    ColorStop::new(4.0, 0xd4d404),
    ColorStop::new(5.0, 0xa6d906),
    ColorStop::new(7.0, 0x06d9a0),
    ColorStop::new(9.0, 0x00d9b0),
    ColorStop::new(12.0, 0x00d9c0),
    ColorStop::new(15.0, 0x00aed0),
    ColorStop::new(18.0, 0x0083e0),
    ColorStop::new(21.0, 0x0057e0),
    ColorStop::new(24.0, 0x0000f0),
    ColorStop::new(27.0, 0x0400f0),
    ColorStop::new(30.0, 0x1c00f0),
    ColorStop::new(36.0, 0x4800f0),
    ColorStop::new(42.0, 0x6900f0),
    ColorStop::new(48.0, 0xa000f0),
    ColorStop::new(56.0, 0xf000f0),
];

/// Sea level pressure, hPa.
const PRESSURE_STOPS: &[ColorStop] = &[
    ColorStop::new(900.0, 0x283282),
    ColorStop::new(980.0, 0x273c8c),
    ColorStop::new(990.0, 0x264696),
    ColorStop::new(1000.0, 0x2350a0),
    ColorStop::new(1001.0, 0x1f5aaa),
    ColorStop::new(1002.0, 0x1a64b4),
    ColorStop::new(1003.0, 0x136ec8),
    ColorStop::new(1004.0, 0x0c78e1),
    ColorStop::new(1005.0, 0x0382e6),
    ColorStop::new(1006.0, 0x0091e6),
    ColorStop::new(1007.0, 0x009ee1),
    ColorStop::new(1008.0, 0x00a6dc),
    ColorStop::new(1009.0, 0x00b2d7),
    ColorStop::new(1010.0, 0x00bed2),
    ColorStop::new(1011.0, 0x28c8c8),
    ColorStop::new(1012.0, 0x78d2aa),
    ColorStop::new(1013.0, 0x8cdc78),
    ColorStop::new(1014.0, 0xa0eb5f),
    ColorStop::new(1015.0, 0xc8f550),
    ColorStop::new(1016.0, 0xf3fb02),
    ColorStop::new(1017.0, 0xffed00),
    ColorStop::new(1018.0, 0xffdd00),
    ColorStop::new(1019.0, 0xffc900),
    ColorStop::new(1020.0, 0xffab00),
    ColorStop::new(1021.0, 0xff8100),
    ColorStop::new(1022.0, 0xf1780c),
    ColorStop::new(1024.0, 0xe26a23),
    ColorStop::new(1028.0, 0xd5453c),
    ColorStop::new(1040.0, 0xb53c59),
];

/// Sea surface temperature, °C.
const SEA_TEMPERATURE_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 0x0000d9),
    ColorStop::new(3.0, 0x002ad9),
    ColorStop::new(6.0, 0x006ed9),
    ColorStop::new(9.0, 0x00b2d9),
    ColorStop::new(12.0, 0x00d4d4),
    ColorStop::new(15.0, 0x00d9a6),
    ColorStop::new(18.0, 0x00d900),
    ColorStop::new(20.0, 0x95d900),
    ColorStop::new(22.0, 0xd9d900),
    ColorStop::new(23.0, 0xd9ae00),
    ColorStop::new(24.0, 0xd98300),
    ColorStop::new(25.0, 0xd95700),
    ColorStop::new(26.0, 0xd90000),
    ColorStop::new(27.0, 0xae0000),
    ColorStop::new(28.0, 0x8c0000),
    ColorStop::new(29.0, 0x870000),
    ColorStop::new(30.0, 0x690000),
    ColorStop::new(32.0, 0x550000),
    ColorStop::new(35.0, 0x410000),
];

/// Piecewise linear color ramp over strictly increasing stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGradient {
    stops: Cow<'static, [ColorStop]>,
}

impl ColorGradient {
    /// Build a gradient from custom stops.
    ///
    /// Needs at least two stops with finite, strictly increasing values.
    pub fn new(stops: Vec<ColorStop>) -> ClimResult<Self> {
        if stops.len() < 2 {
            return Err(ClimError::Config(format!(
                "color gradient needs at least 2 stops, got {}",
                stops.len()
            )));
        }
        if stops.iter().any(|s| !s.value.is_finite()) {
            return Err(ClimError::Config("color stop values must be finite".into()));
        }
        if let Some(pair) = stops.windows(2).find(|w| w[1].value <= w[0].value) {
            return Err(ClimError::Config(format!(
                "color stops must increase: {} is followed by {}",
                pair[0].value, pair[1].value
            )));
        }
        Ok(Self {
            stops: Cow::Owned(stops),
        })
    }

    /// The built-in ramp of a domain.
    pub fn for_domain(domain: Domain) -> Self {
        let stops = match domain {
            Domain::Wind => WIND_STOPS,
            Domain::Current => CURRENT_STOPS,
            Domain::Pressure => PRESSURE_STOPS,
            Domain::SeaTemperature => SEA_TEMPERATURE_STOPS,
        };
        Self {
            stops: Cow::Borrowed(stops),
        }
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    /// Color of `value`.
    ///
    /// Values outside the stops take the nearest end color and NaN takes
    /// the first stop's color.
    pub fn color(&self, value: f64) -> Rgb {
        let stops = &self.stops;
        if value.is_nan() {
            return stops[0].color;
        }

        let last = stops.len() - 1;
        let upper = (1..=last).find(|&i| stops[i].value > value).unwrap_or(last);
        let (a, b) = (stops[upper - 1], stops[upper]);
        let d = ((value - a.value) / (b.value - a.value)).clamp(0.0, 1.0);
        a.color.lerp(b.color, d)
    }

    /// RGBA color for rasters: transparent for NaN.
    pub fn color_rgba(&self, value: f64, alpha: u8) -> Rgba<u8> {
        if value.is_nan() {
            return Rgba([0, 0, 0, 0]);
        }
        let c = self.color(value);
        Rgba([c.r, c.g, c.b, alpha])
    }
}

/// Horizontal pixels per degree of longitude in the overlay raster.
pub fn raster_scale(domain: Domain) -> f64 {
    match domain {
        Domain::Wind => 2.0,
        Domain::Pressure => 0.5,
        _ => 1.0,
    }
}

/// Latitude of a raster row with rows spaced evenly in Mercator `y`.
///
/// Row 0 is the northern edge; the raster spans about ±85.05°.
pub fn mercator_row_latitude(row: u32, height: u32) -> f64 {
    let y = PI * (1.0 - 2.0 * row as f64 / height as f64);
    2.0 * y.exp().atan().to_degrees() - 90.0
}

/// Render a domain over the whole globe.
///
/// The raster is `scale·360 + 1` pixels wide so that both 0° and 360°
/// have a column. `sampler` returns the value at `(lat, lon)`; NaN pixels
/// are fully transparent.
pub fn render_overlay_raster<F>(domain: Domain, gradient: &ColorGradient, mut sampler: F) -> RgbaImage
where
    F: FnMut(f64, f64) -> f64,
{
    let scale = raster_scale(domain);
    let width = (scale * 360.0) as u32 + 1;
    let height = (scale * 360.0) as u32;

    let mut img = RgbaImage::new(width, height);
    let mut empty = 0usize;
    for y in 0..height {
        let lat = mercator_row_latitude(y, height);
        for x in 0..width {
            let lon = x as f64 / scale;
            let v = sampler(lat, lon);
            if v.is_nan() {
                empty += 1;
            }
            img.put_pixel(x, y, gradient.color_rgba(v, OVERLAY_ALPHA));
        }
    }

    debug!(
        domain = %domain,
        width,
        height,
        transparent = empty,
        "Rendered overlay raster"
    );
    img
}
