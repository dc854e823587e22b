//! Bounded cache of pre-rendered value labels.
//!
//! A glyph is black text on a white box with five pixels of horizontal
//! and one pixel of vertical padding. Alpha is the inverted brightness, so
//! the white box vanishes when blended and the text stays opaque.

use std::num::NonZeroUsize;
use std::sync::Arc;

use clim_common::{ClimError, ClimResult};
use image::{Rgb as RgbPixel, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use lru::LruCache;
use rusttype::{point, Font, Scale};
use tracing::debug;

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

const PAD_X: u32 = 5;
const PAD_Y: u32 = 1;

pub const DEFAULT_GLYPH_CAPACITY: usize = 256;
pub const NOT_AVAILABLE_TEXT: &str = "N/A";

/// Turns label text into black-on-white pixels.
pub trait TextRasterizer {
    /// Render `text` tightly: white background, dark text.
    fn render(&self, text: &str) -> RgbImage;
}

/// Rasterizer backed by the embedded monospace font.
pub struct FontRasterizer {
    font: Font<'static>,
    scale: Scale,
}

impl FontRasterizer {
    pub fn new(font_size: f32) -> ClimResult<Self> {
        let font = Font::try_from_bytes(FONT_DATA)
            .ok_or_else(|| ClimError::malformed("embedded label font could not be parsed"))?;
        Ok(Self {
            font,
            scale: Scale::uniform(font_size),
        })
    }

    fn measure(&self, text: &str) -> (u32, u32) {
        let v = self.font.v_metrics(self.scale);
        let width = self
            .font
            .layout(text, self.scale, point(0.0, v.ascent))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0);
        (width.ceil().max(1.0) as u32, (v.ascent - v.descent).ceil().max(1.0) as u32)
    }
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer").field("scale", &self.scale.y).finish()
    }
}

impl TextRasterizer for FontRasterizer {
    fn render(&self, text: &str) -> RgbImage {
        let (w, h) = self.measure(text);
        let mut img = RgbImage::from_pixel(w, h, RgbPixel([255, 255, 255]));
        draw_text_mut(&mut img, RgbPixel([0, 0, 0]), 0, 0, self.scale, &self.font, text);
        img
    }
}

/// Canonical cache key: the value rounded to a whole number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphKey {
    Value(i64),
    NotAvailable,
}

impl GlyphKey {
    pub fn for_value(value: f64) -> Self {
        if value.is_nan() {
            GlyphKey::NotAvailable
        } else {
            // `as` saturates infinities
            GlyphKey::Value(value.round() as i64)
        }
    }

    pub fn text(self) -> String {
        match self {
            GlyphKey::Value(v) => v.to_string(),
            GlyphKey::NotAvailable => NOT_AVAILABLE_TEXT.to_string(),
        }
    }
}

/// A rendered label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelGlyph {
    pub key: GlyphKey,
    pub text: String,
    pub pixels: RgbaImage,
}

impl LabelGlyph {
    /// Pad rendered text and derive alpha from brightness.
    pub fn from_text_image(key: GlyphKey, text: String, rendered: &RgbImage) -> Self {
        let width = rendered.width() + 2 * PAD_X;
        let height = rendered.height() + 2 * PAD_Y;
        let mut pixels = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0]));

        for (x, y, p) in rendered.enumerate_pixels() {
            let [r, g, b] = p.0;
            let mean = (r as u32 + g as u32 + b as u32) / 3;
            pixels.put_pixel(x + PAD_X, y + PAD_Y, Rgba([r, g, b, 255 - mean as u8]));
        }

        Self { key, text, pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// LRU cache of label glyphs.
pub struct LabelGlyphCache<R = FontRasterizer> {
    rasterizer: R,
    glyphs: LruCache<GlyphKey, Arc<LabelGlyph>>,
}

impl LabelGlyphCache<FontRasterizer> {
    /// Cache using the embedded font.
    pub fn with_font(font_size: f32, capacity: usize) -> ClimResult<Self> {
        Ok(Self::new(FontRasterizer::new(font_size)?, capacity))
    }
}

impl<R: TextRasterizer> LabelGlyphCache<R> {
    /// `capacity` of zero is treated as one.
    pub fn new(rasterizer: R, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            rasterizer,
            glyphs: LruCache::new(capacity),
        }
    }

    /// The glyph for `value`, rendering it on a miss.
    pub fn get(&mut self, value: f64) -> Arc<LabelGlyph> {
        let key = GlyphKey::for_value(value);
        if let Some(glyph) = self.glyphs.get(&key) {
            return Arc::clone(glyph);
        }

        let text = key.text();
        let rendered = self.rasterizer.render(&text);
        let glyph = Arc::new(LabelGlyph::from_text_image(key, text, &rendered));
        debug!(text = %glyph.text, width = glyph.width(), height = glyph.height(), "Rendered label glyph");
        self.glyphs.put(key, Arc::clone(&glyph));
        glyph
    }

    pub fn contains(&self, value: f64) -> bool {
        self.glyphs.contains(&GlyphKey::for_value(value))
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.glyphs.cap().get()
    }

    pub fn clear(&mut self) {
        self.glyphs.clear();
    }
}

impl<R> std::fmt::Debug for LabelGlyphCache<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelGlyphCache")
            .field("len", &self.glyphs.len())
            .field("capacity", &self.glyphs.cap())
            .finish()
    }
}
