//! Color ramps, isolines and value labels for the climatology overlay.
//!
//! Nothing here draws on a chart. The modules produce colors, RGBA
//! buffers and geographic polylines for the host to display:
//! - Color gradients and the Mercator overlay raster
//! - Isolines (marching squares) and their per-month cache
//! - Pre-rendered value label glyphs

pub mod contour;
pub mod gradient;
pub mod isoline_cache;
pub mod label_cache;

pub use contour::{label_anchors, FieldGeometry, GeoPoint, GeoPolyline, IsoLine, LabelAnchor, SampledField};
pub use gradient::{render_overlay_raster, ColorGradient, ColorStop};
pub use isoline_cache::{IsoLineCache, IsoLineSettings};
pub use label_cache::{FontRasterizer, GlyphKey, LabelGlyph, LabelGlyphCache, TextRasterizer};
