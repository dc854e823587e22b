//! Isoline extraction using the marching squares algorithm.
//!
//! Fields are sampled on a regular lat/lon lattice. Contours are traced in
//! grid coordinates (`x` = column, `y` = row) and converted to geographic
//! points at the end. A cyclic field also contours the cell between its
//! last and first column, so lines cross the 0°/360° seam without a gap.

use std::collections::{HashMap, VecDeque};

use clim_common::{positive_degrees, ClimError, ClimResult, GeoTransform, Viewport};
use serde::Serialize;

/// Endpoint matching tolerance, in grid units.
const KEY_TOLERANCE: f64 = 1e-6;

/// A point in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A line segment between two points
#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A chained contour in grid coordinates.
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f64,
    pub points: Vec<Point>,
    /// Closed contours repeat their first point at the end.
    pub closed: bool,
}

/// Placement of a sampled field on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldGeometry {
    /// Latitude of row 0.
    pub lat0: f64,
    /// Latitude change per row, negative for north-to-south rows.
    pub lat_step: f64,
    /// Longitude of column 0.
    pub lon0: f64,
    pub lon_step: f64,
}

impl FieldGeometry {
    /// Lattice of cell centers covering the globe, north to south.
    pub fn global(rows: usize, cols: usize) -> Self {
        let lat_step = 180.0 / rows as f64;
        let lon_step = 360.0 / cols as f64;
        Self {
            lat0: 90.0 - lat_step / 2.0,
            lat_step: -lat_step,
            lon0: lon_step / 2.0,
            lon_step,
        }
    }

    pub fn latitude(&self, row: f64) -> f64 {
        self.lat0 + row * self.lat_step
    }

    pub fn longitude(&self, col: f64) -> f64 {
        positive_degrees(self.lon0 + col * self.lon_step)
    }

    pub fn to_geo(&self, p: Point) -> GeoPoint {
        GeoPoint {
            lat: self.latitude(p.y),
            lon: self.longitude(p.x),
        }
    }
}

/// A row-major grid of samples ready for contouring.
#[derive(Debug, Clone)]
pub struct SampledField {
    values: Vec<f64>,
    width: usize,
    height: usize,
    cyclic: bool,
    geometry: FieldGeometry,
}

impl SampledField {
    pub fn new(
        values: Vec<f64>,
        width: usize,
        height: usize,
        cyclic: bool,
        geometry: FieldGeometry,
    ) -> ClimResult<Self> {
        if width < 2 || height < 2 {
            return Err(ClimError::malformed(format!(
                "contour field must be at least 2x2, got {}x{}",
                width, height
            )));
        }
        if values.len() != width * height {
            return Err(ClimError::malformed(format!(
                "contour field has {} values, expected {}x{}",
                values.len(),
                width,
                height
            )));
        }
        Ok(Self {
            values,
            width,
            height,
            cyclic,
            geometry,
        })
    }

    /// Sample `f(lat, lon)` at every lattice point of `geometry`.
    pub fn sample<F>(width: usize, height: usize, cyclic: bool, geometry: FieldGeometry, mut f: F) -> ClimResult<Self>
    where
        F: FnMut(f64, f64) -> f64,
    {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            let lat = geometry.latitude(y as f64);
            for x in 0..width {
                values.push(f(lat, geometry.longitude(x as f64)));
            }
        }
        Self::new(values, width, height, cyclic, geometry)
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[y * self.width + x]
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    pub fn geometry(&self) -> &FieldGeometry {
        &self.geometry
    }

    /// Smallest and largest non-NaN sample.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    fn wrap_width(&self) -> Option<usize> {
        self.cyclic.then_some(self.width)
    }
}

/// Levels from `min` to `max` inclusive, `spacing` apart.
///
/// Empty when the spacing is not positive or the bounds are reversed.
pub fn generate_levels(min: f64, max: f64, spacing: f64) -> Vec<f64> {
    if !(spacing > 0.0) || !min.is_finite() || !max.is_finite() || min > max {
        return Vec::new();
    }
    let count = ((max - min) / spacing + 1e-9).floor() as usize;
    (0..=count).map(|i| min + i as f64 * spacing).collect()
}

/// Fraction of the way from `a` to `b` where `level` is crossed.
fn crossing(a: f64, b: f64, level: f64) -> f64 {
    if a == b {
        0.5
    } else {
        ((level - a) / (b - a)).clamp(0.0, 1.0)
    }
}

/// Run marching squares for one level.
///
/// Corners at or above `level` count as inside. Cells with a NaN corner
/// are skipped. Saddle cells are resolved by the average of the four
/// corners: when it is at or above `level` the two inside corners are
/// connected through the cell center.
pub fn march_squares(field: &SampledField, level: f64) -> Vec<Segment> {
    let mut segments = Vec::new();
    let cols = if field.cyclic { field.width } else { field.width - 1 };
    let wrap = |p: Point| {
        if field.cyclic && p.x >= field.width as f64 {
            Point::new(p.x - field.width as f64, p.y)
        } else {
            p
        }
    };

    for y in 0..field.height - 1 {
        for x in 0..cols {
            let x1 = (x + 1) % field.width;
            let tl = field.get(x, y);
            let tr = field.get(x1, y);
            let br = field.get(x1, y + 1);
            let bl = field.get(x, y + 1);

            if tl.is_nan() || tr.is_nan() || br.is_nan() || bl.is_nan() {
                continue;
            }

            let mut case = 0u8;
            if tl >= level {
                case |= 1;
            }
            if tr >= level {
                case |= 2;
            }
            if br >= level {
                case |= 4;
            }
            if bl >= level {
                case |= 8;
            }
            if case == 0 || case == 15 {
                continue;
            }

            let (xf, yf) = (x as f64, y as f64);
            let top = wrap(Point::new(xf + crossing(tl, tr, level), yf));
            let bottom = wrap(Point::new(xf + crossing(bl, br, level), yf + 1.0));
            let left = Point::new(xf, yf + crossing(tl, bl, level));
            let right = wrap(Point::new(xf + 1.0, yf + crossing(tr, br, level)));

            let mut push = |start, end| segments.push(Segment { start, end });
            let center_inside = (tl + tr + br + bl) / 4.0 >= level;

            match case {
                1 | 14 => push(left, top),
                2 | 13 => push(top, right),
                3 | 12 => push(left, right),
                4 | 11 => push(right, bottom),
                6 | 9 => push(top, bottom),
                7 | 8 => push(left, bottom),
                5 if center_inside => {
                    push(top, right);
                    push(left, bottom);
                }
                5 => {
                    push(left, top);
                    push(right, bottom);
                }
                10 if center_inside => {
                    push(left, top);
                    push(right, bottom);
                }
                10 => {
                    push(top, right);
                    push(left, bottom);
                }
                _ => {}
            }
        }
    }

    segments
}

type EndpointKey = (i64, i64);

fn endpoint_key(p: Point, wrap: Option<usize>) -> EndpointKey {
    let mut x = (p.x / KEY_TOLERANCE).round() as i64;
    if let Some(width) = wrap {
        x = x.rem_euclid((width as f64 / KEY_TOLERANCE).round() as i64);
    }
    (x, (p.y / KEY_TOLERANCE).round() as i64)
}

/// Segment endpoints indexed for chaining.
struct SegmentIndex<'a> {
    segments: &'a [Segment],
    ends: HashMap<EndpointKey, Vec<usize>>,
    used: Vec<bool>,
    wrap: Option<usize>,
}

impl<'a> SegmentIndex<'a> {
    fn new(segments: &'a [Segment], wrap: Option<usize>) -> Self {
        let mut ends: HashMap<EndpointKey, Vec<usize>> = HashMap::new();
        let mut used = vec![false; segments.len()];
        for (i, s) in segments.iter().enumerate() {
            let (a, b) = (endpoint_key(s.start, wrap), endpoint_key(s.end, wrap));
            if a == b {
                // zero length, nothing to draw
                used[i] = true;
                continue;
            }
            ends.entry(a).or_default().push(i);
            ends.entry(b).or_default().push(i);
        }
        Self {
            segments,
            ends,
            used,
            wrap,
        }
    }

    fn key(&self, p: Point) -> EndpointKey {
        endpoint_key(p, self.wrap)
    }

    /// Take an unused segment touching `at` and return its far end.
    fn take_next(&mut self, at: Point) -> Option<Point> {
        let key = self.key(at);
        let candidates = self.ends.get(&key)?;
        let next = candidates.iter().copied().find(|&j| !self.used[j])?;
        self.used[next] = true;
        let s = self.segments[next];
        if self.key(s.start) == key {
            Some(s.end)
        } else {
            Some(s.start)
        }
    }
}

/// Chain segments that share endpoints into polylines.
///
/// `wrap` is the column count of a cyclic field, so endpoints on column
/// `0` and column `wrap` match.
pub fn connect_segments(segments: &[Segment], level: f64, wrap: Option<usize>) -> Vec<Contour> {
    let mut index = SegmentIndex::new(segments, wrap);
    let mut contours = Vec::new();

    for i in 0..segments.len() {
        if index.used[i] {
            continue;
        }
        index.used[i] = true;

        let first = index.key(segments[i].start);
        let mut chain = VecDeque::from([segments[i].start, segments[i].end]);
        let mut closed = false;

        while let Some(&tail) = chain.back() {
            let Some(next) = index.take_next(tail) else {
                break;
            };
            chain.push_back(next);
            if index.key(next) == first {
                closed = true;
                break;
            }
        }

        if !closed {
            while let Some(&head) = chain.front() {
                let Some(prev) = index.take_next(head) else {
                    break;
                };
                chain.push_front(prev);
            }
        }

        contours.push(Contour {
            level,
            points: chain.into_iter().collect(),
            closed,
        });
    }

    contours
}

/// Trace every contour of one level in grid coordinates.
pub fn trace_contours(field: &SampledField, level: f64) -> Vec<Contour> {
    let segments = march_squares(field, level);
    connect_segments(&segments, level, field.wrap_width())
}

/// A geographic point, longitude in `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPolyline {
    pub points: Vec<GeoPoint>,
    pub closed: bool,
}

/// All lines of one threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IsoLine {
    pub value: f64,
    pub polylines: Vec<GeoPolyline>,
}

impl IsoLine {
    /// Trace `level` over `field` and place the result on the globe.
    pub fn build(field: &SampledField, level: f64) -> Self {
        let geometry = field.geometry;
        let polylines = trace_contours(field, level)
            .into_iter()
            .map(|c| GeoPolyline {
                points: c.points.into_iter().map(|p| geometry.to_geo(p)).collect(),
                closed: c.closed,
            })
            .collect();
        Self { value: level, polylines }
    }

    pub fn point_count(&self) -> usize {
        self.polylines.iter().map(|p| p.points.len()).sum()
    }

    pub fn label_text(&self) -> String {
        format!("{:.0}", self.value)
    }
}

/// Where to draw a value label along an isoline, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelAnchor {
    pub x: f64,
    pub y: f64,
    pub value: f64,
    pub text: String,
}

/// Spread labels along each polyline roughly every `density` pixels.
///
/// Lines are projected with the host transform; steps that jump across the
/// longitude seam break the line, and anchors outside the viewport are
/// dropped.
pub fn label_anchors(
    isoline: &IsoLine,
    transform: &dyn GeoTransform,
    viewport: &Viewport,
    density: f64,
) -> Vec<LabelAnchor> {
    let mut anchors = Vec::new();
    if !(density > 0.0) {
        return anchors;
    }
    let text = isoline.label_text();
    let (w, h) = (viewport.pixel_width as f64, viewport.pixel_height as f64);

    for line in &isoline.polylines {
        for run in split_at_seam(&line.points) {
            let pixels: Vec<(f64, f64)> = run.iter().map(|p| transform.geo_to_pixel(p.lat, p.lon)).collect();
            let lengths: Vec<f64> = pixels
                .windows(2)
                .map(|s| (s[1].0 - s[0].0).hypot(s[1].1 - s[0].1))
                .collect();
            let total: f64 = lengths.iter().sum();
            if total < density * 0.5 {
                continue;
            }

            let count = ((total / density).floor() as usize).max(1);
            let spacing = total / (count as f64 + 1.0);
            let mut walked = 0.0;
            let mut next_at = spacing;
            let mut placed = 0;

            for (seg, &len) in lengths.iter().enumerate() {
                while placed < count && walked + len >= next_at && len > 0.0 {
                    let t = (next_at - walked) / len;
                    let (x0, y0) = pixels[seg];
                    let (x1, y1) = pixels[seg + 1];
                    let (x, y) = (x0 + t * (x1 - x0), y0 + t * (y1 - y0));
                    if (0.0..=w).contains(&x) && (0.0..=h).contains(&y) {
                        anchors.push(LabelAnchor {
                            x,
                            y,
                            value: isoline.value,
                            text: text.clone(),
                        });
                    }
                    placed += 1;
                    next_at += spacing;
                }
                walked += len;
            }
        }
    }

    anchors
}

/// Split a polyline where consecutive points are more than 180° apart.
fn split_at_seam(points: &[GeoPoint]) -> Vec<&[GeoPoint]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..points.len() {
        if (points[i].lon - points[i - 1].lon).abs() > 180.0 {
            runs.push(&points[start..i]);
            start = i;
        }
    }
    if start < points.len() {
        runs.push(&points[start..]);
    }
    runs.retain(|r| r.len() >= 2);
    runs
}
