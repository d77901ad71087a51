//! Glyph outline data consumed by the rasterizer.
//!
//! Contours are closed sequences of points laid out as
//! `[on, ctrl, on, ctrl, …]`. Segment `j` is the quadratic Bezier
//! `(p[2j], p[2j+1], p[(2j+2) % n])`, so a contour of `2k` points holds
//! `k` segments and the last control point leads back to `p[0]`.
//!
//! All coordinates are in font units with Y growing upward.

use std::collections::HashMap;

/// Bounding box and advance of a glyph, in font units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphMetrics {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
    pub advance_width: f32,
}

impl GlyphMetrics {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32, advance_width: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            advance_width,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Vertical metrics shared by every glyph of a font, in font units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontMetrics {
    /// Nominal line height. `font_height(scale)` is derived from this.
    pub line_height: f32,
    /// Vertical distance between atlas rows when packing wraps.
    pub line_pitch: f32,
}

/// Closed contours plus metrics for one glyph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphOutline {
    pub contours: Vec<Vec<[f32; 2]>>,
    pub metrics: GlyphMetrics,
}

impl GlyphOutline {
    /// Number of quadratic segments across all contours.
    pub fn segment_count(&self) -> usize {
        self.contours.iter().map(|c| c.len() / 2).sum()
    }
}

/// Lookup from character to outline. Absence is a normal outcome.
pub trait OutlineSource {
    fn font_metrics(&self) -> FontMetrics;

    fn glyph(&self, c: char) -> Option<GlyphOutline>;
}

/// In-memory outline table, for procedurally defined glyphs and tests.
#[derive(Clone, Debug)]
pub struct OutlineMap {
    metrics: FontMetrics,
    glyphs: HashMap<char, GlyphOutline>,
}

impl OutlineMap {
    pub fn new(metrics: FontMetrics) -> Self {
        Self {
            metrics,
            glyphs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, c: char, outline: GlyphOutline) {
        self.glyphs.insert(c, outline);
    }

    pub fn with_glyph(mut self, c: char, outline: GlyphOutline) -> Self {
        self.insert(c, outline);
        self
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl OutlineSource for OutlineMap {
    fn font_metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn glyph(&self, c: char) -> Option<GlyphOutline> {
        self.glyphs.get(&c).cloned()
    }
}

/// Build a closed contour of straight edges from polygon corners.
///
/// Each edge becomes a quadratic whose control point is the edge
/// midpoint, which keeps the flattened samples on the straight line.
pub fn polygon_contour(corners: &[[f32; 2]]) -> Vec<[f32; 2]> {
    let n = corners.len();
    let mut contour = Vec::with_capacity(n * 2);
    for (i, &a) in corners.iter().enumerate() {
        let b = corners[(i + 1) % n];
        contour.push(a);
        contour.push(midpoint(a, b));
    }
    contour
}

pub(crate) fn midpoint(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5]
}

// ===================================================================
// Tests
// ===================================================================
