//! Glyph rasterizer: scanline fill of quadratic outlines into the atlas.
//!
//! Per glyph:
//!
//! 1. Place the scaled bounding box at the pen (wrapping rows if needed).
//! 2. Flatten every quadratic segment and tag each sample: segments
//!    running down the bitmap mark span starts (first writer wins),
//!    segments running up or flat mark span ends (last writer wins).
//! 3. Sweep each row left to right, toggling `inside` on the markers and
//!    filling covered cells. A cell directly below a filled cell is
//!    filled too, which closes gaps on near-horizontal edges where no
//!    sample landed on the row.
//!
//! Font units are Y-up and are written to the bitmap unflipped, so glyphs
//! are stored upside down. Text layout flips them back when building quads.

use std::collections::HashMap;
use std::time::Instant;

use thiserror::Error;

use crate::atlas::{AtlasPen, AtlasRect, CoverageBitmap, EMPTY, FILLED, SPAN_END, SPAN_START};
use crate::layout::TextLayout;
use crate::outline::{FontMetrics, GlyphMetrics, GlyphOutline, OutlineSource};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    #[error("Glyph `{character}` does not fit in the {size}×{size} atlas")]
    AtlasFull { character: char, size: u32 },
    #[error("Invalid raster configuration: {0}")]
    InvalidConfig(String),
}

// ── Configuration ───────────────────────────────────────────────────

/// Atlas build parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterConfig {
    /// Width = height of the atlas in pixels.
    pub atlas_size: u32,
    /// Font units → atlas pixels.
    pub font_scale: f32,
    /// Characters to rasterize, in packing order.
    pub charset: Vec<char>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            atlas_size: 2048,
            font_scale: 0.1,
            charset: ('!'..='~').collect(),
        }
    }
}

impl RasterConfig {
    pub fn with_atlas_size(mut self, size: u32) -> Self {
        self.atlas_size = size;
        self
    }

    pub fn with_font_scale(mut self, scale: f32) -> Self {
        self.font_scale = scale;
        self
    }

    pub fn with_charset(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.charset = chars.into_iter().collect();
        self
    }

    fn validate(&self) -> Result<(), RasterError> {
        if self.atlas_size == 0 {
            return Err(RasterError::InvalidConfig("atlas_size must be > 0".into()));
        }
        if !(self.font_scale.is_finite() && self.font_scale > 0.0) {
            return Err(RasterError::InvalidConfig(format!(
                "font_scale must be positive, got {}",
                self.font_scale
            )));
        }
        Ok(())
    }
}

// ── Records ─────────────────────────────────────────────────────────

/// Where a character lives in the atlas, plus its font-unit metrics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphRecord {
    pub character: char,
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
    /// Placed rectangle in atlas pixels.
    pub rect: AtlasRect,
    pub metrics: GlyphMetrics,
}

/// Result of an atlas build: the coverage bitmap and the glyph table.
#[derive(Clone, Debug)]
pub struct FontAtlas {
    bitmap: CoverageBitmap,
    layout: TextLayout,
}

impl FontAtlas {
    pub fn bitmap(&self) -> &CoverageBitmap {
        &self.bitmap
    }

    pub fn layout(&self) -> &TextLayout {
        &self.layout
    }

    pub fn into_parts(self) -> (CoverageBitmap, TextLayout) {
        (self.bitmap, self.layout)
    }
}

// ── Rasterizer ──────────────────────────────────────────────────────

pub struct GlyphRasterizer {
    config: RasterConfig,
    font: FontMetrics,
    bitmap: CoverageBitmap,
    pen: AtlasPen,
    records: HashMap<char, GlyphRecord>,
}

impl GlyphRasterizer {
    pub fn new(config: RasterConfig, font: FontMetrics) -> Result<Self, RasterError> {
        config.validate()?;
        let line_pitch = (font.line_pitch * config.font_scale) as i32;
        if line_pitch < 1 {
            return Err(RasterError::InvalidConfig(format!(
                "line pitch {} × scale {} is under one pixel",
                font.line_pitch, config.font_scale
            )));
        }
        let bitmap = CoverageBitmap::new(config.atlas_size, config.atlas_size);
        let pen = AtlasPen::new((font.line_height * config.font_scale) as i32, line_pitch);
        Ok(Self {
            config,
            font,
            bitmap,
            pen,
            records: HashMap::new(),
        })
    }

    /// Rasterize every character of `config.charset` found in `source`.
    ///
    /// Spaces are skipped (measured, never drawn); characters missing
    /// from the font are skipped with a warning.
    pub fn build<S>(source: &S, config: RasterConfig) -> Result<FontAtlas, RasterError>
    where
        S: OutlineSource + ?Sized,
    {
        let start = Instant::now();
        let charset = config.charset.clone();
        let mut rasterizer = Self::new(config, source.font_metrics())?;

        for c in charset {
            if c == ' ' {
                continue;
            }
            match source.glyph(c) {
                Some(outline) => {
                    rasterizer.rasterize(c, &outline)?;
                }
                None => log::warn!("Font has no glyph for {c:?}, skipping"),
            }
        }

        log::info!(
            "Rasterized {} glyphs into {}×{} atlas (pen at {},{}; {:.1}ms)",
            rasterizer.records.len(),
            rasterizer.bitmap.width(),
            rasterizer.bitmap.height(),
            rasterizer.pen.x,
            rasterizer.pen.y,
            start.elapsed().as_secs_f64() * 1000.0,
        );

        Ok(rasterizer.finish())
    }

    pub fn bitmap(&self) -> &CoverageBitmap {
        &self.bitmap
    }

    pub fn pen(&self) -> AtlasPen {
        self.pen
    }

    pub fn record(&self, c: char) -> Option<&GlyphRecord> {
        self.records.get(&c)
    }

    /// Place, scan-fill and record one glyph, then advance the pen.
    ///
    /// A character that was already rasterized is left untouched. On
    /// `AtlasFull` nothing changes, the pen included.
    pub fn rasterize(
        &mut self,
        c: char,
        outline: &GlyphOutline,
    ) -> Result<GlyphRecord, RasterError> {
        if let Some(existing) = self.records.get(&c) {
            log::debug!("Glyph {c:?} already in atlas");
            return Ok(*existing);
        }

        let s = self.config.font_scale;
        let m = outline.metrics;
        let rect = self
            .pen
            .place([m.min_x * s, m.min_y * s], [m.max_x * s, m.max_y * s], &self.bitmap)
            .ok_or(RasterError::AtlasFull {
                character: c,
                size: self.config.atlas_size,
            })?;

        let (uv_min, uv_max) = self.bitmap.rect_to_uv(&rect);
        let record = GlyphRecord {
            character: c,
            uv_min,
            uv_max,
            rect,
            metrics: m,
        };
        self.records.insert(c, record);

        for contour in &outline.contours {
            self.mark_contour(contour, s);
        }
        self.fill_rows(&rect);

        self.pen.advance((m.advance_width * s) as i32);
        Ok(record)
    }

    pub fn finish(self) -> FontAtlas {
        let layout = TextLayout::new(self.records, self.config.font_scale, self.font.line_height);
        FontAtlas {
            bitmap: self.bitmap,
            layout,
        }
    }

    fn mark_contour(&mut self, contour: &[[f32; 2]], scale: f32) {
        let n = contour.len();
        let scaled = |p: [f32; 2]| [p[0] * scale, p[1] * scale];

        for j in 0..n / 2 {
            let p0 = scaled(contour[2 * j]);
            let p1 = scaled(contour[2 * j + 1]);
            let p2 = scaled(contour[(2 * j + 2) % n]);

            let downward = p0[1] < p2[1];
            let resolution = segment_resolution(p0, p2);
            for i in 0..=resolution {
                let t = i as f32 / resolution as f32;
                let p = quad_bezier(p0, p1, p2, t);
                let x = self.pen.x + p[0] as i32;
                let y = self.pen.y + p[1] as i32;
                if downward {
                    if self.bitmap.get(x, y) == EMPTY {
                        self.bitmap.set(x, y, SPAN_START);
                    }
                } else {
                    self.bitmap.set(x, y, SPAN_END);
                }
            }
        }
    }

    fn fill_rows(&mut self, rect: &AtlasRect) {
        for y in rect.min_y..rect.max_y {
            let mut inside = false;
            for x in rect.min_x..rect.max_x {
                match self.bitmap.get(x, y) {
                    SPAN_START => inside = true,
                    SPAN_END => inside = false,
                    _ if self.bitmap.get(x, y - 1) == FILLED => self.bitmap.set(x, y, FILLED),
                    _ if inside => self.bitmap.set(x, y, FILLED),
                    _ => {}
                }
            }
        }
    }
}

/// Sample count for a segment: two per pixel of chord length, at least 1.
fn segment_resolution(p0: [f32; 2], p2: [f32; 2]) -> usize {
    let dx = p2[0] - p0[0];
    let dy = p2[1] - p0[1];
    ((dx * dx + dy * dy).sqrt() * 2.0).max(1.0) as usize
}

fn lerp(a: [f32; 2], b: [f32; 2], t: f32) -> [f32; 2] {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

/// Point on the quadratic Bezier `(a, b, c)` at `t`.
pub fn quad_bezier(a: [f32; 2], b: [f32; 2], c: [f32; 2], t: f32) -> [f32; 2] {
    lerp(lerp(a, b, t), lerp(b, c, t), t)
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{polygon_contour, OutlineMap};

    // Binary fractions keep scaled coordinates exact.
    const SCALE: f32 = 1.0 / 64.0;

    fn font() -> FontMetrics {
        FontMetrics {
            line_height: 1280.0, // 20 px
            line_pitch: 1536.0,  // 24 px
        }
    }

    /// 12×14 px box traced up the left side and down the right side.
    fn square() -> GlyphOutline {
        GlyphOutline {
            contours: vec![polygon_contour(&[
                [0.0, 0.0],
                [0.0, 896.0],
                [768.0, 896.0],
                [768.0, 0.0],
            ])],
            metrics: GlyphMetrics::new(0.0, 0.0, 768.0, 896.0, 832.0),
        }
    }

    fn triangle() -> GlyphOutline {
        GlyphOutline {
            contours: vec![polygon_contour(&[[0.0, 0.0], [384.0, 896.0], [768.0, 0.0]])],
            metrics: GlyphMetrics::new(0.0, 0.0, 768.0, 896.0, 832.0),
        }
    }

    fn config(size: u32) -> RasterConfig {
        RasterConfig::default()
            .with_atlas_size(size)
            .with_font_scale(SCALE)
    }

    #[test]
    fn test_quad_bezier_endpoints_and_midpoint() {
        let (a, b, c) = ([0.0, 0.0], [4.0, 8.0], [8.0, 0.0]);
        assert_eq!(quad_bezier(a, b, c, 0.0), a);
        assert_eq!(quad_bezier(a, b, c, 1.0), c);
        assert_eq!(quad_bezier(a, b, c, 0.5), [4.0, 4.0]);
    }

    #[test]
    fn test_segment_resolution_minimum_one() {
        assert_eq!(segment_resolution([3.0, 3.0], [3.0, 3.0]), 1);
        assert_eq!(segment_resolution([0.0, 0.0], [0.0, 14.0]), 28);
    }

    #[test]
    fn test_square_fill_exact() {
        let mut r = GlyphRasterizer::new(config(64), font()).unwrap();
        let record = r.rasterize('B', &square()).unwrap();
        assert_eq!(
            record.rect,
            AtlasRect {
                min_x: 0,
                min_y: 20,
                max_x: 12,
                max_y: 34
            }
        );

        let bitmap = r.bitmap();
        // Interior rows 21..34, columns 1..12 are filled.
        for y in 21..34 {
            assert_eq!(bitmap.get(0, y), SPAN_START, "row {y}");
            for x in 1..12 {
                assert_eq!(bitmap.get(x, y), FILLED, "({x},{y})");
            }
            assert_eq!(bitmap.get(12, y), SPAN_END, "row {y}");
        }
        // First row is all end markers from the flat edge.
        for x in 0..=12 {
            assert_eq!(bitmap.get(x, 20), SPAN_END);
        }
        // 13 rows × 11 columns, plus the solid texel.
        assert_eq!(bitmap.count(FILLED), 13 * 11 + 1);
    }

    #[test]
    fn test_rasterize_is_deterministic() {
        let mut a = GlyphRasterizer::new(config(64), font()).unwrap();
        let mut b = GlyphRasterizer::new(config(64), font()).unwrap();
        a.rasterize('A', &triangle()).unwrap();
        b.rasterize('A', &triangle()).unwrap();
        assert_eq!(a.bitmap(), b.bitmap());
        assert!(a.bitmap().count(FILLED) > 1);
    }

    #[test]
    fn test_marks_stay_inside_glyph_rect() {
        let mut r = GlyphRasterizer::new(config(64), font()).unwrap();
        let record = r.rasterize('A', &triangle()).unwrap();
        let bitmap = r.bitmap();
        for y in 0..64 {
            for x in 0..64 {
                if (x, y) == (0, 0) || bitmap.get(x, y) == EMPTY {
                    continue;
                }
                assert!(
                    x >= record.rect.min_x
                        && x <= record.rect.max_x
                        && y >= record.rect.min_y
                        && y <= record.rect.max_y,
                    "stray pixel at ({x},{y})"
                );
            }
        }
    }

    #[test]
    fn test_pen_advances_by_scaled_advance() {
        let mut r = GlyphRasterizer::new(config(64), font()).unwrap();
        r.rasterize('A', &triangle()).unwrap();
        assert_eq!(r.pen().x, 13);
        let second = r.rasterize('B', &square()).unwrap();
        assert_eq!(second.rect.min_x, 13);
        assert_eq!(r.pen().x, 26);
    }

    #[test]
    fn test_duplicate_character_not_redrawn() {
        let mut r = GlyphRasterizer::new(config(64), font()).unwrap();
        let first = r.rasterize('B', &square()).unwrap();
        let again = r.rasterize('B', &square()).unwrap();
        assert_eq!(first, again);
        assert_eq!(r.pen().x, 13);
    }

    #[test]
    fn test_wrap_at_fixed_line_pitch_without_overlap() {
        let mut outlines = OutlineMap::new(font());
        for c in 'a'..='f' {
            outlines.insert(c, square());
        }
        let atlas =
            GlyphRasterizer::build(&outlines, config(64).with_charset('a'..='f')).unwrap();
        let layout = atlas.layout();

        let rects: Vec<AtlasRect> = ('a'..='f').map(|c| layout.glyph(c).unwrap().rect).collect();
        let xs: Vec<i32> = rects.iter().map(|r| r.min_x).collect();
        assert_eq!(xs, vec![0, 13, 26, 39, 0, 13]);
        assert_eq!(rects[3].min_y, 20);
        assert_eq!(rects[4].min_y, 20 + 24);
        assert_eq!(rects[5].min_y, 20 + 24);

        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn test_atlas_full_is_an_error() {
        let mut outlines = OutlineMap::new(font());
        for c in 'a'..='z' {
            outlines.insert(c, square());
        }
        let result = GlyphRasterizer::build(&outlines, config(64).with_charset('a'..='z'));
        assert!(matches!(result, Err(RasterError::AtlasFull { size: 64, .. })));
    }

    #[test]
    fn test_build_skips_space_and_missing() {
        let outlines = OutlineMap::new(font()).with_glyph('B', square());
        let atlas = GlyphRasterizer::build(&outlines, config(64).with_charset([' ', 'B', 'Z']))
            .unwrap();
        let layout = atlas.layout();
        assert_eq!(layout.glyph_count(), 1);
        assert!(layout.glyph('B').is_some());
        assert!(layout.glyph(' ').is_none());
        assert!(layout.glyph('Z').is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            GlyphRasterizer::new(config(0), font()),
            Err(RasterError::InvalidConfig(_))
        ));
        assert!(matches!(
            GlyphRasterizer::new(config(64).with_font_scale(-1.0), font()),
            Err(RasterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_sub_pixel_line_pitch_rejected() {
        // 1536 units at 1/2048 is 0.75 px: wrapped rows would stack.
        let result = GlyphRasterizer::new(config(64).with_font_scale(1.0 / 2048.0), font());
        assert!(matches!(result, Err(RasterError::InvalidConfig(_))));
    }

    /// 8×14 px hook starting 2 px left of the origin, 7 px advance.
    fn hook() -> GlyphOutline {
        GlyphOutline {
            contours: vec![polygon_contour(&[
                [-128.0, 0.0],
                [-128.0, 896.0],
                [384.0, 896.0],
                [384.0, 0.0],
            ])],
            metrics: GlyphMetrics::new(-128.0, 0.0, 384.0, 896.0, 448.0),
        }
    }

    #[test]
    fn test_negative_bearing_first_glyph() {
        let outlines = OutlineMap::new(font()).with_glyph('j', hook());
        let atlas = GlyphRasterizer::build(&outlines, config(256).with_charset(['j'])).unwrap();
        let record = atlas.layout().glyph('j').unwrap();
        assert_eq!(record.rect.min_x, 0);
        assert_eq!(record.rect.max_x, 8);
        assert!(atlas.bitmap().count(FILLED) > 1);
    }

    #[test]
    fn test_negative_bearing_glyph_after_square() {
        let outlines = OutlineMap::new(font())
            .with_glyph('a', square())
            .with_glyph('j', hook());
        let atlas =
            GlyphRasterizer::build(&outlines, config(64).with_charset(['a', 'j'])).unwrap();
        let a = atlas.layout().glyph('a').unwrap().rect;
        let j = atlas.layout().glyph('j').unwrap().rect;
        assert_eq!(j.min_x, a.max_x);
        assert!(!a.overlaps(&j));
    }

    #[test]
    fn test_negative_bearing_glyph_wraps() {
        let mut outlines = OutlineMap::new(font());
        for c in 'a'..='d' {
            outlines.insert(c, square());
        }
        outlines.insert('j', hook());
        // Four squares end at x = 51; the hook needs 51..59 and the atlas is 59 wide.
        let charset = ['a', 'b', 'c', 'd', 'j'];
        let atlas = GlyphRasterizer::build(&outlines, config(59).with_charset(charset)).unwrap();
        let layout = atlas.layout();

        let j = layout.glyph('j').unwrap();
        assert_eq!(j.rect.min_x, 0);
        assert_eq!(j.rect.min_y, 20 + 24);
        for c in 'a'..='d' {
            assert!(!j.rect.overlaps(&layout.glyph(c).unwrap().rect));
        }
    }

    #[test]
    fn test_atlas_full_leaves_pen_in_place() {
        let mut r = GlyphRasterizer::new(config(64), font()).unwrap();
        for c in 'a'..='h' {
            r.rasterize(c, &square()).unwrap();
        }
        let before = r.pen();
        let bitmap = r.bitmap().clone();

        let result = r.rasterize('i', &square());
        assert!(matches!(result, Err(RasterError::AtlasFull { character: 'i', .. })));
        assert_eq!(r.pen(), before);
        assert_eq!(r.bitmap(), &bitmap);
        assert!(r.record('i').is_none());
    }

    #[test]
    fn test_uvs_normalized() {
        let mut r = GlyphRasterizer::new(config(64), font()).unwrap();
        let record = r.rasterize('B', &square()).unwrap();
        assert_eq!(record.uv_min, [0.0, 20.0 / 64.0]);
        assert_eq!(record.uv_max, [12.0 / 64.0, 34.0 / 64.0]);
    }
}
