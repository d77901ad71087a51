//! Text layout: measurement and screen-space glyph quads.
//!
//! Screen space has its origin at the top left with Y growing down. A
//! string drawn at `(x, y)` occupies roughly `[y, y + font_height)`.

use std::collections::HashMap;
use std::convert::Infallible;

use crate::rasterizer::GlyphRecord;

/// Four corners of one glyph, counter-clockwise on screen, with the
/// matching atlas UVs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphQuad {
    pub points: [[f32; 2]; 4],
    pub uvs: [[f32; 2]; 4],
}

/// Receiver for laid-out glyph quads (usually a GPU batch).
pub trait QuadSink {
    type Error;

    fn push_quad(&mut self, quad: &GlyphQuad, color: [f32; 4]) -> Result<(), Self::Error>;
}

impl QuadSink for Vec<GlyphQuad> {
    type Error = Infallible;

    fn push_quad(&mut self, quad: &GlyphQuad, _color: [f32; 4]) -> Result<(), Infallible> {
        self.push(*quad);
        Ok(())
    }
}

/// Glyph table produced by an atlas build.
#[derive(Clone, Debug)]
pub struct TextLayout {
    glyphs: HashMap<char, GlyphRecord>,
    font_scale: f32,
    line_height: f32,
}

impl TextLayout {
    pub fn new(glyphs: HashMap<char, GlyphRecord>, font_scale: f32, line_height: f32) -> Self {
        Self {
            glyphs,
            font_scale,
            line_height,
        }
    }

    pub fn glyph(&self, c: char) -> Option<&GlyphRecord> {
        self.glyphs.get(&c)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn font_scale(&self) -> f32 {
        self.font_scale
    }

    /// Line height in screen pixels at `scale`.
    pub fn font_height(&self, scale: f32) -> f32 {
        self.line_height * self.font_scale * scale
    }

    /// Horizontal advance of one character. Space is half a line high;
    /// characters without a glyph are zero-width.
    pub fn measure_character(&self, c: char, scale: f32) -> f32 {
        if c == ' ' {
            return self.font_height(scale) * 0.5;
        }
        self.glyphs
            .get(&c)
            .map_or(0.0, |g| g.metrics.advance_width * self.font_scale * scale)
    }

    pub fn measure_text(&self, text: &str, scale: f32) -> f32 {
        text.chars().map(|c| self.measure_character(c, scale)).sum()
    }

    /// Quad for `c` with its pen at `position`, or `None` if the atlas
    /// has no glyph for it.
    pub fn glyph_quad(&self, position: [f32; 2], c: char, scale: f32) -> Option<GlyphQuad> {
        let g = self.glyphs.get(&c)?;
        let s = self.font_scale * scale;
        let m = g.metrics;

        let left = position[0] + m.min_x * s;
        let right = left + m.width() * s;
        let bottom = position[1] + self.font_height(scale) - m.min_y * s;
        let top = bottom - m.height() * s;

        Some(GlyphQuad {
            points: [[left, bottom], [right, bottom], [right, top], [left, top]],
            uvs: [
                g.uv_min,
                [g.uv_max[0], g.uv_min[1]],
                g.uv_max,
                [g.uv_min[0], g.uv_max[1]],
            ],
        })
    }

    /// Emit one quad per drawable character and return the total advance.
    pub fn draw_text<S>(
        &self,
        sink: &mut S,
        position: [f32; 2],
        text: &str,
        scale: f32,
        color: [f32; 4],
    ) -> Result<f32, S::Error>
    where
        S: QuadSink + ?Sized,
    {
        let mut advance = 0.0;
        for c in text.chars() {
            if let Some(quad) = self.glyph_quad([position[0] + advance, position[1]], c, scale) {
                sink.push_quad(&quad, color)?;
            }
            advance += self.measure_character(c, scale);
        }
        Ok(advance)
    }
}

// ===================================================================
// Tests
// ===================================================================
