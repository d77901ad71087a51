//! Font loading: TrueType/OpenType outlines via `ttf-parser`, system
//! font discovery via `font-kit`.
//!
//! `ttf-parser` already inserts the implied on-curve midpoint between two
//! consecutive off-curve points, so quadratic segments arrive complete.
//! [`ContourBuilder`] folds its path callbacks into the interleaved
//! `[on, ctrl, on, ctrl, …]` contour layout:
//!
//! - `line_to` becomes a quadratic with the edge midpoint as control.
//! - `curve_to` (CFF cubics) is split at `t = 0.5` and each half is
//!   approximated by a single quadratic.
//! - `close` drops a repeated start point, or inserts a closing edge.

use std::path::Path;

use font_kit::family_name::FamilyName;
use font_kit::handle::Handle;
use font_kit::properties::Properties;
use font_kit::source::SystemSource;
use thiserror::Error;

use crate::outline::{midpoint, FontMetrics, GlyphMetrics, GlyphOutline, OutlineSource};

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse font: {0}")]
    Parse(String),
    #[error("No system font matches `{0}`")]
    NotFound(String),
    #[error("Failed to load system font: {0}")]
    Load(String),
}

// ── TrueType outline source ─────────────────────────────────────────

/// Outline source backed by an in-memory TrueType/OpenType file.
pub struct TtfOutlines {
    data: Vec<u8>,
    face_index: u32,
    metrics: FontMetrics,
}

impl TtfOutlines {
    /// Parse font bytes. `face_index` selects a face in a collection.
    pub fn from_bytes(data: Vec<u8>, face_index: u32) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| FontError::Parse(e.to_string()))?;

        let metrics = FontMetrics {
            line_height: f32::from(face.units_per_em()),
            line_pitch: f32::from(face.ascender()) - f32::from(face.descender())
                + f32::from(face.line_gap()),
        };

        log::info!(
            "Loaded font: {} glyphs, {} units/em, pitch {}",
            face.number_of_glyphs(),
            face.units_per_em(),
            metrics.line_pitch,
        );

        Ok(Self {
            data,
            face_index,
            metrics,
        })
    }

    /// Read and parse a font file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data, 0)
    }

    /// Load the best system match for a CSS-style family name
    /// (`"sans-serif"`, `"serif"`, `"monospace"` or a concrete name).
    pub fn from_system(family: &str) -> Result<Self, FontError> {
        let (data, face_index) = load_system_font(family)?;
        Self::from_bytes(data, face_index)
    }

    fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index).ok()
    }
}

impl OutlineSource for TtfOutlines {
    fn font_metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn glyph(&self, c: char) -> Option<GlyphOutline> {
        let face = self.face()?;
        let id = face.glyph_index(c)?;
        let advance_width = f32::from(face.glyph_hor_advance(id).unwrap_or(0));

        let mut builder = ContourBuilder::default();
        let bbox = face.outline_glyph(id, &mut builder);
        let metrics = match bbox {
            Some(r) => GlyphMetrics::new(
                f32::from(r.x_min),
                f32::from(r.y_min),
                f32::from(r.x_max),
                f32::from(r.y_max),
                advance_width,
            ),
            // Blank glyph: no outline, advance only.
            None => GlyphMetrics {
                advance_width,
                ..GlyphMetrics::default()
            },
        };

        Some(GlyphOutline {
            contours: builder.finish(),
            metrics,
        })
    }
}

// ── System fonts ────────────────────────────────────────────────────

/// Locate a system font and return its bytes plus face index.
pub fn load_system_font(family: &str) -> Result<(Vec<u8>, u32), FontError> {
    let name = match family.trim().to_lowercase().as_str() {
        "sans-serif" => FamilyName::SansSerif,
        "serif" => FamilyName::Serif,
        "monospace" => FamilyName::Monospace,
        _ => FamilyName::Title(family.trim().to_string()),
    };

    let handle = SystemSource::new()
        .select_best_match(&[name], &Properties::new())
        .map_err(|e| FontError::NotFound(format!("{family} ({e:?})")))?;

    let face_index = match &handle {
        Handle::Path { font_index, .. } | Handle::Memory { font_index, .. } => *font_index,
    };

    let font = handle
        .load()
        .map_err(|e| FontError::Load(format!("{e:?}")))?;
    let data = font
        .copy_font_data()
        .ok_or_else(|| FontError::Load(format!("no font data for {}", font.family_name())))?;

    log::info!("Selected system font `{}` for `{family}`", font.family_name());
    Ok((data.to_vec(), face_index))
}

// ── Path → contour conversion ───────────────────────────────────────

/// Collects `ttf-parser` path callbacks into interleaved contours.
#[derive(Default)]
pub(crate) struct ContourBuilder {
    contours: Vec<Vec<[f32; 2]>>,
    current: Vec<[f32; 2]>,
}

impl ContourBuilder {
    pub(crate) fn finish(mut self) -> Vec<Vec<[f32; 2]>> {
        self.end_contour();
        self.contours
    }

    fn last(&self) -> [f32; 2] {
        self.current.last().copied().unwrap_or([0.0, 0.0])
    }

    fn end_contour(&mut self) {
        if self.current.len() >= 3 {
            let first = self.current[0];
            let last = self.last();
            if first == last {
                self.current.pop();
            } else {
                self.current.push(midpoint(last, first));
            }
            self.contours.push(std::mem::take(&mut self.current));
        } else {
            self.current.clear();
        }
    }
}

impl ttf_parser::OutlineBuilder for ContourBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.end_contour();
        self.current.push([x, y]);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let ctrl = midpoint(self.last(), [x, y]);
        self.current.push(ctrl);
        self.current.push([x, y]);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.current.push([x1, y1]);
        self.current.push([x, y]);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.last();
        let (p1, p2, p3) = ([x1, y1], [x2, y2], [x, y]);

        // de Casteljau split at t = 0.5.
        let p01 = midpoint(p0, p1);
        let p12 = midpoint(p1, p2);
        let p23 = midpoint(p2, p3);
        let p012 = midpoint(p01, p12);
        let p123 = midpoint(p12, p23);
        let mid = midpoint(p012, p123);

        for (a, b, c, d) in [(p0, p01, p012, mid), (mid, p123, p23, p3)] {
            self.current.push(cubic_to_quad_control(a, b, c, d));
            self.current.push(d);
        }
    }

    fn close(&mut self) {
        self.end_contour();
    }
}

/// Control point of the quadratic closest to cubic `(a, b, c, d)`.
fn cubic_to_quad_control(a: [f32; 2], b: [f32; 2], c: [f32; 2], d: [f32; 2]) -> [f32; 2] {
    [
        (3.0 * (b[0] + c[0]) - a[0] - d[0]) * 0.25,
        (3.0 * (b[1] + c[1]) - a[1] - d[1]) * 0.25,
    ]
}

// ===================================================================
// Tests
// ===================================================================
