//! Glyph atlas: single-channel coverage bitmap plus the packing pen.
//!
//! Glyphs are packed left-to-right along a baseline. When a glyph's
//! rectangle would leave the atlas, the pen wraps to the next row, one
//! fixed line pitch further down (independent of glyph height).
//!
//! Cells hold one of four values during rasterization: empty, span-end,
//! span-start or filled. The markers are left in place after the fill
//! pass; they sample as near-full coverage.

/// Empty cell.
pub const EMPTY: u8 = 0;
/// Right edge of a span (outline sampled while moving up or flat).
pub const SPAN_END: u8 = 253;
/// Left edge of a span (outline sampled while moving down).
pub const SPAN_START: u8 = 254;
/// Fully covered cell.
pub const FILLED: u8 = 255;

/// Pixel-space rectangle within the atlas, half-open on max edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl AtlasRect {
    pub fn overlaps(&self, other: &AtlasRect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}

/// Row-major `width × height` coverage bitmap, one byte per pixel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CoverageBitmap {
    /// Blank bitmap with the solid texel at (0, 0) already set.
    pub fn new(width: u32, height: u32) -> Self {
        let mut bitmap = Self {
            width,
            height,
            data: vec![EMPTY; width as usize * height as usize],
        };
        bitmap.set(0, 0, FILLED);
        bitmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw pixel rows, ready for an `R8` texture upload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    /// Pixel value, or `EMPTY` outside the bitmap.
    pub fn get(&self, x: i32, y: i32) -> u8 {
        if self.contains(x, y) {
            self.data[self.index(x, y)]
        } else {
            EMPTY
        }
    }

    /// Write a pixel. Writes outside the bitmap are dropped.
    pub fn set(&mut self, x: i32, y: i32, value: u8) {
        if self.contains(x, y) {
            let i = self.index(x, y);
            self.data[i] = value;
        }
    }

    /// UV at the center of the always-filled texel (0, 0). Solid fills
    /// sample here.
    pub fn solid_uv(&self) -> [f32; 2] {
        [0.5 / self.width as f32, 0.5 / self.height as f32]
    }

    /// Normalize a pixel rectangle to `(uv_min, uv_max)`.
    pub fn rect_to_uv(&self, rect: &AtlasRect) -> ([f32; 2], [f32; 2]) {
        let w = self.width as f32;
        let h = self.height as f32;
        (
            [rect.min_x as f32 / w, rect.min_y as f32 / h],
            [rect.max_x as f32 / w, rect.max_y as f32 / h],
        )
    }

    /// Number of cells with the given value.
    pub fn count(&self, value: u8) -> usize {
        self.data.iter().filter(|&&v| v == value).count()
    }

    fn index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Packing cursor. The pen sits on the current row's baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasPen {
    pub x: i32,
    pub y: i32,
    /// Row advance in pixels when wrapping.
    pub line_pitch: i32,
    /// Right edge of the last rectangle placed on this row.
    pub row_end: i32,
}

impl AtlasPen {
    pub fn new(baseline: i32, line_pitch: i32) -> Self {
        Self {
            x: 0,
            y: baseline,
            line_pitch,
            row_end: 0,
        }
    }

    /// Rectangle covered by scaled glyph bounds at the current pen.
    pub fn rect_at(&self, min: [f32; 2], max: [f32; 2]) -> AtlasRect {
        let (x, y) = (self.x as f32, self.y as f32);
        AtlasRect {
            min_x: (x + min[0]) as i32,
            min_y: (y + min[1]) as i32,
            max_x: (x + max[0]) as i32,
            max_y: (y + max[1]) as i32,
        }
    }

    /// Place scaled glyph bounds, wrapping to a new row when they do not
    /// fit. A negative left bearing pushes the origin right so the glyph
    /// never starts left of the previous glyph's right edge (or column 0
    /// at row start). Returns `None`, with the pen left
    /// where it was, if the rectangle still leaves the bitmap after
    /// wrapping.
    pub fn place(
        &mut self,
        min: [f32; 2],
        max: [f32; 2],
        bitmap: &CoverageBitmap,
    ) -> Option<AtlasRect> {
        let saved = *self;

        self.clear_left_bearing(min[0]);
        let rect = self.rect_at(min, max);
        if fits(&rect, bitmap) {
            self.row_end = rect.max_x;
            return Some(rect);
        }

        self.x = 0;
        self.y += self.line_pitch;
        self.row_end = 0;
        log::debug!("Atlas pen wrapped to row y={}", self.y);

        self.clear_left_bearing(min[0]);
        let rect = self.rect_at(min, max);
        if fits(&rect, bitmap) {
            self.row_end = rect.max_x;
            Some(rect)
        } else {
            *self = saved;
            None
        }
    }

    fn clear_left_bearing(&mut self, min_x: f32) {
        if min_x < 0.0 {
            self.x = self.x.max((self.row_end as f32 - min_x).ceil() as i32);
        }
    }

    pub fn advance(&mut self, pixels: i32) {
        self.x += pixels;
    }
}

fn fits(rect: &AtlasRect, bitmap: &CoverageBitmap) -> bool {
    rect.min_x >= 0
        && rect.min_y >= 0
        && rect.max_x < bitmap.width() as i32
        && rect.max_y < bitmap.height() as i32
}

// ===================================================================
// Tests
// ===================================================================
