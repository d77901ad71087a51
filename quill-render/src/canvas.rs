//! Immediate-mode drawing surface handed to the application each frame.
//!
//! A `Canvas` borrows the renderer's batch and glyph table. Shapes are
//! filled by sampling the atlas's reserved solid texel, so shapes and
//! text share one texture, one pipeline and one draw call.

use quill_text::TextLayout;

use crate::arena::ArenaError;
use crate::batch::BatchRenderer;
use crate::mesh::{Mesh, Rect};

/// Common RGBA colors.
pub mod color {
    pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
    pub const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    pub const GREEN: [f32; 4] = [0.0, 1.0, 0.0, 1.0];
    pub const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];
    pub const YELLOW: [f32; 4] = [1.0, 1.0, 0.0, 1.0];
    pub const MAGENTA: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
    pub const LIGHT_CYAN: [f32; 4] = [0.3, 1.0, 1.0, 1.0];
}

pub struct Canvas<'a> {
    batch: &'a mut BatchRenderer,
    text: &'a TextLayout,
    solid_uv: [f32; 2],
}

impl<'a> Canvas<'a> {
    /// `solid_uv` must address a fully covered atlas texel.
    pub fn new(batch: &'a mut BatchRenderer, text: &'a TextLayout, solid_uv: [f32; 2]) -> Self {
        Self {
            batch,
            text,
            solid_uv,
        }
    }

    /// Fill a mesh with a solid color.
    pub fn draw(&mut self, mesh: &Mesh, color: [f32; 4]) -> Result<(), ArenaError> {
        self.batch.submit(mesh, self.solid_uv, color)
    }

    /// Draw a mesh with every vertex sampling the atlas at `uv`.
    pub fn draw_mesh_uv(
        &mut self,
        mesh: &Mesh,
        uv: [f32; 2],
        color: [f32; 4],
    ) -> Result<(), ArenaError> {
        self.batch.submit(mesh, uv, color)
    }

    /// Fill a convex (or star-shaped) polygon.
    pub fn draw_polygon(&mut self, points: &[[f32; 2]], color: [f32; 4]) -> Result<(), ArenaError> {
        let uvs = vec![self.solid_uv; points.len()];
        self.batch.submit_polygon(points, &uvs, color)
    }

    /// Polygon with an explicit atlas coordinate per point.
    pub fn draw_polygon_uv(
        &mut self,
        points: &[[f32; 2]],
        uvs: &[[f32; 2]],
        color: [f32; 4],
    ) -> Result<(), ArenaError> {
        self.batch.submit_polygon(points, uvs, color)
    }

    pub fn draw_rect(&mut self, rect: Rect, color: [f32; 4]) -> Result<(), ArenaError> {
        self.draw(&Mesh::rect(rect), color)
    }

    pub fn draw_rect_border(
        &mut self,
        rect: Rect,
        border: f32,
        color: [f32; 4],
    ) -> Result<(), ArenaError> {
        self.draw(&Mesh::rect_border(rect, border), color)
    }

    /// Draw `text` with its top-left at `position`. Returns the advance.
    pub fn draw_text(
        &mut self,
        position: [f32; 2],
        text: &str,
        scale: f32,
        color: [f32; 4],
    ) -> Result<f32, ArenaError> {
        self.text.draw_text(&mut *self.batch, position, text, scale, color)
    }

    /// Draw `text` centered on `center`, horizontally and by line height.
    pub fn draw_text_centered(
        &mut self,
        center: [f32; 2],
        text: &str,
        scale: f32,
        color: [f32; 4],
    ) -> Result<f32, ArenaError> {
        let x = center[0] - self.measure_text(text, scale) * 0.5;
        let y = center[1] - self.font_height(scale) * 0.5;
        self.draw_text([x, y], text, scale, color)
    }

    pub fn measure_text(&self, text: &str, scale: f32) -> f32 {
        self.text.measure_text(text, scale)
    }

    pub fn font_height(&self, scale: f32) -> f32 {
        self.text.font_height(scale)
    }

    pub fn solid_uv(&self) -> [f32; 2] {
        self.solid_uv
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quill_text::{
        polygon_contour, FontMetrics, GlyphMetrics, GlyphOutline, GlyphRasterizer, OutlineMap,
        RasterConfig,
    };

    const SOLID: [f32; 2] = [0.5 / 64.0, 0.5 / 64.0];

    fn layout() -> TextLayout {
        let square = GlyphOutline {
            contours: vec![polygon_contour(&[
                [0.0, 0.0],
                [0.0, 896.0],
                [768.0, 896.0],
                [768.0, 0.0],
            ])],
            metrics: GlyphMetrics::new(0.0, 0.0, 768.0, 896.0, 832.0),
        };
        let font = OutlineMap::new(FontMetrics {
            line_height: 1280.0,
            line_pitch: 1536.0,
        })
        .with_glyph('B', square);
        let config = RasterConfig::default()
            .with_atlas_size(64)
            .with_font_scale(1.0 / 64.0)
            .with_charset(['B']);
        GlyphRasterizer::build(&font, config).unwrap().into_parts().1
    }

    #[test]
    fn test_solid_shapes_use_solid_uv() {
        let text = layout();
        let mut batch = BatchRenderer::new(64, 128);
        let mut canvas = Canvas::new(&mut batch, &text, SOLID);
        canvas.draw_rect(Rect::new(0.0, 0.0, 10.0, 10.0), color::RED).unwrap();
        canvas
            .draw_rect_border(Rect::new(0.0, 0.0, 10.0, 10.0), 1.0, color::BLUE)
            .unwrap();
        canvas
            .draw_polygon(&[[0.0, 0.0], [5.0, 0.0], [0.0, 5.0]], color::GREEN)
            .unwrap();

        assert_eq!(batch.vertex_count(), 4 + 16 + 3);
        assert_eq!(batch.triangle_count(), 2 + 8 + 1);
        assert!(batch.vertices().iter().all(|v| v.uv == SOLID));
    }

    #[test]
    fn test_draw_text_goes_through_batch() {
        let text = layout();
        let mut batch = BatchRenderer::new(64, 128);
        let mut canvas = Canvas::new(&mut batch, &text, SOLID);
        let advance = canvas.draw_text([0.0, 0.0], "B B", 1.0, color::WHITE).unwrap();

        assert_eq!(advance, 13.0 + 10.0 + 13.0);
        assert_eq!(batch.vertex_count(), 8);
        assert_eq!(batch.index_count(), 12);
    }

    #[test]
    fn test_draw_text_centered() {
        let text = layout();
        let mut batch = BatchRenderer::new(64, 128);
        let mut canvas = Canvas::new(&mut batch, &text, SOLID);
        assert_eq!(canvas.measure_text("B", 1.0), 13.0);
        assert_eq!(canvas.font_height(1.0), 20.0);
        canvas
            .draw_text_centered([50.0, 50.0], "B", 1.0, color::WHITE)
            .unwrap();

        // Origin is (50 - 6.5, 50 - 10); quad spans the glyph box below it.
        let xs: Vec<f32> = batch.vertices().iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = batch.vertices().iter().map(|v| v.position[1]).collect();
        assert_eq!(xs, vec![43.5, 55.5, 55.5, 43.5]);
        assert_eq!(ys, vec![60.0, 60.0, 46.0, 46.0]);
    }

    #[test]
    fn test_capacity_error_propagates() {
        let text = layout();
        let mut batch = BatchRenderer::new(4, 6);
        let mut canvas = Canvas::new(&mut batch, &text, SOLID);
        canvas.draw_rect(Rect::new(0.0, 0.0, 1.0, 1.0), color::RED).unwrap();
        assert!(canvas.draw_text([0.0, 0.0], "B", 1.0, color::WHITE).is_err());
    }

    #[test]
    fn test_mesh_uv_applies_to_every_vertex() {
        let text = layout();
        let glyph = text.glyph('B').unwrap();
        let mut batch = BatchRenderer::new(64, 128);
        let mut canvas = Canvas::new(&mut batch, &text, SOLID);
        let mesh = Mesh::ellipse(Rect::new(0.0, 0.0, 8.0, 8.0), 6);
        canvas.draw_mesh_uv(&mesh, glyph.uv_min, color::MAGENTA).unwrap();

        assert_eq!(batch.vertex_count(), 6);
        assert!(batch
            .vertices()
            .iter()
            .all(|v| v.uv == glyph.uv_min && v.color == color::MAGENTA));
    }

    #[test]
    fn test_polygon_uv_per_point() {
        let text = layout();
        let glyph = text.glyph('B').unwrap();
        let (lo, hi) = (glyph.uv_min, glyph.uv_max);
        let points = [[0.0, 0.0], [12.0, 0.0], [12.0, 14.0], [0.0, 14.0]];
        let uvs = [lo, [hi[0], lo[1]], hi, [lo[0], hi[1]]];

        let mut batch = BatchRenderer::new(64, 128);
        let mut canvas = Canvas::new(&mut batch, &text, SOLID);
        canvas.draw_polygon_uv(&points, &uvs, color::WHITE).unwrap();

        let got: Vec<[f32; 2]> = batch.vertices().iter().map(|v| v.uv).collect();
        assert_eq!(got, uvs.to_vec());
        assert_eq!(batch.indices(), vec![0, 1, 2, 0, 2, 3]);
    }
}
