//! Demo scene: a handful of labelled shapes with hover highlighting
//! and a frame-time readout.

use quill_render::{color, ArenaError, Canvas, Mesh, Rect};

const BORDER_WIDTH: f32 = 2.0;
const HOVER_COLOR: [f32; 4] = [0.35, 0.65, 1.0, 1.0];
const LABEL_SCALE: f32 = 0.12;
const HUD_SCALE: f32 = 0.09;
const ELLIPSE_SEGMENTS: u32 = 48;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Ellipse,
    Triangle,
}

#[derive(Clone, Debug)]
pub struct Shape {
    pub kind: ShapeKind,
    pub bounds: Rect,
    pub color: [f32; 4],
    pub label: String,
}

impl Shape {
    pub fn new(kind: ShapeKind, bounds: Rect, color: [f32; 4], label: &str) -> Self {
        Self {
            kind,
            bounds,
            color,
            label: label.to_string(),
        }
    }

    pub fn mesh(&self) -> Mesh {
        let b = self.bounds;
        match self.kind {
            ShapeKind::Rect => Mesh::rect(b),
            ShapeKind::Ellipse => Mesh::ellipse(b, ELLIPSE_SEGMENTS),
            ShapeKind::Triangle => Mesh::polygon(&[
                [b.x + b.width * 0.5, b.y],
                [b.x + b.width, b.y + b.height],
                [b.x, b.y + b.height],
            ]),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub shapes: Vec<Shape>,
    pub hovered: Option<usize>,
}

impl Scene {
    pub fn demo() -> Self {
        let shapes = vec![
            Shape::new(
                ShapeKind::Rect,
                Rect::new(60.0, 80.0, 220.0, 140.0),
                [0.26, 0.52, 0.96, 1.0],
                "Rect",
            ),
            Shape::new(
                ShapeKind::Ellipse,
                Rect::new(320.0, 80.0, 200.0, 140.0),
                [0.96, 0.26, 0.42, 1.0],
                "Ellipse",
            ),
            Shape::new(
                ShapeKind::Triangle,
                Rect::new(560.0, 80.0, 180.0, 160.0),
                [0.30, 0.75, 0.45, 1.0],
                "Triangle",
            ),
            Shape::new(
                ShapeKind::Rect,
                Rect::new(60.0, 280.0, 680.0, 90.0),
                [0.22, 0.22, 0.28, 1.0],
                "Quill: shapes and text, one draw call",
            ),
            Shape::new(
                ShapeKind::Ellipse,
                Rect::new(340.0, 410.0, 120.0, 120.0),
                color::YELLOW,
                "Hover me",
            ),
        ];
        Self {
            shapes,
            hovered: None,
        }
    }

    /// Topmost shape whose bounds contain `p`.
    pub fn hit_test(&self, p: [f32; 2]) -> Option<usize> {
        self.shapes.iter().rposition(|s| s.bounds.contains(p))
    }

    /// Update the hovered shape; returns whether it changed.
    pub fn cursor_moved(&mut self, p: [f32; 2]) -> bool {
        let hit = self.hit_test(p);
        let changed = hit != self.hovered;
        self.hovered = hit;
        changed
    }

    /// Emit the whole scene into `canvas`.
    pub fn draw(&self, canvas: &mut Canvas<'_>, frame_ms: f32) -> Result<(), ArenaError> {
        for (i, shape) in self.shapes.iter().enumerate() {
            canvas.draw(&shape.mesh(), shape.color)?;
            if self.hovered == Some(i) {
                canvas.draw_rect_border(shape.bounds, BORDER_WIDTH, HOVER_COLOR)?;
            }
            let center = shape.bounds.center();
            canvas.draw_text_centered(center, &shape.label, LABEL_SCALE, color::WHITE)?;
        }

        let hud = format!("{frame_ms:.1} ms");
        let width = canvas.measure_text(&hud, HUD_SCALE);
        let height = canvas.font_height(HUD_SCALE);
        canvas.draw_rect(Rect::new(8.0, 8.0, width + 16.0, height + 8.0), [0.0, 0.0, 0.0, 0.6])?;
        canvas.draw_text([16.0, 12.0], &hud, HUD_SCALE, color::LIGHT_CYAN)?;
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quill_render::BatchRenderer;
    use quill_text::{
        polygon_contour, FontMetrics, GlyphMetrics, GlyphOutline, GlyphRasterizer, OutlineMap,
        RasterConfig, TextLayout,
    };

    fn layout() -> TextLayout {
        let mut font = OutlineMap::new(FontMetrics {
            line_height: 1000.0,
            line_pitch: 1200.0,
        });
        for c in '!'..='~' {
            font.insert(
                c,
                GlyphOutline {
                    contours: vec![polygon_contour(&[
                        [0.0, 0.0],
                        [0.0, 700.0],
                        [500.0, 700.0],
                        [500.0, 0.0],
                    ])],
                    metrics: GlyphMetrics::new(0.0, 0.0, 500.0, 700.0, 600.0),
                },
            );
        }
        let config = RasterConfig::default().with_atlas_size(1024);
        GlyphRasterizer::build(&font, config).unwrap().into_parts().1
    }

    #[test]
    fn test_demo_scene_shapes() {
        let scene = Scene::demo();
        assert_eq!(scene.shapes.len(), 5);
        assert!(scene.shapes.iter().all(|s| !s.mesh().is_empty()));
    }

    #[test]
    fn test_hit_test_picks_topmost() {
        let mut scene = Scene::demo();
        scene.shapes.push(Shape::new(
            ShapeKind::Rect,
            Rect::new(100.0, 100.0, 10.0, 10.0),
            color::RED,
            "top",
        ));
        assert_eq!(scene.hit_test([105.0, 105.0]), Some(5));
        assert_eq!(scene.hit_test([70.0, 90.0]), Some(0));
        assert_eq!(scene.hit_test([5.0, 5.0]), None);
    }

    #[test]
    fn test_hover_reports_changes() {
        let mut scene = Scene::demo();
        assert!(scene.cursor_moved([100.0, 100.0]));
        assert_eq!(scene.hovered, Some(0));
        assert!(!scene.cursor_moved([101.0, 100.0]));
        assert!(scene.cursor_moved([5.0, 5.0]));
        assert_eq!(scene.hovered, None);
    }

    #[test]
    fn test_draw_fills_batch() {
        let text = layout();
        let mut batch = BatchRenderer::new(8192, 24576);
        let mut scene = Scene::demo();
        scene.hovered = Some(1);
        {
            let mut canvas = Canvas::new(&mut batch, &text, [0.0, 0.0]);
            scene.draw(&mut canvas, 16.7).unwrap();
        }
        assert!(batch.triangle_count() > 0);
        let cursor = batch.vertex_count();
        assert!(batch.indices().iter().all(|&i| i < cursor));
    }
}
