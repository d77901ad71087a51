//! High-level renderer: owns the batch, the glyph table and the atlas
//! pipeline, and turns one frame of `Canvas` calls into a single draw.

use quill_text::{FontAtlas, TextLayout};
use thiserror::Error;
use wgpu::{
    Color, CommandEncoderDescriptor, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDescriptor, StoreOp, TextureView, TextureViewDescriptor,
};

use crate::arena::ArenaError;
use crate::batch::BatchRenderer;
use crate::canvas::Canvas;
use crate::config::RendererConfig;
use crate::context::GpuContext;
use crate::pipelines::AtlasPipeline;
use crate::vertex::CameraUniform;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("No surface configured (headless mode)")]
    NoSurface,
    #[error("Shader compilation failed: {0}")]
    ShaderCompile(String),
    #[error("Frame geometry overflow: {0}")]
    Capacity(#[from] ArenaError),
}

/// Counts for one flushed frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub vertex_count: u32,
    pub index_count: u32,
    pub triangle_count: u32,
    /// 1 if anything was drawn, else 0.
    pub draw_calls: u32,
}

impl FrameStats {
    fn from_batch(batch: &BatchRenderer) -> Self {
        Self {
            vertex_count: batch.vertex_count(),
            index_count: batch.index_count(),
            triangle_count: batch.triangle_count(),
            draw_calls: u32::from(!batch.is_empty()),
        }
    }
}

/// Batched shape + text renderer over one coverage atlas.
///
/// # Usage
///
/// ```ignore
/// let mut renderer = Renderer::new(&gpu, atlas, RendererConfig::default()).await?;
/// let mut canvas = renderer.canvas();
/// canvas.draw_rect(Rect::new(10.0, 10.0, 100.0, 40.0), color::BLUE)?;
/// canvas.draw_text([16.0, 20.0], "Hello", 1.0, color::WHITE)?;
/// let stats = renderer.flush_to_surface(&gpu)?;
/// ```
pub struct Renderer {
    pipeline: AtlasPipeline,
    batch: BatchRenderer,
    text: TextLayout,
    solid_uv: [f32; 2],
    clear_color: Color,
}

impl Renderer {
    /// Build the pipeline for `gpu`'s surface format and upload the atlas.
    pub async fn new(
        gpu: &GpuContext,
        atlas: FontAtlas,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let (bitmap, text) = atlas.into_parts();
        let pipeline =
            AtlasPipeline::new(&gpu.device, &gpu.queue, gpu.surface_format, &bitmap).await?;
        let [r, g, b, a] = config.clear_color;

        log::info!(
            "Renderer created: {} glyphs, batch capacity {} vertices / {} indices",
            text.glyph_count(),
            config.max_vertices,
            config.max_indices,
        );

        Ok(Self {
            pipeline,
            batch: BatchRenderer::from_config(&config),
            text,
            solid_uv: bitmap.solid_uv(),
            clear_color: Color { r, g, b, a },
        })
    }

    /// Drawing surface for the current frame.
    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas::new(&mut self.batch, &self.text, self.solid_uv)
    }

    pub fn text_layout(&self) -> &TextLayout {
        &self.text
    }

    /// Geometry accumulated since the last flush.
    pub fn batch(&self) -> &BatchRenderer {
        &self.batch
    }

    /// Drop the geometry accumulated so far without drawing it.
    pub fn discard_frame(&mut self) {
        self.batch.reset();
    }

    /// Set the background clear color.
    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = Color { r, g, b, a };
    }

    /// Draw the frame's batch to the window surface and present it.
    ///
    /// The batch is reset whether or not a surface texture could be
    /// acquired; a failed frame drops its geometry.
    pub fn flush_to_surface(&mut self, gpu: &GpuContext) -> Result<FrameStats, RenderError> {
        let surface = match gpu.surface.as_ref() {
            Some(surface) => surface,
            None => {
                self.batch.reset();
                return Err(RenderError::NoSurface);
            }
        };
        let output = match surface.get_current_texture() {
            Ok(output) => output,
            Err(e) => {
                self.batch.reset();
                return Err(e.into());
            }
        };
        let view = output.texture.create_view(&TextureViewDescriptor::default());

        let stats = self.flush(gpu, &view, gpu.surface_size());
        output.present();
        Ok(stats)
    }

    /// Draw the frame's batch into an off-screen `width × height` target.
    pub fn flush_to_texture(
        &mut self,
        gpu: &GpuContext,
        target_view: &TextureView,
        width: u32,
        height: u32,
    ) -> FrameStats {
        self.flush(gpu, target_view, (width, height))
    }

    fn flush(
        &mut self,
        gpu: &GpuContext,
        view: &TextureView,
        (width, height): (u32, u32),
    ) -> FrameStats {
        let stats = FrameStats::from_batch(&self.batch);

        let camera = CameraUniform::top_left(width.max(1) as f32, height.max(1) as f32);
        self.pipeline.upload_camera(&gpu.queue, &camera);
        self.pipeline.upload_batch(&gpu.device, &gpu.queue, &self.batch);

        let mut encoder = gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("quill_frame_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("quill_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.pipeline.draw(&mut pass);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        self.batch.reset();

        log::trace!(
            "Flushed {} vertices / {} triangles in {} draw call(s)",
            stats.vertex_count,
            stats.triangle_count,
            stats.draw_calls,
        );
        stats
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::color;
    use crate::mesh::{Mesh, Rect};
    use quill_text::{FontMetrics, GlyphRasterizer, OutlineMap, RasterConfig};

    fn empty_atlas() -> FontAtlas {
        let font = OutlineMap::new(FontMetrics {
            line_height: 1000.0,
            line_pitch: 1200.0,
        });
        GlyphRasterizer::build(&font, RasterConfig::default().with_atlas_size(64)).unwrap()
    }

    #[test]
    fn test_frame_stats_from_batch() {
        let mut batch = BatchRenderer::new(16, 16);
        assert_eq!(FrameStats::from_batch(&batch), FrameStats::default());

        let quad = Mesh::rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        batch.submit(&quad, [0.0, 0.0], color::RED).unwrap();
        let stats = FrameStats::from_batch(&batch);
        assert_eq!(stats.vertex_count, 4);
        assert_eq!(stats.index_count, 6);
        assert_eq!(stats.triangle_count, 2);
        assert_eq!(stats.draw_calls, 1);
    }

    #[test]
    fn test_renderer_flush_to_texture() {
        let gpu = pollster::block_on(GpuContext::new_headless());
        if let Ok(gpu) = gpu {
            let mut renderer =
                pollster::block_on(Renderer::new(&gpu, empty_atlas(), RendererConfig::default()))
                    .expect("renderer");
            renderer
                .canvas()
                .draw_rect(Rect::new(8.0, 8.0, 16.0, 16.0), color::YELLOW)
                .unwrap();

            let target = gpu.create_target_texture(64, 64);
            let view = target.create_view(&TextureViewDescriptor::default());
            let stats = renderer.flush_to_texture(&gpu, &view, 64, 64);

            assert_eq!(stats.triangle_count, 2);
            assert_eq!(stats.draw_calls, 1);
            assert!(renderer.batch().is_empty());

            // Next frame starts from zero.
            let stats = renderer.flush_to_texture(&gpu, &view, 64, 64);
            assert_eq!(stats.draw_calls, 0);
        }
    }

    #[test]
    fn test_flush_to_surface_headless_fails() {
        let gpu = pollster::block_on(GpuContext::new_headless());
        if let Ok(gpu) = gpu {
            let mut renderer =
                pollster::block_on(Renderer::new(&gpu, empty_atlas(), RendererConfig::default()))
                    .expect("renderer");
            renderer
                .canvas()
                .draw_rect(Rect::new(0.0, 0.0, 4.0, 4.0), color::RED)
                .unwrap();
            assert!(matches!(
                renderer.flush_to_surface(&gpu),
                Err(RenderError::NoSurface)
            ));
            assert!(renderer.batch().is_empty());
        }
    }

    #[test]
    fn test_discard_frame_clears_batch() {
        let gpu = pollster::block_on(GpuContext::new_headless());
        if let Ok(gpu) = gpu {
            let mut renderer =
                pollster::block_on(Renderer::new(&gpu, empty_atlas(), RendererConfig::default()))
                    .expect("renderer");
            renderer
                .canvas()
                .draw_rect(Rect::new(0.0, 0.0, 4.0, 4.0), color::RED)
                .unwrap();
            assert_eq!(renderer.batch().triangle_count(), 2);
            renderer.discard_frame();
            assert!(renderer.batch().is_empty());
        }
    }
}
