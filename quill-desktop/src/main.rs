//! Quill Desktop: shapes-and-text demo on the batched atlas renderer.
//!
//! Uses `winit` 0.30 for windowing and input and `quill-render` for GPU
//! rendering. Set `QUILL_FONT=/path/to/font.ttf` to override the system
//! sans-serif face.

mod scene;
mod state;

use log::info;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalPosition},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowAttributes, WindowId},
};

use quill_render::{GpuContext, RenderError, Renderer, RendererConfig};
use quill_text::{GlyphRasterizer, RasterConfig};
use state::AppState;

/// Log frame stats every this many frames.
const STATS_INTERVAL: u64 = 300;

/// Winit 0.30 application handler.
struct App {
    window: Option<Arc<Window>>,
    state: Option<AppState>,
    cursor: [f32; 2],
    frame_count: u64,
}

impl App {
    fn new() -> Self {
        Self {
            window: None,
            state: None,
            cursor: [0.0, 0.0],
            frame_count: 0,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("Quill")
            .with_inner_size(LogicalSize::new(800, 600))
            .with_min_inner_size(LogicalSize::new(320, 240));

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .expect("Failed to create window"),
        );

        let size = window.inner_size();
        let gpu = pollster::block_on(GpuContext::new_with_surface(
            window.clone(),
            size.width.max(1),
            size.height.max(1),
        ))
        .expect("Failed to initialize GPU");

        let font = state::load_font().expect("Failed to load font");
        let atlas = GlyphRasterizer::build(&font, RasterConfig::default())
            .expect("Failed to build glyph atlas");
        let renderer = pollster::block_on(Renderer::new(&gpu, atlas, RendererConfig::default()))
            .expect("Failed to create renderer");

        info!(
            "Quill Desktop initialized: {}×{}, GPU: {:?}",
            size.width,
            size.height,
            gpu.adapter.get_info().name
        );

        self.state = Some(AppState::new(gpu, renderer));
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let (Some(window), Some(state)) = (self.window.as_ref(), self.state.as_mut()) else {
            return;
        };

        match event {
            // ── Close / Escape ──────────────────────────────────
            WindowEvent::CloseRequested => {
                info!("Window closed after {} frames", self.frame_count);
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                info!("Escape pressed after {} frames", self.frame_count);
                event_loop.exit();
            }

            // ── Resize ──────────────────────────────────────────
            WindowEvent::Resized(new_size) => {
                state.resize(new_size.width, new_size.height);
                window.request_redraw();
            }

            // ── Mouse ───────────────────────────────────────────
            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                self.cursor = [x as f32, y as f32];
                if state.scene.cursor_moved(self.cursor) {
                    window.request_redraw();
                }
            }

            // ── Redraw ──────────────────────────────────────────
            WindowEvent::RedrawRequested => {
                match state.render_frame() {
                    Ok(stats) => {
                        self.frame_count += 1;
                        if self.frame_count % STATS_INTERVAL == 0 {
                            info!(
                                "Frame {}: {} vertices, {} triangles, {} draw call(s), {:.2} ms",
                                self.frame_count,
                                stats.vertex_count,
                                stats.triangle_count,
                                stats.draw_calls,
                                state.timer.smoothed_ms(),
                            );
                        }
                    }
                    Err(RenderError::Surface(
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated,
                    )) => {
                        let size = window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Render error: {e}");
                    }
                }
                // Continuous redraw keeps the frame-time readout live.
                window.request_redraw();
            }

            _ => {}
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Starting Quill Desktop...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
