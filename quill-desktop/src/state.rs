//! Application state: GPU context, renderer, the demo scene and frame timing.

use std::path::Path;
use std::time::Instant;

use log::info;
use quill_render::{FrameStats, GpuContext, RenderError, Renderer};
use quill_text::{FontError, TtfOutlines};

use crate::scene::Scene;

/// Environment variable naming a TTF/OTF file to load instead of the
/// system sans-serif face.
pub const FONT_ENV: &str = "QUILL_FONT";

/// Weight of the newest sample in the smoothed frame time.
const FRAME_SMOOTHING: f32 = 0.1;

/// Load the UI font from `QUILL_FONT`, else the system sans-serif.
pub fn load_font() -> Result<TtfOutlines, FontError> {
    match std::env::var_os(FONT_ENV) {
        Some(path) => {
            info!("Loading font from {FONT_ENV}={}", Path::new(&path).display());
            TtfOutlines::from_path(path)
        }
        None => TtfOutlines::from_system("sans-serif"),
    }
}

/// Exponentially smoothed frame interval in milliseconds.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Option<Instant>,
    smoothed_ms: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: None,
            smoothed_ms: 0.0,
        }
    }

    /// Record a frame boundary at `now` and return the smoothed interval.
    pub fn tick(&mut self, now: Instant) -> f32 {
        if let Some(last) = self.last {
            let ms = now.duration_since(last).as_secs_f32() * 1000.0;
            self.smoothed_ms = if self.smoothed_ms == 0.0 {
                ms
            } else {
                self.smoothed_ms + (ms - self.smoothed_ms) * FRAME_SMOOTHING
            };
        }
        self.last = Some(now);
        self.smoothed_ms
    }

    pub fn smoothed_ms(&self) -> f32 {
        self.smoothed_ms
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AppState {
    pub gpu: GpuContext,
    pub renderer: Renderer,
    pub scene: Scene,
    pub timer: FrameTimer,
}

impl AppState {
    pub fn new(gpu: GpuContext, renderer: Renderer) -> Self {
        Self {
            gpu,
            renderer,
            scene: Scene::demo(),
            timer: FrameTimer::new(),
        }
    }

    /// Emit the scene and present it as one draw call. A scene that
    /// overflows the batch loses the whole frame.
    pub fn render_frame(&mut self) -> Result<FrameStats, RenderError> {
        let frame_ms = self.timer.tick(Instant::now());
        let drawn = self.scene.draw(&mut self.renderer.canvas(), frame_ms);
        if let Err(e) = drawn {
            self.renderer.discard_frame();
            return Err(e.into());
        }
        self.renderer.flush_to_surface(&self.gpu)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timer_first_tick_is_zero() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.tick(Instant::now()), 0.0);
    }

    #[test]
    fn test_timer_smooths_intervals() {
        let mut timer = FrameTimer::new();
        let start = Instant::now();
        timer.tick(start);
        let first = timer.tick(start + Duration::from_millis(20));
        assert!((first - 20.0).abs() < 0.01);

        let second = timer.tick(start + Duration::from_millis(30));
        // 20 + (10 - 20) * 0.1
        assert!((second - 19.0).abs() < 0.01);
        assert_eq!(timer.smoothed_ms(), second);
    }

    #[test]
    fn test_missing_font_file_is_an_error() {
        let result = TtfOutlines::from_path("/nonexistent/quill.ttf");
        assert!(matches!(result, Err(FontError::Io(_))));
    }
}
