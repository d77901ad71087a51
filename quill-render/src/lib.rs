//! # quill-render
//!
//! Batched 2D mesh and text renderer on `wgpu`. Every shape and glyph of
//! a frame shares one coverage atlas, one pipeline and one draw call.
//!
//! ## Architecture
//!
//! ```text
//!  FontAtlas (quill-text)
//!       │  bitmap ──► R8 texture      layout ──► glyph quads
//!       ▼
//!  Renderer.canvas()                ◀─── draw / draw_rect / draw_text …
//!       │
//!       ▼
//!  BatchRenderer                    ◀─── vertex + index arenas
//!       │
//!       ▼
//!  Renderer.flush_to_surface()      ◀─── upload, single draw, reset
//! ```
//!
//! ## Crate modules
//!
//! - [`arena`]: fixed-capacity bump allocator for staging bytes
//! - [`vertex`]: vertex and camera data types
//! - [`mesh`]: rectangles, fan-triangulated shape builders
//! - [`batch`]: per-frame triangle accumulation
//! - [`canvas`]: immediate-mode drawing API
//! - [`config`]: batch capacities and clear color
//! - [`context`]: GPU device/queue/surface initialisation
//! - [`pipelines`]: the atlas render pipeline
//! - [`renderer`]: frame orchestration and flush

pub mod arena;
pub mod batch;
pub mod canvas;
pub mod config;
pub mod context;
pub mod mesh;
pub mod pipelines;
pub mod renderer;
pub mod vertex;

// Re-exports for convenience
pub use arena::{Arena, ArenaError, ArenaSlot};
pub use batch::BatchRenderer;
pub use canvas::{color, Canvas};
pub use config::RendererConfig;
pub use context::{GpuContext, GpuError};
pub use mesh::{fan_is_valid, Mesh, Rect};
pub use renderer::{FrameStats, RenderError, Renderer};
pub use vertex::{CameraUniform, Vertex};
