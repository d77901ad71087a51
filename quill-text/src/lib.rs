//! # quill-text
//!
//! CPU side of the Quill text path: font outlines, the scanline glyph
//! rasterizer, the single-channel atlas it fills, and text layout.
//!
//! ## Architecture
//!
//! ```text
//! OutlineSource (TtfOutlines / OutlineMap)
//!     │  glyph(char) ──► GlyphOutline { contours, metrics }
//!     ▼
//! GlyphRasterizer::build ──► FontAtlas
//!     │                        ├── CoverageBitmap  (R8 texture upload)
//!     │                        └── TextLayout      (glyph records)
//!     ▼
//! TextLayout::draw_text ──► QuadSink (GPU batch)
//! ```
//!
//! - **`outline`**: Contour layout, metrics, the `OutlineSource` seam.
//! - **`fonts`**: TrueType loading (`ttf-parser`) and system lookup (`font-kit`).
//! - **`atlas`**: Coverage bitmap, marker values, packing pen.
//! - **`rasterizer`**: Outline flattening and row fill.
//! - **`layout`**: Measurement and screen-space glyph quads.

pub mod atlas;
pub mod fonts;
pub mod layout;
pub mod outline;
pub mod rasterizer;

// Re-exports for ergonomic use.
pub use atlas::{AtlasPen, AtlasRect, CoverageBitmap};
pub use fonts::{load_system_font, FontError, TtfOutlines};
pub use layout::{GlyphQuad, QuadSink, TextLayout};
pub use outline::{
    polygon_contour, FontMetrics, GlyphMetrics, GlyphOutline, OutlineMap, OutlineSource,
};
pub use rasterizer::{FontAtlas, GlyphRasterizer, GlyphRecord, RasterConfig, RasterError};
