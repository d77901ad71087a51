//! GPU vertex and uniform data types.
//!
//! All types derive `bytemuck::Pod` + `Zeroable` so they can be appended
//! to the staging arenas and uploaded without conversion.

use bytemuck::{Pod, Zeroable};
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

// ───────────────────────────────────────────────────────────────────
// Vertex
// ───────────────────────────────────────────────────────────────────

/// One batched vertex. 32 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Screen position in pixels, origin top-left.
    pub position: [f32; 2],
    /// RGBA multiplier, each channel in [0.0, 1.0].
    pub color: [f32; 4],
    /// Atlas coordinate; solid fills point at the reserved filled texel.
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 2], color: [f32; 4], uv: [f32; 2]) -> Self {
        Self {
            position,
            color,
            uv,
        }
    }

    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(0) = position
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x2,
            },
            // location(1) = color
            VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: VertexFormat::Float32x4,
            },
            // location(2) = uv
            VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: VertexFormat::Float32x2,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// Camera uniform
// ───────────────────────────────────────────────────────────────────

/// Projection uniform, rebuilt from the viewport on every flush.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    /// 4×4 orthographic projection matrix (column-major).
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    /// Orthographic projection for a `width × height` pixel viewport.
    ///
    /// Maps (0,0) to top-left and (width, height) to bottom-right, Y down.
    /// Depth passes through untouched.
    pub fn top_left(width: f32, height: f32) -> Self {
        let sx = 2.0 / width;
        let sy = -2.0 / height;

        Self {
            view_proj: [
                [sx,  0.0, 0.0, 0.0],
                [0.0, sy,  0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0, 1.0],
            ],
        }
    }

    /// Apply the projection to a 2D point, returning NDC `(x, y)`.
    pub fn project(&self, p: [f32; 2]) -> [f32; 2] {
        let m = &self.view_proj;
        [
            p[0] * m[0][0] + p[1] * m[1][0] + m[3][0],
            p[0] * m[0][1] + p[1] * m[1][1] + m[3][1],
        ]
    }
}

// ===================================================================
// Tests
// ===================================================================
