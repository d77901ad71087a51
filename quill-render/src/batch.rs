//! Batched triangle accumulation over two staging arenas.
//!
//! Draw requests append vertices and `u32` indices; indices are rebased
//! on the vertex cursor so every submission can use local numbering.
//! The whole batch is uploaded and drawn once per frame, then reset.

use quill_text::{GlyphQuad, QuadSink};

use crate::arena::{Arena, ArenaError};
use crate::config::RendererConfig;
use crate::mesh::{fan_is_valid, Mesh};
use crate::vertex::Vertex;

const VERTEX_SIZE: usize = std::mem::size_of::<Vertex>();
const INDEX_SIZE: usize = std::mem::size_of::<u32>();

pub struct BatchRenderer {
    vertices: Arena,
    indices: Arena,
    vertex_cursor: u32,
}

impl BatchRenderer {
    pub fn new(max_vertices: usize, max_indices: usize) -> Self {
        Self {
            vertices: Arena::with_capacity("vertices", max_vertices * VERTEX_SIZE),
            indices: Arena::with_capacity("indices", max_indices * INDEX_SIZE),
            vertex_cursor: 0,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.max_vertices, config.max_indices)
    }

    /// Append a triangulated mesh with one UV and color for every vertex.
    ///
    /// Capacity is checked up front; on error nothing is written.
    pub fn submit(&mut self, mesh: &Mesh, uv: [f32; 2], color: [f32; 4]) -> Result<(), ArenaError> {
        let vertices = mesh.vertices.iter().map(|&p| Vertex::new(p, color, uv));
        self.push(vertices, mesh.vertices.len(), &mesh.triangles)
    }

    /// Append a polygon with per-vertex UVs, fan-triangulated from
    /// `points[0]`. Fewer than 3 points is a no-op.
    pub fn submit_polygon(
        &mut self,
        points: &[[f32; 2]],
        uvs: &[[f32; 2]],
        color: [f32; 4],
    ) -> Result<(), ArenaError> {
        debug_assert_eq!(points.len(), uvs.len(), "one UV per polygon point");
        let n = points.len().min(uvs.len());
        if n < 3 {
            return Ok(());
        }
        if cfg!(debug_assertions) && !fan_is_valid(&points[..n]) {
            log::warn!("Polygon with {n} points folds under fan triangulation");
        }

        let triangles: Vec<[u32; 3]> = (2..n as u32).map(|i| [0, i - 1, i]).collect();
        let vertices = points
            .iter()
            .zip(uvs)
            .map(|(&p, &uv)| Vertex::new(p, color, uv));
        self.push(vertices, n, &triangles)
    }

    fn push(
        &mut self,
        vertices: impl Iterator<Item = Vertex>,
        vertex_count: usize,
        triangles: &[[u32; 3]],
    ) -> Result<(), ArenaError> {
        self.vertices.ensure(vertex_count * VERTEX_SIZE)?;
        self.indices.ensure(triangles.len() * 3 * INDEX_SIZE)?;

        let slot = self.vertices.allocate(vertex_count * VERTEX_SIZE)?;
        for (dst, v) in self
            .vertices
            .slot_mut(slot)
            .chunks_exact_mut(VERTEX_SIZE)
            .zip(vertices)
        {
            dst.copy_from_slice(bytemuck::bytes_of(&v));
        }

        let base = self.vertex_cursor;
        let slot = self.indices.allocate(triangles.len() * 3 * INDEX_SIZE)?;
        for (dst, &i) in self
            .indices
            .slot_mut(slot)
            .chunks_exact_mut(INDEX_SIZE)
            .zip(triangles.iter().flatten())
        {
            dst.copy_from_slice(bytemuck::bytes_of(&(base + i)));
        }

        self.vertex_cursor += vertex_count as u32;
        Ok(())
    }

    /// Drop everything accumulated since the last reset.
    pub fn reset(&mut self) {
        self.vertices.reset();
        self.indices.reset();
        self.vertex_cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_cursor
    }

    pub fn index_count(&self) -> u32 {
        (self.indices.len() / INDEX_SIZE) as u32
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        self.vertices.as_bytes()
    }

    pub fn index_bytes(&self) -> &[u8] {
        self.indices.as_bytes()
    }

    /// Decoded copy of the pending vertices.
    pub fn vertices(&self) -> Vec<Vertex> {
        self.vertices.read_all()
    }

    /// Decoded copy of the pending indices.
    pub fn indices(&self) -> Vec<u32> {
        self.indices.read_all()
    }
}

impl QuadSink for BatchRenderer {
    type Error = ArenaError;

    fn push_quad(&mut self, quad: &GlyphQuad, color: [f32; 4]) -> Result<(), ArenaError> {
        self.submit_polygon(&quad.points, &quad.uvs, color)
    }
}

// ===================================================================
// Tests
// ===================================================================
