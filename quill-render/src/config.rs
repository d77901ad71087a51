//! Renderer configuration.

/// Batch capacities and the background color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererConfig {
    /// Vertex arena capacity, in vertices.
    pub max_vertices: usize,
    /// Index arena capacity, in `u32` indices.
    pub max_indices: usize,
    /// Linear RGBA clear color.
    pub clear_color: [f64; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_vertices: 65_536,
            max_indices: 196_608,
            clear_color: [0.12, 0.12, 0.13, 1.0],
        }
    }
}

impl RendererConfig {
    pub fn with_max_vertices(mut self, n: usize) -> Self {
        self.max_vertices = n;
        self
    }

    pub fn with_max_indices(mut self, n: usize) -> Self {
        self.max_indices = n;
        self
    }

    pub fn with_clear_color(mut self, r: f64, g: f64, b: f64, a: f64) -> Self {
        self.clear_color = [r, g, b, a];
        self
    }
}

// ===================================================================
// Tests
// ===================================================================
