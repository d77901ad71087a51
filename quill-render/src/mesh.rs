//! CPU-side 2D meshes and the shape builders that produce them.
//!
//! Every builder emits fan triangulations: each polygon contributes
//! `(first, i - 1, i)` for `i ≥ 2`. That is only correct for convex or
//! star-shaped polygons (as seen from the first point).

/// Axis-aligned rectangle in pixels, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center_size(center: [f32; 2], size: [f32; 2]) -> Self {
        Self::new(
            center[0] - size[0] * 0.5,
            center[1] - size[1] * 0.5,
            size[0],
            size[1],
        )
    }

    /// Rectangle spanned by two opposite corners, in any order.
    pub fn from_start_end(start: [f32; 2], end: [f32; 2]) -> Self {
        let center = [(start[0] + end[0]) * 0.5, (start[1] + end[1]) * 0.5];
        let size = [(end[0] - start[0]).abs(), (end[1] - start[1]).abs()];
        Self::from_center_size(center, size)
    }

    /// Strict containment; points on the edge are outside.
    pub fn contains(&self, p: [f32; 2]) -> bool {
        p[0] > self.x && p[1] > self.y && p[0] < self.x + self.width && p[1] < self.y + self.height
    }

    pub fn center(&self) -> [f32; 2] {
        [self.x + self.width * 0.5, self.y + self.height * 0.5]
    }

    pub fn size(&self) -> [f32; 2] {
        [self.width, self.height]
    }

    /// Corners clockwise on screen from the top-left.
    pub fn corners(&self) -> [[f32; 2]; 4] {
        let (x0, y0) = (self.x, self.y);
        let (x1, y1) = (self.x + self.width, self.y + self.height);
        [[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }
}

/// Triangulated shape ready for batch submission.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<[f32; 2]>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rect(rect: Rect) -> Self {
        let mut mesh = Self::new();
        mesh.push_rect(rect);
        mesh
    }

    /// Ellipse inscribed in `rect`, approximated by `segments` points.
    pub fn ellipse(rect: Rect, segments: u32) -> Self {
        let mut mesh = Self::new();
        mesh.push_ellipse(rect, segments);
        mesh
    }

    /// Frame of four bars of thickness `border` along the inside of `rect`.
    pub fn rect_border(rect: Rect, border: f32) -> Self {
        let mut mesh = Self::new();
        mesh.push_rect_border(rect, border);
        mesh
    }

    pub fn polygon(points: &[[f32; 2]]) -> Self {
        let mut mesh = Self::new();
        mesh.push_polygon(points);
        mesh
    }

    /// Append a fan-triangulated polygon. Fewer than 3 points adds nothing.
    pub fn push_polygon(&mut self, points: &[[f32; 2]]) {
        if points.len() < 3 {
            return;
        }
        if cfg!(debug_assertions) && !fan_is_valid(points) {
            log::warn!("Polygon with {} points folds under fan triangulation", points.len());
        }
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(points);
        self.triangles
            .extend((2..points.len() as u32).map(|i| [base, base + i - 1, base + i]));
    }

    pub fn push_rect(&mut self, rect: Rect) {
        self.push_polygon(&rect.corners());
    }

    pub fn push_ellipse(&mut self, rect: Rect, segments: u32) {
        let center = rect.center();
        let delta = std::f32::consts::TAU / segments as f32;
        let points: Vec<[f32; 2]> = (0..segments)
            .map(|i| {
                let a = i as f32 * delta;
                [
                    center[0] + a.cos() * rect.width * 0.5,
                    center[1] + a.sin() * rect.height * 0.5,
                ]
            })
            .collect();
        self.push_polygon(&points);
    }

    pub fn push_rect_border(&mut self, rect: Rect, border: f32) {
        let Rect {
            x,
            y,
            width,
            height,
        } = rect;
        self.push_rect(Rect::new(x, y, width, border));
        self.push_rect(Rect::new(x, y, border, height));
        self.push_rect(Rect::new(x, y + height - border, width, border));
        self.push_rect(Rect::new(x + width - border, y, border, height));
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Axis-aligned bounds of all vertices, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Rect> {
        let (first, rest) = self.vertices.split_first()?;
        let (mut min, mut max) = (*first, *first);
        for p in rest {
            min = [min[0].min(p[0]), min[1].min(p[1])];
            max = [max[0].max(p[0]), max[1].max(p[1])];
        }
        Some(Rect::new(min[0], min[1], max[0] - min[0], max[1] - min[1]))
    }

    pub fn center(&self) -> Option<[f32; 2]> {
        self.bounds().map(|b| b.center())
    }
}

/// Whether a fan from `points[0]` covers the polygon without folding:
/// every fan triangle winds the same way (degenerate ones are ignored).
pub fn fan_is_valid(points: &[[f32; 2]]) -> bool {
    let Some(&origin) = points.first() else {
        return true;
    };
    let mut sign = 0.0f32;
    for pair in points[1..].windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let cross =
            (a[0] - origin[0]) * (b[1] - origin[1]) - (a[1] - origin[1]) * (b[0] - origin[0]);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

// ===================================================================
// Tests
// ===================================================================
