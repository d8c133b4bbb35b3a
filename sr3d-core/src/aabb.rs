/// Axis-aligned bounding boxes for frustum culling and camera framing
use nalgebra::Vector3;

/// An axis-aligned box, empty while `min.x > max.x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABBox {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl AABBox {
    /// Create an empty box (min at +infinity, max at -infinity).
    pub fn new() -> Self {
        Self {
            min: Vector3::repeat(f32::INFINITY),
            max: Vector3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Bounds of a flat x,y,z coordinate buffer.
    pub fn from_vertices(vertices: &[f32]) -> Self {
        let mut aabb = Self::new();
        aabb.calc_bounds(vertices);
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Reset to the empty state.
    pub fn empty(&mut self) {
        *self = Self::new();
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    /// Grow the bounds to include a point.
    pub fn expand(&mut self, v: Vector3<f32>) {
        self.min = self.min.inf(&v);
        self.max = self.max.sup(&v);
    }

    /// Reset to empty, then expand over every 3-tuple of the buffer.
    pub fn calc_bounds(&mut self, vertices: &[f32]) {
        self.empty();
        for p in vertices.chunks_exact(3) {
            self.expand(Vector3::new(p[0], p[1], p[2]));
        }
    }
}

impl Default for AABBox {
    fn default() -> Self {
        Self::new()
    }
}
