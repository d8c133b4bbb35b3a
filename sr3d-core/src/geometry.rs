/// Indexed triangle-list geometry buffers
use thiserror::Error;

/// A violated geometry precondition, caught at load time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("index buffer length {0} is not a multiple of 3")]
    IndexCount(usize),
    #[error("vertex buffer length {0} is not a multiple of 3")]
    VertexCount(usize),
    #[error("vertex index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("normal buffer length {got}, expected {expected}")]
    NormalCount { got: usize, expected: usize },
    #[error("uv buffer length {got}, expected {expected}")]
    UvCount { got: usize, expected: usize },
}

/// Renderable triangle-list geometry: three consecutive indices per
/// triangle, three floats per vertex position, optional normals (3 per
/// vertex) and texture coordinates (2 per vertex).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub index_buffer: Vec<u32>,
    pub vertex_buffer: Vec<f32>,
    pub normal_buffer: Option<Vec<f32>>,
    pub uv_buffer: Option<Vec<f32>>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_buffer.len() / 3
    }

    /// Check the buffer invariants. Importers call this before handing
    /// geometry to the pipeline; the rasterizer assumes it has passed.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.index_buffer.len() % 3 != 0 {
            return Err(GeometryError::IndexCount(self.index_buffer.len()));
        }
        if self.vertex_buffer.len() % 3 != 0 {
            return Err(GeometryError::VertexCount(self.vertex_buffer.len()));
        }

        let vertex_count = self.vertex_count();
        for &index in &self.index_buffer {
            if index as usize >= vertex_count {
                return Err(GeometryError::IndexOutOfRange { index, vertex_count });
            }
        }

        if let Some(normals) = &self.normal_buffer {
            if normals.len() != self.vertex_buffer.len() {
                return Err(GeometryError::NormalCount {
                    got: normals.len(),
                    expected: self.vertex_buffer.len(),
                });
            }
        }
        if let Some(uvs) = &self.uv_buffer {
            if uvs.len() != vertex_count * 2 {
                return Err(GeometryError::UvCount {
                    got: uvs.len(),
                    expected: vertex_count * 2,
                });
            }
        }

        Ok(())
    }

    /// Create an axis-aligned cube with per-face normals, for tests and
    /// demo scenes.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;

        // (face normal, four corners wound counter-clockwise seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]]),
            ([0.0, 0.0, -1.0], [[-h, -h, -h], [-h, h, -h], [h, h, -h], [h, -h, -h]]),
            ([0.0, 1.0, 0.0], [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]]),
            ([0.0, -1.0, 0.0], [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]]),
            ([1.0, 0.0, 0.0], [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]]),
            ([-1.0, 0.0, 0.0], [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]]),
        ];

        let mut geometry = Self::new();
        let mut normals = Vec::with_capacity(6 * 4 * 3);
        for (normal, corners) in &faces {
            let base = geometry.vertex_count() as u32;
            for corner in corners {
                geometry.vertex_buffer.extend_from_slice(corner);
                normals.extend_from_slice(normal);
            }
            geometry
                .index_buffer
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        geometry.normal_buffer = Some(normals);

        geometry
    }
}
