/// Per-triangle software pipeline: transform, clip, project, cull, rasterize
use nalgebra::{Matrix4, Vector3, Vector4};

use crate::framebuffer::FrameBuffer;
use crate::geometry::Geometry;
use crate::material::Material;
use crate::matrix_stack::MatrixStack;
use crate::shader::{Shader, ShaderUniform, Vertex};

/// A clipped triangle can gain at most one vertex per frustum plane.
pub const MAX_CLIPPED_VERTICES: usize = 3 + 6;

/// Triangles whose doubled screen-space area is below this produce no
/// fragments. Rendered output depends on the exact threshold.
const DEGENERATE_AREA_EPSILON: f32 = 0.1;

/// Clip the polygon `input[..num]` against one frustum plane, writing the
/// surviving vertices to `out`. `elem` selects the coordinate (0 = x,
/// 1 = y, 2 = z) and `coef` the plane sign: a vertex is inside while
/// `coef * e <= w`. Crossing edges are split at
/// `t = -(c*e1 + w1) / (c*(e2 - e1) + (w2 - w1))` with `c = -coef`,
/// interpolating position, normal (renormalized), uv and color.
fn clip(input: &[Vertex], num: usize, out: &mut [Vertex], elem: usize, coef: f32) -> usize {
    let mut head = 0;

    for i in 0..num {
        let v1 = input[i];
        let v2 = input[(i + 1) % num];
        let e1 = v1.pos[elem];
        let w1 = v1.pos.w;
        let e2 = v2.pos[elem];
        let w2 = v2.pos.w;

        let e1_in = coef * e1 <= w1;
        let e2_in = coef * e2 <= w2;

        if !e1_in && !e2_in {
            continue;
        }
        if e1_in {
            out[head] = v1;
            head += 1;
        }
        if e1_in != e2_in {
            let c = -coef;
            let t = -(c * e1 + w1) / (c * (e2 - e1) + (w2 - w1));
            out[head] = lerp_vertex(&v1, &v2, t);
            head += 1;
        }
    }

    head
}

fn lerp_vertex(v1: &Vertex, v2: &Vertex, t: f32) -> Vertex {
    let nrm = v1.nrm.lerp(&v2.nrm, t);
    Vertex {
        pos: v1.pos.lerp(&v2.pos, t),
        nrm: nrm.try_normalize(0.0).unwrap_or(nrm),
        uv: v1.uv.lerp(&v2.uv, t),
        color: v1.color.lerp(&v2.color, t),
    }
}

/// Run the triangle through all six clip planes, ping-ponging between the
/// two scratch polygons. The result ends up in `clipped`.
fn clip_vertices(
    vertices: &[Vertex; 3],
    tmp: &mut [Vertex; MAX_CLIPPED_VERTICES],
    clipped: &mut [Vertex; MAX_CLIPPED_VERTICES],
) -> usize {
    let mut num = clip(vertices, 3, tmp, 0, -1.0);
    num = clip(&tmp[..], num, &mut clipped[..], 0, 1.0);
    num = clip(&clipped[..], num, &mut tmp[..], 1, -1.0);
    num = clip(&tmp[..], num, &mut clipped[..], 1, 1.0);
    num = clip(&clipped[..], num, &mut tmp[..], 2, -1.0);
    num = clip(&tmp[..], num, &mut clipped[..], 2, 1.0);
    num
}

/// Signed-area winding test on the first three vertices of the polygon.
fn is_ccw(vertices: &[Vertex]) -> bool {
    let x1 = vertices[1].pos.x - vertices[0].pos.x;
    let y1 = vertices[1].pos.y - vertices[0].pos.y;
    let x2 = vertices[2].pos.x - vertices[0].pos.x;
    let y2 = vertices[2].pos.y - vertices[0].pos.y;
    x1 * y2 - x2 * y1 > 0.0
}

/// Orchestrates the per-triangle pipeline against one frame buffer.
///
/// `light_dir` and `ambient` are global lighting state the host may set per
/// frame (the light direction is expected in view space). The scratch
/// vertex arrays are reused across triangles and frames; draw calls are
/// strictly sequential.
pub struct Renderer {
    pub frame_buffer: FrameBuffer,
    pub light_dir: Vector3<f32>,
    pub ambient: Vector4<f32>,
    pub projection_matrix: Matrix4<f32>,
    pub matrix_stack: MatrixStack,
    pub clear_color: u32,

    ndc_vertices: [Vertex; 3],
    ndc_clipped: [Vertex; MAX_CLIPPED_VERTICES],
    ndc_tmp_clipped: [Vertex; MAX_CLIPPED_VERTICES],
}

impl Renderer {
    /// A renderer drawing into `frame_buffer`, with a default perspective
    /// projection (90° vertical fov, near 1, far 300, aspect from the
    /// buffer resolution).
    pub fn new(frame_buffer: FrameBuffer, clear_color: u32) -> Self {
        let aspect = frame_buffer.width as f32 / frame_buffer.height as f32;
        Self {
            frame_buffer,
            light_dir: Vector3::new(1.0, 1.0, 1.0).normalize(),
            ambient: Vector4::new(0.1, 0.1, 0.1, 1.0),
            projection_matrix: Matrix4::new_perspective(aspect, std::f32::consts::FRAC_PI_2, 1.0, 300.0),
            matrix_stack: MatrixStack::new(),
            clear_color,
            ndc_vertices: [Vertex::default(); 3],
            ndc_clipped: [Vertex::default(); MAX_CLIPPED_VERTICES],
            ndc_tmp_clipped: [Vertex::default(); MAX_CLIPPED_VERTICES],
        }
    }

    /// Replace the projection, keeping the frame buffer's aspect ratio.
    pub fn set_perspective(&mut self, fovy: f32, znear: f32, zfar: f32) {
        let aspect = self.frame_buffer.width as f32 / self.frame_buffer.height as f32;
        self.projection_matrix = Matrix4::new_perspective(aspect, fovy, znear, zfar);
    }

    /// Reset the frame buffer for a new frame: clear color, far depth.
    pub fn clear(&mut self) {
        self.frame_buffer.clear(self.clear_color);
    }

    /// Draw an indexed triangle list with `material` bound. Assumes the
    /// geometry has been validated at load time.
    pub fn draw_primitives(&mut self, geometry: &Geometry, material: &Material) {
        let mv = *self.matrix_stack.current_matrix();
        let mvp = self.projection_matrix * mv;
        let uniform = ShaderUniform {
            mv,
            mvp,
            material: Some(material),
            light_dir: self.light_dir,
            ambient: self.ambient,
        };
        let shader = material.shader.as_ref();

        let width = self.frame_buffer.width as f32;
        let height = self.frame_buffer.height as f32;

        for i in (0..geometry.index_buffer.len()).step_by(3) {
            for j in 0..3 {
                shader.vertex(&uniform, geometry, i + j, &mut self.ndc_vertices[j]);
            }

            let count =
                clip_vertices(&self.ndc_vertices, &mut self.ndc_tmp_clipped, &mut self.ndc_clipped);
            if count < 3 {
                continue;
            }

            // perspective divide
            for v in &mut self.ndc_clipped[..count] {
                let w = v.pos.w;
                v.pos.x /= w;
                v.pos.y /= w;
                v.pos.z /= w;
            }

            // backface culling drops the whole clipped polygon
            if !is_ccw(&self.ndc_clipped) {
                continue;
            }

            // screen mapping, NDC-up to screen-down
            for v in &mut self.ndc_clipped[..count] {
                v.pos.x = (v.pos.x + 1.0) / 2.0 * width;
                v.pos.y = (1.0 - (v.pos.y + 1.0) / 2.0) * height;
            }

            // fan around vertex 0
            for j in 0..count - 2 {
                let v0 = self.ndc_clipped[0];
                let v1 = self.ndc_clipped[1 + j];
                let v2 = self.ndc_clipped[2 + j];
                self.draw_triangle(&uniform, shader, v0, v1, v2);
            }
        }
    }

    /// Scanline rasterization of one screen-space triangle with barycentric
    /// interpolation and a strict less-than depth test.
    fn draw_triangle(
        &mut self,
        uniform: &ShaderUniform,
        shader: &dyn Shader,
        v1: Vertex,
        v2: Vertex,
        v3: Vertex,
    ) {
        let fb = &mut self.frame_buffer;
        let (width, height) = (fb.width as f32, fb.height as f32);

        let mut min_x = width;
        let mut max_x = 0.0f32;
        let mut min_y = height;
        let mut max_y = 0.0f32;
        for v in [&v1, &v2, &v3] {
            min_x = min_x.min(v.pos.x);
            max_x = max_x.max(v.pos.x);
            min_y = min_y.min(v.pos.y);
            max_y = max_y.max(v.pos.y);
        }

        // clamp to the frame buffer
        let min_x = min_x.max(0.0);
        let min_y = min_y.max(0.0);
        let max_x = max_x.min(width);
        let max_y = max_y.min(height);

        let ab_x = v2.pos.x - v1.pos.x;
        let ab_y = v2.pos.y - v1.pos.y;
        let ac_x = v3.pos.x - v1.pos.x;
        let ac_y = v3.pos.y - v1.pos.y;

        // twice the signed area; degenerate triangles produce no fragments
        let denom = ab_x * ac_y - ac_x * ab_y;
        if denom.abs() < DEGENERATE_AREA_EPSILON {
            return;
        }

        for y in (min_y as usize)..(max_y.ceil() as usize) {
            let row = fb.width * y;
            for x in (min_x as usize)..(max_x.ceil() as usize) {
                let pa_x = v1.pos.x - x as f32;
                let pa_y = v1.pos.y - y as f32;
                let cross_u = ac_x * pa_y - pa_x * ac_y;
                let cross_v = pa_x * ab_y - ab_x * pa_y;

                let bc = Vector3::new(
                    1.0 - (cross_u + cross_v) / denom,
                    cross_u / denom,
                    cross_v / denom,
                );
                if bc.x < 0.0 || bc.y < 0.0 || bc.z < 0.0 {
                    continue;
                }

                let z = v1.pos.z * bc.x + v2.pos.z * bc.y + v3.pos.z * bc.z;
                let idx = row + x;
                if z >= fb.depth_buffer[idx] {
                    continue;
                }

                let color = match shader.fragment(uniform, &v1, &v2, &v3, &bc) {
                    Some(color) => color,
                    // discarded fragment: no color, no depth write
                    None => continue,
                };
                fb.color_buffer[idx] = color;
                fb.depth_buffer[idx] = z;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::FlatShader;

    /// Writes a fixed color for every covered fragment.
    struct ConstShader(u32);

    impl Shader for ConstShader {
        fn vertex(&self, uniform: &ShaderUniform, geometry: &Geometry, index_idx: usize, out: &mut Vertex) {
            FlatShader::new().vertex(uniform, geometry, index_idx, out);
        }

        fn fragment(
            &self,
            _uniform: &ShaderUniform,
            _v1: &Vertex,
            _v2: &Vertex,
            _v3: &Vertex,
            _bc: &Vector3<f32>,
        ) -> Option<u32> {
            Some(self.0)
        }
    }

    fn clip_vertex(x: f32, y: f32, z: f32, w: f32) -> Vertex {
        Vertex {
            pos: Vector4::new(x, y, z, w),
            ..Vertex::default()
        }
    }

    fn run_clip(vertices: [Vertex; 3]) -> (usize, [Vertex; MAX_CLIPPED_VERTICES]) {
        let mut tmp = [Vertex::default(); MAX_CLIPPED_VERTICES];
        let mut clipped = [Vertex::default(); MAX_CLIPPED_VERTICES];
        let num = clip_vertices(&vertices, &mut tmp, &mut clipped);
        (num, clipped)
    }

    #[test]
    fn test_clip_inside_is_identity() {
        let vertices = [
            clip_vertex(-0.5, -0.5, 0.0, 1.0),
            clip_vertex(0.5, -0.5, 0.0, 1.0),
            clip_vertex(0.0, 0.5, 0.0, 1.0),
        ];
        let (num, clipped) = run_clip(vertices);
        assert_eq!(num, 3);
        assert_eq!(clipped[..3], vertices[..]);
    }

    #[test]
    fn test_clip_fully_outside_one_plane() {
        let vertices = [
            clip_vertex(2.0, 0.0, 0.0, 1.0),
            clip_vertex(3.0, 0.0, 0.0, 1.0),
            clip_vertex(2.5, 1.0, 0.0, 1.0),
        ];
        let (num, _) = run_clip(vertices);
        assert_eq!(num, 0);
    }

    #[test]
    fn test_clip_crossing_one_plane_adds_vertex() {
        let vertices = [
            clip_vertex(0.0, -0.5, 0.0, 1.0),
            clip_vertex(1.5, 0.0, 0.0, 1.0),
            clip_vertex(0.0, 0.5, 0.0, 1.0),
        ];
        let (num, clipped) = run_clip(vertices);
        assert_eq!(num, 4);
        for v in &clipped[..num] {
            assert!(v.pos.x <= v.pos.w + 1e-6);
        }
    }

    #[test]
    fn test_clip_never_exceeds_nine_vertices() {
        let vertices = [
            clip_vertex(-10.0, -10.0, 0.0, 1.0),
            clip_vertex(10.0, -10.0, 0.0, 1.0),
            clip_vertex(0.0, 10.0, 0.0, 1.0),
        ];
        let (num, clipped) = run_clip(vertices);
        assert!((3..=MAX_CLIPPED_VERTICES).contains(&num));
        for v in &clipped[..num] {
            assert!(v.pos.x.abs() <= v.pos.w + 1e-5);
            assert!(v.pos.y.abs() <= v.pos.w + 1e-5);
        }
    }

    #[test]
    fn test_clip_interpolates_at_plane() {
        let mut v1 = clip_vertex(0.0, 0.0, 0.0, 1.0);
        let mut v2 = clip_vertex(2.0, 0.0, 0.0, 1.0);
        v1.color = Vector4::new(0.0, 0.0, 0.0, 1.0);
        v2.color = Vector4::new(1.0, 1.0, 1.0, 1.0);

        let mut out = [Vertex::default(); MAX_CLIPPED_VERTICES];
        // clip the edge v1 -> v2 against x = +w
        let num = clip(&[v1, v2], 2, &mut out, 0, 1.0);
        assert_eq!(num, 3);
        assert_eq!(out[1].pos.x, 1.0);
        assert_eq!(out[1].color.x, 0.5);
    }

    fn test_renderer(size: usize) -> Renderer {
        let mut renderer = Renderer::new(FrameBuffer::new(size, size), 0x000000FF);
        // identity projection: clip space == model space
        renderer.projection_matrix = Matrix4::identity();
        renderer
    }

    fn triangle_geometry(v0: [f32; 3], v1: [f32; 3], v2: [f32; 3]) -> Geometry {
        let mut vertex_buffer = Vec::new();
        vertex_buffer.extend_from_slice(&v0);
        vertex_buffer.extend_from_slice(&v1);
        vertex_buffer.extend_from_slice(&v2);
        Geometry {
            index_buffer: vec![0, 1, 2],
            vertex_buffer,
            normal_buffer: None,
            uv_buffer: None,
        }
    }

    fn const_material(color: u32) -> Material {
        Material::new(Box::new(ConstShader(color)))
    }

    #[test]
    fn test_draw_covers_center_pixel() {
        let mut renderer = test_renderer(8);
        renderer.clear();
        let geometry =
            triangle_geometry([-0.9, -0.9, 0.0], [0.9, -0.9, 0.0], [0.0, 0.9, 0.0]);
        renderer.draw_primitives(&geometry, &const_material(0xFF0000FF));

        let idx = renderer.frame_buffer.index(4, 4);
        assert_eq!(renderer.frame_buffer.color_buffer[idx], 0xFF0000FF);
        assert!(renderer.frame_buffer.depth_buffer[idx] < 1.0);
    }

    #[test]
    fn test_backface_is_culled() {
        let mut renderer = test_renderer(8);
        renderer.clear();
        // clockwise winding
        let geometry =
            triangle_geometry([-0.9, -0.9, 0.0], [0.0, 0.9, 0.0], [0.9, -0.9, 0.0]);
        renderer.draw_primitives(&geometry, &const_material(0xFF0000FF));

        assert!(renderer.frame_buffer.color_buffer.iter().all(|&c| c == 0x000000FF));
        assert!(renderer.frame_buffer.depth_buffer.iter().all(|&z| z == 1.0));
    }

    #[test]
    fn test_depth_test_is_order_independent() {
        let far = triangle_geometry([-0.9, -0.9, 0.75], [0.9, -0.9, 0.75], [0.0, 0.9, 0.75]);
        let near = triangle_geometry([-0.9, -0.9, 0.25], [0.9, -0.9, 0.25], [0.0, 0.9, 0.25]);
        let red = const_material(0xFF0000FF);
        let green = const_material(0x00FF00FF);

        for (geo_a, mat_a, geo_b, mat_b) in
            [(&far, &red, &near, &green), (&near, &green, &far, &red)]
        {
            let mut renderer = test_renderer(8);
            renderer.clear();
            renderer.draw_primitives(geo_a, mat_a);
            renderer.draw_primitives(geo_b, mat_b);

            let idx = renderer.frame_buffer.index(4, 4);
            assert_eq!(renderer.frame_buffer.color_buffer[idx], 0x00FF00FF);
            assert!((renderer.frame_buffer.depth_buffer[idx] - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn test_degenerate_triangle_produces_no_fragments() {
        let mut renderer = test_renderer(8);
        renderer.clear();

        let uniform = ShaderUniform {
            mv: Matrix4::identity(),
            mvp: Matrix4::identity(),
            material: None,
            light_dir: renderer.light_dir,
            ambient: renderer.ambient,
        };
        // screen-space sliver: doubled area 0.06, below the 0.1 threshold
        let v1 = clip_vertex(0.0, 0.0, 0.0, 1.0);
        let v2 = clip_vertex(4.0, 0.01, 0.0, 1.0);
        let v3 = clip_vertex(2.0, 0.02, 0.0, 1.0);
        renderer.draw_triangle(&uniform, &ConstShader(0xFF0000FF), v1, v2, v3);

        assert!(renderer.frame_buffer.color_buffer.iter().all(|&c| c == 0x000000FF));
    }

    #[test]
    fn test_discarded_fragment_keeps_depth() {
        let mut renderer = test_renderer(8);
        renderer.clear();
        let geometry =
            triangle_geometry([-0.9, -0.9, 0.0], [0.9, -0.9, 0.0], [0.0, 0.9, 0.0]);
        struct DiscardShader;
        impl Shader for DiscardShader {
            fn vertex(&self, uniform: &ShaderUniform, geometry: &Geometry, index_idx: usize, out: &mut Vertex) {
                FlatShader::new().vertex(uniform, geometry, index_idx, out);
            }
            fn fragment(
                &self,
                _uniform: &ShaderUniform,
                _v1: &Vertex,
                _v2: &Vertex,
                _v3: &Vertex,
                _bc: &Vector3<f32>,
            ) -> Option<u32> {
                None
            }
        }
        renderer.draw_primitives(&geometry, &Material::new(Box::new(DiscardShader)));

        assert!(renderer.frame_buffer.color_buffer.iter().all(|&c| c == 0x000000FF));
        assert!(renderer.frame_buffer.depth_buffer.iter().all(|&z| z == 1.0));
    }
}
