/// Pluggable per-vertex and per-fragment shading
use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

use crate::color::Color;
use crate::geometry::Geometry;
use crate::material::Material;

/// A pipeline vertex. `pos` is in clip space after the vertex stage, NDC
/// after the perspective divide, screen space during rasterization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Vector4<f32>,
    pub nrm: Vector4<f32>,
    pub uv: Vector2<f32>,
    pub color: Vector4<f32>,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            pos: Vector4::zeros(),
            nrm: Vector4::zeros(),
            uv: Vector2::zeros(),
            color: Vector4::zeros(),
        }
    }
}

/// Uniform context for one `draw_primitives` call. Built by the renderer
/// per draw and passed to both shader stages; shaders hold no state of
/// their own.
pub struct ShaderUniform<'a> {
    pub mv: Matrix4<f32>,
    pub mvp: Matrix4<f32>,
    pub material: Option<&'a Material>,
    pub light_dir: Vector3<f32>,
    pub ambient: Vector4<f32>,
}

pub trait Shader {
    /// Produce the clip-space vertex for index-buffer slot `index_idx`.
    fn vertex(&self, uniform: &ShaderUniform, geometry: &Geometry, index_idx: usize, out: &mut Vertex);

    /// Shade one fragment of the triangle (v1, v2, v3) at barycentric
    /// coordinates `bc`. `None` discards the fragment.
    fn fragment(
        &self,
        uniform: &ShaderUniform,
        v1: &Vertex,
        v2: &Vertex,
        v3: &Vertex,
        bc: &Vector3<f32>,
    ) -> Option<u32>;
}

/// Default shader: per-vertex Lambert lighting with optional
/// nearest-neighbor texturing in the fragment stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatShader;

impl FlatShader {
    pub fn new() -> Self {
        Self
    }
}

impl Shader for FlatShader {
    fn vertex(&self, uniform: &ShaderUniform, geometry: &Geometry, index_idx: usize, out: &mut Vertex) {
        let vb = &geometry.vertex_buffer;
        let v_idx = geometry.index_buffer[index_idx] as usize;

        out.pos = uniform.mvp
            * Vector4::new(vb[v_idx * 3], vb[v_idx * 3 + 1], vb[v_idx * 3 + 2], 1.0);

        match (&geometry.normal_buffer, uniform.material) {
            (Some(nb), Some(material)) => {
                out.nrm = uniform.mv
                    * Vector4::new(nb[v_idx * 3], nb[v_idx * 3 + 1], nb[v_idx * 3 + 2], 0.0);

                let intensity = uniform.light_dir.dot(&out.nrm.xyz()).max(0.0);
                out.color =
                    material.ambient.component_mul(&uniform.ambient) + material.diffuse * intensity;
            }
            _ => {
                out.nrm = Vector4::zeros();
                out.color = Vector4::new(1.0, 1.0, 1.0, 1.0);
            }
        }

        if let Some(uvb) = &geometry.uv_buffer {
            out.uv = Vector2::new(uvb[v_idx * 2], uvb[v_idx * 2 + 1]);
        }
    }

    fn fragment(
        &self,
        uniform: &ShaderUniform,
        v1: &Vertex,
        v2: &Vertex,
        v3: &Vertex,
        bc: &Vector3<f32>,
    ) -> Option<u32> {
        let material = uniform.material?;

        let tex = match &material.texture {
            Some(tex) => tex,
            None => return Some(Color::from(v1.color).to_hex()),
        };

        let u = (bc.dot(&Vector3::new(v1.uv.x, v2.uv.x, v3.uv.x)) * tex.width as f32) as usize;
        let v = (bc.dot(&Vector3::new(v1.uv.y, v2.uv.y, v3.uv.y)) * tex.height as f32) as usize;
        let texel = tex.texel(u, v);

        let color = v1.color * bc.x + v2.color * bc.y + v3.color * bc.z;
        let channel = |byte: u8, scale: f32| ((byte as f32 * scale) as u32).min(0xFF);

        Some(
            channel(texel[0], color.x) << 24
                | channel(texel[1], color.y) << 16
                | channel(texel[2], color.z) << 8
                | channel(texel[3], color.w),
        )
    }
}
