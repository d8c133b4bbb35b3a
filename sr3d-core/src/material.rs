/// Surface materials binding lighting terms, an optional texture and a shader
use nalgebra::Vector4;

use crate::shader::Shader;
use crate::texture::Texture;

/// How a model's surface is evaluated: lighting terms plus the shader that
/// consumes them. Color components are RGBA in 0..1.
pub struct Material {
    pub shader: Box<dyn Shader>,
    pub ambient: Vector4<f32>,
    pub diffuse: Vector4<f32>,
    pub specular: Vector4<f32>,
    pub texture: Option<Texture>,
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("shader", &"<dyn Shader>")
            .field("ambient", &self.ambient)
            .field("diffuse", &self.diffuse)
            .field("specular", &self.specular)
            .field("texture", &self.texture)
            .finish()
    }
}

impl Material {
    pub fn new(shader: Box<dyn Shader>) -> Self {
        Self {
            shader,
            ambient: Vector4::zeros(),
            diffuse: Vector4::zeros(),
            specular: Vector4::zeros(),
            texture: None,
        }
    }
}
