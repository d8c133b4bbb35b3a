/// SR3D Core Library - Software scene-graph rasterizer
///
/// This library implements a CPU-only 3D pipeline: a scene graph of
/// transformable nodes, homogeneous clipping, perspective rasterization
/// with depth buffering, and pluggable shading. Scene import from OBJ/MTL
/// and JSON descriptions is included; presentation is left to host crates.

pub mod aabb;
pub mod color;
pub mod framebuffer;
pub mod geometry;
pub mod json;
pub mod material;
pub mod math;
pub mod matrix_stack;
pub mod obj;
pub mod renderer;
pub mod scene;
pub mod shader;
pub mod texture;
pub mod traverser;

// Re-export commonly used types
pub use aabb::AABBox;
pub use color::Color;
pub use framebuffer::FrameBuffer;
pub use geometry::{Geometry, GeometryError};
pub use json::load_scene_graph_from_json;
pub use material::Material;
pub use matrix_stack::{MatrixStack, MAX_STACK_SIZE};
pub use obj::{load_scene_graph_from_obj, ObjResource};
pub use renderer::Renderer;
pub use scene::{calc_bounds, Model, Node, NodeKind};
pub use shader::{FlatShader, Shader, ShaderUniform, Vertex};
pub use texture::Texture;
pub use traverser::Traverser;
