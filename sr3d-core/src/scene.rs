/// Scene graph of transformable nodes
use nalgebra::{Matrix4, UnitQuaternion, Vector3};

use crate::aabb::AABBox;
use crate::geometry::Geometry;
use crate::material::Material;
use crate::math;
use crate::shader::Shader;

/// Renderable payload attached to a model node.
#[derive(Debug)]
pub struct Model {
    pub geometry: Geometry,
    pub material: Material,
}

impl Model {
    pub fn new(shader: Box<dyn Shader>) -> Self {
        Self {
            geometry: Geometry::new(),
            material: Material::new(shader),
        }
    }
}

/// What a node contributes when visited: nothing, or a model draw.
#[derive(Debug)]
pub enum NodeKind {
    Group,
    Model(Model),
}

/// One node of the scene tree. Owns its children exclusively; the tree has
/// no sharing and no cycles.
#[derive(Debug)]
pub struct Node {
    pub children: Vec<Node>,
    pub rotation: UnitQuaternion<f32>,
    pub position: Vector3<f32>,
    pub bounds: Option<AABBox>,
    pub name: Option<String>,
    pub kind: NodeKind,
}

impl Node {
    /// A plain grouping node: identity rotation, zero position, no bounds.
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            rotation: UnitQuaternion::identity(),
            position: Vector3::zeros(),
            bounds: None,
            name: None,
            kind: NodeKind::Group,
        }
    }

    /// A leaf carrying renderable geometry. Bounds start empty; importers
    /// compute them from the vertex buffer.
    pub fn from_model(model: Model) -> Self {
        Self {
            bounds: Some(AABBox::new()),
            kind: NodeKind::Model(model),
            ..Self::new()
        }
    }

    pub fn model(&self) -> Option<&Model> {
        match &self.kind {
            NodeKind::Model(model) => Some(model),
            NodeKind::Group => None,
        }
    }

    pub fn model_mut(&mut self) -> Option<&mut Model> {
        match &mut self.kind {
            NodeKind::Model(model) => Some(model),
            NodeKind::Group => None,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute composite bounds bottom-up: expand each node's box over its
/// children's bounds transformed by their local rotation+translation.
/// Leaf bounds (computed from vertex buffers at load time) are kept as-is.
pub fn calc_bounds(node: &mut Node) {
    let mut bounds = node.bounds.take().unwrap_or_default();

    for child in &mut node.children {
        calc_bounds(child);

        let child_bounds = match child.bounds {
            Some(b) if !b.is_empty() => b,
            _ => continue,
        };
        let local = Matrix4::new_translation(&child.position) * child.rotation.to_homogeneous();
        for nth in 0..8 {
            let corner = math::transform_aabb_corner(&child_bounds, &local, nth);
            bounds.expand(corner.xyz());
        }
    }

    node.bounds = Some(bounds);
}
