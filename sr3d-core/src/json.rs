/// Three.js-style JSON scene import
///
/// Understands the object-tree subset the renderer needs: `Scene` groups
/// and `Mesh` objects whose `geometry`/`material` uuids resolve into
/// indexed position+normal buffers and a packed diffuse color.
use nalgebra::Vector4;
use serde::Deserialize;
use thiserror::Error;

use crate::aabb::AABBox;
use crate::geometry::GeometryError;
use crate::scene::{calc_bounds, Model, Node};
use crate::shader::FlatShader;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("invalid scene JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported object type: {0}")]
    UnsupportedObject(String),
    #[error("mesh without geometry or material reference")]
    IncompleteMesh,
    #[error("unknown geometry uuid: {0}")]
    UnknownGeometry(String),
    #[error("unknown material uuid: {0}")]
    UnknownMaterial(String),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(Deserialize)]
struct SceneFile {
    object: ObjectDef,
    #[serde(default)]
    geometries: Vec<GeometryDef>,
    #[serde(default)]
    materials: Vec<MaterialDef>,
}

#[derive(Deserialize)]
struct ObjectDef {
    #[serde(rename = "type")]
    object_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    geometry: Option<String>,
    #[serde(default)]
    material: Option<String>,
    #[serde(default)]
    children: Vec<ObjectDef>,
}

#[derive(Deserialize)]
struct GeometryDef {
    uuid: String,
    data: GeometryData,
}

#[derive(Deserialize)]
struct GeometryData {
    index: IndexAttribute,
    attributes: GeometryAttributes,
}

#[derive(Deserialize)]
struct IndexAttribute {
    array: Vec<u32>,
}

#[derive(Deserialize)]
struct GeometryAttributes {
    position: FloatAttribute,
    normal: FloatAttribute,
}

#[derive(Deserialize)]
struct FloatAttribute {
    array: Vec<f32>,
}

#[derive(Deserialize)]
struct MaterialDef {
    uuid: String,
    color: u32,
}

/// Load a scene graph from three.js-style JSON text.
pub fn load_scene_graph_from_json(json_text: &str) -> Result<Node, JsonError> {
    let data: SceneFile = serde_json::from_str(json_text)?;

    let mut root = parse_object_tree(&data.object, &data)?;
    calc_bounds(&mut root);
    Ok(root)
}

fn parse_object_tree(obj: &ObjectDef, data: &SceneFile) -> Result<Node, JsonError> {
    let mut node = match obj.object_type.as_str() {
        "Scene" => Node::new(),
        "Mesh" => create_model(obj, data)?,
        other => return Err(JsonError::UnsupportedObject(other.to_string())),
    };
    node.name = obj.name.clone();

    for child in &obj.children {
        node.children.push(parse_object_tree(child, data)?);
    }

    Ok(node)
}

fn create_model(obj: &ObjectDef, data: &SceneFile) -> Result<Node, JsonError> {
    let geometry_uuid = obj.geometry.as_deref().ok_or(JsonError::IncompleteMesh)?;
    let material_uuid = obj.material.as_deref().ok_or(JsonError::IncompleteMesh)?;

    let geometry = data
        .geometries
        .iter()
        .find(|g| g.uuid == geometry_uuid)
        .ok_or_else(|| JsonError::UnknownGeometry(geometry_uuid.to_string()))?;
    let material = data
        .materials
        .iter()
        .find(|m| m.uuid == material_uuid)
        .ok_or_else(|| JsonError::UnknownMaterial(material_uuid.to_string()))?;

    let mut model = Model::new(Box::new(FlatShader::new()));
    model.geometry.index_buffer = geometry.data.index.array.clone();
    model.geometry.vertex_buffer = geometry.data.attributes.position.array.clone();
    model.geometry.normal_buffer = Some(geometry.data.attributes.normal.array.clone());
    model.geometry.validate()?;

    // packed 0xRRGGBB diffuse; ambient matches so unlit areas keep the hue
    let color = material.color;
    model.material.diffuse = Vector4::new(
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        (color & 0xFF) as f32 / 255.0,
        1.0,
    );
    model.material.ambient = model.material.diffuse;

    let bounds = AABBox::from_vertices(&model.geometry.vertex_buffer);
    let mut node = Node::from_model(model);
    node.bounds = Some(bounds);
    Ok(node)
}
