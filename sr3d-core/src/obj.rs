/// OBJ/MTL scene import
///
/// Produces a validated `Node` tree: one model per `usemtl` statement,
/// wrapped in a group node when an OBJ file contains several. Textures and
/// material libraries are resolved through the `ObjResource` interface so
/// the importer never touches the filesystem itself.
use std::collections::HashMap;

use log::warn;
use nom::{
    character::complete::{char as nom_char, digit1, multispace0, multispace1},
    combinator::{all_consuming, map_res, opt},
    number::complete::float,
    sequence::preceded,
    IResult,
};
use thiserror::Error;

use crate::aabb::AABBox;
use crate::geometry::GeometryError;
use crate::scene::{calc_bounds, Model, Node};
use crate::shader::FlatShader;
use crate::texture::Texture;

/// Resolves the external resources an OBJ file refers to. Texture data is
/// already-decoded RGBA; image decoding happens on the host side.
pub trait ObjResource {
    fn material_text(&self, name: &str) -> Option<String>;
    fn texture_data(&self, name: &str) -> Option<Texture>;
}

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("line {line}: malformed {kind} statement")]
    Malformed { line: usize, kind: &'static str },
    #[error("line {line}: face statement before any usemtl")]
    FaceWithoutMaterial { line: usize },
    #[error("line {line}: reference to undefined vertex data")]
    UndefinedVertex { line: usize },
    #[error("no geometry in OBJ input")]
    Empty,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

#[derive(Debug, Clone, Default)]
struct ObjMaterial {
    ka: Option<[f32; 3]>,
    kd: Option<[f32; 3]>,
    ks: Option<[f32; 3]>,
    illum: Option<i32>,
    map_kd: Option<String>,
}

/// Load a scene graph from OBJ text, resolving `mtllib` and `map_Kd`
/// through `resource`.
pub fn load_scene_graph_from_obj(obj_text: &str, resource: &dyn ObjResource) -> Result<Node, ObjError> {
    ObjConverter::default().convert(obj_text, resource)
}

#[derive(Default)]
struct ObjConverter {
    positions: Vec<f32>,
    normals: Vec<f32>,
    uvs: Vec<f32>,
    materials: HashMap<String, ObjMaterial>,
}

/// A face corner: position index plus optional uv/normal indices, 1-based.
type FaceElement = (u32, Option<u32>, Option<u32>);

impl ObjConverter {
    fn convert(mut self, obj_text: &str, resource: &dyn ObjResource) -> Result<Node, ObjError> {
        self.parse_vertex_material(obj_text, resource)?;
        self.create_node(obj_text, resource)
    }

    /// First pass: vertex data and material libraries.
    fn parse_vertex_material(&mut self, obj_text: &str, resource: &dyn ObjResource) -> Result<(), ObjError> {
        for (idx, line) in obj_text.lines().enumerate() {
            let line_no = idx + 1;
            let (keyword, rest) = split_keyword(line);
            match keyword {
                "v" => {
                    let (_, (x, y, z)) = parse_vector3(rest)
                        .map_err(|_| ObjError::Malformed { line: line_no, kind: "v" })?;
                    self.positions.extend_from_slice(&[x, y, z]);
                }
                "vt" => {
                    let (_, (u, v)) = parse_vector2(rest)
                        .map_err(|_| ObjError::Malformed { line: line_no, kind: "vt" })?;
                    self.uvs.extend_from_slice(&[u, v]);
                }
                "vn" => {
                    let (_, (x, y, z)) = parse_vector3(rest)
                        .map_err(|_| ObjError::Malformed { line: line_no, kind: "vn" })?;
                    self.normals.extend_from_slice(&[x, y, z]);
                }
                "mtllib" => {
                    let name = rest.trim();
                    match resource.material_text(name) {
                        Some(text) => self.parse_material_lib(&text),
                        None => warn!("material library not found: {}", name),
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_material_lib(&mut self, mtl_text: &str) {
        let mut current: Option<(String, ObjMaterial)> = None;

        for line in mtl_text.lines() {
            let (keyword, rest) = split_keyword(line);
            if keyword == "newmtl" {
                if let Some((name, material)) = current.take() {
                    self.materials.insert(name, material);
                }
                current = Some((rest.trim().to_string(), ObjMaterial::default()));
                continue;
            }

            let material = match &mut current {
                Some((_, material)) => material,
                None => continue,
            };
            match keyword {
                "Ka" => material.ka = parse_color3(rest),
                "Kd" => material.kd = parse_color3(rest),
                "Ks" => material.ks = parse_color3(rest),
                "illum" => material.illum = rest.trim().parse().ok(),
                "map_Kd" => material.map_kd = Some(rest.trim().to_string()),
                _ => {}
            }
        }

        if let Some((name, material)) = current {
            self.materials.insert(name, material);
        }
    }

    /// Second pass: one model per usemtl, faces fanned and deduplicated.
    fn create_node(&self, obj_text: &str, resource: &dyn ObjResource) -> Result<Node, ObjError> {
        let mut models: Vec<Model> = Vec::new();
        let mut index_map: HashMap<FaceElement, u32> = HashMap::new();

        for (idx, line) in obj_text.lines().enumerate() {
            let line_no = idx + 1;
            let (keyword, rest) = split_keyword(line);
            match keyword {
                "usemtl" => {
                    models.push(self.create_model(rest.trim(), resource));
                    index_map.clear();
                }
                "f" => {
                    let model = models
                        .last_mut()
                        .ok_or(ObjError::FaceWithoutMaterial { line: line_no })?;

                    let mut corners = Vec::new();
                    for elem in rest.split_whitespace() {
                        let (_, corner) = all_consuming(parse_face_element)(elem)
                            .map_err(|_| ObjError::Malformed { line: line_no, kind: "f" })?;
                        corners.push(corner);
                    }
                    if corners.len() < 3 {
                        return Err(ObjError::Malformed { line: line_no, kind: "f" });
                    }

                    // fan polygons around the first corner
                    for k in 1..corners.len() - 1 {
                        for corner in [corners[0], corners[k], corners[k + 1]] {
                            self.push_corner(model, &mut index_map, corner, line_no)?;
                        }
                    }
                }
                _ => {}
            }
        }

        let mut nodes = Vec::new();
        for model in models {
            model.geometry.validate()?;
            let bounds = AABBox::from_vertices(&model.geometry.vertex_buffer);
            let mut node = Node::from_model(model);
            node.bounds = Some(bounds);
            nodes.push(node);
        }

        let mut root = match nodes.len() {
            0 => return Err(ObjError::Empty),
            1 => nodes.remove(0),
            _ => {
                let mut root = Node::new();
                root.children = nodes;
                root
            }
        };
        calc_bounds(&mut root);
        Ok(root)
    }

    fn create_model(&self, material_name: &str, resource: &dyn ObjResource) -> Model {
        let mut model = Model::new(Box::new(FlatShader::new()));
        let white = [1.0, 1.0, 1.0];

        match self.materials.get(material_name) {
            None => {
                warn!("material not found: {}", material_name);
                model.material.ambient = white.into_rgba();
                model.material.diffuse = white.into_rgba();
                model.material.specular = white.into_rgba();
            }
            Some(mtl) => {
                if mtl.illum == Some(4) {
                    model.material.ambient = white.into_rgba();
                    model.material.diffuse = white.into_rgba();
                    model.material.specular = white.into_rgba();
                } else {
                    model.material.ambient = mtl.ka.unwrap_or(white).into_rgba();
                    model.material.diffuse = mtl.kd.unwrap_or(white).into_rgba();
                    model.material.specular = mtl.ks.unwrap_or(white).into_rgba();
                }

                if let Some(map_kd) = &mtl.map_kd {
                    match resource.texture_data(map_kd) {
                        Some(texture) => model.material.texture = Some(texture),
                        None => warn!("texture not found: {}", map_kd),
                    }
                }
            }
        }

        if !self.uvs.is_empty() {
            model.geometry.uv_buffer = Some(Vec::new());
        }
        if !self.normals.is_empty() {
            model.geometry.normal_buffer = Some(Vec::new());
        }

        model
    }

    /// Append one face corner, reusing the vertex index for corners already
    /// seen in the current model.
    fn push_corner(
        &self,
        model: &mut Model,
        index_map: &mut HashMap<FaceElement, u32>,
        corner: FaceElement,
        line_no: usize,
    ) -> Result<(), ObjError> {
        if let Some(&index) = index_map.get(&corner) {
            model.geometry.index_buffer.push(index);
            return Ok(());
        }

        // OBJ indices are 1-based; 0 is never valid
        let (v, vt, vn) = corner;
        let v = (v as usize)
            .checked_sub(1)
            .ok_or(ObjError::UndefinedVertex { line: line_no })?;
        let position = self
            .positions
            .get(v * 3..v * 3 + 3)
            .ok_or(ObjError::UndefinedVertex { line: line_no })?;
        model.geometry.vertex_buffer.extend_from_slice(position);

        if let (Some(uv_buffer), Some(vt)) = (model.geometry.uv_buffer.as_mut(), vt) {
            let vt = (vt as usize)
                .checked_sub(1)
                .ok_or(ObjError::UndefinedVertex { line: line_no })?;
            let uv = self
                .uvs
                .get(vt * 2..vt * 2 + 2)
                .ok_or(ObjError::UndefinedVertex { line: line_no })?;
            uv_buffer.extend_from_slice(uv);
        }
        if let (Some(normal_buffer), Some(vn)) = (model.geometry.normal_buffer.as_mut(), vn) {
            let vn = (vn as usize)
                .checked_sub(1)
                .ok_or(ObjError::UndefinedVertex { line: line_no })?;
            let normal = self
                .normals
                .get(vn * 3..vn * 3 + 3)
                .ok_or(ObjError::UndefinedVertex { line: line_no })?;
            normal_buffer.extend_from_slice(normal);
        }

        let index = index_map.len() as u32;
        index_map.insert(corner, index);
        model.geometry.index_buffer.push(index);
        Ok(())
    }
}

/// Split a line into its leading keyword and the remainder.
fn split_keyword(line: &str) -> (&str, &str) {
    let line = line.trim_start();
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest),
        None => (line, ""),
    }
}

fn parse_color3(input: &str) -> Option<[f32; 3]> {
    let (_, (r, g, b)) = parse_vector3(input).ok()?;
    Some([r, g, b])
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

fn parse_vector2(input: &str) -> IResult<&str, (f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, u) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, v) = float(input)?;
    Ok((input, (u, v)))
}

fn vertex_index(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse)(input)
}

/// `v`, `v/vt`, `v//vn` or `v/vt/vn`, all indices 1-based.
fn parse_face_element(input: &str) -> IResult<&str, FaceElement> {
    let (input, v) = vertex_index(input)?;
    let (input, vt) = opt(preceded(nom_char('/'), opt(vertex_index)))(input)?;
    let (input, vn) = opt(preceded(nom_char('/'), vertex_index))(input)?;
    Ok((input, (v, vt.flatten(), vn)))
}

/// RGB triple widened to an opaque RGBA vector.
trait IntoRgba {
    fn into_rgba(self) -> nalgebra::Vector4<f32>;
}

impl IntoRgba for [f32; 3] {
    fn into_rgba(self) -> nalgebra::Vector4<f32> {
        nalgebra::Vector4::new(self[0], self[1], self[2], 1.0)
    }
}
