/// Depth-first scene traversal with frustum-culling early-out
use crate::aabb::AABBox;
use crate::math;
use crate::renderer::Renderer;
use crate::scene::{Node, NodeKind};

/// Where a bounding box sits relative to the view frustum.
pub struct Visibility {
    /// Every corner is outside the same clip plane; nothing inside can show.
    pub offscreen: bool,
    /// Every corner is inside all planes. Reported for a future fast path;
    /// the renderer still clips such polygons.
    pub inside: bool,
}

/// Classify `bounds` under the current projection × model-view transform.
/// Absent or empty bounds are treated as visible.
pub fn is_visible(bounds: Option<&AABBox>, renderer: &Renderer) -> Visibility {
    let aabb = match bounds {
        Some(aabb) if !aabb.is_empty() => aabb,
        _ => return Visibility { offscreen: false, inside: false },
    };

    let mvp = renderer.projection_matrix * renderer.matrix_stack.current_matrix();

    let mut code_and = math::OUT_ALL;
    let mut code_or = 0;
    for nth in 0..8 {
        let code = math::calc_out_code(&math::transform_aabb_corner(aabb, &mvp, nth));
        code_and &= code;
        code_or |= code;
    }

    Visibility {
        offscreen: code_and != 0,
        inside: code_or == 0,
    }
}

/// Walks the scene tree, keeping the renderer's matrix stack in step and
/// skipping subtrees whose bounds are fully outside the frustum.
pub struct Traverser;

impl Traverser {
    pub fn new() -> Self {
        Self
    }

    pub fn traverse(&self, node: &Node, renderer: &mut Renderer) {
        renderer.matrix_stack.push_transform(&node.rotation, &node.position);

        let visibility = is_visible(node.bounds.as_ref(), renderer);
        if !visibility.offscreen {
            // TODO: skip the clip pass when visibility.inside
            if let NodeKind::Model(model) = &node.kind {
                renderer.draw_primitives(&model.geometry, &model.material);
            }
            for child in &node.children {
                self.traverse(child, renderer);
            }
        }

        renderer.matrix_stack.pop();
    }
}

impl Default for Traverser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;
    use crate::geometry::Geometry;
    use crate::scene::Model;
    use crate::shader::FlatShader;
    use nalgebra::{Matrix4, Point3, Vector3, Vector4};

    const CLEAR: u32 = 0x87CEFAFF;

    fn cube_node(diffuse: Vector4<f32>) -> Node {
        let mut model = Model::new(Box::new(FlatShader::new()));
        model.geometry = Geometry::cube(1.0);
        model.material.ambient = Vector4::new(0.0, 0.0, 0.0, 1.0);
        model.material.diffuse = diffuse;
        let mut node = Node::from_model(model);
        let vertices = node.model().unwrap().geometry.vertex_buffer.clone();
        node.bounds.as_mut().unwrap().calc_bounds(&vertices);
        node
    }

    #[test]
    fn test_render_unit_cube_front_face() {
        let mut renderer = Renderer::new(FrameBuffer::new(64, 64), CLEAR);
        let node = cube_node(Vector4::new(1.0, 0.0, 0.0, 1.0));

        // camera on the +z axis looking at the origin; light along the
        // front face's view-space normal so its diffuse term is exactly 1
        let view = Matrix4::look_at_rh(
            &Point3::new(0.0, 0.0, 5.0),
            &Point3::origin(),
            &Vector3::y(),
        );
        *renderer.matrix_stack.current_matrix_mut() = view;
        renderer.light_dir = (view * Vector4::new(0.0, 0.0, 1.0, 0.0)).xyz().normalize();

        renderer.clear();
        Traverser::new().traverse(&node, &mut renderer);

        let fb = &renderer.frame_buffer;
        let covered: Vec<usize> =
            (0..fb.depth_buffer.len()).filter(|&i| fb.depth_buffer[i] < 1.0).collect();

        // the front face spans a block of pixels around the center
        assert!(covered.contains(&fb.index(32, 32)));

        // covered pixels carry the face color and a single depth value;
        // everything else is untouched clear color
        let face_depth = fb.depth_buffer[covered[0]];
        for i in 0..fb.depth_buffer.len() {
            if covered.contains(&i) {
                assert_eq!(fb.color_buffer[i], 0xFF0000FF);
                assert!((fb.depth_buffer[i] - face_depth).abs() < 1e-4);
            } else {
                assert_eq!(fb.color_buffer[i], CLEAR);
                assert_eq!(fb.depth_buffer[i], 1.0);
            }
        }
    }

    #[test]
    fn test_bounds_behind_near_plane_culls_subtree() {
        let mut renderer = Renderer::new(FrameBuffer::new(16, 16), CLEAR);
        renderer.projection_matrix = Matrix4::identity();
        renderer.clear();

        // parent sits entirely behind the near plane; its child would
        // rasterize at the origin if traversal reached it
        let mut child = cube_node(Vector4::new(1.0, 1.0, 1.0, 1.0));
        child.position = Vector3::new(0.0, 0.0, 5.0);

        let mut parent = Node::new();
        parent.position = Vector3::new(0.0, 0.0, -5.0);
        parent.bounds = Some(AABBox::from_vertices(&[-0.5, -0.5, -0.5, 0.5, 0.5, 0.5]));
        parent.children = vec![child];

        Traverser::new().traverse(&parent, &mut renderer);

        let fb = &renderer.frame_buffer;
        assert!(fb.color_buffer.iter().all(|&c| c == CLEAR));
        assert!(fb.depth_buffer.iter().all(|&z| z == 1.0));
    }

    #[test]
    fn test_is_visible_outcodes() {
        let mut renderer = Renderer::new(FrameBuffer::new(16, 16), CLEAR);
        renderer.projection_matrix = Matrix4::identity();

        let near_box = AABBox::from_vertices(&[-0.5, -0.5, -5.5, 0.5, 0.5, -4.5]);
        let visibility = is_visible(Some(&near_box), &renderer);
        assert!(visibility.offscreen);
        assert!(!visibility.inside);

        let inner_box = AABBox::from_vertices(&[-0.5, -0.5, -0.5, 0.5, 0.5, 0.5]);
        let visibility = is_visible(Some(&inner_box), &renderer);
        assert!(!visibility.offscreen);
        assert!(visibility.inside);

        // no bounds: always visible, never reported fully inside
        let visibility = is_visible(None, &renderer);
        assert!(!visibility.offscreen);
        assert!(!visibility.inside);
    }

    #[test]
    fn test_traverse_restores_matrix_stack() {
        let mut renderer = Renderer::new(FrameBuffer::new(8, 8), CLEAR);
        let view = Matrix4::new_translation(&Vector3::new(0.0, 0.0, -3.0));
        *renderer.matrix_stack.current_matrix_mut() = view;

        let mut root = Node::new();
        root.children = vec![Node::new(), Node::new()];
        Traverser::new().traverse(&root, &mut renderer);

        assert_eq!(*renderer.matrix_stack.current_matrix(), view);
    }
}
