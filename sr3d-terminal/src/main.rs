/// SR3D Terminal Demo - Rotating Cube
///
/// Renders a lit cube with the software pipeline and presents it as
/// colored characters.
/// Controls:
///   - WASD / Arrow Keys: Rotate the cube
///   - E/R: Roll rotation
///   - Q/ESC: Quit

use anyhow::Result;
use nalgebra::Vector4;
use sr3d_core::{AABBox, FlatShader, Geometry, Model, Node};
use sr3d_terminal::TerminalApp;

fn main() -> Result<()> {
    env_logger::init();

    let mut model = Model::new(Box::new(FlatShader::new()));
    model.geometry = Geometry::cube(2.0);
    model.material.ambient = Vector4::new(0.3, 0.4, 0.9, 1.0);
    model.material.diffuse = Vector4::new(0.3, 0.6, 0.9, 1.0);

    let bounds = AABBox::from_vertices(&model.geometry.vertex_buffer);
    let mut root = Node::from_model(model);
    root.bounds = Some(bounds);

    let mut app = TerminalApp::new(root)?;
    app.run()?;

    Ok(())
}
