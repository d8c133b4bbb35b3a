/// Example: Load and render an OBJ file in the terminal
///
/// Usage: cargo run --example load_obj -- path/to/file.obj
///
/// Material libraries (`mtllib`) are resolved next to the OBJ file.
/// Texture decoding is a host concern and is not wired up here, so
/// `map_Kd` references load without their images.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use sr3d_core::{load_scene_graph_from_obj, ObjResource, Texture};
use sr3d_terminal::TerminalApp;

struct FsResource {
    dir: PathBuf,
}

impl ObjResource for FsResource {
    fn material_text(&self, name: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(name)).ok()
    }

    fn texture_data(&self, name: &str) -> Option<Texture> {
        debug!("skipping texture {} (no image decoding in this example)", name);
        None
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let path = env::args().nth(1).context("usage: load_obj <obj-file>")?;
    let text = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path))?;
    let dir = Path::new(&path).parent().unwrap_or(Path::new(".")).to_path_buf();

    let root = load_scene_graph_from_obj(&text, &FsResource { dir })
        .with_context(|| format!("failed to parse {}", path))?;

    let mut app = TerminalApp::new(root)?;
    app.run()?;

    Ok(())
}
