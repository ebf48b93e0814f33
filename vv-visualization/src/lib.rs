//! Scene assembly, scalar cycling and rendering for the vv mesh viewer
//!
//! The [`ViewerSession`] owns the scene and the scalar cycle; a
//! [`SceneRenderer`] presents it. [`TerminalRenderer`] is always available,
//! the wgpu window renderer needs the `window` feature.

pub mod color;
pub mod config;
pub mod cycler;
pub mod display;
pub mod facet;
pub mod lookup_table;
pub mod renderer;
pub mod scene;
pub mod session;
pub mod terminal;
#[cfg(feature = "window")]
pub mod window;

pub use color::*;
pub use config::*;
pub use cycler::*;
pub use display::*;
pub use facet::*;
pub use lookup_table::*;
pub use renderer::*;
pub use scene::*;
pub use session::*;
pub use terminal::*;
#[cfg(feature = "window")]
pub use window::WindowRenderer;

use vv_core::{Result, TriangleMesh};

/// Build a scene from parsed meshes named after their source files
pub fn build_scene(meshes: Vec<TriangleMesh>, names: Vec<String>) -> Result<Scene> {
    let colors = distinct_colors(meshes.len());
    Scene::build(meshes, names, colors)
}
