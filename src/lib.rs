//! # vv
//!
//! A command-line surface mesh viewer. It detects the format of each input,
//! reads it into triangle meshes with named per-point scalars and shows them
//! with one scalar at a time mapped to colour.
//!
//! This crate ties the workspace together:
//!
//! - **Core** ([`vv_core`]): meshes and point attributes
//! - **I/O** ([`vv_io`]): format sniffing, stdin staging and the parsers
//! - **Visualization** ([`vv_visualization`]): scene, scalar cycling,
//!   colour mapping and renderers
//!
//! ## Quick Start
//!
//! ```no_run
//! use vv::prelude::*;
//!
//! let meshes = vv::read_meshes("heart.vtk").unwrap_or_default();
//! let names = vec!["heart.vtk".to_string(); meshes.len()];
//! let scene = build_scene(meshes, names).unwrap();
//! let mut session = ViewerSession::new(scene, ViewerConfig::default());
//! TerminalRenderer::stdio().run(&mut session).unwrap();
//! ```

pub mod app;
pub mod cli;
pub mod config;

pub use vv_core as core;
pub use vv_io as io;
pub use vv_visualization as visualization;

pub use vv_io::read_meshes;

/// Commonly used types
pub mod prelude {
    pub use vv_core::{Point3f, PointAttribute, TriangleMesh, Vector3f};
    pub use vv_io::{MeshParser, ParserRegistry};
    pub use vv_visualization::{
        build_scene, FacetLayout, InteractionEvent, Scene, SceneRenderer, TerminalRenderer,
        ViewerConfig, ViewerSession,
    };
}
