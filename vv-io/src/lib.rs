//! Mesh file readers for the vv mesh viewer
//!
//! This crate sniffs input headers, stages piped input to disk and turns
//! files into [`vv_core::TriangleMesh`] values. Supported formats:
//!
//! - VTK PolyData, XML (`.vtp`) and legacy (`.vtk`)
//! - DIF XML volume lists
//! - CARTO triangulated meshes
//! - FreeSurfer binary surfaces
//!
//! Use [`ParserRegistry::select`] to find the parser for a file, then
//! [`MeshParser::parse`] to read it.

pub mod error;
pub mod sniff;
pub mod registry;
pub mod xml;
pub mod vtk;
pub mod dif;
pub mod carto;
pub mod freesurfer;

pub use error::*;
pub use registry::{MeshParser, ParserRegistry};
pub use sniff::{stage, FormatTag, StagedInput, DEFAULT_HEADER_BYTES};
pub use vtk::VtkParser;
pub use dif::DifParser;
pub use carto::CartoParser;
pub use freesurfer::FreeSurferParser;

use std::path::Path;
use vv_core::TriangleMesh;

/// Select a parser from the default registry and read `path`.
///
/// Returns `None` when no parser recognises the file.
pub fn read_meshes<P: AsRef<Path>>(path: P) -> Option<Vec<TriangleMesh>> {
    let path = path.as_ref();
    ParserRegistry::default()
        .select(path)
        .map(|parser| parser.parse(path))
}
