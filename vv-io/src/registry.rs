//! Ordered parser registry
//!
//! Dispatch walks the parsers in registration order and hands the file to the
//! first one whose header check accepts it. Signatures can overlap loosely,
//! so the order is the tie-break.

use crate::{
    carto::CartoParser, dif::DifParser, freesurfer::FreeSurferParser, sniff::DEFAULT_HEADER_BYTES,
    vtk::VtkParser, Result,
};
use std::path::Path;
use vv_core::TriangleMesh;

/// A mesh format reader with a cheap signature check
pub trait MeshParser: Send + Sync {
    /// Short name used in log messages
    fn format_name(&self) -> &'static str;

    /// Check if this parser can handle the given file by examining its header
    fn can_parse(&self, path: &Path) -> bool;

    /// Read every mesh in the file
    fn try_parse(&self, path: &Path) -> Result<Vec<TriangleMesh>>;

    /// Read every mesh in the file, logging failures.
    ///
    /// Never fails: a corrupt file yields an empty list so callers can tell
    /// "no parser" apart from "parser found but file unreadable".
    fn parse(&self, path: &Path) -> Vec<TriangleMesh> {
        match self.try_parse(path) {
            Ok(meshes) => {
                log::info!(
                    "{} parser read {} mesh(es) from {}",
                    self.format_name(),
                    meshes.len(),
                    path.display()
                );
                meshes
            }
            Err(e) => {
                log::error!(
                    "Failed to read {} file {}: {}",
                    self.format_name(),
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }
}

/// Registry owning the parsers available for a session
pub struct ParserRegistry {
    parsers: Vec<Box<dyn MeshParser>>,
}

impl ParserRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Registry with every built-in parser, in dispatch order:
    /// DIF XML, VTK, CARTO, FreeSurfer
    pub fn with_default_parsers(header_bytes: usize) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(DifParser::with_header_bytes(header_bytes)));
        registry.register(Box::new(VtkParser::with_header_bytes(header_bytes)));
        registry.register(Box::new(CartoParser::with_header_bytes(header_bytes)));
        registry.register(Box::new(FreeSurferParser::with_header_bytes(header_bytes)));
        registry
    }

    /// Append a parser; it is tried after every parser registered before it
    pub fn register(&mut self, parser: Box<dyn MeshParser>) {
        self.parsers.push(parser);
    }

    /// First parser in registration order whose signature check accepts `path`
    pub fn select(&self, path: &Path) -> Option<&dyn MeshParser> {
        let selected = self
            .parsers
            .iter()
            .find(|p| p.can_parse(path))
            .map(|p| p.as_ref());
        match selected {
            Some(parser) => log::debug!("Selected {} parser for {}", parser.format_name(), path.display()),
            None => log::debug!("No parser accepted {}", path.display()),
        }
        selected
    }

    /// Names of the registered formats in dispatch order
    pub fn formats(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.format_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_default_parsers(DEFAULT_HEADER_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IoError;
    use vv_core::Point3f;

    // Mock parser accepting paths that contain a marker
    struct MockParser {
        name: &'static str,
        marker: &'static str,
        fail: bool,
    }

    impl MeshParser for MockParser {
        fn format_name(&self) -> &'static str {
            self.name
        }

        fn can_parse(&self, path: &Path) -> bool {
            path.to_string_lossy().contains(self.marker)
        }

        fn try_parse(&self, _path: &Path) -> Result<Vec<TriangleMesh>> {
            if self.fail {
                return Err(IoError::parse("mock failure"));
            }
            let vertices = vec![Point3f::new(0.0, 0.0, 0.0)];
            Ok(vec![TriangleMesh::from_vertices_and_faces(vertices, vec![])])
        }
    }

    fn mock(name: &'static str, marker: &'static str) -> Box<dyn MeshParser> {
        Box::new(MockParser {
            name,
            marker,
            fail: false,
        })
    }

    #[test]
    fn test_first_match_wins() {
        let mut registry = ParserRegistry::new();
        registry.register(mock("first", "mesh"));
        registry.register(mock("second", "mesh"));
        let selected = registry.select(Path::new("a.mesh")).unwrap();
        assert_eq!(selected.format_name(), "first");
    }

    #[test]
    fn test_non_matching_order_is_irrelevant() {
        let mut forward = ParserRegistry::new();
        forward.register(mock("other", "zzz"));
        forward.register(mock("target", "mesh"));
        forward.register(mock("another", "yyy"));

        let mut reversed = ParserRegistry::new();
        reversed.register(mock("another", "yyy"));
        reversed.register(mock("target", "mesh"));
        reversed.register(mock("other", "zzz"));

        let path = Path::new("input.mesh");
        assert_eq!(forward.select(path).unwrap().format_name(), "target");
        assert_eq!(reversed.select(path).unwrap().format_name(), "target");
    }

    #[test]
    fn test_no_parser_matches() {
        let mut registry = ParserRegistry::new();
        assert!(registry.select(Path::new("x.mesh")).is_none());
        registry.register(mock("a", "abc"));
        assert!(registry.select(Path::new("x.mesh")).is_none());
    }

    #[test]
    fn test_parse_failure_yields_empty_list() {
        let parser = MockParser {
            name: "broken",
            marker: "",
            fail: true,
        };
        assert!(parser.parse(Path::new("whatever")).is_empty());
    }

    #[test]
    fn test_default_registration_order() {
        let registry = ParserRegistry::default();
        assert_eq!(registry.formats(), vec!["DIF XML", "VTK", "CARTO", "FreeSurfer"]);
        assert_eq!(registry.len(), 4);
    }
}
