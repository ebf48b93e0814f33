//! CARTO triangulated mesh reader
//!
//! Line-oriented text with `[VerticesSection]` and `[TrianglesSection]`
//! blocks. Vertex lines read `index = x y z nx ny nz groupId`, triangle lines
//! `index = v0 v1 v2 nx ny nz groupId`. Triangle indices are 0-based.

use crate::{
    registry::MeshParser,
    sniff::{self, DEFAULT_HEADER_BYTES},
    Result,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use vv_core::{attributes::NORMALS, Point3f, PointAttribute, TriangleMesh};

/// Magic string every CARTO mesh begins with
pub const CARTO_SIGNATURE: &[u8] = b"#TriangulatedMeshVersion2.0";

/// Name of the per-point group attribute
pub const GROUP_ID: &str = "GroupID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Vertices,
    Triangles,
    Other,
}

/// Reader for CARTO `.mesh` files
#[derive(Debug, Clone)]
pub struct CartoParser {
    header_bytes: usize,
}

impl CartoParser {
    pub fn new() -> Self {
        Self::with_header_bytes(DEFAULT_HEADER_BYTES)
    }

    pub fn with_header_bytes(header_bytes: usize) -> Self {
        Self { header_bytes }
    }

    /// Parse CARTO text from any line source.
    ///
    /// Yields one mesh when at least one vertex and one triangle were read,
    /// otherwise none.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Vec<TriangleMesh>> {
        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut groups = Vec::new();
        let mut faces = Vec::new();
        let mut section = Section::Other;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            if line.len() > 2 && line.starts_with('[') && line.ends_with(']') {
                section = match line {
                    "[VerticesSection]" => Section::Vertices,
                    "[TrianglesSection]" => Section::Triangles,
                    _ => Section::Other,
                };
                continue;
            }

            match section {
                Section::Vertices => match parse_record::<f32>(line) {
                    Some((position, normal, group)) => {
                        vertices.push(Point3f::new(position[0], position[1], position[2]));
                        normals.extend_from_slice(&normal);
                        groups.push(group as f32);
                    }
                    None => log::debug!("Skipping malformed CARTO vertex line: {}", line),
                },
                Section::Triangles => match parse_record::<i64>(line) {
                    Some((corners, _, _)) => {
                        let face = [
                            usize::try_from(corners[0]),
                            usize::try_from(corners[1]),
                            usize::try_from(corners[2]),
                        ];
                        if let [Ok(a), Ok(b), Ok(c)] = face {
                            faces.push([a, b, c]);
                        }
                    }
                    None => log::debug!("Skipping malformed CARTO triangle line: {}", line),
                },
                Section::Other => {}
            }
        }

        if vertices.is_empty() || faces.is_empty() {
            log::warn!(
                "CARTO data has {} vertices and {} triangles; no mesh produced",
                vertices.len(),
                faces.len()
            );
            return Ok(Vec::new());
        }

        let point_count = vertices.len();
        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        let dropped = mesh.retain_valid_faces();
        if dropped > 0 {
            log::warn!("Dropped {} CARTO triangles with out-of-range indices", dropped);
        }
        if normals.len() == point_count * 3 {
            mesh.add_attribute(PointAttribute::new(NORMALS, 3, normals)?)?;
        }
        mesh.add_attribute(PointAttribute::scalars(GROUP_ID, groups))?;
        Ok(vec![mesh])
    }
}

impl Default for CartoParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshParser for CartoParser {
    fn format_name(&self) -> &'static str {
        "CARTO"
    }

    fn can_parse(&self, path: &Path) -> bool {
        sniff::contains(&sniff::read_header(path, self.header_bytes), CARTO_SIGNATURE)
    }

    fn try_parse(&self, path: &Path) -> Result<Vec<TriangleMesh>> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }
}

/// Split `index [=] a b c nx ny nz group` into its parts.
///
/// The first ` = ` is treated as a separator. Trailing tokens past the
/// eighth are ignored.
fn parse_record<T: std::str::FromStr>(line: &str) -> Option<([T; 3], [f32; 3], i64)> {
    let normalized = line.replacen(" = ", " ", 1);
    let mut tokens = normalized.split_whitespace();
    tokens.next()?.parse::<i64>().ok()?;
    let a = tokens.next()?.parse::<T>().ok()?;
    let b = tokens.next()?.parse::<T>().ok()?;
    let c = tokens.next()?.parse::<T>().ok()?;
    let nx = tokens.next()?.parse::<f32>().ok()?;
    let ny = tokens.next()?.parse::<f32>().ok()?;
    let nz = tokens.next()?.parse::<f32>().ok()?;
    let group = tokens.next()?.parse::<i64>().ok()?;
    Some(([a, b, c], [nx, ny, nz], group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::{Cursor, Write};

    const SAMPLE: &str = "#TriangulatedMeshVersion2.0
; comment line
[GeneralAttributes]
NumVertex = 3

[VerticesSection]
;   Index = X Y Z NormalX NormalY NormalZ GroupID
0 = 0.0 0.0 0.0 0.0 0.0 1.0 1
1 = 1.0 0.0 0.0 0.0 0.0 1.0 1
2 = 0.0 1.0 0.0 0.0 0.0 1.0 2
3 = 1.0 2.0 3.0 0.0 0.0 1.0 5
4 = 1.0 2.0 3.0 0.0 0.0

[TrianglesSection]
0 = 0 1 2 0.0 0.0 1.0 0
1 = 1 2 3 0.0 0.0 1.0 0
";

    #[test]
    fn test_reads_vertices_triangles_and_attributes() {
        let meshes = CartoParser::read_from(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(meshes.len(), 1);
        let mesh = &meshes[0];
        // The six-token vertex line is skipped
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [1, 2, 3]]);

        let last = mesh.vertices[3];
        assert_relative_eq!(last.x, 1.0);
        assert_relative_eq!(last.y, 2.0);
        assert_relative_eq!(last.z, 3.0);

        let normals = mesh.normals().unwrap();
        assert_relative_eq!(normals[3].z, 1.0);
        let groups = mesh.attribute(GROUP_ID).unwrap();
        assert_eq!(groups.components(), 1);
        assert_eq!(groups.scalar(3), Some(5.0));
    }

    #[test]
    fn test_lines_outside_known_sections_ignored() {
        let text = "#TriangulatedMeshVersion2.0
0 = 0.0 0.0 0.0 0.0 0.0 1.0 1
[VerticesSection]
0 = 0.0 0.0 0.0 0.0 0.0 1.0 1
1 = 1.0 0.0 0.0 0.0 0.0 1.0 1
2 = 0.0 1.0 0.0 0.0 0.0 1.0 1
[Unknown]
3 = 9.0 9.0 9.0 0.0 0.0 1.0 1
[TrianglesSection]
0 0 1 2 0.0 0.0 1.0 0
";
        let meshes = CartoParser::read_from(Cursor::new(text)).unwrap();
        assert_eq!(meshes[0].vertex_count(), 3);
        assert_eq!(meshes[0].face_count(), 1);
    }

    #[test]
    fn test_no_triangles_yields_nothing() {
        let text = "#TriangulatedMeshVersion2.0\n[VerticesSection]\n0 = 0 0 0 0 0 1 1\n";
        assert!(CartoParser::read_from(Cursor::new(text)).unwrap().is_empty());
        assert!(CartoParser::read_from(Cursor::new("")).unwrap().is_empty());
    }

    #[test]
    fn test_signature() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let parser = CartoParser::new();
        assert!(parser.can_parse(file.path()));
        assert_eq!(parser.parse(file.path()).len(), 1);

        let mut other = tempfile::NamedTempFile::new().unwrap();
        other.write_all(b"<?xml version=\"1.0\"?><DIF/>").unwrap();
        assert!(!parser.can_parse(other.path()));
    }
}
