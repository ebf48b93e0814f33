//! FreeSurfer binary surface reader
//!
//! Layout (all big-endian): magic `FF FF FE`, two newline-terminated header
//! lines, vertex count and triangle count as `u32`, `nv` xyz `f32` triples,
//! then `nt` `u32` index triples.

use crate::{
    registry::MeshParser,
    sniff::{self, DEFAULT_HEADER_BYTES},
    IoError, Result,
};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, BufRead, Cursor};
use std::path::Path;
use vv_core::{Face, Point3f, TriangleMesh};

/// Triangle-surface magic number
pub const FREESURFER_MAGIC: [u8; 3] = [0xFF, 0xFF, 0xFE];

/// Filename extensions FreeSurfer uses for surface files
pub const FREESURFER_EXTENSIONS: [&str; 3] = ["pial", "surf", "white"];

/// Reader for FreeSurfer `.pial`, `.surf` and `.white` surfaces
#[derive(Debug, Clone)]
pub struct FreeSurferParser {
    header_bytes: usize,
}

impl FreeSurferParser {
    pub fn new() -> Self {
        Self::with_header_bytes(DEFAULT_HEADER_BYTES)
    }

    pub fn with_header_bytes(header_bytes: usize) -> Self {
        Self { header_bytes }
    }

    /// Decode a complete surface file held in memory
    pub fn read_bytes(data: &[u8]) -> Result<TriangleMesh> {
        if !data.starts_with(&FREESURFER_MAGIC) {
            return Err(IoError::InvalidFormat {
                format: "FreeSurfer surface (bad magic)".to_string(),
            });
        }
        let mut cursor = Cursor::new(&data[FREESURFER_MAGIC.len()..]);

        // "created by ..." and a blank line
        let mut discard = Vec::new();
        cursor.read_until(b'\n', &mut discard)?;
        cursor.read_until(b'\n', &mut discard)?;

        let nv = read_u32(&mut cursor, "vertex count")? as usize;
        let nt = read_u32(&mut cursor, "triangle count")? as usize;
        log::debug!("FreeSurfer surface declares {} vertices, {} triangles", nv, nt);

        let remaining = data.len().saturating_sub(cursor.position() as usize);
        let mut vertices = Vec::with_capacity(nv.min(remaining / 12));
        for _ in 0..nv {
            let x = read_f32(&mut cursor, "vertex data")?;
            let y = read_f32(&mut cursor, "vertex data")?;
            let z = read_f32(&mut cursor, "vertex data")?;
            vertices.push(Point3f::new(x, y, z));
        }

        let mut faces: Vec<Face> = Vec::with_capacity(nt.min(remaining / 12));
        for _ in 0..nt {
            let a = read_u32(&mut cursor, "triangle data")? as usize;
            let b = read_u32(&mut cursor, "triangle data")? as usize;
            let c = read_u32(&mut cursor, "triangle data")? as usize;
            faces.push([a, b, c]);
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        let dropped = mesh.retain_valid_faces();
        if dropped > 0 {
            log::warn!("Dropped {} FreeSurfer triangles with out-of-range indices", dropped);
        }
        Ok(mesh)
    }
}

impl Default for FreeSurferParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshParser for FreeSurferParser {
    fn format_name(&self) -> &'static str {
        "FreeSurfer"
    }

    fn can_parse(&self, path: &Path) -> bool {
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| FREESURFER_EXTENSIONS.contains(&e))
            .unwrap_or(false);
        // Staged stdin has no extension, so the magic number also counts
        by_extension || sniff::read_header(path, self.header_bytes).starts_with(&FREESURFER_MAGIC)
    }

    fn try_parse(&self, path: &Path) -> Result<Vec<TriangleMesh>> {
        let data = std::fs::read(path)?;
        Ok(vec![Self::read_bytes(&data)?])
    }
}

fn read_u32(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<u32> {
    cursor.read_u32::<BigEndian>().map_err(|e| eof_as_truncated(e, what))
}

fn read_f32(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<f32> {
    cursor.read_f32::<BigEndian>().map_err(|e| eof_as_truncated(e, what))
}

fn eof_as_truncated(e: io::Error, what: &str) -> IoError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        IoError::truncated(what)
    } else {
        IoError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn surface(vertices: &[[f32; 3]], triangles: &[[u32; 3]]) -> Vec<u8> {
        let mut data = FREESURFER_MAGIC.to_vec();
        data.extend_from_slice(b"created by test on today\n\n");
        data.write_u32::<BigEndian>(vertices.len() as u32).unwrap();
        data.write_u32::<BigEndian>(triangles.len() as u32).unwrap();
        for v in vertices {
            for &c in v {
                data.write_f32::<BigEndian>(c).unwrap();
            }
        }
        for t in triangles {
            for &i in t {
                data.write_u32::<BigEndian>(i).unwrap();
            }
        }
        data
    }

    #[test]
    fn test_reads_points_and_faces() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.5]];
        let triangles = [[0, 1, 2], [1, 3, 2]];
        let mesh = FreeSurferParser::read_bytes(&surface(&vertices, &triangles)).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.vertices[3], Point3f::new(1.0, 1.0, 0.5));
        assert_eq!(mesh.faces, vec![[0, 1, 2], [1, 3, 2]]);
    }

    #[test]
    fn test_zero_counts_are_not_failure() {
        let mesh = FreeSurferParser::read_bytes(&surface(&[], &[])).unwrap();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_bad_magic() {
        let mut data = surface(&[[0.0; 3]], &[]);
        data[2] = 0xFF;
        assert!(matches!(
            FreeSurferParser::read_bytes(&data),
            Err(IoError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_truncated_data() {
        let mut data = surface(&[[0.0; 3], [1.0; 3], [2.0; 3]], &[[0, 1, 2]]);
        data.truncate(data.len() - 4);
        assert!(matches!(
            FreeSurferParser::read_bytes(&data),
            Err(IoError::Truncated { .. })
        ));
    }

    #[test]
    fn test_signature_by_extension_or_magic() {
        let dir = tempfile::tempdir().unwrap();
        let parser = FreeSurferParser::new();

        let named = dir.path().join("lh.pial");
        std::fs::write(&named, b"not really a surface").unwrap();
        assert!(parser.can_parse(&named));
        assert!(parser.parse(&named).is_empty());

        let mut staged = tempfile::NamedTempFile::new().unwrap();
        staged.write_all(&surface(&[[0.0; 3]], &[])).unwrap();
        assert!(parser.can_parse(staged.path()));
        assert_eq!(parser.parse(staged.path()).len(), 1);

        let plain = dir.path().join("mesh.txt");
        std::fs::write(&plain, b"hello").unwrap();
        assert!(!parser.can_parse(&plain));
    }
}
