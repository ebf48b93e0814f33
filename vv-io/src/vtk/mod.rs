//! VTK PolyData readers
//!
//! Both the XML (`.vtp`) and legacy (`.vtk`) encodings are read natively.
//! Dispatch tries the XML reader first and falls back to the legacy reader
//! when that yields no points.

pub mod legacy;
pub mod xml;

use crate::{
    registry::MeshParser,
    sniff::{self, DEFAULT_HEADER_BYTES},
    IoError, Result,
};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::path::Path;
use vv_core::{Face, Point3f, PointAttribute, TriangleMesh};

/// Byte order of a binary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

/// Numeric element type of a VTK data array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    /// Type names used by legacy files (case-insensitive)
    pub fn from_legacy_name(name: &str) -> Option<Self> {
        let ty = match name.to_ascii_lowercase().as_str() {
            "char" => ScalarType::I8,
            "unsigned_char" => ScalarType::U8,
            "short" => ScalarType::I16,
            "unsigned_short" => ScalarType::U16,
            "int" => ScalarType::I32,
            "unsigned_int" => ScalarType::U32,
            "long" | "vtktypeint64" => ScalarType::I64,
            "unsigned_long" | "vtktypeuint64" => ScalarType::U64,
            "float" => ScalarType::F32,
            "double" => ScalarType::F64,
            // Legacy writers store ids as 32-bit ints
            "vtkidtype" => ScalarType::I32,
            _ => return None,
        };
        Some(ty)
    }

    /// Type names used by the XML `DataArray type=` attribute
    pub fn from_xml_name(name: &str) -> Option<Self> {
        let ty = match name {
            "Int8" | "Char" => ScalarType::I8,
            "UInt8" => ScalarType::U8,
            "Int16" => ScalarType::I16,
            "UInt16" => ScalarType::U16,
            "Int32" => ScalarType::I32,
            "UInt32" => ScalarType::U32,
            "Int64" => ScalarType::I64,
            "UInt64" => ScalarType::U64,
            "Float32" => ScalarType::F32,
            "Float64" => ScalarType::F64,
            _ => return None,
        };
        Some(ty)
    }

    /// Size of one element in bytes
    pub fn size(self) -> usize {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::I64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    /// Decode packed elements. A trailing partial element is ignored.
    pub fn decode(self, bytes: &[u8], endian: Endian) -> Vec<f64> {
        match endian {
            Endian::Big => self.decode_with::<BigEndian>(bytes),
            Endian::Little => self.decode_with::<LittleEndian>(bytes),
        }
    }

    fn decode_with<B: ByteOrder>(self, bytes: &[u8]) -> Vec<f64> {
        bytes
            .chunks_exact(self.size())
            .map(|c| match self {
                ScalarType::I8 => c[0] as i8 as f64,
                ScalarType::U8 => c[0] as f64,
                ScalarType::I16 => B::read_i16(c) as f64,
                ScalarType::U16 => B::read_u16(c) as f64,
                ScalarType::I32 => B::read_i32(c) as f64,
                ScalarType::U32 => B::read_u32(c) as f64,
                ScalarType::I64 => B::read_i64(c) as f64,
                ScalarType::U64 => B::read_u64(c) as f64,
                ScalarType::F32 => B::read_f32(c) as f64,
                ScalarType::F64 => B::read_f64(c),
            })
            .collect()
    }
}

/// Points, triangles and named arrays collected from one dataset or piece
#[derive(Debug, Default)]
pub(crate) struct PolyData {
    pub points: Vec<Point3f>,
    pub faces: Vec<Face>,
    /// `(name, components, values)` for every per-point array
    pub arrays: Vec<(String, usize, Vec<f32>)>,
}

impl PolyData {
    pub fn set_points(&mut self, coords: &[f64]) {
        self.points = coords
            .chunks_exact(3)
            .map(|c| Point3f::new(c[0] as f32, c[1] as f32, c[2] as f32))
            .collect();
    }

    pub fn push_array(&mut self, name: String, components: usize, values: &[f64]) {
        let values = values.iter().map(|&v| v as f32).collect();
        self.arrays.push((name, components, values));
    }

    /// Append another piece, shifting its indices past the current points.
    /// Arrays are kept only when every piece carries them with the same width.
    pub fn merge(&mut self, other: PolyData) {
        if self.points.is_empty() && self.faces.is_empty() && self.arrays.is_empty() {
            *self = other;
            return;
        }
        let base = self.points.len();
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| f.map(|i| i.saturating_add(base))),
        );
        self.points.extend(other.points);

        let mut incoming = other.arrays;
        self.arrays.retain_mut(|(name, components, values)| {
            match incoming.iter().position(|(n, c, _)| n == name && c == components) {
                Some(i) => {
                    values.extend(incoming.swap_remove(i).2);
                    true
                }
                None => {
                    log::warn!("Dropping array '{}' missing from a later piece", name);
                    false
                }
            }
        });
    }

    /// Build the mesh, dropping bad faces and mis-sized arrays
    pub fn into_mesh(self) -> TriangleMesh {
        let mut mesh = TriangleMesh::from_vertices_and_faces(self.points, self.faces);
        let dropped = mesh.retain_valid_faces();
        if dropped > 0 {
            log::warn!("Dropped {} VTK cells with out-of-range point ids", dropped);
        }
        for (name, components, values) in self.arrays {
            let attribute = PointAttribute::new(name.clone(), components, values)
                .and_then(|a| mesh.add_attribute(a));
            if let Err(e) = attribute {
                log::warn!("Ignoring VTK point array '{}': {}", name, e);
            }
        }
        mesh
    }
}

/// Fan-triangulate one polygon cell. Cells with fewer than three ids add nothing.
pub(crate) fn triangulate_polygon(ids: &[i64], faces: &mut Vec<Face>) {
    if ids.len() < 3 {
        return;
    }
    for k in 1..ids.len() - 1 {
        if let Some(face) = face_of(ids[0], ids[k], ids[k + 1]) {
            faces.push(face);
        }
    }
}

/// Split a triangle strip, alternating winding so every triangle faces the same way
pub(crate) fn triangulate_strip(ids: &[i64], faces: &mut Vec<Face>) {
    for (k, w) in ids.windows(3).enumerate() {
        let face = if k % 2 == 0 {
            face_of(w[0], w[1], w[2])
        } else {
            face_of(w[1], w[0], w[2])
        };
        if let Some(face) = face {
            faces.push(face);
        }
    }
}

fn face_of(a: i64, b: i64, c: i64) -> Option<Face> {
    Some([
        usize::try_from(a).ok()?,
        usize::try_from(b).ok()?,
        usize::try_from(c).ok()?,
    ])
}

/// Slice a connectivity array into cells given monotone boundary offsets
/// (`boundaries[i]..boundaries[i + 1]` is cell `i`)
pub(crate) fn cells_from_offsets<'a>(
    connectivity: &'a [i64],
    boundaries: &'a [i64],
) -> impl Iterator<Item = Result<&'a [i64]>> + 'a {
    boundaries.windows(2).map(move |w| {
        let start = usize::try_from(w[0]).ok();
        let end = usize::try_from(w[1]).ok();
        match (start, end) {
            (Some(s), Some(e)) if s <= e && e <= connectivity.len() => Ok(&connectivity[s..e]),
            _ => Err(IoError::parse(format!(
                "cell offsets {}..{} outside connectivity of length {}",
                w[0],
                w[1],
                connectivity.len()
            ))),
        }
    })
}

/// Reader for VTK `.vtk` and `.vtp` PolyData files
#[derive(Debug, Clone)]
pub struct VtkParser {
    header_bytes: usize,
}

impl VtkParser {
    pub fn new() -> Self {
        Self::with_header_bytes(DEFAULT_HEADER_BYTES)
    }

    pub fn with_header_bytes(header_bytes: usize) -> Self {
        Self { header_bytes }
    }
}

impl Default for VtkParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshParser for VtkParser {
    fn format_name(&self) -> &'static str {
        "VTK"
    }

    fn can_parse(&self, path: &Path) -> bool {
        let header = sniff::read_header(path, self.header_bytes);
        sniff::contains(&header, b"# vtk DataFile") || sniff::contains(&header, b"<VTKFile")
    }

    fn try_parse(&self, path: &Path) -> Result<Vec<TriangleMesh>> {
        let data = std::fs::read(path)?;

        match xml::read_poly_data(&data) {
            Ok(mesh) if mesh.vertex_count() > 0 => return Ok(vec![mesh]),
            Ok(_) => log::debug!("VTK XML reader found no points in {}", path.display()),
            Err(e) => log::debug!("VTK XML reader rejected {}: {}", path.display(), e),
        }

        let mesh = legacy::read_poly_data(&data)?;
        if mesh.vertex_count() == 0 {
            return Err(IoError::parse("VTK dataset has no points"));
        }
        Ok(vec![mesh])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_decode_endianness() {
        let be = [0x3F, 0x80, 0x00, 0x00, 0x40, 0x00, 0x00, 0x00];
        assert_eq!(ScalarType::F32.decode(&be, Endian::Big), vec![1.0, 2.0]);
        let le = [0x01, 0x00, 0xFF, 0xFF];
        assert_eq!(ScalarType::I16.decode(&le, Endian::Little), vec![1.0, -1.0]);
        assert_eq!(ScalarType::U8.decode(&[7, 8, 9], Endian::Big), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ScalarType::from_legacy_name("FLOAT"), Some(ScalarType::F32));
        assert_eq!(ScalarType::from_legacy_name("vtkIdType"), Some(ScalarType::I32));
        assert_eq!(ScalarType::from_legacy_name("vtktypeint64").map(ScalarType::size), Some(8));
        assert_eq!(ScalarType::from_xml_name("Float64"), Some(ScalarType::F64));
        assert_eq!(ScalarType::from_xml_name("float"), None);
    }

    #[test]
    fn test_fan_and_strip() {
        let mut faces = Vec::new();
        triangulate_polygon(&[0, 1, 2, 3], &mut faces);
        assert_eq!(faces, vec![[0, 1, 2], [0, 2, 3]]);

        faces.clear();
        triangulate_strip(&[0, 1, 2, 3, 4], &mut faces);
        assert_eq!(faces, vec![[0, 1, 2], [2, 1, 3], [2, 3, 4]]);

        faces.clear();
        triangulate_polygon(&[0, 1], &mut faces);
        assert!(faces.is_empty());
    }

    #[test]
    fn test_cells_from_offsets() {
        let connectivity = [0, 1, 2, 2, 3, 4, 5];
        let cells: Vec<_> = cells_from_offsets(&connectivity, &[0, 3, 7])
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(cells, vec![&[0, 1, 2][..], &[2, 3, 4, 5][..]]);
        assert!(cells_from_offsets(&connectivity, &[0, 9]).next().unwrap().is_err());
    }

    #[test]
    fn test_merge_pieces() {
        let mut first = PolyData::default();
        first.set_points(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        first.faces.push([0, 1, 2]);
        first.push_array("t".into(), 1, &[1.0, 2.0, 3.0]);
        first.push_array("only_first".into(), 1, &[0.0, 0.0, 0.0]);

        let mut second = PolyData::default();
        second.set_points(&[5.0, 5.0, 5.0, 6.0, 5.0, 5.0, 5.0, 6.0, 5.0]);
        second.faces.push([0, 1, 2]);
        second.faces.push([0, 1, usize::MAX]);
        second.push_array("t".into(), 1, &[4.0, 5.0, 6.0]);

        first.merge(second);
        let mesh = first.into_mesh();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.faces, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(mesh.attribute("t").unwrap().tuple_count(), 6);
        assert!(mesh.attribute("only_first").is_none());
    }

    #[test]
    fn test_signature_and_fallback() {
        let mut legacy = tempfile::NamedTempFile::new().unwrap();
        legacy
            .write_all(
                b"# vtk DataFile Version 3.0\ntri\nASCII\nDATASET POLYDATA\n\
                  POINTS 3 float\n0 0 0 1 0 0 0 1 0\nPOLYGONS 1 4\n3 0 1 2\n",
            )
            .unwrap();
        let parser = VtkParser::new();
        assert!(parser.can_parse(legacy.path()));
        let meshes = parser.parse(legacy.path());
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].face_count(), 1);

        let mut empty = tempfile::NamedTempFile::new().unwrap();
        empty
            .write_all(b"# vtk DataFile Version 3.0\nnothing\nASCII\nDATASET POLYDATA\nPOINTS 0 float\n")
            .unwrap();
        assert!(parser.can_parse(empty.path()));
        assert!(parser.parse(empty.path()).is_empty());

        let mut other = tempfile::NamedTempFile::new().unwrap();
        other.write_all(b"#TriangulatedMeshVersion2.0\n").unwrap();
        assert!(!parser.can_parse(other.path()));
    }
}
