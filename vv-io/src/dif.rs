//! DIF XML volume reader
//!
//! A DIF document holds a `<Volumes>` list (directly under the root or under a
//! `<DIFBody>` element). Every `<Volume>` child carries whitespace-separated
//! `<Vertices>`, `<Polygons>` and optionally `<Normals>` text, and becomes one
//! mesh.

use crate::{
    registry::MeshParser,
    sniff::{self, DEFAULT_HEADER_BYTES},
    xml::{self, Element},
    IoError, Result,
};
use std::path::Path;
use vv_core::{attributes::NORMALS, Face, Point3f, PointAttribute, TriangleMesh};

/// Reader for DIF XML volume files
#[derive(Debug, Clone)]
pub struct DifParser {
    header_bytes: usize,
}

impl DifParser {
    pub fn new() -> Self {
        Self::with_header_bytes(DEFAULT_HEADER_BYTES)
    }

    pub fn with_header_bytes(header_bytes: usize) -> Self {
        Self { header_bytes }
    }

    /// Convert a parsed document into meshes, one per well-formed `<Volume>`
    pub fn meshes_from_document(root: &Element) -> Result<Vec<TriangleMesh>> {
        let body = root.child("DIFBody").unwrap_or(root);
        let volumes = body
            .child("Volumes")
            .ok_or_else(|| IoError::parse("no <Volumes> element"))?;

        let mut meshes = Vec::new();
        for (index, volume) in volumes.children_named("Volume").enumerate() {
            match volume_to_mesh(volume) {
                Ok(mesh) => meshes.push(mesh),
                Err(e) => log::warn!("Skipping DIF volume {}: {}", index, e),
            }
        }
        Ok(meshes)
    }
}

impl Default for DifParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshParser for DifParser {
    fn format_name(&self) -> &'static str {
        "DIF XML"
    }

    fn can_parse(&self, path: &Path) -> bool {
        let header = sniff::read_header(path, self.header_bytes);
        let by_header = sniff::contains(&header, b"xml") && sniff::contains(&header, b"DIF");

        let by_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .map(|n| n.contains("model") && n.contains("groups"))
            .unwrap_or(false);
        if by_name != by_header {
            log::debug!(
                "DIF filename heuristic ({}) disagrees with header check ({}) for {}",
                by_name,
                by_header,
                path.display()
            );
        }
        by_header
    }

    fn try_parse(&self, path: &Path) -> Result<Vec<TriangleMesh>> {
        let root = xml::read_document(path)?;
        Self::meshes_from_document(&root)
    }
}

fn volume_to_mesh(volume: &Element) -> Result<TriangleMesh> {
    let coords = volume
        .child("Vertices")
        .map(|e| parse_floats(e.text()))
        .ok_or_else(|| IoError::parse("missing <Vertices>"))?;
    if coords.len() % 3 != 0 {
        return Err(IoError::parse(format!(
            "vertex value count {} is not a multiple of 3",
            coords.len()
        )));
    }

    let ids = volume
        .child("Polygons")
        .map(|e| parse_ids(e.text()))
        .ok_or_else(|| IoError::parse("missing <Polygons>"))?;
    if ids.len() % 3 != 0 {
        return Err(IoError::parse(format!(
            "polygon index count {} is not a multiple of 3",
            ids.len()
        )));
    }

    let vertices: Vec<Point3f> = coords
        .chunks_exact(3)
        .map(|c| Point3f::new(c[0] as f32, c[1] as f32, c[2] as f32))
        .collect();

    // Files written by 1-based tools never contain index 0
    let offset = if ids.contains(&0) { 0 } else { 1 };
    let faces: Vec<Face> = ids
        .chunks_exact(3)
        .filter_map(|c| Some([rebase(c[0], offset)?, rebase(c[1], offset)?, rebase(c[2], offset)?]))
        .collect();

    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
    let dropped = mesh.retain_valid_faces();
    if dropped > 0 {
        log::warn!("Dropped {} DIF polygons with out-of-range indices", dropped);
    }

    if let Some(normals) = volume.child("Normals").map(|e| parse_floats(e.text())) {
        if normals.len() == coords.len() {
            let values = normals.iter().map(|&v| v as f32).collect();
            mesh.add_attribute(PointAttribute::new(NORMALS, 3, values)?)?;
        } else {
            log::warn!(
                "Ignoring DIF normals: {} values for {} vertices",
                normals.len(),
                mesh.vertex_count()
            );
        }
    }
    Ok(mesh)
}

fn rebase(id: i64, offset: i64) -> Option<usize> {
    id.checked_sub(offset).and_then(|v| usize::try_from(v).ok())
}

/// Leading run of parseable floats; stops at the first bad token
fn parse_floats(text: &str) -> Vec<f64> {
    text.split_whitespace()
        .map_while(|t| t.parse::<f64>().ok())
        .collect()
}

fn parse_ids(text: &str) -> Vec<i64> {
    text.split_whitespace()
        .map_while(|t| t.parse::<i64>().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn volume(vertices: &str, polygons: &str) -> String {
        format!(
            "<Volume><Vertices>{}</Vertices><Polygons>{}</Polygons></Volume>",
            vertices, polygons
        )
    }

    fn document(volumes: &str) -> String {
        format!(
            "<?xml version=\"1.0\"?>\n<DIF><DIFBody><Volumes>{}</Volumes></DIFBody></DIF>",
            volumes
        )
    }

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SIX_POINTS: &str = "0 0 0 1 0 0 0 1 0 1 1 0 2 0 0 2 1 0";

    #[test]
    fn test_one_based_polygons_are_rebased() {
        let doc = document(&volume(SIX_POINTS, "1 2 3 4 5 6"));
        let root = xml::parse_document(doc.as_bytes()).unwrap();
        let meshes = DifParser::meshes_from_document(&root).unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].faces, vec![[0, 1, 2], [3, 4, 5]]);
    }

    #[test]
    fn test_zero_based_polygons_kept() {
        let doc = document(&volume("0 0 0 1 0 0 0 1 0", "0 1 2"));
        let root = xml::parse_document(doc.as_bytes()).unwrap();
        let meshes = DifParser::meshes_from_document(&root).unwrap();
        assert_eq!(meshes[0].faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_volumes_without_body() {
        let doc = format!("<DIF><Volumes>{}</Volumes></DIF>", volume("0 0 0 1 0 0 0 1 0", "0 1 2"));
        let root = xml::parse_document(doc.as_bytes()).unwrap();
        assert_eq!(DifParser::meshes_from_document(&root).unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_volume_skipped() {
        let good = volume("0 0 0 1 0 0 0 1 0", "0 1 2");
        let bad = volume("0 0 0 1 0", "0 1 2");
        let no_polygons = "<Volume><Vertices>0 0 0</Vertices></Volume>";
        let doc = document(&format!("{}{}{}{}", bad, good, no_polygons, good));
        let root = xml::parse_document(doc.as_bytes()).unwrap();
        assert_eq!(DifParser::meshes_from_document(&root).unwrap().len(), 2);
    }

    #[test]
    fn test_normals_length_checked() {
        let with_normals = "<Volume><Vertices>0 0 0 1 0 0 0 1 0</Vertices>\
            <Polygons>0 1 2</Polygons><Normals>0 0 1 0 0 1 0 0 1</Normals></Volume>";
        let short_normals = "<Volume><Vertices>0 0 0 1 0 0 0 1 0</Vertices>\
            <Polygons>0 1 2</Polygons><Normals>0 0 1</Normals></Volume>";
        let doc = document(&format!("{}{}", with_normals, short_normals));
        let root = xml::parse_document(doc.as_bytes()).unwrap();
        let meshes = DifParser::meshes_from_document(&root).unwrap();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].attribute(NORMALS).unwrap().components(), 3);
        assert!(meshes[1].attribute(NORMALS).is_none());
    }

    #[test]
    fn test_missing_volumes_is_error() {
        let root = xml::parse_document(b"<DIF><DIFBody/></DIF>").unwrap();
        assert!(DifParser::meshes_from_document(&root).is_err());
    }

    #[test]
    fn test_signature_and_empty_volumes() {
        let file = write_temp(&document(""));
        let parser = DifParser::new();
        assert!(parser.can_parse(file.path()));
        assert!(parser.parse(file.path()).is_empty());

        let other = write_temp("# vtk DataFile Version 3.0\n");
        assert!(!parser.can_parse(other.path()));
    }

    #[test]
    fn test_corrupt_file_yields_nothing() {
        let file = write_temp("<?xml version=\"1.0\"?><DIF><Volumes>");
        assert!(DifParser::new().parse(file.path()).is_empty());
    }
}
