//! The set of meshes displayed together

use crate::color::{distinct_color, Rgb};
use std::collections::BTreeSet;
use vv_core::{Drawable, Error, Point3f, Result, TriangleMesh};

/// One displayed mesh with its label and flat colour
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub name: String,
    pub mesh: TriangleMesh,
    pub base_color: Rgb,
}

/// Ordered list of meshes; order decides base colours and which mesh drives
/// the legend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    entries: Vec<SceneEntry>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a scene from parallel lists of meshes, names and colours
    pub fn build(meshes: Vec<TriangleMesh>, names: Vec<String>, colors: Vec<Rgb>) -> Result<Self> {
        if meshes.len() != names.len() || meshes.len() != colors.len() {
            return Err(Error::Visualization(format!(
                "scene needs one name and colour per mesh ({} meshes, {} names, {} colours)",
                meshes.len(),
                names.len(),
                colors.len()
            )));
        }
        let entries = meshes
            .into_iter()
            .zip(names)
            .zip(colors)
            .map(|((mesh, name), base_color)| SceneEntry {
                name,
                mesh,
                base_color,
            })
            .collect();
        Ok(Self { entries })
    }

    /// Append a mesh, giving it the next distinct base colour
    pub fn push(&mut self, name: impl Into<String>, mesh: TriangleMesh) {
        let base_color = distinct_color(self.entries.len());
        self.entries.push(SceneEntry {
            name: name.into(),
            mesh,
            base_color,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&SceneEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneEntry> {
        self.entries.iter()
    }

    /// Sorted union of attribute names across every mesh
    pub fn scalar_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| e.mesh.point_data.names())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Drawable for Scene {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        self.entries
            .iter()
            .filter(|e| !e.mesh.vertices.is_empty())
            .map(|e| e.mesh.bounding_box())
            .reduce(|(amin, amax), (bmin, bmax)| {
                (
                    Point3f::new(amin.x.min(bmin.x), amin.y.min(bmin.y), amin.z.min(bmin.z)),
                    Point3f::new(amax.x.max(bmax.x), amax.y.max(bmax.y), amax.z.max(bmax.z)),
                )
            })
            .unwrap_or((Point3f::origin(), Point3f::origin()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::color::LIGHT_GREY;
    use vv_core::PointAttribute;

    /// Triangle carrying one scalar array per `(name, values)` pair
    pub(crate) fn triangle_with(arrays: &[(&str, [f32; 3])]) -> TriangleMesh {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        for (name, values) in arrays {
            mesh.add_attribute(PointAttribute::scalars(*name, values.to_vec()))
                .unwrap();
        }
        mesh
    }

    #[test]
    fn test_scalar_names_sorted_union() {
        let mut scene = Scene::new();
        scene.push("a", triangle_with(&[("B", [0.0; 3]), ("A", [0.0; 3])]));
        scene.push("b", triangle_with(&[("C", [0.0; 3]), ("A", [1.0; 3])]));
        assert_eq!(scene.scalar_names(), vec!["A", "B", "C"]);
        assert_eq!(scene.get(0).unwrap().base_color, LIGHT_GREY);
        assert_ne!(scene.get(1).unwrap().base_color, LIGHT_GREY);
    }

    #[test]
    fn test_build_checks_lengths() {
        let meshes = vec![triangle_with(&[]), triangle_with(&[])];
        assert!(Scene::build(meshes.clone(), vec!["x".into()], vec![LIGHT_GREY]).is_err());
        let scene = Scene::build(
            meshes,
            vec!["x".into(), "y".into()],
            vec![LIGHT_GREY, [1.0, 0.0, 0.0]],
        )
        .unwrap();
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.get(1).unwrap().name, "y");
    }

    #[test]
    fn test_bounding_box_skips_empty_meshes() {
        let mut scene = Scene::new();
        scene.push("empty", TriangleMesh::new());
        scene.push("tri", triangle_with(&[]));
        let (min, max) = scene.bounding_box();
        assert_eq!(min, Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3f::new(1.0, 1.0, 0.0));
    }
}
