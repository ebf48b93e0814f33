//! Core traits for vv

use crate::{mesh::*, point::*};

/// Trait for drawable/renderable objects
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounding_box_of(&self.vertices)
    }
}

impl Drawable for [TriangleMesh] {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        let corners: Vec<Point3f> = self
            .iter()
            .filter(|m| !m.vertices.is_empty())
            .flat_map(|m| {
                let (min, max) = m.bounding_box();
                [min, max]
            })
            .collect();
        bounding_box_of(&corners)
    }
}

fn bounding_box_of(points: &[Point3f]) -> (Point3f, Point3f) {
    let Some(first) = points.first() else {
        return (Point3f::origin(), Point3f::origin());
    };

    let mut min = *first;
    let mut max = *first;

    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        min.z = min.z.min(p.z);

        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
        max.z = max.z.max(p.z);
    }

    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_bounding_box() {
        let a = TriangleMesh::from_vertices_and_faces(
            vec![Point3f::new(-1.0, 0.0, 0.0), Point3f::new(0.0, 2.0, 0.0)],
            vec![],
        );
        let b = TriangleMesh::from_vertices_and_faces(vec![Point3f::new(3.0, -1.0, 5.0)], vec![]);
        let meshes = vec![a, TriangleMesh::new(), b];
        let (min, max) = meshes.as_slice().bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -1.0, 0.0));
        assert_eq!(max, Point3f::new(3.0, 2.0, 5.0));
        assert_eq!(meshes[1].bounding_box(), (Point3f::origin(), Point3f::origin()));
    }
}
