//! What every mesh, the legend and the window title show for a given scalar
//!
//! [`DisplayState::for_scalar`] is a pure function of the scene, the chosen
//! scalar and the config, so recolouring twice with the same name yields the
//! same state.

use crate::color::Rgb;
use crate::config::ViewerConfig;
use crate::lookup_table::LookupTable;
use crate::scene::{Scene, SceneEntry};

/// How one mesh is coloured
#[derive(Debug, Clone, PartialEq)]
pub enum Coloring {
    /// Flat base colour, no scalar mapping
    Base(Rgb),
    /// Mapped through a lookup table spanning this mesh's own value range
    Scalar { name: String, range: (f32, f32) },
}

impl Coloring {
    /// Colouring of `entry` when `scalar` is active.
    ///
    /// Each mesh uses the range of its own copy of the attribute; meshes
    /// without it keep their base colour.
    pub fn for_entry(entry: &SceneEntry, scalar: Option<&str>) -> Self {
        match scalar.and_then(|name| entry.mesh.attribute(name)) {
            Some(attribute) => Coloring::Scalar {
                name: attribute.name().to_string(),
                range: attribute.range().unwrap_or((0.0, 0.0)),
            },
            None => Coloring::Base(entry.base_color),
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Coloring::Scalar { .. })
    }

    /// Per-vertex colours for `entry` under this colouring
    pub fn vertex_colors(&self, entry: &SceneEntry, config: &ViewerConfig) -> Vec<Rgb> {
        match self {
            Coloring::Base(color) => vec![*color; entry.mesh.vertex_count()],
            Coloring::Scalar { name, range } => match entry.mesh.attribute(name) {
                Some(attribute) => {
                    LookupTable::from_config(&config.color_map, *range).map_attribute(attribute)
                }
                None => vec![entry.base_color; entry.mesh.vertex_count()],
            },
        }
    }
}

/// Colour bar description
#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub title: String,
    pub range: (f32, f32),
    pub labels: usize,
}

impl Legend {
    pub fn new(title: impl Into<String>, range: (f32, f32), labels: usize) -> Self {
        Self {
            title: title.into(),
            range,
            labels,
        }
    }

    /// Empty legend: no title, no labels
    pub fn hidden() -> Self {
        Self::new("", (0.0, 0.0), 0)
    }

    pub fn is_visible(&self) -> bool {
        self.labels > 0
    }

    /// Label values evenly spaced from the low to the high end of the range
    pub fn label_values(&self) -> Vec<f32> {
        let (lo, hi) = self.range;
        match self.labels {
            0 => Vec::new(),
            1 => vec![lo],
            n => (0..n)
                .map(|i| lo + (hi - lo) * i as f32 / (n - 1) as f32)
                .collect(),
        }
    }
}

/// Everything the renderer needs to draw the single-view scene
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub active_scalar: Option<String>,
    pub meshes: Vec<Coloring>,
    pub legend: Legend,
    pub title: String,
}

impl DisplayState {
    /// Display for `scalar`, or the `NoScalar` display when `None`.
    ///
    /// The legend follows the first mesh (in scene order) carrying the
    /// scalar. The title gains a ` - <name>` suffix, or ` - No Scalars` when
    /// the scene has scalars but none is active.
    pub fn for_scalar(scene: &Scene, scalar: Option<&str>, config: &ViewerConfig) -> Self {
        let meshes: Vec<Coloring> = scene
            .iter()
            .map(|entry| Coloring::for_entry(entry, scalar))
            .collect();

        let legend = meshes
            .iter()
            .find_map(|c| match c {
                Coloring::Scalar { name, range } => {
                    Some(Legend::new(name.clone(), *range, config.color_map.legend_labels))
                }
                Coloring::Base(_) => None,
            })
            .unwrap_or_else(Legend::hidden);

        let base = &config.window.title;
        let title = match scalar {
            Some(name) => format!("{} - {}", base, name),
            None if scene.scalar_names().is_empty() => base.clone(),
            None => format!("{} - No Scalars", base),
        };

        Self {
            active_scalar: scalar.map(str::to_string),
            meshes,
            legend,
            title,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::LIGHT_GREY;
    use crate::scene::tests::triangle_with;

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.push("first", triangle_with(&[("A", [0.0, 1.0, 2.0])]));
        scene.push("second", triangle_with(&[("A", [10.0, 20.0, 30.0]), ("B", [5.0; 3])]));
        scene.push("third", triangle_with(&[("B", [-1.0, 0.0, 1.0])]));
        scene
    }

    #[test]
    fn test_per_mesh_ranges() {
        let scene = scene();
        let state = DisplayState::for_scalar(&scene, Some("A"), &ViewerConfig::default());
        assert_eq!(
            state.meshes[0],
            Coloring::Scalar { name: "A".into(), range: (0.0, 2.0) }
        );
        assert_eq!(
            state.meshes[1],
            Coloring::Scalar { name: "A".into(), range: (10.0, 30.0) }
        );
        assert_eq!(state.meshes[2], Coloring::Base(scene.get(2).unwrap().base_color));
        assert_eq!(state.title, "VV mesh viewer - A");
    }

    #[test]
    fn test_legend_follows_first_mesh_with_scalar() {
        let scene = scene();
        let state = DisplayState::for_scalar(&scene, Some("B"), &ViewerConfig::default());
        assert!(!state.meshes[0].is_mapped());
        assert_eq!(state.legend, Legend::new("B", (5.0, 5.0), 5));
    }

    #[test]
    fn test_no_scalar_state() {
        let scene = scene();
        let state = DisplayState::for_scalar(&scene, None, &ViewerConfig::default());
        assert!(state.meshes.iter().all(|c| !c.is_mapped()));
        assert_eq!(state.meshes[0], Coloring::Base(LIGHT_GREY));
        assert!(!state.legend.is_visible());
        assert_eq!(state.legend.title, "");
        assert_eq!(state.title, "VV mesh viewer - No Scalars");

        let plain = Scene::new();
        let state = DisplayState::for_scalar(&plain, None, &ViewerConfig::default());
        assert_eq!(state.title, "VV mesh viewer");
    }

    #[test]
    fn test_recolor_is_idempotent() {
        let scene = scene();
        let config = ViewerConfig::default();
        let once = DisplayState::for_scalar(&scene, Some("A"), &config);
        let twice = DisplayState::for_scalar(&scene, Some("A"), &config);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_legend_labels() {
        let legend = Legend::new("t", (0.0, 1.0), 5);
        assert_eq!(legend.label_values(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(Legend::hidden().label_values().is_empty());
    }

    #[test]
    fn test_vertex_colors() {
        let scene = scene();
        let config = ViewerConfig::default();
        let entry = scene.get(0).unwrap();
        let mapped = Coloring::for_entry(entry, Some("A")).vertex_colors(entry, &config);
        assert_eq!(mapped.len(), 3);
        assert_eq!(mapped[0], [1.0, 0.0, 0.0]);
        let flat = Coloring::for_entry(entry, None).vertex_colors(entry, &config);
        assert_eq!(flat, vec![LIGHT_GREY; 3]);
    }
}
