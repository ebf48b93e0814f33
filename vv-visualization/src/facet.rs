//! Exploded (facet) view: one panel per scalar name laid out on a grid

use crate::config::ViewerConfig;
use crate::display::{Coloring, Legend};
use crate::scene::Scene;

/// Window title suffix of the facet view
pub const FACET_TITLE_SUFFIX: &str = "Exploded (facet) view";

/// Near-square grid holding `count` panels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacetGrid {
    pub cols: usize,
    pub rows: usize,
}

impl FacetGrid {
    /// `cols = ceil(sqrt(count))`, `rows = ceil(count / cols)`
    pub fn for_count(count: usize) -> Self {
        if count == 0 {
            return Self { cols: 0, rows: 0 };
        }
        let cols = (count as f64).sqrt().ceil() as usize;
        let rows = count.div_ceil(cols);
        Self { cols, rows }
    }

    /// Viewport of panel `index`, filled row by row from the top left
    pub fn viewport(&self, index: usize) -> Viewport {
        let (cols, rows) = (self.cols.max(1) as f32, self.rows.max(1) as f32);
        let row = (index / self.cols.max(1)) as f32;
        let col = (index % self.cols.max(1)) as f32;
        Viewport {
            x_min: col / cols,
            x_max: (col + 1.0) / cols,
            y_min: 1.0 - (row + 1.0) / rows,
            y_max: 1.0 - row / rows,
        }
    }
}

/// Rectangle in normalised window coordinates, origin at the bottom left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl Viewport {
    pub const FULL: Viewport = Viewport {
        x_min: 0.0,
        y_min: 0.0,
        x_max: 1.0,
        y_max: 1.0,
    };

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Pixel rectangle `(x, y, width, height)` with y measured from the top
    pub fn to_pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let (w, h) = (width as f32, height as f32);
        let x = (self.x_min * w).round() as u32;
        let y = ((1.0 - self.y_max) * h).round() as u32;
        let pw = ((self.width() * w).round() as u32).max(1).min(width.saturating_sub(x).max(1));
        let ph = ((self.height() * h).round() as u32).max(1).min(height.saturating_sub(y).max(1));
        (x, y, pw, ph)
    }
}

/// One panel of the facet view
#[derive(Debug, Clone, PartialEq)]
pub struct FacetPanel {
    pub scalar: String,
    pub viewport: Viewport,
    /// One colouring per scene entry, in scene order
    pub meshes: Vec<Coloring>,
    /// Union-range legend, absent when no mesh has a non-degenerate range
    pub legend: Option<Legend>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FacetLayout {
    pub grid: FacetGrid,
    pub panels: Vec<FacetPanel>,
    pub title: String,
}

impl FacetLayout {
    /// Lay out one panel per scalar name. `None` when the scene has no
    /// scalars, in which case the single view is used instead.
    pub fn build(scene: &Scene, config: &ViewerConfig) -> Option<Self> {
        let names = scene.scalar_names();
        if names.is_empty() {
            return None;
        }
        let grid = FacetGrid::for_count(names.len());
        let panels = names
            .iter()
            .enumerate()
            .map(|(i, name)| FacetPanel {
                scalar: name.clone(),
                viewport: grid.viewport(i),
                meshes: scene
                    .iter()
                    .map(|entry| Coloring::for_entry(entry, Some(name)))
                    .collect(),
                legend: union_range(scene, name)
                    .filter(|(lo, hi)| hi > lo)
                    .map(|range| {
                        Legend::new(name.clone(), range, config.color_map.facet_legend_labels)
                    }),
            })
            .collect();
        Some(Self {
            grid,
            panels,
            title: format!("{} - {}", config.window.title, FACET_TITLE_SUFFIX),
        })
    }
}

/// Smallest range covering `name` on every mesh that has it
fn union_range(scene: &Scene, name: &str) -> Option<(f32, f32)> {
    scene
        .iter()
        .filter_map(|entry| entry.mesh.attribute(name))
        .map(|attribute| attribute.range().unwrap_or((0.0, 0.0)))
        .reduce(|(alo, ahi), (blo, bhi)| (alo.min(blo), ahi.max(bhi)))
}
