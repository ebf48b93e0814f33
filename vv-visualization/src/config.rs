//! Viewer settings
//!
//! Every field has a default, so a partial TOML table only overrides the keys
//! it names.

use crate::color::{Rgb, GREY};
use serde::{Deserialize, Serialize};

/// Base window title; scalar and mode suffixes are appended to it
pub const DEFAULT_TITLE: &str = "VV mesh viewer";

/// Settings shared by every renderer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub color_map: ColorMapConfig,
}

/// Window geometry and title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub background: Rgb,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1024,
            title: DEFAULT_TITLE.to_string(),
            background: [0.1, 0.1, 0.1],
        }
    }
}

/// Scalar colour ramp and legend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorMapConfig {
    /// Number of discrete colours in the lookup table
    pub table_size: usize,
    /// Hue at the low and high end of the ramp, in `[0, 1]`
    pub hue_range: [f32; 2],
    pub nan_color: Rgb,
    /// Legend labels in the single view
    pub legend_labels: usize,
    /// Legend labels on each facet panel
    pub facet_legend_labels: usize,
}

impl Default for ColorMapConfig {
    fn default() -> Self {
        Self {
            table_size: 256,
            hue_range: [0.0, 0.8],
            nan_color: GREY,
            legend_labels: 5,
            facet_legend_labels: 4,
        }
    }
}
