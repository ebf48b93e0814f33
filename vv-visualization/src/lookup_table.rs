//! Discrete colour ramp mapping a scalar range onto a hue sweep

use crate::color::{hsv_to_rgb, Rgb};
use crate::config::ColorMapConfig;
use vv_core::PointAttribute;

/// A table of evenly spaced hues covering `range`.
///
/// Values are scaled linearly into the table and clamped at both ends. NaN
/// maps to the NaN colour. A degenerate range (`lo >= hi`) maps every finite
/// value to the first entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupTable {
    colors: Vec<Rgb>,
    range: (f32, f32),
    nan_color: Rgb,
}

impl LookupTable {
    /// Build a table of `size` colours sweeping hue from `hue_range[0]` to
    /// `hue_range[1]` at full saturation and value
    pub fn new(size: usize, hue_range: [f32; 2], range: (f32, f32), nan_color: Rgb) -> Self {
        let size = size.max(1);
        let (h0, h1) = (hue_range[0] as f64, hue_range[1] as f64);
        let step = if size > 1 {
            (h1 - h0) / (size - 1) as f64
        } else {
            0.0
        };
        let colors = (0..size)
            .map(|i| hsv_to_rgb(h0 + step * i as f64, 1.0, 1.0))
            .collect();
        Self {
            colors,
            range,
            nan_color,
        }
    }

    pub fn from_config(config: &ColorMapConfig, range: (f32, f32)) -> Self {
        Self::new(config.table_size, config.hue_range, range, config.nan_color)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn range(&self) -> (f32, f32) {
        self.range
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn nan_color(&self) -> Rgb {
        self.nan_color
    }

    /// Table slot for a value, `None` for NaN
    pub fn index_of(&self, value: f32) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let (lo, hi) = self.range;
        if lo >= hi {
            return Some(0);
        }
        let n = self.colors.len();
        let scaled = ((value - lo) / (hi - lo) * n as f32).floor();
        Some((scaled.max(0.0) as usize).min(n - 1))
    }

    pub fn map(&self, value: f32) -> Rgb {
        match self.index_of(value) {
            Some(i) => self.colors[i],
            None => self.nan_color,
        }
    }

    /// Colour every point by component 0 of `attribute`
    pub fn map_attribute(&self, attribute: &PointAttribute) -> Vec<Rgb> {
        attribute.scalar_values().map(|v| self.map(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::GREY;
    use approx::assert_relative_eq;

    fn table() -> LookupTable {
        LookupTable::from_config(&ColorMapConfig::default(), (0.0, 10.0))
    }

    #[test]
    fn test_ramp_endpoints() {
        let lut = table();
        assert_eq!(lut.len(), 256);
        // Hue 0 is red, hue 0.8 is purple
        assert_eq!(lut.colors()[0], [1.0, 0.0, 0.0]);
        let last = lut.colors()[255];
        assert_relative_eq!(last[0], 0.8, epsilon = 1e-5);
        assert_relative_eq!(last[1], 0.0);
        assert_relative_eq!(last[2], 1.0);
    }

    #[test]
    fn test_value_to_index() {
        let lut = table();
        assert_eq!(lut.index_of(0.0), Some(0));
        assert_eq!(lut.index_of(5.0), Some(128));
        assert_eq!(lut.index_of(10.0), Some(255));
        assert_eq!(lut.index_of(-3.0), Some(0));
        assert_eq!(lut.index_of(99.0), Some(255));
        assert_eq!(lut.index_of(f32::NAN), None);
        assert_eq!(lut.map(f32::NAN), GREY);
    }

    #[test]
    fn test_degenerate_range() {
        let lut = LookupTable::new(16, [0.0, 0.8], (2.0, 2.0), GREY);
        assert_eq!(lut.index_of(2.0), Some(0));
        assert_eq!(lut.index_of(7.0), Some(0));
    }

    #[test]
    fn test_map_attribute_uses_first_component() {
        let lut = LookupTable::new(2, [0.0, 0.5], (0.0, 1.0), GREY);
        let attribute = PointAttribute::new("v", 2, vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        let colors = lut.map_attribute(&attribute);
        assert_eq!(colors, vec![lut.colors()[0], lut.colors()[1]]);
    }
}
