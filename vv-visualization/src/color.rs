//! Colour helpers: HSV conversion and per-mesh base colours

/// Linear RGB triple with components in `[0, 1]`
pub type Rgb = [f32; 3];

/// Base colour of the first mesh in a scene
pub const LIGHT_GREY: Rgb = [0.83, 0.83, 0.83];

/// Colour used for NaN scalar values
pub const GREY: Rgb = [0.752_941, 0.752_941, 0.752_941];

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618_033_988_749_894_8;

/// Convert hue/saturation/value (all in `[0, 1]`) to RGB
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    let h6 = h * 6.0;
    let f = h6 - h6.floor();
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match (h6.floor() as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    [r as f32, g as f32, b as f32]
}

/// Base colour for the `index`-th mesh of a scene.
///
/// Mesh 0 is light grey. Later meshes step around the hue circle by the
/// golden ratio so neighbouring indices stay far apart.
pub fn distinct_color(index: usize) -> Rgb {
    if index == 0 {
        return LIGHT_GREY;
    }
    let hue = ((index - 1) as f64 * GOLDEN_RATIO_CONJUGATE).fract();
    hsv_to_rgb(hue, 0.95, 1.0)
}

/// Base colours for `count` meshes
pub fn distinct_colors(count: usize) -> Vec<Rgb> {
    (0..count).map(distinct_color).collect()
}
