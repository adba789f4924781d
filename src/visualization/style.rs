//! Series colors, stroke patterns and the surface colormap.

use std::str::FromStr;

use palette::Srgb;
use plotters::style::RGBColor;

use crate::config::{LineStyle, DEFAULT_PALETTE};

/// Plasma colormap anchors, evenly spaced over [0, 1].
const PLASMA: [(u8, u8, u8); 8] = [
    (13, 8, 135),
    (84, 2, 163),
    (139, 10, 165),
    (185, 50, 137),
    (219, 92, 104),
    (244, 136, 73),
    (254, 188, 43),
    (240, 249, 33),
];

/// Color token for series `index`: the explicit color when one exists at that
/// position, else the palette entry `index % palette.len()`.
pub fn series_color_token<'a>(index: usize, explicit: &'a [String], palette: &'a [String]) -> &'a str {
    if let Some(color) = explicit.get(index) {
        return color;
    }
    if palette.is_empty() {
        return DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()];
    }
    &palette[index % palette.len()]
}

/// Resolve a color token: `#rrggbb` / `#rgb`, single-letter codes, or CSS/X11 names.
pub fn resolve_color(token: &str) -> Option<RGBColor> {
    let token = token.trim();
    let rgb: Srgb<u8> = if token.starts_with('#') {
        Srgb::from_str(token).ok()?
    } else {
        let lower = token.to_ascii_lowercase();
        let name = match lower.as_str() {
            "r" => "red",
            "g" => "green",
            "b" => "blue",
            "c" => "cyan",
            "m" => "magenta",
            "y" => "yellow",
            "k" => "black",
            "w" => "white",
            other => other,
        };
        palette::named::from_str(name)?
    };
    Some(RGBColor(rgb.red, rgb.green, rgb.blue))
}

/// On/off lengths of a stroke pattern in units of [`dash_unit`]; `None` for solid lines.
pub fn dash_pattern(style: LineStyle) -> Option<&'static [f64]> {
    match style {
        LineStyle::Solid => None,
        LineStyle::Dashed => Some(&[6.0, 4.0]),
        LineStyle::Dotted => Some(&[1.0, 2.5]),
        LineStyle::DashDot => Some(&[6.0, 3.0, 1.0, 3.0]),
    }
}

/// Pattern unit for a plot spanning `span` data units, scaled with the stroke width.
pub fn dash_unit(span: f64, thickness: f64) -> f64 {
    span / 300.0 * thickness.max(1.0)
}

/// Split a polyline into the "on" pieces of an alternating on/off pattern,
/// measured along its arc length.
pub fn split_dashes(points: &[(f64, f64)], pattern: &[f64]) -> Vec<Vec<(f64, f64)>> {
    if points.len() < 2 || pattern.len() % 2 != 0 || !pattern.iter().any(|&l| l > 0.0) {
        return vec![points.to_vec()];
    }

    let mut dashes = Vec::new();
    let mut phase = 0;
    let mut remaining = pattern[0];
    let mut current = vec![points[0]];

    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let len = (b.0 - a.0).hypot(b.1 - a.1);
        if len == 0.0 {
            continue;
        }

        let mut travelled = 0.0;
        while len - travelled > remaining {
            travelled += remaining;
            let t = travelled / len;
            let p = (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t);
            if phase % 2 == 0 {
                current.push(p);
                dashes.push(std::mem::take(&mut current));
            } else {
                current = vec![p];
            }
            phase = (phase + 1) % pattern.len();
            remaining = pattern[phase];
        }
        remaining -= len - travelled;
        if phase % 2 == 0 {
            current.push(b);
        }
    }

    if phase % 2 == 0 && current.len() >= 2 {
        dashes.push(current);
    }
    dashes
}

/// Plasma colormap lookup for `t` in [0, 1]; values outside are clamped.
pub fn plasma(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (PLASMA.len() - 1) as f64;
    let idx = (scaled.floor() as usize).min(PLASMA.len() - 2);
    let frac = scaled - idx as f64;

    let (r0, g0, b0) = PLASMA[idx];
    let (r1, g1, b1) = PLASMA[idx + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}
