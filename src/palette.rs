use anyhow::{anyhow, Result};
use plotters::style::RGBColor;
use serde::Deserialize;

/// Colors used by the map, as hex (#RRGGBB, #RGB) or named colors.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Palette {
    /// Smallest log GDP
    pub low: String,
    /// Largest log GDP
    pub high: String,
    pub missing_from_source: String,
    pub missing_data: String,
    pub background: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            low: "#c6dbef".to_string(),
            high: "#08306b".to_string(),
            missing_from_source: "#bdbdbd".to_string(),
            missing_data: "#fdae6b".to_string(),
            background: "white".to_string(),
        }
    }
}

/// A palette with every color parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPalette {
    pub low: RGBColor,
    pub high: RGBColor,
    pub missing_from_source: RGBColor,
    pub missing_data: RGBColor,
    pub background: RGBColor,
}

impl Palette {
    pub fn resolve(&self) -> Result<ResolvedPalette> {
        Ok(ResolvedPalette {
            low: require_color(&self.low)?,
            high: require_color(&self.high)?,
            missing_from_source: require_color(&self.missing_from_source)?,
            missing_data: require_color(&self.missing_data)?,
            background: require_color(&self.background)?,
        })
    }
}

impl ResolvedPalette {
    /// Color for `value` on the low..high gradient spanning `range`.
    pub fn shade(&self, value: f64, range: (f64, f64)) -> RGBColor {
        let (lo, hi) = range;
        let t = if hi > lo { (value - lo) / (hi - lo) } else { 0.5 };
        lerp(self.low, self.high, t)
    }
}

fn require_color(color_str: &str) -> Result<RGBColor> {
    parse_color(color_str).ok_or_else(|| anyhow!("Unknown color '{}'", color_str))
}

/// Linear interpolation between two colors, `t` clamped to 0..=1
pub fn lerp(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Parse a color string into RGBColor, supporting hex (#RRGGBB, #RGB) and named colors
pub fn parse_color(color_str: &str) -> Option<RGBColor> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    match color_str.to_lowercase().as_str() {
        "white" => Some(RGBColor(255, 255, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "yellow" => Some(RGBColor(255, 255, 0)),
        "orange" => Some(RGBColor(255, 165, 0)),
        "purple" => Some(RGBColor(128, 0, 128)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        "darkgray" | "darkgrey" => Some(RGBColor(64, 64, 64)),
        "lightgray" | "lightgrey" => Some(RGBColor(192, 192, 192)),
        _ => None,
    }
}

/// Parse hex color (#RRGGBB or #RGB)
fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}
