//! Per-request render settings.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Unit of the root element's `width` and `height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    #[default]
    #[serde(alias = "mm")]
    Millimeters,
    #[serde(alias = "in")]
    Inches,
}

impl LengthUnit {
    /// Converts a length in mils and returns it with the unit suffix.
    pub fn format_mils(self, mils: i32) -> String {
        match self {
            LengthUnit::Millimeters => schsvg_svg::format_length(f64::from(mils) * 0.0254, "mm"),
            LengthUnit::Inches => schsvg_svg::format_length(f64::from(mils) / 1000.0, "in"),
        }
    }
}

impl FromStr for LengthUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mm" | "millimeters" => Ok(LengthUnit::Millimeters),
            "in" | "inches" => Ok(LengthUnit::Inches),
            other => Err(format!("unknown unit '{other}', expected mm or in")),
        }
    }
}

/// Settings read once at the start of a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub unit: LengthUnit,
    pub font_family: String,
    pub junction_radius: i32,
    pub no_connect_size: i32,
    pub render_components: bool,
    pub show_hidden_pins: bool,
    pub error_font_size: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            unit: LengthUnit::Millimeters,
            font_family: "sans-serif".to_string(),
            junction_radius: 20,
            no_connect_size: 24,
            render_components: true,
            show_hidden_pins: false,
            error_font_size: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mils() {
        assert_eq!(LengthUnit::Millimeters.format_mils(11693), "297.0022mm");
        assert_eq!(LengthUnit::Inches.format_mils(11693), "11.693in");
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!("mm".parse::<LengthUnit>().unwrap(), LengthUnit::Millimeters);
        assert_eq!("Inches".parse::<LengthUnit>().unwrap(), LengthUnit::Inches);
        assert!("cubits".parse::<LengthUnit>().is_err());
    }

    #[test]
    fn test_defaults() {
        let settings = RenderSettings::default();
        assert_eq!(settings.font_family, "sans-serif");
        assert!(settings.render_components);
        assert!(!settings.show_hidden_pins);
        assert_eq!(settings.error_font_size, 100.0);
    }
}
