// Library exports for gdpmap

pub mod config;
pub mod converter;
pub mod countries;
pub mod error;
pub mod gdp;
pub mod graph;
pub mod palette;
pub mod reconcile;
pub mod runtime;
pub mod table;
pub mod years;

use serde::Deserialize;

pub use config::{CodeInfo, GdpInfo, MapConfig};
pub use converter::{build_code_converter, CodeConverter};
pub use countries::PlotCountries;
pub use error::LoadError;
pub use gdp::{build_gdp_map, build_map_by_code, build_map_by_name, GdpMap, GdpTable, Unify};
pub use reconcile::{reconcile_by_code, reconcile_by_name, Reconciliation};

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    #[serde(default)]
    pub colors: palette::Palette,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            format: OutputFormat::Png,
            colors: palette::Palette::default(),
        }
    }
}
