use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Plot code (e.g. "us") to display name (e.g. "United States"), as known to
/// the map renderer. This is the universe of countries every result covers.
pub type PlotCountries = BTreeMap<String, String>;

/// Load plot countries from a JSON object of `code: name` pairs.
pub fn load_plot_countries(path: &Path) -> Result<PlotCountries> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plot countries {}", path.display()))?;
    let countries: PlotCountries = serde_json::from_str(&text)
        .with_context(|| format!("Plot countries in {} must be a JSON object of strings", path.display()))?;
    Ok(countries)
}
