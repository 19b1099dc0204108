use crate::table::TableSource;
use crate::RenderOptions;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Describes the GDP-by-year source table.
#[derive(Debug, Clone, Deserialize)]
pub struct GdpInfo {
    #[serde(alias = "gdpfile")]
    pub source_path: PathBuf,
    #[serde(default = "default_separator", alias = "separator")]
    pub field_separator: char,
    #[serde(default = "default_quote", alias = "quote")]
    pub quote_char: char,
    pub min_year: u32,
    pub max_year: u32,
    #[serde(alias = "country_name")]
    pub country_name_field: String,
    #[serde(alias = "country_code")]
    pub country_code_field: String,
}

/// Describes the reference table pairing plot codes with data codes.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeInfo {
    #[serde(alias = "codefile")]
    pub source_path: PathBuf,
    #[serde(default = "default_separator", alias = "separator")]
    pub field_separator: char,
    #[serde(default = "default_quote", alias = "quote")]
    pub quote_char: char,
    #[serde(alias = "plot_codes")]
    pub plot_code_field: String,
    #[serde(alias = "data_codes")]
    pub data_code_field: String,
}

/// Top-level configuration document read by the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub gdpinfo: GdpInfo,
    #[serde(default)]
    pub codeinfo: Option<CodeInfo>,
    /// JSON object of plot code to display name
    #[serde(default)]
    pub countries: Option<PathBuf>,
    #[serde(default)]
    pub render: RenderOptions,
}

fn default_separator() -> char { ',' }
fn default_quote() -> char { '"' }

impl GdpInfo {
    pub fn source(&self) -> Result<TableSource> {
        Ok(TableSource::new(
            &self.source_path,
            single_byte(self.field_separator, "field_separator")?,
            single_byte(self.quote_char, "quote_char")?,
        ))
    }

    /// Year labels from `min_year` to `max_year` inclusive
    pub fn years(&self) -> impl Iterator<Item = String> {
        (self.min_year..=self.max_year).map(|y| y.to_string())
    }

    pub fn contains_year(&self, year: &str) -> bool {
        year.parse::<u32>()
            .map(|y| (self.min_year..=self.max_year).contains(&y))
            .unwrap_or(false)
    }
}

impl CodeInfo {
    pub fn source(&self) -> Result<TableSource> {
        Ok(TableSource::new(
            &self.source_path,
            single_byte(self.field_separator, "field_separator")?,
            single_byte(self.quote_char, "quote_char")?,
        ))
    }
}

impl MapConfig {
    /// Load a JSON config. Relative paths inside it resolve against the
    /// config file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: MapConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        if config.gdpinfo.min_year > config.gdpinfo.max_year {
            anyhow::bail!(
                "min_year ({}) is greater than max_year ({})",
                config.gdpinfo.min_year,
                config.gdpinfo.max_year
            );
        }

        if let Some(base) = path.parent() {
            config.gdpinfo.source_path = rebase(base, &config.gdpinfo.source_path);
            if let Some(codeinfo) = config.codeinfo.as_mut() {
                codeinfo.source_path = rebase(base, &codeinfo.source_path);
            }
            if let Some(countries) = config.countries.as_mut() {
                *countries = rebase(base, countries);
            }
        }

        Ok(config)
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn single_byte(c: char, what: &str) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(anyhow!("{} must be a single ASCII character, got '{}'", what, c))
    }
}
